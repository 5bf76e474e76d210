mod pair_repository;
mod title_repository;

pub use pair_repository::{PairRepository, SqlitePairRepository};
pub use title_repository::{SqliteTitleRepository, TitleRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
