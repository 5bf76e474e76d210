use std::sync::MutexGuard;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Title;

use super::Repository;

pub trait TitleRepository: Repository<Entity = Title, Id = Uuid> {
    fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Title>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteTitleRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteTitleRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_title(row: &rusqlite::Row) -> rusqlite::Result<Title> {
        Ok(Title {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            owner_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            name: row.get(2)?,
            platform: row.get(3)?,
            added_at: parse_timestamp(&row.get::<_, String>(4)?),
            updated_at: parse_timestamp(&row.get::<_, String>(5)?),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl<'a> Repository for SqliteTitleRepository<'a> {
    type Entity = Title;
    type Id = Uuid;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, platform, added_at, updated_at
             FROM titles WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], Self::row_to_title) {
            Ok(title) => Ok(Some(title)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entity: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO titles (id, owner_id, name, platform, added_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entity.id.to_string(),
                entity.owner_id.to_string(),
                entity.name,
                entity.platform,
                entity.added_at.to_rfc3339(),
                entity.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM titles WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

impl<'a> TitleRepository for SqliteTitleRepository<'a> {
    fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Title>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, platform, added_at, updated_at
             FROM titles WHERE owner_id = ?1 ORDER BY added_at, id",
        )?;

        let rows = stmt
            .query_map(params![owner_id.to_string()], Self::row_to_title)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM titles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    fn owner() -> Uuid {
        Uuid::from_u128(1)
    }

    #[test]
    fn save_find_delete_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteTitleRepository::new(db.connection());

        let title = Title::new(owner(), "Hollow Knight").with_platform("pc");
        repo.save(&title).unwrap();

        let found = repo.find_by_id(&title.id).unwrap().unwrap();
        assert_eq!(found.name, "Hollow Knight");
        assert_eq!(found.platform.as_deref(), Some("pc"));
        assert_eq!(found.owner_id, owner());

        assert!(repo.delete(&title.id).unwrap());
        assert!(repo.find_by_id(&title.id).unwrap().is_none());
        assert!(!repo.delete(&title.id).unwrap());
    }

    #[test]
    fn list_for_owner_filters_other_owners() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteTitleRepository::new(db.connection());

        repo.save(&Title::new(owner(), "Portal")).unwrap();
        repo.save(&Title::new(owner(), "Portal 2")).unwrap();
        repo.save(&Title::new(Uuid::from_u128(2), "Portal")).unwrap();

        let titles = repo.list_for_owner(&owner()).unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(repo.count().unwrap(), 3);
    }
}
