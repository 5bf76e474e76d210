use std::str::FromStr;
use std::sync::MutexGuard;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::{LudexError, Result};
use crate::models::{MatchKind, PairKey, SimilarityPair};

use super::Repository;

pub trait PairRepository: Repository<Entity = SimilarityPair, Id = Uuid> {
    fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<SimilarityPair>>;
    fn find_by_key(&self, owner_id: &Uuid, key: &PairKey) -> Result<Option<SimilarityPair>>;
    /// Rewrite score and match kind after a rescan. Leaves `dismissed` alone.
    fn update_match(&self, id: &Uuid, score: u8, match_type: MatchKind) -> Result<()>;
    fn set_dismissed(&self, id: &Uuid, dismissed: bool) -> Result<bool>;
    fn count(&self) -> Result<usize>;
    fn count_dismissed(&self) -> Result<usize>;
}

pub struct SqlitePairRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqlitePairRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_pair(row: &rusqlite::Row) -> rusqlite::Result<SimilarityPair> {
        Ok(SimilarityPair {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            title_a_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            title_b_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
            owner_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap_or_default(),
            score: row.get(4)?,
            match_type: MatchKind::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
            dismissed: row.get(6)?,
            created_at: parse_timestamp(&row.get::<_, String>(7)?),
            updated_at: parse_timestamp(&row.get::<_, String>(8)?),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const PAIR_COLUMNS: &str = "id, title_a_id, title_b_id, owner_id, score, match_type, dismissed,
                            created_at, updated_at";

impl<'a> Repository for SqlitePairRepository<'a> {
    type Entity = SimilarityPair;
    type Id = Uuid;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAIR_COLUMNS} FROM similarity_pairs WHERE id = ?1"
        ))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_pair) {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entity: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO similarity_pairs
                (id, title_a_id, title_b_id, owner_id, score, match_type, dismissed,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entity.id.to_string(),
                entity.title_a_id.to_string(),
                entity.title_b_id.to_string(),
                entity.owner_id.to_string(),
                entity.score,
                entity.match_type.to_string(),
                entity.dismissed,
                entity.created_at.to_rfc3339(),
                entity.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM similarity_pairs WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}

impl<'a> PairRepository for SqlitePairRepository<'a> {
    fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<SimilarityPair>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAIR_COLUMNS} FROM similarity_pairs
             WHERE owner_id = ?1 ORDER BY title_a_id, title_b_id"
        ))?;

        let rows = stmt
            .query_map(params![owner_id.to_string()], Self::row_to_pair)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_by_key(&self, owner_id: &Uuid, key: &PairKey) -> Result<Option<SimilarityPair>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAIR_COLUMNS} FROM similarity_pairs
             WHERE owner_id = ?1 AND title_a_id = ?2 AND title_b_id = ?3"
        ))?;

        match stmt.query_row(
            params![
                owner_id.to_string(),
                key.first().to_string(),
                key.second().to_string()
            ],
            Self::row_to_pair,
        ) {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update_match(&self, id: &Uuid, score: u8, match_type: MatchKind) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE similarity_pairs SET score = ?2, match_type = ?3, updated_at = ?4
             WHERE id = ?1",
            params![
                id.to_string(),
                score,
                match_type.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if updated == 0 {
            return Err(LudexError::PairNotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_dismissed(&self, id: &Uuid, dismissed: bool) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE similarity_pairs SET dismissed = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), dismissed, Utc::now().to_rfc3339()],
        )?;
        Ok(updated > 0)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM similarity_pairs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_dismissed(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM similarity_pairs WHERE dismissed = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
