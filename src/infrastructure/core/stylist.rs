use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::core::{NewStylist, Stylist, StylistId, StylistRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::delete_by_id;

#[derive(Debug, Clone, sqlx::FromRow)]
struct StylistRow {
    id: i64,
    name: String,
    phone_number: String,
    social_media: Option<String>,
    portfolio: Option<String>,
}

impl From<StylistRow> for Stylist {
    fn from(row: StylistRow) -> Self {
        Stylist::new(
            row.id.into(),
            row.name,
            row.phone_number,
            row.social_media,
            row.portfolio,
        )
    }
}

#[derive(Clone)]
pub struct SqliteStylistRepository {
    pool: SqlitePool,
}

impl SqliteStylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StylistRepository for SqliteStylistRepository {
    async fn create(&mut self, new: NewStylist) -> Result<Stylist, DataAccessError> {
        let result = sqlx::query(
            "INSERT INTO stylist (name, phone_number, social_media, portfolio) VALUES (?, ?, ?, ?)",
        )
        .bind(new.name.as_str())
        .bind(new.phone_number.as_str())
        .bind(new.social_media.as_deref())
        .bind(new.portfolio.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(Stylist::from_new(result.last_insert_rowid().into(), new))
    }

    async fn find_by_id(&self, id: StylistId) -> Result<Option<Stylist>, DataAccessError> {
        let row = sqlx::query_as::<_, StylistRow>(
            "SELECT id, name, phone_number, social_media, portfolio FROM stylist WHERE id = ?",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Stylist::from))
    }

    async fn find_all(&self) -> Result<Vec<Stylist>, DataAccessError> {
        let rows = sqlx::query_as::<_, StylistRow>(
            "SELECT id, name, phone_number, social_media, portfolio FROM stylist ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Stylist::from).collect())
    }

    async fn save(&mut self, entity: &Stylist) -> Result<bool, DataAccessError> {
        let result = sqlx::query(
            "UPDATE stylist SET name = ?, phone_number = ?, social_media = ?, portfolio = ?
             WHERE id = ?",
        )
        .bind(entity.name())
        .bind(entity.phone_number())
        .bind(entity.social_media())
        .bind(entity.portfolio())
        .bind(*entity.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, entity: &Stylist) -> Result<bool, DataAccessError> {
        delete_by_id::<Stylist>(&self.pool, entity.id()).await
    }
}
