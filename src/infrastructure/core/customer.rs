use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::core::{Customer, CustomerId, CustomerRepository, NewCustomer};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::delete_by_id;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    email: String,
    phone_number: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer::new(row.id.into(), row.name, row.email, row.phone_number)
    }
}

#[derive(Clone)]
pub struct SqliteCustomerRepository {
    pool: SqlitePool,
}

impl SqliteCustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    async fn create(&mut self, new: NewCustomer) -> Result<Customer, DataAccessError> {
        let result =
            sqlx::query("INSERT INTO customer (name, email, phone_number) VALUES (?, ?, ?)")
                .bind(new.name.as_str())
                .bind(new.email.as_str())
                .bind(new.phone_number.as_str())
                .execute(&self.pool)
                .await?;
        Ok(Customer::from_new(result.last_insert_rowid().into(), new))
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone_number FROM customer WHERE id = ?",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone_number FROM customer ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn save(&mut self, entity: &Customer) -> Result<bool, DataAccessError> {
        let result =
            sqlx::query("UPDATE customer SET name = ?, email = ?, phone_number = ? WHERE id = ?")
                .bind(entity.name())
                .bind(entity.email())
                .bind(entity.phone_number())
                .bind(*entity.id())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, entity: &Customer) -> Result<bool, DataAccessError> {
        delete_by_id::<Customer>(&self.pool, entity.id()).await
    }
}
