use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::domain::core::{NewService, Price, Service, ServiceId, ServiceRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::{decode_duration, delete_by_id, encode_duration, RowConvertError};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    service_type: String,
    description: String,
    duration: i64,
    price: String,
}

impl TryFrom<ServiceRow> for Service {
    type Error = RowConvertError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let price = Price::new(Decimal::from_str(&row.price)?)?;
        Ok(Service::new(
            row.id.into(),
            row.service_type,
            row.description,
            decode_duration(row.duration),
            price,
        ))
    }
}

#[derive(Clone)]
pub struct SqliteServiceRepository {
    pool: SqlitePool,
}

impl SqliteServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for SqliteServiceRepository {
    async fn create(&mut self, new: NewService) -> Result<Service, DataAccessError> {
        let duration = encode_duration(new.duration)?;
        let result = sqlx::query(
            "INSERT INTO service (service_type, description, duration, price) VALUES (?, ?, ?, ?)",
        )
        .bind(new.service_type.as_str())
        .bind(new.description.as_str())
        .bind(duration)
        .bind(new.price.amount().to_string())
        .execute(&self.pool)
        .await?;
        Ok(Service::from_new(result.last_insert_rowid().into(), new))
    }

    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, DataAccessError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, service_type, description, duration, price FROM service WHERE id = ?",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Service::try_from).transpose()?)
    }

    async fn find_all(&self) -> Result<Vec<Service>, DataAccessError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, service_type, description, duration, price FROM service ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(Service::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn save(&mut self, entity: &Service) -> Result<bool, DataAccessError> {
        let duration = encode_duration(entity.duration())?;
        let result = sqlx::query(
            "UPDATE service SET service_type = ?, description = ?, duration = ?, price = ?
             WHERE id = ?",
        )
        .bind(entity.service_type())
        .bind(entity.description())
        .bind(duration)
        .bind(entity.price().amount().to_string())
        .bind(*entity.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, entity: &Service) -> Result<bool, DataAccessError> {
        delete_by_id::<Service>(&self.pool, entity.id()).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::core::{
        AppointmentRepository, Customer, CustomerRepository, NewCustomer,
        NewStylist, StylistRepository,
    };
    use crate::infrastructure::core::{
        SqliteAppointmentRepository, SqliteCustomerRepository, SqliteStylistRepository,
    };
    use crate::infrastructure::memory_pool;

    use super::*;

    fn new_service(service_type: &str, price: &str, minutes: i64) -> NewService {
        NewService {
            service_type: service_type.to_owned(),
            description: format!("{service_type} at the salon"),
            duration: Duration::minutes(minutes),
            price: Price::new(Decimal::from_str(price).unwrap()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_repository() {
        let mut repo = SqliteServiceRepository::new(memory_pool().await);

        let mut braids = repo
            .create(new_service("Box braids", "180", 240))
            .await
            .unwrap();
        let stored = repo.find_by_id(braids.id()).await.unwrap().unwrap();
        assert_eq!(stored, braids);
        assert_eq!(stored.price().amount().to_string(), "180.00");
        assert_eq!(stored.duration(), Duration::hours(4));

        braids.set_price(Price::new(Decimal::from_str("199.5").unwrap()).unwrap());
        assert!(repo.save(&braids).await.unwrap());
        assert_eq!(
            repo.find_by_id(braids.id()).await.unwrap().unwrap().price().to_string(),
            "199.50"
        );

        assert!(repo.delete(&braids).await.unwrap());
        assert_eq!(repo.find_by_id(braids.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_services() {
        let mut repo = SqliteServiceRepository::new(memory_pool().await);
        assert!(Service::list_services(&repo).await.unwrap().is_empty());

        let haircut = repo.create(new_service("Haircut", "35", 45)).await.unwrap();
        let color = repo.create(new_service("Color", "120", 90)).await.unwrap();
        assert_eq!(
            Service::list_services(&repo).await.unwrap(),
            vec![haircut, color]
        );
    }

    #[tokio::test]
    async fn test_broken_price_text() {
        let pool = memory_pool().await;
        sqlx::query(
            "INSERT INTO service (service_type, description, duration, price)
             VALUES ('Cut', '', 0, 'free')",
        )
        .execute(&pool)
        .await
        .unwrap();
        let repo = SqliteServiceRepository::new(pool);
        assert!(matches!(
            repo.find_all().await,
            Err(DataAccessError::ClientSideError(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_appointments() {
        let pool = memory_pool().await;
        let mut services = SqliteServiceRepository::new(pool.clone());
        let mut stylists = SqliteStylistRepository::new(pool.clone());
        let mut customers = SqliteCustomerRepository::new(pool.clone());
        let mut appointments = SqliteAppointmentRepository::new(pool);

        let haircut = services.create(new_service("Haircut", "35", 45)).await.unwrap();
        let bob = stylists
            .create(NewStylist {
                name: "Bob".to_owned(),
                phone_number: "555-0102".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();
        let alice: Customer = customers
            .create(NewCustomer {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                phone_number: "555-0101".to_owned(),
            })
            .await
            .unwrap();
        let appointment = alice
            .book_appointment(
                &mut appointments,
                &bob,
                &haircut,
                Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(appointment.customer_id(), alice.id());

        assert!(services.delete(&haircut).await.unwrap());
        assert_eq!(appointments.find_by_id(appointment.id()).await.unwrap(), None);
    }
}
