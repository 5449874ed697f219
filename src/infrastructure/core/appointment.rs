use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::core::{
    Appointment, AppointmentDetail, AppointmentId, AppointmentRepository, CustomerId,
    NewAppointment,
};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::{delete_by_id, RowConvertError};

const SELECT_DETAIL: &str = "SELECT a.id, a.service_id, a.stylist_id, a.customer_id, \
     a.appointment_datetime, a.status, \
     c.name AS customer_name, st.name AS stylist_name, s.service_type \
     FROM appointment a \
     JOIN customer c ON a.customer_id = c.id \
     JOIN stylist st ON a.stylist_id = st.id \
     JOIN service s ON a.service_id = s.id";

const SELECT_APPOINTMENT: &str = "SELECT id, service_id, stylist_id, customer_id, \
     appointment_datetime, status FROM appointment";

#[derive(Debug, Clone, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    service_id: i64,
    stylist_id: i64,
    customer_id: i64,
    appointment_datetime: DateTime<Utc>,
    status: String,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = RowConvertError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment::new(
            row.id.into(),
            row.service_id.into(),
            row.stylist_id.into(),
            row.customer_id.into(),
            row.appointment_datetime,
            row.status.parse()?,
        ))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AppointmentDetailRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    customer_name: String,
    stylist_name: String,
    service_type: String,
}

impl TryFrom<AppointmentDetailRow> for AppointmentDetail {
    type Error = RowConvertError;

    fn try_from(row: AppointmentDetailRow) -> Result<Self, Self::Error> {
        Ok(AppointmentDetail {
            appointment: row.appointment.try_into()?,
            customer_name: row.customer_name,
            stylist_name: row.stylist_name,
            service_type: row.service_type,
        })
    }
}

fn collect(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>, RowConvertError> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[derive(Clone)]
pub struct SqliteAppointmentRepository {
    pool: SqlitePool,
}

impl SqliteAppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    async fn create(&mut self, new: NewAppointment) -> Result<Appointment, DataAccessError> {
        let result = sqlx::query(
            "INSERT INTO appointment
             (service_id, stylist_id, customer_id, appointment_datetime, status)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(*new.service_id)
        .bind(*new.stylist_id)
        .bind(*new.customer_id)
        .bind(new.appointment_datetime)
        .bind(new.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(Appointment::from_new(result.last_insert_rowid().into(), new))
    }

    async fn find_by_id(&self, id: AppointmentId) -> Result<Option<Appointment>, DataAccessError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!("{SELECT_APPOINTMENT} WHERE id = ?"))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Appointment::try_from).transpose()?)
    }

    async fn find_all(&self) -> Result<Vec<Appointment>, DataAccessError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!("{SELECT_APPOINTMENT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(collect(rows)?)
    }

    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Appointment>, DataAccessError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "{SELECT_APPOINTMENT} WHERE customer_id = ? ORDER BY id"
        ))
        .bind(*customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect(rows)?)
    }

    async fn find_detail_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<AppointmentDetail>, DataAccessError> {
        let row = sqlx::query_as::<_, AppointmentDetailRow>(&format!("{SELECT_DETAIL} WHERE a.id = ?"))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AppointmentDetail::try_from).transpose()?)
    }

    async fn find_all_details(&self) -> Result<Vec<AppointmentDetail>, DataAccessError> {
        let rows = sqlx::query_as::<_, AppointmentDetailRow>(&format!("{SELECT_DETAIL} ORDER BY a.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(AppointmentDetail::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn save(&mut self, entity: &Appointment) -> Result<bool, DataAccessError> {
        let result = sqlx::query(
            "UPDATE appointment
             SET service_id = ?, stylist_id = ?, customer_id = ?,
                 appointment_datetime = ?, status = ?
             WHERE id = ?",
        )
        .bind(*entity.service_id())
        .bind(*entity.stylist_id())
        .bind(*entity.customer_id())
        .bind(entity.appointment_datetime())
        .bind(entity.status().as_str())
        .bind(*entity.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, entity: &Appointment) -> Result<bool, DataAccessError> {
        delete_by_id::<Appointment>(&self.pool, entity.id()).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    use crate::domain::core::{
        AppointmentStatus, Customer, CustomerRepository, NewCustomer, NewService, NewStylist,
        Price, Service, ServiceRepository, Stylist, StylistId, StylistRepository,
    };
    use crate::infrastructure::core::{
        SqliteCustomerRepository, SqliteServiceRepository, SqliteStylistRepository,
    };
    use crate::infrastructure::memory_pool;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    struct Salon {
        appointments: SqliteAppointmentRepository,
        services: SqliteServiceRepository,
        alice: Customer,
        bob: Stylist,
        haircut: Service,
    }

    async fn salon() -> Salon {
        let pool = memory_pool().await;
        let alice = SqliteCustomerRepository::new(pool.clone())
            .create(NewCustomer {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                phone_number: "555-0101".to_owned(),
            })
            .await
            .unwrap();
        let bob = SqliteStylistRepository::new(pool.clone())
            .create(NewStylist {
                name: "Bob".to_owned(),
                phone_number: "555-0102".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut services = SqliteServiceRepository::new(pool.clone());
        let haircut = services
            .create(NewService {
                service_type: "Haircut".to_owned(),
                description: "Wash, cut and style".to_owned(),
                duration: Duration::minutes(45),
                price: Price::new(Decimal::from(35)).unwrap(),
            })
            .await
            .unwrap();
        Salon {
            appointments: SqliteAppointmentRepository::new(pool),
            services,
            alice,
            bob,
            haircut,
        }
    }

    #[tokio::test]
    async fn test_booking_scenario() {
        let Salon {
            mut appointments,
            alice,
            bob,
            haircut,
            ..
        } = salon().await;

        // Alice が Bob にカットを予約
        let mut appointment = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(10, 10))
            .await
            .unwrap();
        assert_eq!(appointment.status(), AppointmentStatus::Pending);
        assert_eq!(
            appointments.find_by_id(appointment.id()).await.unwrap(),
            Some(appointment.clone())
        );

        // Bob が確定
        assert!(bob
            .confirm_appointment(&mut appointments, &mut appointment)
            .await
            .unwrap());
        assert_eq!(
            appointments
                .find_by_id(appointment.id())
                .await
                .unwrap()
                .map(|a| a.status()),
            Some(AppointmentStatus::Confirmed)
        );

        // Alice が日時を変更すると保留に戻る
        alice
            .reschedule_appointment(&mut appointments, &mut appointment, at(11, 11))
            .await
            .unwrap();
        let stored = appointments
            .find_by_id(appointment.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.appointment_datetime(), at(11, 11));
        assert_eq!(stored.status(), AppointmentStatus::Pending);
        assert_eq!(alice.view_appointments(&appointments).await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn test_cancel_twice() {
        let Salon {
            mut appointments,
            alice,
            bob,
            haircut,
            ..
        } = salon().await;
        let mut appointment = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(10, 10))
            .await
            .unwrap();
        for _ in 0..2 {
            alice
                .cancel_appointment(&mut appointments, &mut appointment)
                .await
                .unwrap();
            assert_eq!(
                appointments
                    .find_by_id(appointment.id())
                    .await
                    .unwrap()
                    .map(|a| a.status()),
                Some(AppointmentStatus::Canceled)
            );
        }
    }

    #[tokio::test]
    async fn test_modify_service() {
        let Salon {
            mut appointments,
            mut services,
            alice,
            bob,
            haircut,
        } = salon().await;
        let color = services
            .create(NewService {
                service_type: "Color".to_owned(),
                description: "Full color".to_owned(),
                duration: Duration::minutes(90),
                price: Price::new(Decimal::from(120)).unwrap(),
            })
            .await
            .unwrap();
        let mut appointment = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(10, 10))
            .await
            .unwrap();
        appointment
            .modify_service(&mut appointments, &color)
            .await
            .unwrap();

        let detail = appointments
            .find_detail_by_id(appointment.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.appointment.service_id(), color.id());
        assert_eq!(detail.service_type, "Color");
        assert_eq!(detail.to_string(), "2024-01-10 10:00:00+00:00 - Alice with Bob");
    }

    #[tokio::test]
    async fn test_find_all_details() {
        let Salon {
            mut appointments,
            alice,
            bob,
            haircut,
            ..
        } = salon().await;
        assert!(appointments.find_all_details().await.unwrap().is_empty());

        let first = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(10, 10))
            .await
            .unwrap();
        let second = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(12, 15))
            .await
            .unwrap();

        let details = appointments.find_all_details().await.unwrap();
        assert_eq!(
            details.iter().map(|d| d.appointment.clone()).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert_eq!(
            details.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "2024-01-10 10:00:00+00:00 - Alice with Bob",
                "2024-01-12 15:00:00+00:00 - Alice with Bob",
            ]
        );
        assert!(details.iter().all(|d| d.service_type == "Haircut"));
    }

    #[tokio::test]
    async fn test_booking_unknown_stylist() {
        let Salon {
            mut appointments,
            alice,
            haircut,
            ..
        } = salon().await;
        let ghost = Stylist::new(StylistId::from(404), "Ghost".to_owned(), "0".to_owned(), None, None);
        let error = alice
            .book_appointment(&mut appointments, &ghost, &haircut, at(10, 10))
            .await
            .unwrap_err();
        assert!(matches!(error, DataAccessError::WriteError(_)), "{error}");
        assert!(appointments.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let Salon {
            mut appointments,
            alice,
            bob,
            haircut,
            ..
        } = salon().await;
        let appointment = alice
            .book_appointment(&mut appointments, &bob, &haircut, at(10, 10))
            .await
            .unwrap();
        assert!(appointments.delete(&appointment).await.unwrap());
        assert!(!appointments.save(&appointment).await.unwrap());
        assert_eq!(appointments.find_detail_by_id(appointment.id()).await.unwrap(), None);
        assert_eq!(
            appointments.find_by_id(AppointmentId::from(999)).await.unwrap(),
            None
        );
    }
}
