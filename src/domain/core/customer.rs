use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{DataAccessError, Entity, Id};

use super::{
    Appointment, AppointmentRepository, AppointmentStatus, NewAppointment, Service, Stylist,
};

/// お客様リポジトリ
#[async_trait]
pub trait CustomerRepository: Send {
    /// お客様を登録する (メールアドレスが重複していればエラー)
    async fn create(&mut self, new: NewCustomer) -> Result<Customer, DataAccessError>;
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError>;
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError>;
    async fn save(&mut self, entity: &Customer) -> Result<bool, DataAccessError>;
    /// お客様を削除する (予約も連鎖削除される)
    async fn delete(&mut self, entity: &Customer) -> Result<bool, DataAccessError>;
}

/// お客様ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
    Deref, Default,
)]
pub struct CustomerId(i64);

impl Id for CustomerId {
    type Inner = i64;
}

/// 未登録のお客様
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// お客様エンティティ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: String,
    phone_number: String,
}

impl Customer {
    pub fn new(id: CustomerId, name: String, email: String, phone_number: String) -> Self {
        Self {
            id,
            name,
            email,
            phone_number,
        }
    }

    pub fn from_new(id: CustomerId, new: NewCustomer) -> Self {
        Self::new(id, new.name, new.email, new.phone_number)
    }

    /// 予約する
    ///
    /// 日時の妥当性や他の予約との重複は確認しない。
    pub async fn book_appointment<R>(
        &self,
        repository: &mut R,
        stylist: &Stylist,
        service: &Service,
        datetime: DateTime<Utc>,
    ) -> Result<Appointment, DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        let appointment = repository
            .create(NewAppointment {
                service_id: service.id(),
                stylist_id: stylist.id(),
                customer_id: self.id,
                appointment_datetime: datetime,
                status: AppointmentStatus::Pending,
            })
            .await?;
        info!(
            "予約を受け付けました: appointment={} customer={} stylist={} service={}",
            appointment.id(),
            self.id,
            stylist.id(),
            service.id()
        );
        Ok(appointment)
    }

    /// このお客様の全ての予約
    pub async fn view_appointments<R>(
        &self,
        repository: &R,
    ) -> Result<Vec<Appointment>, DataAccessError>
    where
        R: AppointmentRepository + Sync + ?Sized,
    {
        repository.find_by_customer(self.id).await
    }

    /// 予約をキャンセルする
    // TODO: 他のお客様の予約もキャンセルできてしまうので所有者確認を入れる
    pub async fn cancel_appointment<R>(
        &self,
        repository: &mut R,
        appointment: &mut Appointment,
    ) -> Result<(), DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        appointment.set_status(AppointmentStatus::Canceled);
        appointment.save(repository).await?;
        info!(
            "予約をキャンセルしました: appointment={} customer={}",
            appointment.id(),
            self.id
        );
        Ok(())
    }

    /// 予約日時を変更する。状態は保留に戻る
    pub async fn reschedule_appointment<R>(
        &self,
        repository: &mut R,
        appointment: &mut Appointment,
        new_datetime: DateTime<Utc>,
    ) -> Result<(), DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        appointment.reschedule(repository, new_datetime).await?;
        appointment.set_status(AppointmentStatus::Pending);
        appointment.save(repository).await?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_email(&mut self, email: String) {
        self.email = email;
    }

    pub fn set_phone_number(&mut self, phone_number: String) {
        self.phone_number = phone_number;
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    const ENTITY_NAME: &'static str = "customer";

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
