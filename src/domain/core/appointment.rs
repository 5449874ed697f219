use std::{fmt, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{DataAccessError, Entity, Id};

use super::{CustomerId, Service, ServiceId, StylistId};

/// 予約リポジトリ
#[async_trait]
pub trait AppointmentRepository: Send {
    /// 予約を登録する
    async fn create(&mut self, new: NewAppointment) -> Result<Appointment, DataAccessError>;
    /// IDで予約を検索する
    async fn find_by_id(&self, id: AppointmentId) -> Result<Option<Appointment>, DataAccessError>;
    /// 全ての予約を取得する
    async fn find_all(&self) -> Result<Vec<Appointment>, DataAccessError>;
    /// お客様の予約を取得する
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Appointment>, DataAccessError>;
    /// お客様名・スタイリスト名付きで予約を取得する
    async fn find_detail_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<AppointmentDetail>, DataAccessError>;
    /// お客様名・スタイリスト名付きで全ての予約を取得する
    async fn find_all_details(&self) -> Result<Vec<AppointmentDetail>, DataAccessError>;
    /// 予約を保存する
    async fn save(&mut self, entity: &Appointment) -> Result<bool, DataAccessError>;
    /// 予約を削除する
    async fn delete(&mut self, entity: &Appointment) -> Result<bool, DataAccessError>;
}

/// 予約ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
    Deref, Default,
)]
pub struct AppointmentId(i64);

impl Id for AppointmentId {
    type Inner = i64;
}

/// 予約状態
///
/// 遷移の制約は無い。どの状態からどの状態へも変更できる。
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Canceled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Canceled,
    ];

    /// 保存・表示に使う文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_owned()))
    }
}

/// 予約状態の文字列が不正
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown appointment status: {0:?}")]
pub struct ParseStatusError(String);

/// 未登録の予約
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub service_id: ServiceId,
    pub stylist_id: StylistId,
    pub customer_id: CustomerId,
    pub appointment_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// 予約エンティティ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,
    service_id: ServiceId,
    stylist_id: StylistId,
    customer_id: CustomerId,
    appointment_datetime: DateTime<Utc>,
    status: AppointmentStatus,
}

impl Appointment {
    pub fn new(
        id: AppointmentId,
        service_id: ServiceId,
        stylist_id: StylistId,
        customer_id: CustomerId,
        appointment_datetime: DateTime<Utc>,
        status: AppointmentStatus,
    ) -> Self {
        Self {
            id,
            service_id,
            stylist_id,
            customer_id,
            appointment_datetime,
            status,
        }
    }

    pub fn from_new(id: AppointmentId, new: NewAppointment) -> Self {
        Self::new(
            id,
            new.service_id,
            new.stylist_id,
            new.customer_id,
            new.appointment_datetime,
            new.status,
        )
    }

    /// 日時を変更して保存する
    pub async fn reschedule<R>(
        &mut self,
        repository: &mut R,
        new_datetime: DateTime<Utc>,
    ) -> Result<(), DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        self.appointment_datetime = new_datetime;
        self.save(repository).await?;
        info!("予約日時を変更しました: appointment={} datetime={}", self.id, new_datetime);
        Ok(())
    }

    /// サービスを変更して保存する
    pub async fn modify_service<R>(
        &mut self,
        repository: &mut R,
        new_service: &Service,
    ) -> Result<(), DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        self.service_id = new_service.id();
        self.save(repository).await?;
        info!(
            "予約サービスを変更しました: appointment={} service={}",
            self.id, self.service_id
        );
        Ok(())
    }

    /// 保存する。行が既に削除されていても作り直さない
    pub(crate) async fn save<R>(&self, repository: &mut R) -> Result<bool, DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        let saved = repository.save(self).await?;
        if !saved {
            warn!("予約が見つからないため保存されませんでした: appointment={}", self.id);
        }
        Ok(saved)
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn stylist_id(&self) -> StylistId {
        self.stylist_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn appointment_datetime(&self) -> DateTime<Utc> {
        self.appointment_datetime
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn set_status(&mut self, status: AppointmentStatus) {
        self.status = status;
    }
}

impl Entity for Appointment {
    type Id = AppointmentId;

    const ENTITY_NAME: &'static str = "appointment";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 表示用の予約 (お客様名・スタイリスト名・サービス種別付き)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub customer_name: String,
    pub stylist_name: String,
    pub service_type: String,
}

impl fmt::Display for AppointmentDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} with {}",
            self.appointment.appointment_datetime.format("%Y-%m-%d %H:%M:%S%:z"),
            self.customer_name,
            self.stylist_name
        )
    }
}
