use std::fmt;

use async_trait::async_trait;
use chrono::Duration;
use derive_more::{Deref, Display, From};
use num_format::{Locale, ToFormattedString};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use thiserror::Error;

use crate::domain::{DataAccessError, Entity, Id};

/// サービスリポジトリ
#[async_trait]
pub trait ServiceRepository: Send {
    /// サービスを登録する
    async fn create(&mut self, new: NewService) -> Result<Service, DataAccessError>;
    /// IDでサービスを検索する
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, DataAccessError>;
    /// 全てのサービスを取得する
    async fn find_all(&self) -> Result<Vec<Service>, DataAccessError>;
    /// サービスを保存する
    async fn save(&mut self, entity: &Service) -> Result<bool, DataAccessError>;
    /// サービスを削除する (予約も連鎖削除される)
    async fn delete(&mut self, entity: &Service) -> Result<bool, DataAccessError>;
}

/// サービスID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
    Deref, Default,
)]
pub struct ServiceId(i64);

impl Id for ServiceId {
    type Inner = i64;
}

/// 料金 (DECIMAL(6,2))
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const MAX_DIGITS: u32 = 6;
    pub const DECIMAL_PLACES: u32 = 2;

    /// 小数第2位に丸める。桁あふれはエラー
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let mut amount = amount.round_dp(Self::DECIMAL_PLACES);
        amount.rescale(Self::DECIMAL_PLACES);
        let limit = Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::DECIMAL_PLACES));
        if amount.abs() >= limit {
            return Err(PriceError::TooManyDigits(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0.is_sign_negative() && !self.0.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = self.0.abs();
        let units = abs.trunc().to_i64().unwrap_or_default();
        let cents = (abs.fract() * Decimal::ONE_HUNDRED).to_u32().unwrap_or_default();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            units.to_formatted_string(&Locale::en),
            cents
        )
    }
}

/// 料金エラー
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price {0} does not fit in {} digits", Price::MAX_DIGITS)]
    TooManyDigits(Decimal),
}

/// 未登録のサービス
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub service_type: String,
    pub description: String,
    #[serde_as(as = "DurationSeconds<i64>")]
    pub duration: Duration,
    pub price: Price,
}

/// サービスエンティティ
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    service_type: String,
    description: String,
    #[serde_as(as = "DurationSeconds<i64>")]
    duration: Duration,
    price: Price,
}

impl Service {
    pub fn new(
        id: ServiceId,
        service_type: String,
        description: String,
        duration: Duration,
        price: Price,
    ) -> Self {
        Self {
            id,
            service_type,
            description,
            duration,
            price,
        }
    }

    pub fn from_new(id: ServiceId, new: NewService) -> Self {
        Self::new(id, new.service_type, new.description, new.duration, new.price)
    }

    /// 登録されている全てのサービス
    pub async fn list_services<R>(repository: &R) -> Result<Vec<Service>, DataAccessError>
    where
        R: ServiceRepository + Sync + ?Sized,
    {
        repository.find_all().await
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn set_service_type(&mut self, service_type: String) {
        self.service_type = service_type;
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn set_price(&mut self, price: Price) {
        self.price = price;
    }
}

impl Entity for Service {
    type Id = ServiceId;

    const ENTITY_NAME: &'static str = "service";

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.service_type)
    }
}
