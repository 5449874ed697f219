use std::fmt;

use async_trait::async_trait;
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{DataAccessError, Entity, Id};

use super::{Appointment, AppointmentRepository, AppointmentStatus};

/// スタイリストリポジトリ
#[async_trait]
pub trait StylistRepository: Send {
    async fn create(&mut self, new: NewStylist) -> Result<Stylist, DataAccessError>;
    async fn find_by_id(&self, id: StylistId) -> Result<Option<Stylist>, DataAccessError>;
    async fn find_all(&self) -> Result<Vec<Stylist>, DataAccessError>;
    async fn save(&mut self, entity: &Stylist) -> Result<bool, DataAccessError>;
    /// スタイリストを削除する (担当予約も連鎖削除される)
    async fn delete(&mut self, entity: &Stylist) -> Result<bool, DataAccessError>;
}

/// スタイリストID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
    Deref, Default,
)]
pub struct StylistId(i64);

impl Id for StylistId {
    type Inner = i64;
}

/// 未登録のスタイリスト
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewStylist {
    pub name: String,
    pub phone_number: String,
    pub social_media: Option<String>,
    /// ポートフォリオ画像の参照
    pub portfolio: Option<String>,
}

/// スタイリストエンティティ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stylist {
    id: StylistId,
    name: String,
    phone_number: String,
    social_media: Option<String>,
    portfolio: Option<String>,
}

impl Stylist {
    pub fn new(
        id: StylistId,
        name: String,
        phone_number: String,
        social_media: Option<String>,
        portfolio: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            phone_number,
            social_media,
            portfolio,
        }
    }

    pub fn from_new(id: StylistId, new: NewStylist) -> Self {
        Self::new(id, new.name, new.phone_number, new.social_media, new.portfolio)
    }

    /// 予約を確定する
    ///
    /// 予約の状態は問わない。保存に成功すれば常に`true`を返す。
    pub async fn confirm_appointment<R>(
        &self,
        repository: &mut R,
        appointment: &mut Appointment,
    ) -> Result<bool, DataAccessError>
    where
        R: AppointmentRepository + ?Sized,
    {
        appointment.set_status(AppointmentStatus::Confirmed);
        appointment.save(repository).await?;
        info!(
            "予約を確定しました: appointment={} stylist={}",
            appointment.id(),
            self.id
        );
        Ok(true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn social_media(&self) -> Option<&str> {
        self.social_media.as_deref()
    }

    pub fn portfolio(&self) -> Option<&str> {
        self.portfolio.as_deref()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_phone_number(&mut self, phone_number: String) {
        self.phone_number = phone_number;
    }

    pub fn set_social_media(&mut self, social_media: Option<String>) {
        self.social_media = social_media;
    }

    pub fn set_portfolio(&mut self, portfolio: Option<String>) {
        self.portfolio = portfolio;
    }
}

impl Entity for Stylist {
    type Id = StylistId;

    const ENTITY_NAME: &'static str = "stylist";

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl fmt::Display for Stylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
