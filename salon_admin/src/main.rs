use std::error::Error;

use salon::{
    domain::{
        core::{AppointmentRepository, Service},
        Entity,
    },
    infrastructure::{
        self,
        core::{SqliteAppointmentRepository, SqliteServiceRepository},
    },
    SalonConfig,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    match SalonConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::from(&config.logger.level))
                .init();
            if let Err(error) = run(&config).await {
                error!("アプリケーションエラー: {}", error);
                std::process::exit(1);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定の読み込みに失敗しました: {}", error);
            std::process::exit(1);
        }
    }
}

async fn run(config: &SalonConfig) -> Result<(), Box<dyn Error>> {
    let pool = infrastructure::connect(&config.database).await?;
    infrastructure::migrate(&pool).await?;
    info!("マイグレーション完了");

    let services = SqliteServiceRepository::new(pool.clone());
    let catalogue = Service::list_services(&services).await?;
    info!("登録サービス数: {}", catalogue.len());
    for service in &catalogue {
        info!(
            "#{} {} ({}分) {}",
            service.id(),
            service,
            service.duration().num_minutes(),
            service.price()
        );
    }

    let appointments = SqliteAppointmentRepository::new(pool);
    for detail in appointments.find_all_details().await? {
        info!(
            "予約 #{} [{}] {} ({})",
            detail.appointment.id(),
            detail.appointment.status(),
            detail,
            detail.service_type
        );
    }
    Ok(())
}
