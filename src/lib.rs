use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, FileFormat};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct SalonConfig {
    pub database: Database,
    pub logger: Logger,
}

impl SalonConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(
            Config::builder().add_source(config::File::with_name("salon.toml")),
            Self::environment(),
        )
    }

    /// TOML文字列から設定を読み込む (環境変数も反映される)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Self::toml_source(toml), Self::environment())
    }

    /// `SALON_DATABASE__URL` のように `__` で入れ子を表す
    fn environment() -> Environment {
        Environment::with_prefix("SALON")
            .prefix_separator("_")
            .separator("__")
    }

    fn toml_source(toml: &str) -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml))
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        builder
            .add_source(environment)
            .build()?
            .try_deserialize::<SalonConfig>()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default = "Database::default_max_connections")]
    pub max_connections: u32,
}

impl Database {
    fn default_max_connections() -> u32 {
        5
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}
