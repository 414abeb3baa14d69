//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `BAWASA__*` environment
//! variables, e.g. `BAWASA__SERVER__PORT=8080`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Overrides of the default billing policy. Missing keys keep the default.
#[derive(Debug, Default, Deserialize)]
pub struct Billing {
    pub rate_minor_per_m3: Option<i64>,
    pub tier_threshold_m3: Option<i64>,
    pub due_days: Option<u32>,
}

impl Billing {
    pub fn policy(&self) -> engine::BillingPolicy {
        let defaults = engine::BillingPolicy::default();
        engine::BillingPolicy {
            rate_minor_per_m3: self.rate_minor_per_m3.unwrap_or(defaults.rate_minor_per_m3),
            tier_threshold_m3: self.tier_threshold_m3.unwrap_or(defaults.tier_threshold_m3),
            due_days: self.due_days.unwrap_or(defaults.due_days),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub billing: Billing,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("BAWASA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_file_parses() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "bawasa.db" }

            [billing]
            due_days = 30
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "bawasa.db"));

        let policy = settings.billing.policy();
        assert_eq!(policy.due_days, 30);
        assert_eq!(policy.rate_minor_per_m3, 3_000);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert_eq!(settings.billing.policy(), engine::BillingPolicy::default());
    }

    #[test]
    fn memory_database_is_a_plain_string() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"
            "#,
        );
        assert!(matches!(settings.server.unwrap().database, Database::Memory));
    }
}
