//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

use crate::SessionCookie;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: Server,

    /// Service configuration.
    #[serde(default)]
    pub service: Service,

    /// Session cookie configuration.
    #[serde(default)]
    pub cookie: Cookie,

    /// Postgres configuration.
    #[serde(default)]
    pub postgres: Postgres,

    /// Log configuration.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret signing session tokens.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(Self::DEFAULT_JWT_SECRET.to_owned())]
    pub jwt_secret: String,

    /// Lifetime of a session.
    #[default(time::Duration::from_secs(60 * 60 * 24 * 30))]
    #[serde(with = "humantime_serde")]
    pub session_lifetime: time::Duration,

    /// [`bcrypt`] cost of hashing passwords.
    ///
    /// [`bcrypt`]: https://wikipedia.org/wiki/Bcrypt
    #[default(12)]
    pub password_hash_cost: u32,
}

impl Service {
    /// Placeholder [`Service::jwt_secret`] used when none is configured.
    pub const DEFAULT_JWT_SECRET: &'static str = "secret";

    /// Indicates whether the [`Service::jwt_secret`] is left at the publicly
    /// known [`Service::DEFAULT_JWT_SECRET`], so anyone may forge sessions.
    #[must_use]
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == Self::DEFAULT_JWT_SECRET
    }
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            session_lifetime,
            password_hash_cost,
        } = value;
        Self {
            session_lifetime,
            password_hash_cost,
            ..Self::with_secret(jwt_secret)
        }
    }
}

/// Session cookie configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cookie {
    /// Name of the cookie.
    #[default("RJ_session".to_owned())]
    pub name: String,

    /// Indicator whether the cookie is sent over HTTPS only.
    pub secure: bool,
}

impl From<Cookie> for SessionCookie {
    fn from(value: Cookie) -> Self {
        let Cookie { name, secure } = value;
        Self { name, secure }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn defaults_without_file() {
        let Config {
            server,
            service,
            cookie,
            postgres,
            log: _,
        } = Config::new("does-not-exist.toml").unwrap();

        assert_eq!(server.port, 8080);
        assert_eq!(service.session_lifetime, Duration::from_secs(2_592_000));
        assert_eq!(service.password_hash_cost, 12);
        assert_eq!(cookie.name, "RJ_session");
        assert!(!cookie.secure);
        assert_eq!(postgres.dbname, "postgres");
    }

    #[test]
    fn converts_service_config() {
        let conf = service::Config::from(super::Service {
            session_lifetime: Duration::from_secs(60),
            ..super::Service::default()
        });

        assert_eq!(conf.session_lifetime, Duration::from_secs(60));
        assert_eq!(conf.password_hash_cost, 12);
    }

    #[test]
    fn detects_default_jwt_secret() {
        assert!(super::Service::default().uses_default_jwt_secret());
        assert!(!super::Service {
            jwt_secret: "d0n't-t3ll".to_owned(),
            ..super::Service::default()
        }
        .uses_default_jwt_secret());
    }
}
