//! Connection configuration.
//!
//! A [`ConnectionConfig`] can be built three ways:
//!
//! - in code, starting from [`ConnectionConfig::default`] and chaining setters;
//! - from an untyped string-keyed map ([`ConnectionConfig::from_map`]), the shape
//!   application config loaders usually hand over;
//! - from a section of a TOML settings file ([`ConnectionConfig::from_toml_str`] /
//!   [`ConnectionConfig::from_file`]).
//!
//! Every path ends in [`ConnectionConfig::validate`], so an invalid port or pool
//! size never reaches the driver.

use crate::error::{OrmError, OrmResult};
use mysql_async::{Opts, OptsBuilder, PoolConstraints, PoolOpts};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// Upper bound on pool size used when `max_open_conns` is 0 ("unlimited").
const UNLIMITED_OPEN_CONNS: usize = 1024;

/// Database driver kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    #[default]
    Mysql,
}

impl DriverKind {
    pub fn parse(name: &str) -> OrmResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            other => Err(OrmError::config(format!("unsupported driver type: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
        }
    }
}

/// Settings for one database connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub driver: DriverKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database (schema) name. Empty means none is selected on connect.
    pub database: String,
    /// Maximum open connections, 0 = unlimited.
    pub max_open_conns: usize,
    pub max_idle_conns: usize,
    pub conn_max_lifetime: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Mysql,
            host: "127.0.0.1".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: String::new(),
            database: String::new(),
            max_open_conns: 4,
            max_idle_conns: 4,
            conn_max_lifetime: Duration::from_secs(600),
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn max_open_conns(mut self, n: usize) -> Self {
        self.max_open_conns = n;
        self
    }

    pub fn max_idle_conns(mut self, n: usize) -> Self {
        self.max_idle_conns = n;
        self
    }

    pub fn conn_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.conn_max_lifetime = lifetime;
        self
    }

    /// Parse a string-keyed map into a validated configuration.
    ///
    /// Recognized keys: `driver`, `host`, `port`, `username`, `password`, `name`,
    /// `maxOpenConns`, `maxIdleConns`, `connMaxLifetime`. Missing keys keep their
    /// defaults, unknown keys are ignored. A key with the wrong type fails with
    /// [`OrmError::ConfigInvalid`] naming that key.
    ///
    /// `connMaxLifetime` accepts an integer number of seconds or a duration
    /// string such as `"90s"`, `"10m"` or `"1h30m"`.
    pub fn from_map(map: &Map<String, Value>) -> OrmResult<Self> {
        let mut config = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "driver" => config.driver = DriverKind::parse(expect_str(key, value)?)?,
                "host" => config.host = expect_str(key, value)?.to_string(),
                "port" => {
                    let port = expect_int(key, value)?;
                    config.port = check_port(port)?;
                }
                "username" => config.username = expect_str(key, value)?.to_string(),
                "password" => config.password = expect_str(key, value)?.to_string(),
                "name" => config.database = expect_str(key, value)?.to_string(),
                "maxOpenConns" => config.max_open_conns = expect_count(key, value)?,
                "maxIdleConns" => config.max_idle_conns = expect_count(key, value)?,
                "connMaxLifetime" => config.conn_max_lifetime = expect_duration(key, value)?,
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse one `[section]` of a TOML settings file.
    ///
    /// The section must carry `host`, `port`, `username`, `password` and `name`;
    /// pool keys are optional.
    ///
    /// ```toml
    /// [main]
    /// host = "127.0.0.1"
    /// port = 3306
    /// username = "app"
    /// password = "secret"
    /// name = "shop"
    /// maxOpenConns = 16
    /// connMaxLifetime = "5m"
    /// ```
    pub fn from_toml_str(raw: &str, section: &str) -> OrmResult<Self> {
        let table: toml::Table = toml::from_str(raw)
            .map_err(|e| OrmError::config(format!("failed to parse settings: {e}")))?;

        let section_value = table
            .get(section)
            .cloned()
            .ok_or_else(|| OrmError::config(format!("section [{section}] not found")))?;

        let file: FileSection = section_value
            .try_into()
            .map_err(|e| OrmError::config(format!("section [{section}]: {e}")))?;

        file.into_config()
    }

    /// Read a TOML settings file and parse one of its sections.
    pub fn from_file(path: impl AsRef<Path>, section: &str) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read settings file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw, section)
    }

    /// Check the invariants the pool relies on.
    pub fn validate(&self) -> OrmResult<()> {
        check_port(i64::from(self.port))?;

        if self.host.trim().is_empty() {
            return Err(OrmError::config("host must not be empty"));
        }

        if self.max_open_conns > 0 && self.max_idle_conns > self.max_open_conns {
            return Err(OrmError::config(format!(
                "maxIdleConns ({}) exceeds maxOpenConns ({})",
                self.max_idle_conns, self.max_open_conns
            )));
        }

        Ok(())
    }

    /// Driver connection options for this configuration.
    pub fn to_opts(&self) -> OrmResult<Opts> {
        self.validate()?;

        let max = match self.max_open_conns {
            0 => UNLIMITED_OPEN_CONNS,
            n => n,
        };
        let min = self.max_idle_conns.min(max);
        let constraints = PoolConstraints::new(min, max).ok_or_else(|| {
            OrmError::config(format!("invalid pool constraints: min {min}, max {max}"))
        })?;

        let mut pool_opts = PoolOpts::default().with_constraints(constraints);
        if !self.conn_max_lifetime.is_zero() {
            pool_opts = pool_opts.with_abs_conn_ttl(Some(self.conn_max_lifetime));
        }

        let database = (!self.database.is_empty()).then(|| self.database.clone());
        let password = (!self.password.is_empty()).then(|| self.password.clone());

        let builder = OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.username.clone()))
            .pass(password)
            .db_name(database)
            .pool_opts(pool_opts);

        Ok(Opts::from(builder))
    }

    /// `user@host:port/name`, without the password. Used in log lines.
    pub fn display_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// Shape of a settings-file section.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileSection {
    #[serde(default)]
    driver: Option<String>,
    host: String,
    port: i64,
    username: String,
    password: String,
    name: String,
    #[serde(default)]
    max_open_conns: Option<usize>,
    #[serde(default)]
    max_idle_conns: Option<usize>,
    #[serde(default)]
    conn_max_lifetime: Option<toml::Value>,
}

impl FileSection {
    fn into_config(self) -> OrmResult<ConnectionConfig> {
        let mut config = ConnectionConfig {
            host: self.host,
            port: check_port(self.port)?,
            username: self.username,
            password: self.password,
            database: self.name,
            ..ConnectionConfig::default()
        };

        if let Some(driver) = self.driver {
            config.driver = DriverKind::parse(&driver)?;
        }
        if let Some(n) = self.max_open_conns {
            config.max_open_conns = n;
        }
        if let Some(n) = self.max_idle_conns {
            config.max_idle_conns = n;
        }
        match self.conn_max_lifetime {
            Some(toml::Value::Integer(secs)) if secs >= 0 => {
                config.conn_max_lifetime = Duration::from_secs(secs as u64);
            }
            Some(toml::Value::String(s)) => config.conn_max_lifetime = parse_duration(&s)?,
            Some(other) => {
                return Err(OrmError::config(format!(
                    "connMaxLifetime must be seconds or a duration string, got {other}"
                )));
            }
            None => {}
        }

        config.validate()?;
        Ok(config)
    }
}

fn check_port(port: i64) -> OrmResult<u16> {
    if port <= 0 || port >= 65535 {
        return Err(OrmError::config(format!(
            "port must be between 1 and 65534, got {port}"
        )));
    }
    Ok(port as u16)
}

fn expect_str<'a>(key: &str, value: &'a Value) -> OrmResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| OrmError::config(format!("{key} must be a string, got {value}")))
}

fn expect_int(key: &str, value: &Value) -> OrmResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| OrmError::config(format!("{key} must be an integer, got {value}")))
}

fn expect_count(key: &str, value: &Value) -> OrmResult<usize> {
    let n = expect_int(key, value)?;
    usize::try_from(n).map_err(|_| OrmError::config(format!("{key} must not be negative, got {n}")))
}

fn expect_duration(key: &str, value: &Value) -> OrmResult<Duration> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(Duration::from_secs)
            .ok_or_else(|| OrmError::config(format!("{key} must be a whole number of seconds, got {n}"))),
        Value::String(s) => parse_duration(s),
        other => Err(OrmError::config(format!(
            "{key} must be seconds or a duration string, got {other}"
        ))),
    }
}

/// Parse a duration string made of `<number><unit>` pairs.
///
/// Units: `h`, `m`, `s`, `ms`, `us`, `ns`. Example: `"1h30m"`, `"250ms"`.
pub fn parse_duration(input: &str) -> OrmResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(OrmError::config("duration cannot be empty"));
    }

    let invalid = || OrmError::config(format!("invalid duration: '{input}'"));

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| OrmError::config(format!("missing unit in duration: '{input}'")))?;
        if digits == 0 {
            return Err(invalid());
        }
        let amount: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let out_of_range = || OrmError::config(format!("duration out of range: '{input}'"));
        let part = match unit {
            "h" => Duration::from_secs(amount.checked_mul(3600).ok_or_else(out_of_range)?),
            "m" => Duration::from_secs(amount.checked_mul(60).ok_or_else(out_of_range)?),
            "s" => Duration::from_secs(amount),
            "ms" => Duration::from_millis(amount),
            "us" | "µs" => Duration::from_micros(amount),
            "ns" => Duration::from_nanos(amount),
            _ => return Err(OrmError::config(format!("unknown unit '{unit}' in duration: '{input}'"))),
        };
        total = total.checked_add(part).ok_or_else(out_of_range)?;
    }

    Ok(total)
}
