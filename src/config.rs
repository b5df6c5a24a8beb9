//! Connection configuration, as stored in the node's credentials.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the native client library is loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientLibrary {
    /// System default search path
    #[default]
    Default,
    Custom {
        #[serde(rename = "customPath")]
        path: PathBuf,
    },
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub sid: String,
    /// Database name; for the bundled SQLite backend, the database file path
    pub database: String,
    pub user: String,
    pub password: String,
    /// Connect timeout in milliseconds
    pub connect_timeout: u64,
    /// Request timeout in milliseconds
    pub request_timeout: u64,
    pub ssl: bool,
    pub client_library: ClientLibrary,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.2".to_string(),
            port: 1521,
            sid: "WINT".to_string(),
            database: String::new(),
            user: "system".to_string(),
            password: String::new(),
            connect_timeout: 15_000,
            request_timeout: 15_000,
            ssl: false,
            client_library: ClientLibrary::Default,
        }
    }
}

impl ConnectionConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout = timeout_ms;
        self
    }

    pub fn with_client_library(mut self, library: ClientLibrary) -> Self {
        self.client_library = library;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be greater than 0".to_string()));
        }
        if self.connect_timeout == 0 || self.request_timeout == 0 {
            return Err(Error::Config("timeouts must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("ssl", &self.ssl)
            .field("client_library", &self.client_library)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_credential_form() {
        let config = ConnectionConfig::default();
        assert_eq!(config.port, 1521);
        assert_eq!(config.sid, "WINT");
        assert_eq!(config.connect_timeout(), Duration::from_millis(15_000));
    }

    #[test]
    fn parses_camel_case_json() {
        let config = ConnectionConfig::from_json_str(
            r#"{"host":"db","port":1522,"requestTimeout":500,
                "clientLibrary":{"type":"custom","customPath":"/opt/client"}}"#,
        )
        .unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.user, "system");
        assert_eq!(
            config.client_library,
            ClientLibrary::Custom {
                path: PathBuf::from("/opt/client")
            }
        );
    }

    #[test]
    fn builders_override_defaults() {
        let config = ConnectionConfig::new("app.db")
            .with_request_timeout_ms(250)
            .with_client_library(ClientLibrary::Custom {
                path: PathBuf::from("lib"),
            });
        assert_eq!(config.database, "app.db");
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.connect_timeout(), Duration::from_millis(15_000));
        assert!(matches!(config.client_library, ClientLibrary::Custom { .. }));
        assert!(config.validate().is_ok());
        assert!(config.with_request_timeout_ms(0).validate().is_err());
    }

    #[test]
    fn zero_port_is_invalid() {
        assert!(ConnectionConfig::from_json_str(r#"{"port":0}"#).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let mut config = ConnectionConfig::default();
        config.password = "hunter2".to_string();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
