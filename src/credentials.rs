//! Credential check: open and close a connection without running anything.

use serde::Serialize;

use crate::config::ConnectionConfig;
use crate::executor::Connector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTestResult {
    pub status: TestStatus,
    pub message: String,
}

pub async fn test_connection(
    connector: &dyn Connector,
    config: &ConnectionConfig,
) -> ConnectionTestResult {
    let checked = match connector.connect(config).await {
        Ok(conn) => conn.close().await,
        Err(e) => Err(e),
    };
    match checked {
        Ok(()) => ConnectionTestResult {
            status: TestStatus::Ok,
            message: "Connection successful!".to_string(),
        },
        Err(e) => ConnectionTestResult {
            status: TestStatus::Error,
            message: e.to_string(),
        },
    }
}
