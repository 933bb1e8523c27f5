//! Shared HTTP client construction

use std::time::Duration;

/// User agent sent with every outbound request
pub const USER_AGENT: &str = concat!("panel/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for catalog and discovery requests
///
/// Every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("panel/"));
        assert!(USER_AGENT.len() > "panel/".len());
    }
}
