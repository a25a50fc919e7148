use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v21.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint settings, loaded once at startup and handed to
/// every client by value. Nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub access_token: String,
    pub account_id: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(access_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: account_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `.env` (if present) and the process environment.
    ///
    /// Missing credentials are not rejected here: the Graph API answers
    /// with an authentication error and the client reports that as "no data".
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let access_token = std::env::var("ACCESS_TOKEN").unwrap_or_default();
        let account_id = std::env::var("ACCOUNT_ID").unwrap_or_default();

        if access_token.is_empty() {
            tracing::warn!("ACCESS_TOKEN is not set; API calls will be rejected");
        }
        if account_id.is_empty() {
            tracing::warn!("ACCOUNT_ID is not set; campaign lookups will fail");
        }

        let timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            access_token,
            account_id,
            base_url: std::env::var("GRAPH_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_version: std::env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Versioned root every endpoint path hangs off, e.g. `https://graph.facebook.com/v21.0`.
    pub fn versioned_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.versioned_url(), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_version_and_path() {
        let config = ApiConfig::new("token", "act_1");
        assert_eq!(
            config.endpoint("123/insights"),
            "https://graph.facebook.com/v21.0/123/insights"
        );
    }

    #[test]
    fn test_endpoint_tolerates_extra_slashes() {
        let config = ApiConfig::new("token", "act_1").with_base_url("http://localhost:8080/");
        assert_eq!(
            config.endpoint("/act_1/campaigns"),
            "http://localhost:8080/v21.0/act_1/campaigns"
        );
    }
}
