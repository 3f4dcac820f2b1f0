use thiserror::Error;

impl From<serde_json::Error> for GatekeeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for GatekeeperError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for GatekeeperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportError(format!("request timed out: {}", err))
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Missing or invalid startup configuration; the process must not serve requests.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("GitHub App not installed for {owner}/{repo}")]
    InstallationNotFound { owner: String, repo: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

impl GatekeeperError {
    pub fn installation_not_found(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::InstallationNotFound {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}
