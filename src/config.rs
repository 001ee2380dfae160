use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::chat::ChatError;
use crate::constants::{DEFAULT_CHAT_URL, DEFAULT_LOG_FILE};

/// Connection settings for the chat backend, shared by every subcommand.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct ChatConfig {
    #[arg(
        long,
        env = "CHAT_ENDPOINT",
        default_value = DEFAULT_CHAT_URL,
        help = "Absolute URL of the chat endpoint."
    )]
    pub endpoint: String,

    #[arg(
        long,
        env = "CHAT_USER_ID",
        help = "Optional user id sent along with every message."
    )]
    pub user_id: Option<String>,

    #[arg(
        long = "timeout",
        env = "CHAT_TIMEOUT_SECS",
        value_parser = parse_timeout,
        help = "Request timeout in seconds. Requests never time out when unset."
    )]
    pub timeout: Option<Duration>,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct LogArgs {
    #[arg(
        long,
        env = "CHAT_LOG_FILE",
        default_value = DEFAULT_LOG_FILE,
        help = "File that receives the session log."
    )]
    pub log_file: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_URL.to_string(),
            user_id: None,
            timeout: None,
        }
    }
}

impl ChatConfig {
    pub fn endpoint_url(&self) -> Result<Url, ChatError> {
        let url = Url::parse(&self.endpoint).map_err(|source| ChatError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: source.to_string(),
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }
        Ok(url)
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: u64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of seconds", value))?;
    if secs == 0 {
        return Err("timeout must be at least one second".to_string());
    }
    Ok(Duration::from_secs(secs))
}
