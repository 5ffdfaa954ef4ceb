use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime settings, read once at startup. Every knob has a default so the
/// tracker works out of the box; `.env` files are honoured via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the JSON store files.
    pub data_dir: PathBuf,
    /// Bind address for `spendwise server`.
    pub listen: SocketAddr,
    pub assist: AssistConfig,
}

#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// OpenAI-compatible API root, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = env::var("SPENDWISE_DATA_DIR")
            .unwrap_or_else(|_| "./.spendwise".to_string())
            .into();

        let listen = env::var("SPENDWISE_LISTEN")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let assist = AssistConfig {
            base_url: env::var("SPENDWISE_ASSIST_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("SPENDWISE_ASSIST_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            timeout_secs: env::var("SPENDWISE_ASSIST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        };

        Self { data_dir, listen, assist }
    }
}
