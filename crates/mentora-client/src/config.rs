use std::time::Duration;

/// 10 MiB, matching the storage collaborator's upload cap.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Signed URLs are issued with a one-hour lifetime.
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
/// Pending entries without confirmation surface as failed after this.
const DEFAULT_PENDING_TIMEOUT_SECS: u64 = 15;
/// Heuristic reconciliation window for matching optimistic entries.
const DEFAULT_RECONCILE_WINDOW_SECS: u64 = 30;
/// Directory/history polling cadence.
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Client configuration, read from `MENTORA_*` env vars with defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_upload_bytes: u64,
    pub signed_url_ttl: Duration,
    pub pending_timeout: Duration,
    pub reconcile_window: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        // Load .env if present
        let _ = dotenvy::dotenv();

        let base_url =
            std::env::var("MENTORA_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        Self {
            base_url,
            max_upload_bytes: env_u64("MENTORA_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            signed_url_ttl: Duration::from_secs(env_u64(
                "MENTORA_SIGNED_URL_TTL_SECS",
                DEFAULT_SIGNED_URL_TTL_SECS,
            )),
            pending_timeout: Duration::from_secs(env_u64(
                "MENTORA_PENDING_TIMEOUT_SECS",
                DEFAULT_PENDING_TIMEOUT_SECS,
            )),
            reconcile_window: Duration::from_secs(env_u64(
                "MENTORA_RECONCILE_WINDOW_SECS",
                DEFAULT_RECONCILE_WINDOW_SECS,
            )),
            poll_interval: Duration::from_millis(env_u64(
                "MENTORA_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
            pending_timeout: Duration::from_secs(DEFAULT_PENDING_TIMEOUT_SECS),
            reconcile_window: Duration::from_secs(DEFAULT_RECONCILE_WINDOW_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
