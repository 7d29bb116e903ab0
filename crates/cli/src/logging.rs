// Logging - tracing subscriber setup
// Logs go to stderr so stdout only carries command output (i.e. a token)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `json` or `pretty` (default)
pub const LOG_FORMAT_ENV: &str = "SQUONK2_LOG_FORMAT";
/// Used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "squonk2=info";

pub fn init() {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
