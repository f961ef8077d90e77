use clap::Parser;
use tracing::Level;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_PORT: u16 = 6379;

/// Server configuration, read from the command line with environment variable fallbacks.
#[derive(Parser, Debug, Clone)]
#[command(name = "redust", version, about = "An in-memory data server speaking RESP")]
pub struct Config {
    /// The address to listen on
    #[arg(long, env = "REDUST_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// The port to listen on
    #[arg(short, long, env = "REDUST_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Largest request, in bytes, a client may have buffered before it is disconnected
    #[arg(long, env = "REDUST_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Most verbose level logs are emitted at (trace, debug, info, warn, error)
    #[arg(long, env = "REDUST_LOG", default_value = "info")]
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            log_level: Level::INFO,
        }
    }
}
