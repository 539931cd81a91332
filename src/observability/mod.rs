//! 可观测性

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG 优先；未设置或无法解析时使用配置中的 log_level
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
