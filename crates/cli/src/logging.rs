use blocktime_core::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_directives(level: &str) -> String {
    format!("warn,blocktime_core={level},blocktime={level}")
}

/// Builds the filter: `RUST_LOG=debug|trace` raise our crates only, any other
/// `RUST_LOG` is used verbatim, and without it `logging.level` applies.
fn build_filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        Some(level @ ("debug" | "trace")) => EnvFilter::new(default_directives(level)),
        Some(directives) => EnvFilter::try_new(directives)
            .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level))),
        None => EnvFilter::new(default_directives(&config.level)),
    }
}

/// Installs the global subscriber. Logs go to stderr; stdout carries results.
pub fn init_logging(config: &LoggingConfig) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let registry = tracing_subscriber::registry().with(build_filter(config, rust_log.as_deref()));

    if config.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        // "pretty" and any other format default to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}
