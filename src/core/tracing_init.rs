use crate::core::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dependencies that are chatty at debug level
const QUIET_TARGETS: &[&str] = &["hyper_util=warn", "reqwest=info", "h2=warn"];

fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|t| t.to_string()));
    directives.join(",")
}

pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level)));

    let use_console = config.console || config.format == "console";

    if use_console {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init();
    }
}
