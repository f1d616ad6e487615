use std::io::IsTerminal;
use std::str::FromStr;

use anyhow::Context;
use hive_compiler_config::log::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let directives = config.env_filter_str();
    let filter = EnvFilter::from_str(&directives)
        .with_context(|| format!("invalid log filter {}", directives))?;
    let timer = UtcTime::rfc_3339();
    let is_terminal = std::io::stderr().is_terminal();
    let registry = tracing_subscriber::registry();

    match config.format {
        LogFormat::PrettyTree => registry
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_writer(std::io::stderr)
                    .with_ansi(is_terminal)
                    .with_bracketed_fields(true)
                    .with_deferred_spans(false)
                    .with_wraparound(25)
                    .with_indent_lines(true)
                    .with_timer(tracing_tree::time::Uptime::default())
                    .with_thread_names(false)
                    .with_thread_ids(false)
                    .with_targets(false),
            )
            .with(filter)
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_timer(timer),
            )
            .with(filter)
            .init(),
        LogFormat::PrettyCompact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_ansi(is_terminal)
                    .with_timer(timer)
                    .with_target(false),
            )
            .with(filter)
            .init(),
    };

    Ok(())
}
