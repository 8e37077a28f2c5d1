use clap::Parser;
use proofperks::cli::Cli;
use proofperks::config::{AppConfig, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.command.is_long_running() {
        let logging = AppConfig::load_from(&cli.config_dir)
            .map(|c| c.logging)
            .unwrap_or_default();
        init_logging(&logging);
    } else {
        init_logging_simple();
    }

    cli.run().await
}

fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let level = if logging.level.is_empty() {
        "info"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},proofperks=debug")));

    // `tracing_appender::rolling::daily` panics if it can't create the initial log
    // file, so only enable the file layer for a writable PERKS_LOG_DIR.
    let log_dir = std::env::var("PERKS_LOG_DIR").ok();
    let file_layer = log_dir.as_deref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory {dir} ({e}), file logging disabled");
            return None;
        }
        let probe = std::path::Path::new(dir).join(".perks_write_test");
        match std::fs::OpenOptions::new().create(true).append(true).open(&probe) {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
                let file_appender = tracing_appender::rolling::daily(dir, "proofperks.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the life of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not write to log directory {dir} ({e}), file logging disabled");
                None
            }
        }
    });

    let (console_layer, json_layer) = if logging.json {
        (None, Some(tracing_subscriber::fmt::layer().json().with_target(true)))
    } else {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
            None,
        )
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir.filter(|_| file_logging_enabled) {
        eprintln!("Logging to: {dir}/proofperks.log");
    }
}

fn init_logging_simple() {
    // Minimal logging for CLI commands
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
