use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn filter(verbose: bool) -> EnvFilter {
    std::env::var("LAPWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        )
}

/// Send logs to `log_path`; the terminal belongs to the UI.
///
/// When the file cannot be opened logging is silently disabled. Calling this
/// more than once keeps the first subscriber.
pub fn init_logging(log_path: Option<&Path>, verbose: bool) {
    let file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let Some(file) = file else {
        return;
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
