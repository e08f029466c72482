// src/log.rs
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "menu_scrape=info",
        1 => "menu_scrape=debug",
        _ => "menu_scrape=trace",
    }
}

/// Install the global subscriber: human-readable lines on stderr, plus an
/// append-only copy in `log_file` when given. `RUST_LOG` wins over `verbosity`.
///
/// Calling this twice is harmless; the second call keeps the first subscriber.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_target(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .try_init();
    Ok(())
}
