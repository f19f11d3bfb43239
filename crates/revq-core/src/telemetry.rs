//! Centralised tracing initialisation for revq binaries.
//!
//! Call [`init_tracing`] once at program start. Safe to call more than
//! once — the global subscriber can only be set once per process, and
//! later calls are silently ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default filter directives when `RUST_LOG` is not set: the requested
/// level for revq's own crates, with the embedded store and HTTP stack
/// capped at `warn` so their connection chatter stays out of job logs.
fn default_directives(level: Level) -> String {
    format!(
        "{},surrealdb=warn,surrealdb_core=warn,hyper=warn,reqwest=warn",
        level.as_str().to_lowercase()
    )
}

/// Initialise the global tracing subscriber.
///
/// * `json` — when `true`, emit newline-delimited JSON log lines.
/// * `level` — default verbosity when `RUST_LOG` is not set.
///
/// An explicit `RUST_LOG` wins outright, including over the dependency
/// caps from [`default_directives`].
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let fmt_layer = if json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();
}
