//! Tracing setup for the sandbox binaries.
//!
//! Logs go to stderr so that command output on stdout (setup transcripts,
//! JSON reports) stays machine-readable. Only the first call installs a
//! subscriber.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP stack crates that are noisy below `warn`.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

/// Default filter directives for `level`, used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let mut directives = level.as_str().to_lowercase();
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
