//! Log output of the `irida-uploader` binary.
//!
//! Results are printed on stdout (plain or `--json`), so every log line goes
//! to stderr. `--verbose` raises the uploader's own crates to DEBUG while the
//! HTTP stack stays at WARN; a multi-gigabyte FASTQ transfer would otherwise
//! bury the run's lifecycle events under connection chatter.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose logs are capped at WARN unless `RUST_LOG` says otherwise.
const QUIET_CRATES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter used when `RUST_LOG` is unset.
fn default_directives(level: Level) -> String {
    let mut directives = level.as_str().to_ascii_lowercase();
    for krate in QUIET_CRATES {
        directives.push_str(&format!(",{krate}=warn"));
    }
    directives
}

/// Install the global subscriber; later calls are no-ops.
///
/// `json` switches to newline-delimited JSON for log shippers watching
/// unattended batch uploads.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry.with(stderr.json()).try_init()
    } else {
        registry.with(stderr).try_init()
    };
    result.ok();
}
