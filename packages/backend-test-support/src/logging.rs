//! Test logging bootstrap shared by unit tests and integration test binaries.
//!
//! Engine tests spawn room drivers on the tokio runtime, so log lines from
//! several rooms can interleave. Each line carries the `room_id` field and the
//! event target, which is enough to untangle a failing run.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "warn";

/// Install the test subscriber once.
///
/// Filter precedence: `TEST_LOG`, then `RUST_LOG`, then `warn`.
/// `TEST_LOG_JSON=1` switches to JSON lines, matching the binary's output.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Same as [`init`] with a caller-chosen fallback filter.
pub fn init_with_default(default_filter: &str) {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let json = std::env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1");

        let builder = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time();

        // try_init: another harness may already own the global subscriber
        if json {
            builder.json().try_init().ok();
        } else {
            builder.with_target(true).try_init().ok();
        }
    });
}
