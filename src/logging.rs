use std::str::FromStr;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialize the global tracing subscriber.
///
/// `level` is a tracing env-filter directive (for example
/// `info,ledgerstream_api=debug`). Calling this more than once is a no-op
/// so the test harness can share a process with the binary entrypoint.
pub fn init(level: &str, json: bool) -> Result<()> {
    INITIALIZED.get_or_try_init(|| {
        let filter = EnvFilter::from_str(level)?;

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_file(true)
            .with_line_number(true);

        if json {
            builder.json().try_init()
        } else {
            builder.pretty().try_init()
        }
        .map_err(|e| anyhow::anyhow!("failed to set global subscriber: {e}"))
    })?;

    Ok(())
}
