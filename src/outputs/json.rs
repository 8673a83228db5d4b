//! JSON dump writer.
//!
//! Dumps are pretty-printed with a 4-space indent. Non-ASCII text is written
//! as UTF-8 rather than `\u` escapes. Existing files are overwritten.

use crate::error::Result;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `value` with a 4-space indent.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write an envelope to `path`, creating the parent directory if needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_envelope<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = to_pretty_json(value)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, &json).await?;
    info!(bytes = json.len(), "Wrote JSON dump");
    Ok(())
}
