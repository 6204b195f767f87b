use std::fs::Metadata;
use std::time::SystemTime;

/// Modification time in milliseconds since the Unix epoch.
///
/// Timestamps before the epoch collapse to 0.
pub fn modified_millis(metadata: &Metadata) -> std::io::Result<u64> {
    let modified = metadata.modified()?;
    Ok(modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0))
}
