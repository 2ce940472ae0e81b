//! Helpers shared by the unit tests.

use std::path::PathBuf;

/// A fresh path in the temp directory, unique per process and call.
pub(crate) fn temp_path(tag: &str, ext: &str) -> PathBuf {
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "objview_{}_{}_{}.{}",
        tag,
        std::process::id(),
        nonce,
        ext
    ))
}
