//! Replace-by-rename file writes inside a capability directory.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `contents` to `file_name` in `dir` so readers see either the old
/// file or the complete new one.
pub(super) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let temp_name = format!(
        ".{file_name}.tmp.{}.{nanos}.{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );

    let result = write_temp(dir, &temp_name, contents).and_then(|()| replace(dir, &temp_name, file_name));
    if result.is_err() && dir.remove_file(&temp_name).is_err() {
        // The temp file may never have been created.
    }
    result?;

    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Directory sync is best effort.
    }
    Ok(())
}

fn write_temp(dir: &Dir, temp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(temp_name, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(windows)]
fn replace(dir: &Dir, temp_name: &str, file_name: &str) -> io::Result<()> {
    match dir.remove_file(file_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(temp_name, dir, file_name)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, temp_name: &str, file_name: &str) -> io::Result<()> {
    dir.rename(temp_name, dir, file_name)
}
