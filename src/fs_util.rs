use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::HarvestError;

pub fn ensure_dir(path: &Utf8Path) -> Result<(), HarvestError> {
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("create {path}: {err}")))
}

/// Runs `write` against a temporary file in `dir` and renames it to `file_name` once
/// `write` succeeds. On failure the temporary file is removed and nothing appears
/// under `file_name`.
pub fn persist_atomic<F>(
    dir: &Utf8Path,
    file_name: &str,
    write: F,
) -> Result<(Utf8PathBuf, u64), HarvestError>
where
    F: FnOnce(&mut dyn Write) -> Result<u64, HarvestError>,
{
    let mut temp = tempfile::Builder::new()
        .prefix(".dish-harvester-")
        .suffix(".part")
        .tempfile_in(dir.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("temp file in {dir}: {err}")))?;
    let bytes = write(temp.as_file_mut())?;
    temp.as_file_mut()
        .flush()
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;

    let destination = dir.join(file_name);
    temp.persist(destination.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("persist {destination}: {err}")))?;
    Ok((destination, bytes))
}
