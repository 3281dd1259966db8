use std::io;
use std::path::{Path, PathBuf};

/// Recursively lists every file under `root`, sorted.
pub fn list_input_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Logs the container inputs so a run's log shows what it had to work with.
/// An unreadable input directory is only a warning.
pub fn log_input_files(root: &Path) {
    match list_input_files(root) {
        Ok(files) => {
            tracing::info!(root = %root.display(), count = files.len(), "input files");
            for file in files {
                tracing::info!("  {}", file.display());
            }
        }
        Err(e) => {
            tracing::warn!(root = %root.display(), "cannot list input files: {}", e);
        }
    }
}
