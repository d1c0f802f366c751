//! Reload trigger for the tile server.
//!
//! The tile server watches a file's modification time and reloads its map
//! styles when it changes.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::info;

/// Create `path` if missing and set its modification time to now.
pub fn touch(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.set_modified(SystemTime::now())?;

    info!(path = %path.display(), "Touched reload trigger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles").join("reload");

        touch(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_updates_mtime_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reload");
        fs::write(&path, "keep").unwrap();

        let old = SystemTime::now() - Duration::from_secs(3600);
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        touch(&path).unwrap();

        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(modified > old + Duration::from_secs(60));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }
}
