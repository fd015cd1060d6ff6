//! Atomic output file writing

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{EpgError, Result};

/// Write `contents` to `path` through a temp file in the same directory.
///
/// The target only ever holds the previous file or the complete new one. On
/// failure the temp file is removed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path(path)?;
    debug!("Writing {} bytes to {}", contents.len(), tmp.display());

    let result = write_and_sync(&tmp, contents).and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(EpgError::io(path, e));
    }
    Ok(())
}

fn write_and_sync(tmp: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// `dir/name` -> `dir/.name.tmp`
fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        EpgError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
        )
    })?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("epg.xml");

        write_atomic(&target, b"<tv/>").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "<tv/>");

        write_atomic(&target, "<tv>ü</tv>".as_bytes()).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "<tv>ü</tv>");

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no_such_dir").join("epg.xml");

        let err = write_atomic(&target, b"<tv/>").unwrap_err();
        assert!(matches!(err, EpgError::Io { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_failed_rename_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("epg.xml");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        assert!(write_atomic(&target, b"<tv/>").is_err());
        assert!(target.is_dir());
        assert!(!dir.path().join(".epg.xml.tmp").exists());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("out/tr-epg.xml")).unwrap(),
            PathBuf::from("out/.tr-epg.xml.tmp")
        );
        assert!(temp_path(Path::new("/")).is_err());
    }
}
