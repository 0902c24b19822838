//! Output file writing.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::ConvertError;

/// Write `bytes` to `dest`, fully replacing any existing file.
///
/// Data goes to a temp file in the destination directory and is renamed
/// into place, so a failed write never leaves a truncated image at `dest`.
/// The temp file is removed if anything fails before the rename.
pub fn write_output(dest: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let err = |e: io::Error| ConvertError::Write(dest.to_path_buf(), e);

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(err)?;
    tmp.write_all(bytes).map_err(err)?;
    set_readable(tmp.as_file()).map_err(err)?;
    tmp.persist(dest).map_err(|e| err(e.error))?;
    Ok(())
}

/// Temp files start out owner-only; outputs are ordinary files.
#[cfg(unix)]
fn set_readable(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a/b/out.png");
        write_output(&dest, b"data").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"data");
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.png");
        fs::write(&dest, b"old and longer content").unwrap();

        write_output(&dest, b"new").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        // No temp file left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_directory_fails() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("taken");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), b"x").unwrap();

        let err = write_output(&target, b"x").unwrap_err();
        assert!(matches!(err, ConvertError::Write(..)));
        // The failed rename does not leave the temp file behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_writers_same_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("shared.png");

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let dest = dest.clone();
                std::thread::spawn(move || write_output(&dest, &[i; 64]))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }

        // Whole content from exactly one writer, no stray temp files
        let content = fs::read(&dest).unwrap();
        assert_eq!(content.len(), 64);
        assert!(content.iter().all(|&b| b == content[0]));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.png");
        write_output(&dest, b"png").unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
