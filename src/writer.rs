//! Output writing

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::BundleError;

/// Write the bundled document to `path`
///
/// The parent directory is created when missing. Content goes to a temporary
/// file beside the destination which then replaces it, so a failed write
/// leaves any previous output intact.
pub fn write_output(path: &Path, contents: &str) -> Result<(), BundleError> {
    let write_err = |source| BundleError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Write the bundled document to any writer
pub fn write_to<W: Write>(mut writer: W, contents: &str) -> std::io::Result<()> {
    writer.write_all(contents.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dist/nested/index.html");

        write_output(&path, "<p>hi</p>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "old content that is longer").unwrap();

        write_output(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        write_output(&path, "x").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        write_to(&mut buffer, "abc").unwrap();
        assert_eq!(buffer, b"abc");
    }
}
