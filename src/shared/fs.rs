//! Usage: Small filesystem helpers shared across infra adapters (atomic writes, optional reads).

use std::path::Path;

use super::error::ConfigError;

fn io_err(action: &str, path: &Path, err: std::io::Error) -> ConfigError {
    ConfigError::Io(format!("failed to {action} {}: {err}", path.display()))
}

pub fn read_optional_file(path: &Path) -> Result<Option<Vec<u8>>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read(path)
        .map(Some)
        .map_err(|e| io_err("read", path, e))
}

/// Missing file reads as an empty string.
pub fn read_text_or_empty(path: &Path) -> Result<String, ConfigError> {
    Ok(read_optional_file(path)?
        .map(|b| String::from_utf8_lossy(&b).to_string())
        .unwrap_or_default())
}

pub fn is_symlink(path: &Path) -> Result<bool, ConfigError> {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .map_err(|e| io_err("read metadata", path, e))
}

pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err("create dir", parent, e))?;
    }

    let file_name = path.file_name().and_then(|v| v.to_str()).unwrap_or("file");
    let tmp_path = path.with_file_name(format!("{file_name}.switch-tmp"));

    std::fs::write(&tmp_path, bytes).map_err(|e| io_err("write temp file", &tmp_path, e))?;

    // Windows rename requires target not to exist.
    #[cfg(windows)]
    {
        if path.is_file() {
            if let Err(err) = std::fs::remove_file(path) {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(io_err("replace", path, err));
            }
        }
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err("finalize file", path, err));
    }

    Ok(())
}

pub fn write_file_atomic_if_changed(path: &Path, bytes: &[u8]) -> Result<bool, ConfigError> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == bytes {
            return Ok(false);
        }
    }
    write_file_atomic(path, bytes)?;
    Ok(true)
}

pub fn remove_file_if_exists(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path).map_err(|e| io_err("remove", path, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_optional_file_missing_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = read_optional_file(&dir.path().join("missing.txt")).expect("read");
        assert!(out.is_none());
        assert_eq!(
            read_text_or_empty(&dir.path().join("missing.txt")).expect("read"),
            ""
        );
    }

    #[test]
    fn write_file_atomic_creates_parent_and_writes_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a").join("b").join("file.txt");
        write_file_atomic(&path, b"hello").expect("write_file_atomic");
        let got = read_optional_file(&path)
            .expect("read_optional_file")
            .expect("file exists");
        assert_eq!(got, b"hello");
        assert!(!path.with_file_name("file.txt.switch-tmp").exists());
    }

    #[test]
    fn failed_rename_keeps_target_and_cleans_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::create_dir_all(path.join("keep")).expect("mkdir");

        assert!(write_file_atomic(&path, b"x = 1\n").is_err());
        assert!(path.join("keep").is_dir());
        assert!(!path.with_file_name("config.toml.switch-tmp").exists());
    }

    #[test]
    fn write_file_atomic_if_changed_is_false_when_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("file.txt");
        assert!(write_file_atomic_if_changed(&path, b"v1").expect("write"));
        assert!(!write_file_atomic_if_changed(&path, b"v1").expect("write"));
        assert!(write_file_atomic_if_changed(&path, b"v2").expect("write"));
        assert_eq!(read_text_or_empty(&path).expect("read"), "v2");
    }

    #[test]
    fn remove_file_if_exists_reports_whether_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.json");
        assert!(!remove_file_if_exists(&path).expect("remove"));
        std::fs::write(&path, "{}").expect("write");
        assert!(remove_file_if_exists(&path).expect("remove"));
        assert!(!path.exists());
    }
}
