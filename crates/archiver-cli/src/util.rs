//! Utility functions for CLI operations.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use archiver_store::Store;
use tracing::debug;

/// Open an existing store for reading.
///
/// A missing file is an error; nothing is created on disk.
pub fn open_store(path: &Path) -> Result<Store> {
    if !path.exists() {
        bail!("Database file not found at {}", path.display());
    }
    connect(path)
}

fn connect(path: &Path) -> Result<Store> {
    Store::open(path).with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Open a store for writing, creating its directory when needed.
pub fn open_store_for_writing(path: &Path) -> Result<Store> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        debug!("Creating {}", parent.display());
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    connect(path)
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_does_not_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("aranet4.db");
        assert!(open_store(&path).is_err());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn test_open_store_does_not_create_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let err = open_store(&path).unwrap_err();
        assert!(err.to_string().starts_with("Database file not found at"));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_store_for_writing_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aranet4.db");
        open_store_for_writing(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_output(Some(&path), "timestamp,co2\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "timestamp,co2\n");
    }
}
