use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt},
};
use tracing::warn;

/// Reads the whole file. A missing file is `None`, not an error.
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, io::Error> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replaces the contents of `path` so that readers see either the old or the new contents, never
/// a partial write. Data is synced to disk before the rename.
pub async fn replace_file(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_sibling(path);
    let result = write_synced(&temporary, contents).await;
    let result = match result {
        Ok(()) => fs::rename(&temporary, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = fs::remove_file(&temporary).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Couldn't clean up {temporary:?}: {e}");
            }
        }
    }
    result
}

async fn write_synced(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(|| OsString::from("record"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::fs::operations::{read_optional, replace_file, temporary_sibling};

    #[tokio::test]
    async fn test_read_optional_missing() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_optional(&dir.path().join("absent")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_file_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("record.json");

        replace_file(&path, b"first version that is longer").await?;
        replace_file(&path, b"second").await?;

        assert_eq!(read_optional(&path).await?, Some(b"second".to_vec()));
        assert!(!temporary_sibling(&path).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_file_missing_directory() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing").join("record.json");

        assert!(replace_file(&path, b"data").await.is_err());
        Ok(())
    }
}
