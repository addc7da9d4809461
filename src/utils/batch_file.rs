use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DocSetError;
use crate::listing::batch_list::BatchList;

pub(crate) const BATCH_LIST_ENV: &str = "DOCSET_BATCH_LIST";
const BATCH_LIST_FILE: &str = "batch-list.txt";

pub fn docset_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("docset"),
        None => std::env::temp_dir().join("docset"),
    }
}

/// `DOCSET_BATCH_LIST` when set, else `batch-list.txt` in the data directory.
pub fn default_batch_list_path() -> PathBuf {
    std::env::var(BATCH_LIST_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| docset_data_dir().join(BATCH_LIST_FILE))
}

/// Reads the batch list, trimmed; a missing file is an empty list.
pub async fn load(path: &Path) -> Result<BatchList, DocSetError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let mut list = BatchList::parse(&text);
            list.trim();
            Ok(list)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BatchList::default()),
        Err(err) => Err(err.into()),
    }
}

/// Writes the batch list through a temporary sibling file and a rename, so a
/// crash never leaves a half-written list behind.
pub async fn save(path: &Path, list: &BatchList) -> Result<(), DocSetError> {
    let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Err(DocSetError::InvalidArgument(format!(
            "Invalid batch list path (no parent directory): {}",
            path.display()
        )));
    };
    tokio::fs::create_dir_all(dir).await?;

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| BATCH_LIST_FILE.to_string());

    let mut opened = None;
    for attempt in 0..32_u32 {
        let candidate = dir.join(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            seed.saturating_add(attempt as u128)
        ));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                opened = Some((candidate, file));
                break;
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    let Some((tmp_path, mut file)) = opened else {
        return Err(DocSetError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "Unable to allocate temporary batch list file",
        )));
    };

    let mut text = list.to_text();
    if !text.is_empty() {
        text.push('\n');
    }
    let written = async {
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;
    if let Err(err) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    debug!(path = %path.display(), lines = list.len(), "batch list saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = load(&dir.path().join("absent.txt")).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_keeps_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("batch-list.txt");
        let list = BatchList::parse("id1\tLabel One\nid2");

        save(&path, &list).await.unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "id1\tLabel One\nid2\n");

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.lines(), list.lines());
    }

    #[tokio::test]
    async fn reloaded_list_has_no_trailing_blank_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch-list.txt");
        save(&path, &BatchList::parse("a\nb")).await.unwrap();

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            serde_json::json!(["a", "b"])
        );
    }

    #[tokio::test]
    async fn failed_save_removes_the_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch-list.txt");
        tokio::fs::create_dir(&path).await.unwrap();
        tokio::fs::write(path.join("keep"), "x").await.unwrap();

        assert!(save(&path, &BatchList::parse("a")).await.is_err());

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["batch-list.txt"]);
    }

    #[tokio::test]
    async fn save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch-list.txt");
        save(&path, &BatchList::parse("a")).await.unwrap();
        save(&path, &BatchList::default()).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["batch-list.txt"]);
        assert!(load(&path).await.unwrap().is_empty());
    }
}
