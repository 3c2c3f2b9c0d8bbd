// SPDX-License-Identifier: GPL-3.0-only

//! Saving captured photos to disk

use crate::errors::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Give up after this many taken names
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Downloads directory, then pictures directory, then the working directory
pub fn default_save_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::picture_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Path for the `n`-th attempt at saving `file_name` in `dir`
///
/// Attempt 0 is the name itself; later attempts get a browser-style counter
/// before the extension: `smile-photo (1).png`, `smile-photo (2).png`, ...
pub fn candidate_path(dir: &Path, file_name: &str, n: u32) -> PathBuf {
    if n == 0 {
        return dir.join(file_name);
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => dir.join(format!("{} ({}).{}", stem, n, ext)),
        _ => dir.join(format!("{} ({})", file_name, n)),
    }
}

/// Write `bytes` as `file_name` in `dir` without overwriting anything
///
/// Each candidate name is claimed with `create_new`, so concurrent saves
/// never land on the same file. Returns the path actually written.
pub async fn save_photo(dir: PathBuf, file_name: String, bytes: Vec<u8>) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Storage(format!("{}: {}", dir.display(), e)))?;

    for n in 0..MAX_NAME_ATTEMPTS {
        let path = candidate_path(&dir, &file_name, n);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(AppError::Storage(format!("{}: {}", path.display(), e))),
        };
        debug!(path = %path.display(), size = bytes.len(), "Writing photo");

        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Photo saved");
        return Ok(path);
    }

    Err(AppError::Storage(format!(
        "no free name for {} in {}",
        file_name,
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "smile-camera-storage-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_candidate_names() {
        let dir = PathBuf::from("/photos");
        assert_eq!(candidate_path(&dir, "smile-photo.png", 0), dir.join("smile-photo.png"));
        assert_eq!(
            candidate_path(&dir, "smile-photo.png", 2),
            dir.join("smile-photo (2).png")
        );
        assert_eq!(candidate_path(&dir, "photo", 1), dir.join("photo (1)"));
        assert_eq!(candidate_path(&dir, ".hidden", 1), dir.join(".hidden (1)"));
    }

    #[tokio::test]
    async fn test_save_skips_taken_names() {
        let dir = temp_dir("collide");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("smile-photo.png"), b"a").unwrap();
        std::fs::write(dir.join("smile-photo (1).png"), b"b").unwrap();

        let path = save_photo(dir.clone(), "smile-photo.png".into(), vec![7])
            .await
            .unwrap();

        assert_eq!(path, dir.join("smile-photo (2).png"));
        assert_eq!(std::fs::read(dir.join("smile-photo.png")).unwrap(), b"a");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_get_distinct_files() {
        let dir = temp_dir("concurrent");

        let saves: Vec<_> = (0..8u8)
            .map(|i| tokio::spawn(save_photo(dir.clone(), "smile-photo.png".into(), vec![i; 64])))
            .collect();
        let mut paths = Vec::new();
        for save in saves {
            paths.push(save.await.unwrap().unwrap());
        }

        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 8);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 8);
        for path in &paths {
            let bytes = std::fs::read(path).unwrap();
            assert_eq!(bytes.len(), 64);
            assert!(bytes.iter().all(|b| *b == bytes[0]));
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let dir = temp_dir("save");

        let first = save_photo(dir.clone(), "smile-photo.png".into(), vec![1, 2, 3])
            .await
            .unwrap();
        let second = save_photo(dir.clone(), "smile-photo.png".into(), vec![4, 5])
            .await
            .unwrap();

        assert_eq!(first, dir.join("smile-photo.png"));
        assert_eq!(second, dir.join("smile-photo (1).png"));
        assert_eq!(std::fs::read(&first).unwrap(), vec![1, 2, 3]);
        assert_eq!(std::fs::read(&second).unwrap(), vec![4, 5]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
