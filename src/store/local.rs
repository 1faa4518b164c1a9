//! Local fallback storage.
//!
//! [`LocalStorage`] is a flat string → string map persisted as one JSON file,
//! the on-disk twin of the browser's local storage. [`LocalCache`] stores the
//! typed blobs the store and the maintenance tools need on top of it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::Config;
use crate::model::entity::{Course, CourseProgress};
use crate::store::error::CacheResult;

pub const COURSES_KEY: &str = "lms_courses";
pub const PROGRESS_KEY_PREFIX: &str = "course_progress_";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> CacheResult<BTreeMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, items: &BTreeMap<String, String>) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(items)?).await?;
        Ok(())
    }

    pub async fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    pub async fn set_item(&self, key: &str, value: String) -> CacheResult<()> {
        let mut items = self.load().await?;
        items.insert(key.to_string(), value);
        self.store(&items).await
    }

    pub async fn remove_item(&self, key: &str) -> CacheResult<bool> {
        let mut items = self.load().await?;
        let removed = items.remove(key).is_some();
        if removed {
            self.store(&items).await?;
        }
        Ok(removed)
    }

    pub async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.load().await?.into_keys().collect())
    }

    /// Removes every key matching `predicate` and returns them.
    pub async fn remove_where(&self, predicate: impl Fn(&str) -> bool) -> CacheResult<Vec<String>> {
        let items = self.load().await?;
        let (removed, kept): (BTreeMap<_, _>, BTreeMap<_, _>) =
            items.into_iter().partition(|(key, _)| predicate(key.as_str()));

        if !removed.is_empty() {
            self.store(&kept).await?;
        }
        Ok(removed.into_keys().collect())
    }
}

/// Cached progress of one user in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBlob {
    pub course_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub progress: CourseProgress,
}

/// A cached progress key; `blob` is `None` when its value no longer parses.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub key: String,
    pub blob: Option<ProgressBlob>,
}

pub fn progress_key(course_id: &str, user_id: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{course_id}_{user_id}")
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    storage: LocalStorage,
}

impl LocalCache {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(LocalStorage::new(config.client().cache_file()))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub async fn save_courses(&self, courses: &[Course]) -> CacheResult<()> {
        let blob = serde_json::to_string(courses)?;
        self.storage.set_item(COURSES_KEY, blob).await?;
        tracing::debug!(count = courses.len(), "courses written to local cache");
        Ok(())
    }

    pub async fn load_courses(&self) -> CacheResult<Option<Vec<Course>>> {
        match self.storage.get_item(COURSES_KEY).await? {
            Some(blob) => {
                let courses: Vec<Course> = serde_json::from_str(&blob)?;
                courses.iter().try_for_each(Course::validate)?;
                Ok(Some(courses))
            }
            None => Ok(None),
        }
    }

    pub async fn save_progress(
        &self,
        course_id: &str,
        user_id: &str,
        progress: &CourseProgress,
    ) -> CacheResult<()> {
        let blob = ProgressBlob {
            course_id: course_id.to_string(),
            user_id: user_id.to_string(),
            progress: progress.clone(),
        };
        self.storage
            .set_item(&progress_key(course_id, user_id), serde_json::to_string(&blob)?)
            .await
    }

    pub async fn load_progress(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> CacheResult<Option<CourseProgress>> {
        match self.storage.get_item(&progress_key(course_id, user_id)).await? {
            Some(raw) => {
                let blob: ProgressBlob = serde_json::from_str(&raw)?;
                Ok(Some(blob.progress))
            }
            None => Ok(None),
        }
    }

    pub async fn progress_keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(PROGRESS_KEY_PREFIX))
            .collect())
    }

    pub async fn progress_entries(&self) -> CacheResult<Vec<ProgressEntry>> {
        let items = self.storage.load().await?;
        Ok(items
            .into_iter()
            .filter(|(key, _)| key.starts_with(PROGRESS_KEY_PREFIX))
            .map(|(key, raw)| {
                let blob = match serde_json::from_str::<ProgressBlob>(&raw) {
                    Ok(blob) => Some(blob),
                    Err(e) => {
                        tracing::warn!("cached progress `{key}` is corrupted: {e}");
                        None
                    }
                };
                ProgressEntry { key, blob }
            })
            .collect())
    }

    /// Deletes every cached progress blob and returns the removed keys. The
    /// course collection is left alone.
    #[tracing::instrument(skip(self))]
    pub async fn clear_progress_cache(&self) -> CacheResult<Vec<String>> {
        let removed = self
            .storage
            .remove_where(|key| key.starts_with(PROGRESS_KEY_PREFIX))
            .await?;
        tracing::info!(removed = removed.len(), "cleared cached progress");
        Ok(removed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::CourseDraft;
    use crate::store::error::CacheError;

    fn cache_in(dir: &tempfile::TempDir) -> LocalCache {
        LocalCache::new(LocalStorage::new(dir.path().join("nested").join("storage.json")))
    }

    #[tokio::test]
    async fn storage_item_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));

        assert_eq!(storage.get_item("k").await.unwrap(), None);
        storage.set_item("k", "v".into()).await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(storage.keys().await.unwrap(), vec!["k".to_string()]);
        assert!(storage.remove_item("k").await.unwrap());
        assert!(!storage.remove_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn courses_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        assert!(cache.load_courses().await.unwrap().is_none());

        let course = Course::from_draft(CourseDraft::titled("Biology"));
        cache.save_courses(std::slice::from_ref(&course)).await.unwrap();

        let loaded = cache.load_courses().await.unwrap().unwrap();
        assert_eq!(loaded, vec![course]);
    }

    #[tokio::test]
    async fn malformed_cached_course_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let blob = serde_json::json!([{
            "id": "c1",
            "title": "Broken",
            "modules": [{
                "id": "m1",
                "title": "Quiz",
                "kind": "trivia",
                "quiz": [{
                    "id": "q1",
                    "time_limit": 0,
                    "points": 10,
                    "type": "true-false",
                    "correct_answer": true,
                }],
            }],
        }]);
        cache
            .storage()
            .set_item(COURSES_KEY, blob.to_string())
            .await
            .unwrap();

        let err = cache.load_courses().await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidData(ref e) if e.field == "time_limit"));
    }

    #[tokio::test]
    async fn clear_progress_keeps_courses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.save_courses(&[]).await.unwrap();
        cache
            .save_progress("course-1", "user-1", &CourseProgress::new(["mod-1"]))
            .await
            .unwrap();
        cache
            .save_progress("course-2", "user-1", &CourseProgress::default())
            .await
            .unwrap();
        cache
            .storage()
            .set_item("course_progress_broken", "{not json".into())
            .await
            .unwrap();

        let entries = cache.progress_entries().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.blob.is_none()).count(), 1);

        let removed = cache.clear_progress_cache().await.unwrap();
        assert_eq!(removed.len(), 3);
        assert!(cache.progress_keys().await.unwrap().is_empty());
        assert!(cache.load_courses().await.unwrap().is_some());
        assert_eq!(cache.load_progress("course-1", "user-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn progress_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let mut progress = CourseProgress::new(["mod-1", "mod-2"]);
        progress.percentage = 40;

        cache.save_progress("c", "u", &progress).await.unwrap();
        assert_eq!(cache.load_progress("c", "u").await.unwrap(), Some(progress));
        assert_eq!(
            cache.progress_keys().await.unwrap(),
            vec![progress_key("c", "u")]
        );
    }
}
