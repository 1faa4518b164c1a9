use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::model::entity::{Course, UserEntity};
use crate::model::error::DatabaseResult;

/// Everything the mock API serves, in the same shape as the JSON data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub users: Vec<UserEntity>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// JSON-file database behind the mock REST API. Reads are served from memory,
/// every successful write is flushed back to the file (when there is one).
#[derive(Debug, Clone)]
pub struct MockDatabase {
    tables: Arc<RwLock<Tables>>, // cloning is cheap, handles share the same tables
    path: Option<Arc<PathBuf>>,
}

impl MockDatabase {
    pub async fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref().to_path_buf();

        let tables = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist, starting empty", path.display());
                Tables::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            path: Some(Arc::new(path)),
        })
    }

    pub fn in_memory(tables: Tables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
            path: None,
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read().await;
        f(&tables)
    }

    /// Runs `f` under the write lock and flushes if it succeeded. `f` must
    /// validate before it mutates; a failed write is not rolled back.
    pub async fn write<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> DatabaseResult<R>,
    ) -> DatabaseResult<R> {
        let mut tables = self.tables.write().await;
        let result = f(&mut tables)?;
        self.flush(&tables).await?;
        Ok(result)
    }

    async fn flush(&self, tables: &Tables) -> DatabaseResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(tables)?;
        fs::write(path, bytes).await?;
        tracing::trace!("flushed mock database to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::{CourseDraft, CourseStatus};

    #[tokio::test]
    async fn open_missing_file_then_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let db = MockDatabase::open(&path).await.unwrap();
        assert_eq!(db.read(|t| t.courses.len()).await, 0);

        db.write(|t| {
            t.courses.push(Course::from_draft(CourseDraft::titled("Rust 101")));
            Ok(())
        })
        .await
        .unwrap();

        let reopened = MockDatabase::open(&path).await.unwrap();
        let (title, status) = reopened
            .read(|t| (t.courses[0].title().to_string(), t.courses[0].status()))
            .await;
        assert_eq!(title, "Rust 101");
        assert_eq!(status, CourseStatus::Draft);
    }

    #[tokio::test]
    async fn failed_write_is_not_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let db = MockDatabase::open(&path).await.unwrap();

        let result: DatabaseResult<()> = db
            .write(|_| {
                Err(crate::model::DatabaseError::not_found(
                    crate::model::ResourceType::Course,
                    "nope",
                ))
            })
            .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
