mod database;
pub use database::{MockDatabase, Tables};

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod repo;
pub use repo::{CrudRepository, Page, PaginatableRepository, ResourceType, ResourceTyped};

use uuid::Uuid;

/// Fresh id of the form `<prefix>-<uuid>`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: MockDatabase,
}

impl ModelManager {
    pub fn new(database: MockDatabase) -> Self {
        Self { database }
    }

    pub fn db(&self) -> &MockDatabase {
        &self.database
    }
}
