use async_trait::async_trait;

use crate::model::entity::{Course, CoursePatch, UserEntity};
use crate::store::error::PersistenceResult;

/// The remote side of the persistence gateway.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Cheap probe used to decide between online and offline mode.
    async fn check_availability(&self) -> PersistenceResult<()>;

    async fn list_users(&self) -> PersistenceResult<Vec<UserEntity>>;

    async fn list_courses(&self) -> PersistenceResult<Vec<Course>>;

    async fn create_course(&self, course: &Course) -> PersistenceResult<Course>;

    async fn update_course(&self, id: &str, patch: &CoursePatch) -> PersistenceResult<Course>;

    async fn login(&self, email: &str, password: &str) -> PersistenceResult<UserEntity>;
}
