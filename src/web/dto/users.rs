use serde::{Deserialize, Serialize};

use crate::model::entity::{UserEntity, UserProgress};
use crate::web::UserRole;

/// A user as the API exposes it, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub enrolled_courses: Vec<String>,
    /// Raw recorded progress keyed by course id.
    #[schema(value_type = Object)]
    pub progress: UserProgress,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            enrolled_courses: user.enrolled_courses().to_vec(),
            progress: user.progress().clone(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}
