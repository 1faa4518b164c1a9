use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::impl_paginatable_for;
use crate::model::entity::{CourseProgress, UserProgress};
use crate::model::repo::{ResourceTyped, window};
use crate::model::{
    DatabaseError, ModelManager, ResourceType, error::DatabaseResult, new_id, repo::CrudRepository,
};
use crate::web::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntity {
    id: String,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    password_hash: String,
    role: UserRole,
    #[serde(default)]
    enrolled_courses: Vec<String>,
    #[serde(default)]
    progress: UserProgress,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEntityCreate {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserEntityUpdate {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub enrolled_courses: Option<Vec<String>>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> ResourceType {
        ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn enrolled_courses(&self) -> &[String] {
        &self.enrolled_courses
    }

    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.enrolled_courses.iter().any(|id| id == course_id)
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub async fn all(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        Ok(mm.db().read(|t| t.users.clone()).await)
    }

    pub async fn find_by_email(mm: &ModelManager, email: &str) -> DatabaseResult<Option<Self>> {
        Ok(mm
            .db()
            .read(|t| {
                t.users
                    .iter()
                    .find(|u| u.email.eq_ignore_ascii_case(email))
                    .cloned()
            })
            .await)
    }

    /// Replaces the stored progress record for one course.
    pub async fn set_course_progress(
        mut self,
        mm: &ModelManager,
        course_id: &str,
        progress: CourseProgress,
    ) -> DatabaseResult<Self> {
        self.progress.insert(course_id, progress);
        self.save(mm).await
    }

    async fn save(self, mm: &ModelManager) -> DatabaseResult<Self> {
        mm.db()
            .write(|t| {
                let slot = t
                    .users
                    .iter_mut()
                    .find(|u| u.id == self.id)
                    .ok_or_else(|| DatabaseError::not_found(ResourceType::User, &self.id))?;
                *slot = self.clone();
                Ok(self)
            })
            .await
    }
}

#[async_trait]
impl CrudRepository<UserEntity, UserEntityCreate, UserEntityUpdate> for UserEntity {
    async fn create(mm: &ModelManager, data: UserEntityCreate) -> DatabaseResult<Self> {
        let user = UserEntity {
            id: new_id("user"),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            enrolled_courses: Vec::new(),
            progress: UserProgress::default(),
        };

        mm.db()
            .write(|t| {
                if t.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
                    return Err(DatabaseError::conflict(ResourceType::User, &user.email));
                }
                t.users.push(user.clone());
                Ok(user)
            })
            .await
    }

    async fn update(mut self, mm: &ModelManager, data: UserEntityUpdate) -> DatabaseResult<Self> {
        if let Some(name) = data.name {
            self.name = name;
        }
        if let Some(role) = data.role {
            self.role = role;
        }
        if let Some(enrolled) = data.enrolled_courses {
            self.enrolled_courses = enrolled;
        }
        self.save(mm).await
    }

    async fn find_by_id(mm: &ModelManager, id: &str) -> DatabaseResult<Option<Self>> {
        Ok(mm
            .db()
            .read(|t| t.users.iter().find(|u| u.id == id).cloned())
            .await)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        Ok(mm.db().read(|t| window(&t.users, limit, offset)).await)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        Ok(mm.db().read(|t| t.users.len() as i64).await)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreate, UserEntityUpdate);

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{MockDatabase, Tables};

    fn create_body(email: &str, role: UserRole) -> UserEntityCreate {
        UserEntityCreate {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
        }
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let mm = ModelManager::new(MockDatabase::in_memory(Tables::default()));
        UserEntity::create(&mm, create_body("ada@example.com", UserRole::Student))
            .await
            .unwrap();
        let err = UserEntity::create(&mm, create_body("ADA@example.com", UserRole::Teacher))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { .. }));

        let found = UserEntity::find_by_email(&mm, "Ada@Example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn enroll_and_record_progress() {
        let mm = ModelManager::new(MockDatabase::in_memory(Tables::default()));
        let user = UserEntity::create(&mm, create_body("bob@example.com", UserRole::Student))
            .await
            .unwrap();

        let user = user
            .update(
                &mm,
                UserEntityUpdate {
                    enrolled_courses: Some(vec!["course-1".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(user.is_enrolled("course-1"));

        let user = user
            .set_course_progress(&mm, "course-1", CourseProgress::new(["mod-1"]))
            .await
            .unwrap();

        let stored = UserEntity::find_by_id(&mm, user.id()).await.unwrap().unwrap();
        let progress = stored.progress().course("course-1").unwrap();
        assert!(progress.completed_modules.contains("mod-1"));
    }

    #[test]
    fn hash_is_omitted_when_empty() {
        let json = serde_json::json!({
            "id": "user-1",
            "name": "Remote",
            "email": "remote@example.com",
            "role": "teacher"
        });
        let user: UserEntity = serde_json::from_value(json).unwrap();
        assert_eq!(user.hash(), "");
        assert_eq!(user.role(), UserRole::Teacher);

        let back = serde_json::to_value(&user).unwrap();
        assert!(back.get("password_hash").is_none());
    }
}
