use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::Config;
use crate::model::entity::{Course, CourseCreate, CoursePatch, UserEntity};
use crate::store::error::{PersistenceError, PersistenceResult};
use crate::store::repository::CourseRepository;

/// [`CourseRepository`] speaking to the REST API served by [`crate::web`].
#[derive(Debug, Clone)]
pub struct RemoteRepository {
    client: Client,
    base_url: String,
}

impl RemoteRepository {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PersistenceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> PersistenceResult<Self> {
        Self::new(config.client().api_url(), config.client().timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> PersistenceResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PersistenceError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CourseRepository for RemoteRepository {
    async fn check_availability(&self) -> PersistenceResult<()> {
        let response = self.client.get(self.url("health")).send().await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    async fn list_users(&self) -> PersistenceResult<Vec<UserEntity>> {
        let response = self.client.get(self.url("users")).send().await?;
        Self::parse(response).await
    }

    async fn list_courses(&self) -> PersistenceResult<Vec<Course>> {
        let response = self.client.get(self.url("courses")).send().await?;
        Self::parse(response).await
    }

    #[tracing::instrument(skip(self, course), fields(course_id = course.id()))]
    async fn create_course(&self, course: &Course) -> PersistenceResult<Course> {
        let response = self
            .client
            .post(self.url("courses"))
            .json(&CourseCreate::from(course))
            .send()
            .await?;
        Self::parse(response).await
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_course(&self, id: &str, patch: &CoursePatch) -> PersistenceResult<Course> {
        let response = self
            .client
            .patch(self.url(&format!("courses/{id}")))
            .json(patch)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn login(&self, email: &str, password: &str) -> PersistenceResult<UserEntity> {
        let response = self
            .client
            .post(self.url("auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn urls_are_joined_with_single_slash() {
        let repo = RemoteRepository::new("http://localhost:5000/api/v1/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(repo.base_url(), "http://localhost:5000/api/v1");
        assert_eq!(repo.url("/courses"), "http://localhost:5000/api/v1/courses");
        assert_eq!(repo.url("health"), "http://localhost:5000/api/v1/health");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        // port 9 (discard) is not expected to run an HTTP server
        let repo = RemoteRepository::new("http://127.0.0.1:9/api/v1", Duration::from_millis(500))
            .unwrap();
        assert!(repo.check_availability().await.is_err());
    }
}
