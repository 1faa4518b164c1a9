use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_paginatable_for;
use crate::model::entity::{FieldError, Identified, Module, ensure_unique_ids};
use crate::model::repo::{ResourceTyped, window};
use crate::model::{
    DatabaseError, ModelManager, ResourceType, error::DatabaseResult, new_id, repo::CrudRepository,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for CourseStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(FieldError::new("status", format!("unknown status `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Course {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instructor_id: Option<String>,
    #[serde(default)]
    status: CourseStatus,
    #[serde(default)]
    modules: Vec<Module>,
    #[serde(default)]
    enrolled_students: u32,
    #[serde(default)]
    average_rating: f32,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

/// Fields the author fills in before a course exists.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub instructor_id: Option<String>,
}

impl CourseDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        validate_title(&self.title)
    }
}

/// Body of `createCourse`. The id is optional: clients that generate their
/// own ids (the content store does) send it along.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// Partial update accepted by `updateCourse`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CoursePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<Module>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_students: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
}

fn validate_title(title: &str) -> Result<(), FieldError> {
    if title.trim().is_empty() {
        return Err(FieldError::new("title", "is required"));
    }
    Ok(())
}

/// Module ids are unique within the course and each module is well formed.
fn validate_modules(modules: &[Module]) -> Result<(), FieldError> {
    ensure_unique_ids("modules", modules)?;
    modules.iter().try_for_each(Module::validate)
}

impl ResourceTyped for Course {
    fn get_resource_type() -> ResourceType {
        ResourceType::Course
    }
}

impl Course {
    /// New draft with a fresh id and zeroed statistics. Does not validate.
    pub fn from_draft(draft: CourseDraft) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("course"),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            instructor_id: draft.instructor_id,
            status: CourseStatus::Draft,
            modules: Vec::new(),
            enrolled_students: 0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn instructor_id(&self) -> Option<&str> {
        self.instructor_id.as_deref()
    }

    pub fn status(&self) -> CourseStatus {
        self.status
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut Vec<Module> {
        &mut self.modules
    }

    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn module_mut(&mut self, module_id: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id == module_id)
    }

    pub fn module_ids(&self) -> BTreeSet<&str> {
        self.modules.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn enrolled_students(&self) -> u32 {
        self.enrolled_students
    }

    pub fn average_rating(&self) -> f32 {
        self.average_rating
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Any status may follow any other.
    pub fn set_status(&mut self, status: CourseStatus) {
        self.status = status;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        validate_title(&self.title)?;
        validate_modules(&self.modules)
    }

    pub fn apply_patch(&mut self, patch: CoursePatch) -> Result<(), FieldError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(modules) = &patch.modules {
            validate_modules(modules)?;
        }
        if let Some(rating) = patch.average_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(FieldError::new("average_rating", "must be within 0..=5"));
            }
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(instructor_id) = patch.instructor_id {
            self.instructor_id = Some(instructor_id);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(modules) = patch.modules {
            self.modules = modules;
        }
        if let Some(enrolled) = patch.enrolled_students {
            self.enrolled_students = enrolled;
        }
        if let Some(rating) = patch.average_rating {
            self.average_rating = rating;
        }

        self.touch();
        Ok(())
    }

    pub async fn all(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        Ok(mm.db().read(|t| t.courses.clone()).await)
    }
}

impl Identified for Course {
    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Course> for CourseCreate {
    fn from(course: &Course) -> Self {
        Self {
            id: Some(course.id.clone()),
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            instructor_id: course.instructor_id.clone(),
            status: course.status,
            modules: course.modules.clone(),
        }
    }
}

/// Everything the editor can change, used to push a whole course back.
impl From<&Course> for CoursePatch {
    fn from(course: &Course) -> Self {
        Self {
            title: Some(course.title.clone()),
            description: Some(course.description.clone()),
            category: Some(course.category.clone()),
            instructor_id: course.instructor_id.clone(),
            status: Some(course.status),
            modules: Some(course.modules.clone()),
            enrolled_students: None,
            average_rating: None,
        }
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CoursePatch> for Course {
    async fn create(mm: &ModelManager, data: CourseCreate) -> DatabaseResult<Self> {
        validate_title(&data.title)?;
        validate_modules(&data.modules)?;

        let mut course = Course::from_draft(CourseDraft {
            title: data.title,
            description: data.description,
            category: data.category,
            instructor_id: data.instructor_id,
        });
        if let Some(id) = data.id {
            course.id = id;
        }
        course.status = data.status;
        course.modules = data.modules;

        mm.db()
            .write(|t| {
                if t.courses.iter().any(|c| c.id == course.id) {
                    return Err(DatabaseError::conflict(ResourceType::Course, &course.id));
                }
                t.courses.push(course.clone());
                Ok(course)
            })
            .await
    }

    async fn update(mut self, mm: &ModelManager, data: CoursePatch) -> DatabaseResult<Self> {
        self.apply_patch(data)?;

        mm.db()
            .write(|t| {
                let slot = t
                    .courses
                    .iter_mut()
                    .find(|c| c.id == self.id)
                    .ok_or_else(|| DatabaseError::not_found(ResourceType::Course, &self.id))?;
                *slot = self.clone();
                Ok(self)
            })
            .await
    }

    async fn find_by_id(mm: &ModelManager, id: &str) -> DatabaseResult<Option<Self>> {
        Ok(mm
            .db()
            .read(|t| t.courses.iter().find(|c| c.id == id).cloned())
            .await)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        Ok(mm.db().read(|t| window(&t.courses, limit, offset)).await)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        Ok(mm.db().read(|t| t.courses.len() as i64).await)
    }
}

impl_paginatable_for!(Course, CourseCreate, CoursePatch);
