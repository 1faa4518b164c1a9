//! In-memory course collection edited by the authoring UI.
//!
//! Every mutation is applied locally first and then persisted. While the
//! store is [`Connectivity::Online`] the change goes to the remote API; the
//! first remote failure flips the store offline and from then on the whole
//! collection is written to the [`LocalCache`] until [`CourseContentStore::reconnect`]
//! finds the API again.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

mod error;
pub use error::{CacheError, CacheResult, PersistenceError, PersistenceResult, StoreError, StoreResult};

mod local;
pub use local::{
    COURSES_KEY, LocalCache, LocalStorage, PROGRESS_KEY_PREFIX, ProgressBlob, ProgressEntry,
    progress_key,
};

mod remote;
pub use remote::RemoteRepository;

mod repository;
pub use repository::CourseRepository;

mod sequence;
pub use sequence::Direction;

use crate::model::ResourceType;
use crate::model::entity::{
    ContentField, ContentItem, ContentType, Course, CourseDraft, CoursePatch, CourseStatus, Module,
    ModuleField, ModuleKind, QuestionType, QuizField, QuizQuestion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy)]
enum Change {
    Created,
    Updated,
}

pub struct CourseContentStore {
    courses: Vec<Course>,
    connectivity: Connectivity,
    remote: Box<dyn CourseRepository>,
    cache: LocalCache,
    /// Items the editor shows unfolded. Never persisted.
    expanded: BTreeSet<String>,
}

impl std::fmt::Debug for CourseContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseContentStore")
            .field("courses", &self.courses.len())
            .field("connectivity", &self.connectivity)
            .field("cache", &self.cache)
            .finish()
    }
}

impl CourseContentStore {
    /// Reads the course list from the remote API, falling back to the local
    /// cache (and offline mode) when the API cannot be reached.
    #[tracing::instrument(skip_all)]
    pub async fn load(remote: Box<dyn CourseRepository>, cache: LocalCache) -> StoreResult<Self> {
        let (courses, connectivity) = Self::fetch(remote.as_ref(), &cache).await?;
        Ok(Self {
            courses,
            connectivity,
            remote,
            cache,
            expanded: BTreeSet::new(),
        })
    }

    async fn fetch(
        remote: &dyn CourseRepository,
        cache: &LocalCache,
    ) -> StoreResult<(Vec<Course>, Connectivity)> {
        let listed = match remote.check_availability().await {
            Ok(()) => remote.list_courses().await,
            Err(e) => Err(e),
        };

        match listed {
            Ok(courses) => {
                info!(count = courses.len(), "loaded courses from remote");
                Ok((courses, Connectivity::Online))
            }
            Err(e) => {
                warn!("remote unavailable, using local cache: {e}");
                let courses = cache.load_courses().await?.unwrap_or_default();
                Ok((courses, Connectivity::Offline))
            }
        }
    }

    /// Re-runs the startup read, replacing the in-memory collection.
    pub async fn reload(&mut self) -> StoreResult<()> {
        let (courses, connectivity) = Self::fetch(self.remote.as_ref(), &self.cache).await?;
        self.courses = courses;
        self.connectivity = connectivity;
        Ok(())
    }

    /// Probes the remote API and switches connectivity accordingly. Local
    /// edits made while offline are not pushed.
    pub async fn reconnect(&mut self) -> StoreResult<()> {
        match self.remote.check_availability().await {
            Ok(()) => {
                info!("remote reachable again");
                self.connectivity = Connectivity::Online;
                Ok(())
            }
            Err(e) => {
                self.connectivity = Connectivity::Offline;
                Err(StoreError::ServerUnavailable(e))
            }
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn is_offline(&self) -> bool {
        self.connectivity == Connectivity::Offline
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id() == course_id)
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn expanded_items(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    pub fn collapse(&mut self, item_id: &str) -> bool {
        self.expanded.remove(item_id)
    }

    // Courses

    pub async fn create_course(&mut self, draft: CourseDraft) -> StoreResult<Course> {
        draft.validate()?;

        let course = Course::from_draft(draft);
        self.courses.push(course.clone());
        debug!(course_id = course.id(), "course created");

        self.persist(course.id(), Change::Created).await?;
        Ok(course)
    }

    pub async fn update_course_details(
        &mut self,
        course_id: &str,
        patch: CoursePatch,
    ) -> StoreResult<()> {
        self.course_mut(course_id)?.apply_patch(patch)?;
        self.persist(course_id, Change::Updated).await
    }

    /// Any status may follow any other.
    pub async fn set_course_status(
        &mut self,
        course_id: &str,
        status: CourseStatus,
    ) -> StoreResult<()> {
        self.course_mut(course_id)?.set_status(status);
        self.persist(course_id, Change::Updated).await
    }

    // Modules

    pub async fn add_module(
        &mut self,
        course_id: &str,
        kind: ModuleKind,
        title: &str,
    ) -> StoreResult<Module> {
        let module = Module::new(kind, title);
        self.course_mut(course_id)?.modules_mut().push(module.clone());
        self.commit(course_id).await?;
        Ok(module)
    }

    pub async fn update_module(
        &mut self,
        course_id: &str,
        module_id: &str,
        field: ModuleField,
    ) -> StoreResult<()> {
        self.module_mut(course_id, module_id)?.apply(field);
        self.commit(course_id).await
    }

    pub async fn remove_module(&mut self, course_id: &str, module_id: &str) -> StoreResult<Module> {
        let removed = sequence::remove(self.course_mut(course_id)?.modules_mut(), module_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::Module, module_id))?;
        self.commit(course_id).await?;
        Ok(removed)
    }

    pub async fn move_module(
        &mut self,
        course_id: &str,
        module_id: &str,
        direction: Direction,
    ) -> StoreResult<bool> {
        let moved = sequence::shift(self.course_mut(course_id)?.modules_mut(), module_id, direction)
            .ok_or_else(|| StoreError::not_found(ResourceType::Module, module_id))?;
        if moved {
            self.commit(course_id).await?;
        }
        Ok(moved)
    }

    // Content items

    /// Appends a new item and marks it expanded.
    pub async fn add_content_item(
        &mut self,
        course_id: &str,
        module_id: &str,
        kind: ContentType,
    ) -> StoreResult<ContentItem> {
        let item = ContentItem::new(kind);
        self.module_mut(course_id, module_id)?
            .content
            .push(item.clone());
        self.expanded.insert(item.id.clone());
        self.commit(course_id).await?;
        Ok(item)
    }

    pub async fn update_content_item(
        &mut self,
        course_id: &str,
        module_id: &str,
        item_id: &str,
        field: ContentField,
    ) -> StoreResult<()> {
        let module = self.module_mut(course_id, module_id)?;
        sequence::find_mut(&mut module.content, item_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::ContentItem, item_id))?
            .apply(field);
        self.commit(course_id).await
    }

    pub async fn remove_content_item(
        &mut self,
        course_id: &str,
        module_id: &str,
        item_id: &str,
    ) -> StoreResult<ContentItem> {
        let module = self.module_mut(course_id, module_id)?;
        let removed = sequence::remove(&mut module.content, item_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::ContentItem, item_id))?;
        self.expanded.remove(item_id);
        self.commit(course_id).await?;
        Ok(removed)
    }

    /// Returns `false` (and persists nothing) at either boundary.
    pub async fn move_content_item(
        &mut self,
        course_id: &str,
        module_id: &str,
        item_id: &str,
        direction: Direction,
    ) -> StoreResult<bool> {
        let module = self.module_mut(course_id, module_id)?;
        let moved = sequence::shift(&mut module.content, item_id, direction)
            .ok_or_else(|| StoreError::not_found(ResourceType::ContentItem, item_id))?;
        if moved {
            self.commit(course_id).await?;
        }
        Ok(moved)
    }

    /// Appends a copy with a fresh id and a `" (Copy)"` title.
    pub async fn duplicate_content_item(
        &mut self,
        course_id: &str,
        module_id: &str,
        item_id: &str,
    ) -> StoreResult<ContentItem> {
        let module = self.module_mut(course_id, module_id)?;
        let copy = sequence::duplicate(&mut module.content, item_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::ContentItem, item_id))?;
        self.commit(course_id).await?;
        Ok(copy)
    }

    // Quiz questions

    /// Appends a question seeded with the defaults of `question_type`.
    pub async fn add_quiz_question(
        &mut self,
        course_id: &str,
        module_id: &str,
        question_type: QuestionType,
    ) -> StoreResult<QuizQuestion> {
        let question = QuizQuestion::new(question_type);
        self.module_mut(course_id, module_id)?
            .quiz
            .push(question.clone());
        self.expanded.insert(question.id.clone());
        self.commit(course_id).await?;
        Ok(question)
    }

    pub async fn update_quiz_question(
        &mut self,
        course_id: &str,
        module_id: &str,
        question_id: &str,
        field: QuizField,
    ) -> StoreResult<()> {
        let module = self.module_mut(course_id, module_id)?;
        sequence::find_mut(&mut module.quiz, question_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::QuizQuestion, question_id))?
            .apply(field)?;
        self.commit(course_id).await
    }

    pub async fn remove_quiz_question(
        &mut self,
        course_id: &str,
        module_id: &str,
        question_id: &str,
    ) -> StoreResult<QuizQuestion> {
        let module = self.module_mut(course_id, module_id)?;
        let removed = sequence::remove(&mut module.quiz, question_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::QuizQuestion, question_id))?;
        self.expanded.remove(question_id);
        self.commit(course_id).await?;
        Ok(removed)
    }

    pub async fn move_quiz_question(
        &mut self,
        course_id: &str,
        module_id: &str,
        question_id: &str,
        direction: Direction,
    ) -> StoreResult<bool> {
        let module = self.module_mut(course_id, module_id)?;
        let moved = sequence::shift(&mut module.quiz, question_id, direction)
            .ok_or_else(|| StoreError::not_found(ResourceType::QuizQuestion, question_id))?;
        if moved {
            self.commit(course_id).await?;
        }
        Ok(moved)
    }

    pub async fn duplicate_quiz_question(
        &mut self,
        course_id: &str,
        module_id: &str,
        question_id: &str,
    ) -> StoreResult<QuizQuestion> {
        let module = self.module_mut(course_id, module_id)?;
        let copy = sequence::duplicate(&mut module.quiz, question_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::QuizQuestion, question_id))?;
        self.commit(course_id).await?;
        Ok(copy)
    }

    // Internals

    fn course_mut(&mut self, course_id: &str) -> StoreResult<&mut Course> {
        self.courses
            .iter_mut()
            .find(|c| c.id() == course_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::Course, course_id))
    }

    fn module_mut(&mut self, course_id: &str, module_id: &str) -> StoreResult<&mut Module> {
        self.course_mut(course_id)?
            .module_mut(module_id)
            .ok_or_else(|| StoreError::not_found(ResourceType::Module, module_id))
    }

    async fn commit(&mut self, course_id: &str) -> StoreResult<()> {
        self.course_mut(course_id)?.touch();
        self.persist(course_id, Change::Updated).await
    }

    /// Remote failures are absorbed here: they switch the store offline and
    /// the collection goes to the local cache instead.
    ///
    /// A failed cache write is returned as [`StoreError::Cache`] but the edit
    /// stays in memory, so the next successful save writes it out.
    async fn persist(&mut self, course_id: &str, change: Change) -> StoreResult<()> {
        if self.connectivity == Connectivity::Online {
            let course = self
                .courses
                .iter()
                .find(|c| c.id() == course_id)
                .ok_or_else(|| StoreError::not_found(ResourceType::Course, course_id))?;

            let result = match change {
                Change::Created => self.remote.create_course(course).await.map(drop),
                Change::Updated => self
                    .remote
                    .update_course(course_id, &CoursePatch::from(course))
                    .await
                    .map(drop),
            };

            match result {
                Ok(()) => {
                    debug!(course_id, ?change, "saved to remote");
                    return Ok(());
                }
                Err(e) => {
                    warn!(course_id, "remote save failed, switching to offline mode: {e}");
                    self.connectivity = Connectivity::Offline;
                }
            }
        }

        self.cache.save_courses(&self.courses).await?;
        Ok(())
    }
}
