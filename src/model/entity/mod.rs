use std::collections::BTreeSet;

use thiserror::Error;

mod user;
pub use user::{UserEntity, UserEntityCreate, UserEntityUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseDraft, CoursePatch, CourseStatus};

mod module;
pub use module::{Module, ModuleField, ModuleKind};

mod content;
pub use content::{ContentField, ContentItem, ContentType, DEFAULT_CONTENT_DURATION};

mod quiz;
pub use quiz::{
    DEFAULT_POINTS, DEFAULT_TIME_LIMIT, Difficulty, QuestionKind, QuestionType, QuizField,
    QuizQuestion, TRUE_FALSE_OPTIONS,
};

mod progress;
pub use progress::{CourseProgress, UserProgress};

/// Anything living in an ordered, id-addressed sequence.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Copy of an element under a fresh id, marked as a copy.
pub trait Duplicate {
    fn duplicate(&self) -> Self;
}

/// A field value that does not satisfy the entity's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Rejects a sequence in which two elements share an id.
pub(crate) fn ensure_unique_ids<'a, T, I>(field: &'static str, items: I) -> Result<(), FieldError>
where
    T: Identified + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut seen = BTreeSet::new();
    for item in items {
        if !seen.insert(item.id()) {
            return Err(FieldError::new(field, format!("duplicate id `{}`", item.id())));
        }
    }
    Ok(())
}
