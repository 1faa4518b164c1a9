use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// What a user has recorded for one course. `percentage` is the raw stored
/// value and may be stale, see [`crate::progress`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseProgress {
    #[serde(default)]
    pub completed_modules: BTreeSet<String>,
    #[serde(default)]
    pub percentage: u8,
}

impl CourseProgress {
    pub fn new<I, S>(completed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            completed_modules: completed.into_iter().map(Into::into).collect(),
            percentage: 0,
        }
    }
}

/// Per-user progress keyed by course id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProgress {
    courses: BTreeMap<String, CourseProgress>,
}

impl UserProgress {
    pub fn course(&self, course_id: &str) -> Option<&CourseProgress> {
        self.courses.get(course_id)
    }

    pub fn insert(&mut self, course_id: impl Into<String>, progress: CourseProgress) {
        self.courses.insert(course_id.into(), progress);
    }

    pub fn mark_completed(&mut self, course_id: &str, module_id: impl Into<String>) {
        self.courses
            .entry(course_id.to_string())
            .or_default()
            .completed_modules
            .insert(module_id.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CourseProgress)> {
        self.courses.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<(String, CourseProgress)> for UserProgress {
    fn from_iter<T: IntoIterator<Item = (String, CourseProgress)>>(iter: T) -> Self {
        Self {
            courses: iter.into_iter().collect(),
        }
    }
}
