use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::entity::{Course, CourseProgress};
use crate::progress::{ReconcileReport, reconcile};

/// Stored and reconciled progress of one user in one course.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseProgressResponse {
    pub course_id: String,
    pub completed_modules: BTreeSet<String>,
    /// Percentage as recorded, possibly stale.
    pub stored_percentage: u8,
    /// Percentage recomputed against the current module list.
    pub percentage: u8,
    pub stale_modules: Vec<String>,
}

impl CourseProgressResponse {
    /// `course` is `None` when the course no longer exists; every recorded
    /// module is then stale.
    pub fn new(course_id: &str, course: Option<&Course>, recorded: &CourseProgress) -> Self {
        let mut reconciled = recorded.clone();
        let report = match course {
            Some(course) => reconcile(course, &mut reconciled),
            None => {
                let stale = std::mem::take(&mut reconciled.completed_modules);
                ReconcileReport {
                    stale_modules: stale.into_iter().collect(),
                    previous: recorded.percentage,
                    current: 0,
                }
            }
        };

        Self {
            course_id: course_id.to_string(),
            completed_modules: reconciled.completed_modules,
            stored_percentage: report.previous,
            percentage: report.current,
            stale_modules: report.stale_modules,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressUpdateBody {
    pub completed_modules: BTreeSet<String>,
}
