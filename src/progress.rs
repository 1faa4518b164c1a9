//! Progress reconciliation.
//!
//! Stored percentages drift when modules are removed or renamed after a user
//! recorded progress. The displayed value is therefore always recomputed from
//! the completed module ids that still exist in the course.

use std::collections::BTreeSet;

use crate::model::entity::{Course, CourseProgress, UserProgress};

/// Completion percentage of `course` for the given user progress, in `0..=100`.
pub fn compute_display_progress(course: &Course, progress: &UserProgress) -> u8 {
    match progress.course(course.id()) {
        Some(recorded) => course_progress_percentage(course, recorded),
        None => 0,
    }
}

/// Same as [`compute_display_progress`] for a single course record.
pub fn course_progress_percentage(course: &Course, recorded: &CourseProgress) -> u8 {
    percentage(valid_completed(course, recorded).len(), total_modules(course))
}

/// Distinct module ids, so a repeated id is never counted twice.
fn total_modules(course: &Course) -> usize {
    course.module_ids().len()
}

/// Recorded module ids that still belong to `course`.
pub fn valid_completed<'a>(course: &Course, recorded: &'a CourseProgress) -> BTreeSet<&'a str> {
    let real = course.module_ids();
    recorded
        .completed_modules
        .iter()
        .map(String::as_str)
        .filter(|id| real.contains(id))
        .collect()
}

/// `round(100 * done / total)` with halves rounded up, 0 for an empty course.
fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as u8
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub stale_modules: Vec<String>,
    pub previous: u8,
    pub current: u8,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.stale_modules.is_empty() || self.previous != self.current
    }
}

/// Drops stale module ids from `recorded` and overwrites its stored
/// percentage with the recomputed one.
pub fn reconcile(course: &Course, recorded: &mut CourseProgress) -> ReconcileReport {
    let real = course.module_ids();
    let (kept, stale): (BTreeSet<String>, BTreeSet<String>) = std::mem::take(
        &mut recorded.completed_modules,
    )
    .into_iter()
    .partition(|id| real.contains(id.as_str()));

    let previous = recorded.percentage;
    recorded.completed_modules = kept;
    recorded.percentage = percentage(recorded.completed_modules.len(), total_modules(course));

    ReconcileReport {
        stale_modules: stale.into_iter().collect(),
        previous,
        current: recorded.percentage,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::{CourseDraft, CoursePatch, Module, ModuleKind};

    fn course_with_modules(ids: &[&str]) -> Course {
        let mut course = Course::from_draft(CourseDraft::titled("Course"));
        let modules = ids
            .iter()
            .map(|id| {
                let mut module = Module::new(ModuleKind::Theory, *id);
                module.id = id.to_string();
                module
            })
            .collect();
        course
            .apply_patch(CoursePatch {
                modules: Some(modules),
                ..Default::default()
            })
            .unwrap();
        course
    }

    fn progress_for(course: &Course, completed: &[&str]) -> UserProgress {
        let mut progress = UserProgress::default();
        progress.insert(course.id(), CourseProgress::new(completed.iter().copied()));
        progress
    }

    #[test]
    fn empty_course_is_zero() {
        let course = course_with_modules(&[]);
        let progress = progress_for(&course, &["mod-1", "mod-2"]);
        assert_eq!(compute_display_progress(&course, &progress), 0);
    }

    #[test]
    fn missing_record_is_zero() {
        let course = course_with_modules(&["mod-1"]);
        assert_eq!(compute_display_progress(&course, &UserProgress::default()), 0);
    }

    #[test]
    fn stale_ids_are_ignored() {
        let course = course_with_modules(&["mod-1", "mod-2"]);
        let progress = progress_for(&course, &["mod-1", "mod-stale"]);
        assert_eq!(compute_display_progress(&course, &progress), 50);
    }

    #[test]
    fn rounds_to_nearest() {
        let course = course_with_modules(&["a", "b", "c"]);
        assert_eq!(compute_display_progress(&course, &progress_for(&course, &["a"])), 33);
        assert_eq!(compute_display_progress(&course, &progress_for(&course, &["a", "b"])), 67);
        assert_eq!(
            compute_display_progress(&course, &progress_for(&course, &["a", "b", "c"])),
            100
        );
    }

    #[test]
    fn halves_round_up() {
        let ids: Vec<String> = (0..8).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let course = course_with_modules(&refs);
        // 1/8 = 12.5%
        assert_eq!(compute_display_progress(&course, &progress_for(&course, &["m0"])), 13);
    }

    #[test]
    fn monotonic_in_valid_completions() {
        let ids: Vec<String> = (0..7).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let course = course_with_modules(&refs);

        let mut last = 0;
        for n in 0..=refs.len() {
            let value = compute_display_progress(&course, &progress_for(&course, &refs[..n]));
            assert!(value >= last, "{value} < {last} at {n}");
            last = value;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn reconcile_rewrites_stale_record() {
        let course = course_with_modules(&["mod-1", "mod-2"]);
        let mut recorded = CourseProgress::new(["mod-1", "mod-old"]);
        recorded.percentage = 100;

        let report = reconcile(&course, &mut recorded);
        assert!(report.changed());
        assert_eq!(report.stale_modules, vec!["mod-old".to_string()]);
        assert_eq!((report.previous, report.current), (100, 50));
        assert_eq!(recorded.percentage, 50);
        assert_eq!(recorded.completed_modules.len(), 1);

        let again = reconcile(&course, &mut recorded);
        assert!(!again.changed());
    }

    #[test]
    fn display_and_reconcile_agree_on_repeated_module_ids() {
        let course: Course = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "title": "Course",
            "modules": [
                { "id": "m1", "title": "One" },
                { "id": "m1", "title": "One again" },
            ],
        }))
        .unwrap();
        assert!(course.validate().is_err());

        let progress = progress_for(&course, &["m1"]);
        let display = compute_display_progress(&course, &progress);

        let mut recorded = CourseProgress::new(["m1"]);
        let report = reconcile(&course, &mut recorded);
        assert_eq!(display, report.current);
        assert_eq!(display, 100);
    }
}
