//! Role dashboards.
//!
//! Role gating here only filters what is shown; it is not access control.

use serde::Serialize;

use crate::model::entity::{Course, CourseStatus, UserEntity};
use crate::progress::compute_display_progress;
use crate::web::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct NavItem {
    pub label: String,
    pub path: String,
}

impl NavItem {
    fn new(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Overview {
    Student {
        enrolled_courses: usize,
        completed_courses: usize,
        average_progress: u8,
    },
    Teacher {
        courses: usize,
        published_courses: usize,
        total_students: u64,
        average_rating: f32,
    },
    Admin {
        users: usize,
        students: usize,
        teachers: usize,
        courses: usize,
        published_courses: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CourseCard {
    pub course_id: String,
    pub title: String,
    pub category: String,
    pub status: CourseStatus,
    pub modules: usize,
    pub enrolled_students: u32,
    /// Reconciled completion, only present on student dashboards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl CourseCard {
    fn new(course: &Course, progress: Option<u8>) -> Self {
        Self {
            course_id: course.id().to_string(),
            title: course.title().to_string(),
            category: course.category().to_string(),
            status: course.status(),
            modules: course.modules().len(),
            enrolled_students: course.enrolled_students(),
            progress,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Dashboard<'a> {
    Student {
        user: &'a UserEntity,
        courses: Vec<&'a Course>,
    },
    Teacher {
        user: &'a UserEntity,
        courses: Vec<&'a Course>,
    },
    Admin {
        courses: &'a [Course],
        users: &'a [UserEntity],
    },
}

impl<'a> Dashboard<'a> {
    /// Students see the courses they are enrolled in, teachers the courses
    /// they instruct, admins everything.
    pub fn for_user(user: &'a UserEntity, courses: &'a [Course], users: &'a [UserEntity]) -> Self {
        match user.role() {
            UserRole::Student => Self::Student {
                user,
                courses: courses.iter().filter(|c| user.is_enrolled(c.id())).collect(),
            },
            UserRole::Teacher => Self::Teacher {
                user,
                courses: courses
                    .iter()
                    .filter(|c| c.instructor_id() == Some(user.id()))
                    .collect(),
            },
            UserRole::Admin => Self::Admin { courses, users },
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Self::Student { .. } => UserRole::Student,
            Self::Teacher { .. } => UserRole::Teacher,
            Self::Admin { .. } => UserRole::Admin,
        }
    }

    pub fn navigation(&self) -> Vec<NavItem> {
        let mut items = vec![NavItem::new("Dashboard", "/dashboard")];
        match self {
            Self::Student { .. } => {
                items.push(NavItem::new("My courses", "/courses"));
                items.push(NavItem::new("Progress", "/progress"));
            }
            Self::Teacher { .. } => {
                items.push(NavItem::new("My courses", "/courses"));
                items.push(NavItem::new("Course editor", "/courses/editor"));
            }
            Self::Admin { .. } => {
                items.push(NavItem::new("Courses", "/courses"));
                items.push(NavItem::new("Course editor", "/courses/editor"));
                items.push(NavItem::new("Users", "/users"));
            }
        }
        items
    }

    pub fn overview(&self) -> Overview {
        match self {
            Self::Student { user, courses } => {
                let progress: Vec<u8> = courses
                    .iter()
                    .map(|c| compute_display_progress(c, user.progress()))
                    .collect();
                let average_progress = if progress.is_empty() {
                    0
                } else {
                    let sum: usize = progress.iter().map(|p| *p as usize).sum();
                    ((2 * sum + progress.len()) / (2 * progress.len())) as u8
                };
                Overview::Student {
                    enrolled_courses: courses.len(),
                    completed_courses: progress.iter().filter(|p| **p == 100).count(),
                    average_progress,
                }
            }
            Self::Teacher { courses, .. } => {
                let rated: Vec<f32> = courses
                    .iter()
                    .map(|c| c.average_rating())
                    .filter(|r| *r > 0.0)
                    .collect();
                let average_rating = if rated.is_empty() {
                    0.0
                } else {
                    rated.iter().sum::<f32>() / rated.len() as f32
                };
                Overview::Teacher {
                    courses: courses.len(),
                    published_courses: count_published(courses.iter().copied()),
                    total_students: courses
                        .iter()
                        .map(|c| u64::from(c.enrolled_students()))
                        .sum(),
                    average_rating,
                }
            }
            Self::Admin { courses, users } => Overview::Admin {
                users: users.len(),
                students: users.iter().filter(|u| u.role() == UserRole::Student).count(),
                teachers: users.iter().filter(|u| u.role() == UserRole::Teacher).count(),
                courses: courses.len(),
                published_courses: count_published(courses.iter()),
            },
        }
    }

    pub fn course_cards(&self) -> Vec<CourseCard> {
        match self {
            Self::Student { user, courses } => courses
                .iter()
                .map(|c| CourseCard::new(c, Some(compute_display_progress(c, user.progress()))))
                .collect(),
            Self::Teacher { courses, .. } => {
                courses.iter().map(|c| CourseCard::new(c, None)).collect()
            }
            Self::Admin { courses, .. } => {
                courses.iter().map(|c| CourseCard::new(c, None)).collect()
            }
        }
    }
}

fn count_published<'c>(courses: impl Iterator<Item = &'c Course>) -> usize {
    courses
        .filter(|c| c.status() == CourseStatus::Published)
        .count()
}
