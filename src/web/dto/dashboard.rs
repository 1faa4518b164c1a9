use serde::Serialize;

use crate::dashboard::{CourseCard, Dashboard, NavItem, Overview};
use crate::web::UserRole;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub role: UserRole,
    pub navigation: Vec<NavItem>,
    pub overview: Overview,
    pub courses: Vec<CourseCard>,
}

impl From<&Dashboard<'_>> for DashboardResponse {
    fn from(dashboard: &Dashboard<'_>) -> Self {
        Self {
            role: dashboard.role(),
            navigation: dashboard.navigation(),
            overview: dashboard.overview(),
            courses: dashboard.course_cards(),
        }
    }
}
