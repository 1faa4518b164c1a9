use serde::{Deserialize, Serialize};

use crate::model::entity::{Duplicate, Identified};
use crate::model::new_id;

pub const DEFAULT_CONTENT_DURATION: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Video,
    Interactive,
    Resource,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Video => write!(f, "video"),
            Self::Interactive => write!(f, "interactive"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// Single piece of theory material inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Minutes.
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    DEFAULT_CONTENT_DURATION
}

/// Editable field of a [`ContentItem`] together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentField {
    Title(String),
    Body(String),
    Url(Option<String>),
    Kind(ContentType),
    Duration(u32),
}

impl ContentItem {
    pub fn new(kind: ContentType) -> Self {
        Self {
            id: new_id("content"),
            kind,
            title: String::new(),
            body: String::new(),
            url: None,
            duration: DEFAULT_CONTENT_DURATION,
        }
    }

    pub fn apply(&mut self, field: ContentField) {
        match field {
            ContentField::Title(title) => self.title = title,
            ContentField::Body(body) => self.body = body,
            ContentField::Url(url) => self.url = url,
            ContentField::Kind(kind) => self.kind = kind,
            ContentField::Duration(duration) => self.duration = duration,
        }
    }
}

impl Identified for ContentItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Duplicate for ContentItem {
    fn duplicate(&self) -> Self {
        Self {
            id: new_id("content"),
            title: format!("{} (Copy)", self.title),
            ..self.clone()
        }
    }
}
