use serde::{Deserialize, Serialize};

use crate::model::entity::{ContentItem, FieldError, Identified, QuizQuestion, ensure_unique_ids};
use crate::model::new_id;

/// Theory modules carry content items, trivia modules carry quiz questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    #[default]
    Theory,
    Trivia,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: ModuleKind,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleField {
    Title(String),
    Description(String),
    Kind(ModuleKind),
}

impl Module {
    pub fn new(kind: ModuleKind, title: impl Into<String>) -> Self {
        Self {
            id: new_id("module"),
            title: title.into(),
            description: String::new(),
            kind,
            content: Vec::new(),
            quiz: Vec::new(),
        }
    }

    pub fn apply(&mut self, field: ModuleField) {
        match field {
            ModuleField::Title(title) => self.title = title,
            ModuleField::Description(description) => self.description = description,
            ModuleField::Kind(kind) => self.kind = kind,
        }
    }

    /// Item and question ids are unique within the module and every question
    /// is well formed.
    pub fn validate(&self) -> Result<(), FieldError> {
        ensure_unique_ids("content", &self.content)?;
        ensure_unique_ids("quiz", &self.quiz)?;
        self.quiz.iter().try_for_each(QuizQuestion::validate)
    }

    /// Total minutes of theory content.
    pub fn duration(&self) -> u32 {
        self.content.iter().map(|item| item.duration).sum()
    }
}

impl Identified for Module {
    fn id(&self) -> &str {
        &self.id
    }
}
