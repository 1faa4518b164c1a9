use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::entity::{Duplicate, FieldError, Identified};
use crate::model::new_id;

pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];
pub const DEFAULT_TIME_LIMIT: u32 = 20;
pub const DEFAULT_POINTS: u32 = 100;
const DEFAULT_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    TypeAnswer,
    MultipleSelect,
    OrderSequence,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleChoice => write!(f, "multiple-choice"),
            Self::TrueFalse => write!(f, "true-false"),
            Self::TypeAnswer => write!(f, "type-answer"),
            Self::MultipleSelect => write!(f, "multiple-select"),
            Self::OrderSequence => write!(f, "order-sequence"),
        }
    }
}

/// Type-specific part of a question: its options and how the correct answer
/// is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct_answer: usize,
    },
    /// Options are always [`TRUE_FALSE_OPTIONS`].
    TrueFalse { correct_answer: bool },
    TypeAnswer { correct_text: String },
    MultipleSelect {
        options: Vec<String>,
        correct_answers: BTreeSet<usize>,
    },
    /// `correct_order` is a permutation of option indices.
    OrderSequence {
        options: Vec<String>,
        correct_order: Vec<usize>,
    },
}

impl QuestionKind {
    pub fn default_for(question_type: QuestionType) -> Self {
        let blank_options = || vec![String::new(); DEFAULT_OPTION_COUNT];

        match question_type {
            QuestionType::MultipleChoice => Self::MultipleChoice {
                options: blank_options(),
                correct_answer: 0,
            },
            QuestionType::TrueFalse => Self::TrueFalse {
                correct_answer: true,
            },
            QuestionType::TypeAnswer => Self::TypeAnswer {
                correct_text: String::new(),
            },
            QuestionType::MultipleSelect => Self::MultipleSelect {
                options: blank_options(),
                correct_answers: BTreeSet::new(),
            },
            QuestionType::OrderSequence => Self::OrderSequence {
                options: blank_options(),
                correct_order: (0..DEFAULT_OPTION_COUNT).collect(),
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
            Self::TypeAnswer { .. } => QuestionType::TypeAnswer,
            Self::MultipleSelect { .. } => QuestionType::MultipleSelect,
            Self::OrderSequence { .. } => QuestionType::OrderSequence,
        }
    }

    /// Answer encoding is consistent with the options.
    pub fn validate(&self) -> Result<(), FieldError> {
        match self {
            Self::MultipleChoice {
                options,
                correct_answer,
            } => {
                if *correct_answer >= options.len() {
                    return Err(FieldError::new("correct_answer", "option index out of range"));
                }
            }
            Self::MultipleSelect {
                options,
                correct_answers,
            } => {
                if correct_answers.iter().any(|idx| *idx >= options.len()) {
                    return Err(FieldError::new("correct_answers", "option index out of range"));
                }
            }
            Self::OrderSequence {
                options,
                correct_order,
            } => {
                if !is_permutation(correct_order, options.len()) {
                    return Err(FieldError::new(
                        "correct_order",
                        "must be a permutation of the option indices",
                    ));
                }
            }
            Self::TrueFalse { .. } | Self::TypeAnswer { .. } => {}
        }
        Ok(())
    }

    pub fn options(&self) -> Vec<&str> {
        match self {
            Self::MultipleChoice { options, .. }
            | Self::MultipleSelect { options, .. }
            | Self::OrderSequence { options, .. } => options.iter().map(String::as_str).collect(),
            Self::TrueFalse { .. } => TRUE_FALSE_OPTIONS.to_vec(),
            Self::TypeAnswer { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizQuestion {
    pub id: String,
    #[serde(default)]
    pub question: String,
    /// Seconds, always > 0.
    pub time_limit: u32,
    /// Always > 0.
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Editable field of a [`QuizQuestion`] together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizField {
    Question(String),
    TimeLimit(u32),
    Points(u32),
    Difficulty(Difficulty),
    /// Switches the question type, reseeding the type-specific defaults.
    Type(QuestionType),
    Options(Vec<String>),
    CorrectOption(usize),
    CorrectFlag(bool),
    CorrectText(String),
    CorrectSet(BTreeSet<usize>),
    CorrectOrder(Vec<usize>),
}

impl QuizQuestion {
    pub fn new(question_type: QuestionType) -> Self {
        Self {
            id: new_id("question"),
            question: String::new(),
            time_limit: DEFAULT_TIME_LIMIT,
            points: DEFAULT_POINTS,
            difficulty: Difficulty::default(),
            kind: QuestionKind::default_for(question_type),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// Checks a question that arrived as a whole, e.g. inside a course body.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.time_limit == 0 {
            return Err(FieldError::new("time_limit", "must be greater than zero"));
        }
        if self.points == 0 {
            return Err(FieldError::new("points", "must be greater than zero"));
        }
        self.kind.validate()
    }

    pub fn apply(&mut self, field: QuizField) -> Result<(), FieldError> {
        let question_type = self.question_type();
        let mismatch = |field: &'static str| {
            FieldError::new(field, format!("not applicable to {question_type} questions"))
        };

        match field {
            QuizField::Question(text) => self.question = text,
            QuizField::TimeLimit(0) => {
                return Err(FieldError::new("time_limit", "must be greater than zero"));
            }
            QuizField::TimeLimit(secs) => self.time_limit = secs,
            QuizField::Points(0) => {
                return Err(FieldError::new("points", "must be greater than zero"));
            }
            QuizField::Points(points) => self.points = points,
            QuizField::Difficulty(difficulty) => self.difficulty = difficulty,
            QuizField::Type(new_type) => {
                if new_type != question_type {
                    self.kind = QuestionKind::default_for(new_type);
                }
            }
            QuizField::Options(new_options) => {
                if new_options.is_empty() {
                    return Err(FieldError::new("options", "at least one option is required"));
                }

                match &mut self.kind {
                    QuestionKind::MultipleChoice {
                        options,
                        correct_answer,
                    } => {
                        if *correct_answer >= new_options.len() {
                            *correct_answer = 0;
                        }
                        *options = new_options;
                    }
                    QuestionKind::MultipleSelect {
                        options,
                        correct_answers,
                    } => {
                        correct_answers.retain(|idx| *idx < new_options.len());
                        *options = new_options;
                    }
                    QuestionKind::OrderSequence {
                        options,
                        correct_order,
                    } => {
                        if new_options.len() != options.len() {
                            *correct_order = (0..new_options.len()).collect();
                        }
                        *options = new_options;
                    }
                    QuestionKind::TrueFalse { .. } | QuestionKind::TypeAnswer { .. } => {
                        return Err(mismatch("options"));
                    }
                }
            }
            QuizField::CorrectOption(idx) => match &mut self.kind {
                QuestionKind::MultipleChoice {
                    options,
                    correct_answer,
                } => {
                    if idx >= options.len() {
                        return Err(FieldError::new("correct_answer", "option index out of range"));
                    }
                    *correct_answer = idx;
                }
                _ => return Err(mismatch("correct_answer")),
            },
            QuizField::CorrectFlag(flag) => match &mut self.kind {
                QuestionKind::TrueFalse { correct_answer } => *correct_answer = flag,
                _ => return Err(mismatch("correct_answer")),
            },
            QuizField::CorrectText(text) => match &mut self.kind {
                QuestionKind::TypeAnswer { correct_text } => *correct_text = text,
                _ => return Err(mismatch("correct_text")),
            },
            QuizField::CorrectSet(set) => match &mut self.kind {
                QuestionKind::MultipleSelect {
                    options,
                    correct_answers,
                } => {
                    if set.iter().any(|idx| *idx >= options.len()) {
                        return Err(FieldError::new("correct_answers", "option index out of range"));
                    }
                    *correct_answers = set;
                }
                _ => return Err(mismatch("correct_answers")),
            },
            QuizField::CorrectOrder(order) => match &mut self.kind {
                QuestionKind::OrderSequence {
                    options,
                    correct_order,
                } => {
                    if !is_permutation(&order, options.len()) {
                        return Err(FieldError::new(
                            "correct_order",
                            "must be a permutation of the option indices",
                        ));
                    }
                    *correct_order = order;
                }
                _ => return Err(mismatch("correct_order")),
            },
        }

        Ok(())
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &idx in order {
        if idx >= len || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

impl Identified for QuizQuestion {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Duplicate for QuizQuestion {
    fn duplicate(&self) -> Self {
        Self {
            id: new_id("question"),
            question: format!("{} (Copy)", self.question),
            ..self.clone()
        }
    }
}
