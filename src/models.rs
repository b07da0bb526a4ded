//! Assessment data model. Field names follow the JSON the model is asked to emit.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Disability labels offered during onboarding. Any other label is accepted as well.
pub const KNOWN_DISABILITIES: [&str; 4] = [
    "Disabilitas Visual",
    "Disabilitas Audio",
    "Disabilitas Kognitif",
    "Disabilitas Motorik",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    #[default]
    Normal,
    Large,
    Xlarge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub font_size: FontSize,
    pub contrast: Contrast,
}

/// Self-reported profile collected at onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    /// Free text, as entered.
    pub age: String,
    /// Insertion-ordered, no duplicates.
    pub disabilities: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, age: impl Into<String>) -> Self {
        Self { name: name.into(), age: age.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_disability(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !self.disabilities.contains(&label) {
            self.disabilities.push(label);
        }
        self
    }

    /// Add `label` if absent, remove it if present.
    pub fn toggle_disability(&mut self, label: &str) {
        if let Some(pos) = self.disabilities.iter().position(|d| d == label) {
            self.disabilities.remove(pos);
        } else {
            self.disabilities.push(label.to_string());
        }
    }

    pub fn has_disability(&self) -> bool {
        !self.disabilities.is_empty()
    }

    /// Name and age are both required before a quiz can start.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.age.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum QuestionType {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "essay")]
    Essay,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::Essay => "essay",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "multiple-choice" => Some(Self::MultipleChoice),
            "essay" => Some(Self::Essay),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: u32,
    pub question: String,
    /// Empty for essay questions.
    pub options: Vec<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
}

impl Question {
    pub fn is_essay(&self) -> bool {
        self.kind == QuestionType::Essay
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u32,
    pub answer: String,
    pub category: String,
}

impl Answer {
    /// Answer to `question`, carrying over its id and category.
    pub fn for_question(question: &Question, answer: impl Into<String>) -> Self {
        Self {
            question_id: question.id,
            answer: answer.into(),
            category: question.category.clone(),
        }
    }
}

/// Learning styles the analysis prompt asks the model to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    ReadingWriting,
    Social,
    Solitary,
    Logical,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 7] = [
        Self::Visual,
        Self::Auditory,
        Self::Kinesthetic,
        Self::ReadingWriting,
        Self::Social,
        Self::Solitary,
        Self::Logical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Visual => "Visual",
            Self::Auditory => "Auditory",
            Self::Kinesthetic => "Kinesthetic",
            Self::ReadingWriting => "Reading-Writing",
            Self::Social => "Social",
            Self::Solitary => "Solitary",
            Self::Logical => "Logical",
        }
    }

    /// Match model output such as `"Visual"`, `"kinesthetic learner"` or
    /// `"Reading/Writing"` onto the vocabulary. The first style mentioned wins.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let squashed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        Self::ALL
            .iter()
            .filter_map(|style| {
                let needle = style.label().to_lowercase().replace('-', " ");
                squashed.find(&needle).map(|pos| (pos, *style))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, style)| style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub passion: Vec<String>,
    pub learning_style: String,
    pub career_potential: Vec<String>,
    pub recommendations: String,
    pub tips: Vec<String>,
    pub activities: Vec<String>,
}

impl TestResult {
    pub fn learning_style_kind(&self) -> Option<LearningStyle> {
        LearningStyle::parse(&self.learning_style)
    }
}

/// A completed assessment kept in the in-memory history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub result: TestResult,
    pub completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn now(result: TestResult) -> Self {
        Self { result, completed_at: Utc::now() }
    }
}
