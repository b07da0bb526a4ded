//! Turning extracted JSON text into validated domain values.
//!
//! Decoding happens in two stages: syntax (`serde_json::Value`) and then shape.
//! A syntax failure is a [`PipelineError::Decode`]; anything that parses but does
//! not look like what the prompt asked for is a [`SchemaError`].

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ModalityPolicy;
use crate::error::{PipelineError, SchemaError};
use crate::models::{Question, QuestionType, TestResult};
use crate::prompts::{Modality, BATCH_SIZE, OPTIONS_PER_QUESTION};

/// Knobs for question validation.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Modality the prompt requested, if known.
    pub expected: Option<Modality>,
    pub policy: ModalityPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { expected: None, policy: ModalityPolicy::Strict }
    }
}

impl DecodeOptions {
    pub fn expecting(modality: Modality, policy: ModalityPolicy) -> Self {
        Self { expected: Some(modality), policy }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: u32,
    question: String,
    options: Vec<String>,
    category: String,
    #[serde(rename = "type")]
    kind: String,
}

fn parse_value(json: &str) -> Result<Value, PipelineError> {
    serde_json::from_str(json).map_err(|source| PipelineError::Decode { source, raw: json.to_string() })
}

fn validate_question(raw: RawQuestion, options: &DecodeOptions) -> Result<Question, SchemaError> {
    let id = raw.id;
    let kind = QuestionType::parse(raw.kind.trim())
        .ok_or_else(|| SchemaError::UnknownType { id, value: raw.kind.clone() })?;

    if raw.question.trim().is_empty() {
        return Err(SchemaError::BlankQuestionField { id, field: "question" });
    }

    match kind {
        QuestionType::Essay if !raw.options.is_empty() => {
            return Err(SchemaError::OptionsMismatch { id, kind: kind.as_str(), count: raw.options.len() });
        }
        QuestionType::MultipleChoice if raw.options.is_empty() => {
            return Err(SchemaError::OptionsMismatch { id, kind: kind.as_str(), count: 0 });
        }
        QuestionType::MultipleChoice if raw.options.iter().any(|o| o.trim().is_empty()) => {
            return Err(SchemaError::BlankQuestionField { id, field: "options" });
        }
        _ => {}
    }

    if kind == QuestionType::MultipleChoice && raw.options.len() != OPTIONS_PER_QUESTION {
        let count = raw.options.len();
        match options.policy {
            ModalityPolicy::Strict => {
                return Err(SchemaError::OptionsMismatch { id, kind: kind.as_str(), count });
            }
            ModalityPolicy::Lenient => {
                warn!(target: "pasio::decode", id, count, expected = OPTIONS_PER_QUESTION, "option count differs from request");
            }
        }
    }

    if let (Some(expected), ModalityPolicy::Strict) = (options.expected, options.policy) {
        if expected.question_type() != kind {
            return Err(SchemaError::ModalityMismatch {
                id,
                expected: expected.type_label(),
                actual: kind.as_str(),
            });
        }
    }

    Ok(Question {
        id,
        question: raw.question,
        options: raw.options,
        category: raw.category,
        kind,
    })
}

/// Decode and validate a batch of questions from a JSON array.
#[instrument(target = "pasio::decode", skip(json, options), fields(json_len = json.len()))]
pub fn decode_questions(json: &str, options: &DecodeOptions) -> Result<Vec<Question>, PipelineError> {
    let value = parse_value(json)?;
    let raws: Vec<RawQuestion> =
        serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))?;

    if raws.is_empty() {
        return Err(SchemaError::EmptyBatch.into());
    }

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raws.len());
    for raw in raws {
        if !seen.insert(raw.id) {
            return Err(SchemaError::DuplicateId(raw.id).into());
        }
        questions.push(validate_question(raw, options)?);
    }

    if questions.len() != BATCH_SIZE {
        warn!(target: "pasio::decode", count = questions.len(), expected = BATCH_SIZE, "question batch size differs from request");
    }
    debug!(target: "pasio::decode", count = questions.len(), "decoded questions");
    Ok(questions)
}

/// Decode and validate an analysis result from a JSON object.
#[instrument(target = "pasio::decode", skip(json), fields(json_len = json.len()))]
pub fn decode_result(json: &str) -> Result<TestResult, PipelineError> {
    let value = parse_value(json)?;
    let result: TestResult =
        serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))?;

    if result.learning_style.trim().is_empty() {
        return Err(SchemaError::BlankField("learningStyle").into());
    }
    if result.recommendations.trim().is_empty() {
        return Err(SchemaError::BlankField("recommendations").into());
    }
    let lists: [(&'static str, &Vec<String>); 4] = [
        ("passion", &result.passion),
        ("careerPotential", &result.career_potential),
        ("tips", &result.tips),
        ("activities", &result.activities),
    ];
    for (name, list) in lists {
        if list.iter().all(|s| s.trim().is_empty()) {
            return Err(SchemaError::EmptyList(name).into());
        }
    }

    if result.learning_style_kind().is_none() {
        debug!(target: "pasio::decode", learning_style = %result.learning_style, "learning style outside known vocabulary");
    }
    Ok(result)
}
