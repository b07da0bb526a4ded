use thiserror::Error;

use crate::json_utils::JsonKind;

/// Failure talking to the text-generation endpoint. Every provider maps its
/// failures onto these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
    #[error("Provider returned no text")]
    EmptyResponse,
    #[error("Mock error: {0}")]
    Mock(String),
}

impl TransportError {
    /// Whether a later identical request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit | Self::EmptyResponse => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Authentication | Self::Mock(_) => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON {kind} found in response")]
    NotFound { kind: JsonKind },
    #[error("JSON {kind} in response is never closed")]
    Unterminated { kind: JsonKind },
}

/// Well-formed JSON whose shape does not match what was asked for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unexpected shape: {0}")]
    Shape(String),
    #[error("question {id}: unknown question type '{value}'")]
    UnknownType { id: u32, value: String },
    #[error("question {id}: {kind} question has {count} options")]
    OptionsMismatch { id: u32, kind: &'static str, count: usize },
    #[error("question {id}: {field} must not be blank")]
    BlankQuestionField { id: u32, field: &'static str },
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("duplicate question id {0}")]
    DuplicateId(u32),
    #[error("response contains no questions")]
    EmptyBatch,
    #[error("question {id}: expected {expected} question, got {actual}")]
    ModalityMismatch { id: u32, expected: &'static str, actual: &'static str },
    #[error("{0} must contain at least one entry")]
    EmptyList(&'static str),
}

/// Failure of one prompt → transport → extract → decode run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("JSON syntax error: {source}. Extracted text: {raw}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Coarse classification callers can branch on without matching the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Extraction,
    Decode,
    Schema,
    NotInitialized,
    Busy,
    InvalidInput,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Schema(_) => ErrorKind::Schema,
        }
    }
}

/// Error returned by the public assessment operations.
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("failed to generate questions")]
    QuestionGeneration(#[source] PipelineError),
    #[error("failed to analyze answers")]
    AnswerAnalysis(#[source] PipelineError),
    #[error("no question batch has been generated on this service")]
    NotInitialized,
    #[error("another request is already in progress on this service")]
    Busy,
    #[error("incomplete profile: {0}")]
    InvalidProfile(&'static str),
    #[error("answer references question {question_id}, which is not part of the current batch")]
    UnknownQuestion { question_id: u32 },
}

impl AssessmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QuestionGeneration(e) | Self::AnswerAnalysis(e) => e.kind(),
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::Busy => ErrorKind::Busy,
            Self::InvalidProfile(_) | Self::UnknownQuestion { .. } => ErrorKind::InvalidInput,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::QuestionGeneration(PipelineError::Transport(e))
            | Self::AnswerAnalysis(PipelineError::Transport(e)) => e.is_transient(),
            Self::Busy => true,
            _ => false,
        }
    }

    /// Static, localized message for display to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::QuestionGeneration(_) => "Gagal membuat pertanyaan. Silakan coba lagi.",
            Self::AnswerAnalysis(_) | Self::UnknownQuestion { .. } => {
                "Gagal menganalisis jawaban. Silakan coba lagi."
            }
            Self::NotInitialized => "Mulai tes terlebih dahulu.",
            Self::Busy => "Permintaan sebelumnya masih diproses.",
            Self::InvalidProfile(_) => "Lengkapi data profil terlebih dahulu",
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} not set and no key was entered")]
    MissingKey(&'static str),
    #[error("unknown client type '{0}'. Supported: gemini, deepseek, claude, mock")]
    UnknownClient(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
