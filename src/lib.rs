pub mod app;
pub mod clients;
pub mod config;
pub mod core;
pub mod decode;
pub mod error;
pub mod interceptors;
pub mod json_utils;
pub mod models;
pub mod prompts;

// Convenient re-exports
pub use crate::core::{AssessmentService, LowLevelClient};
pub use error::{AssessmentError, ErrorKind};
pub use json_utils::{extract_json, JsonKind};
pub use models::{Answer, Question, QuestionType, TestResult, UserProfile};
