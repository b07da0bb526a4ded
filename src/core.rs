//! Core API: the model client abstraction and the assessment facade that
//! composes prompt building, transport, extraction and decoding.
//!
//! Quick start:
//! - Build a client (see [`crate::clients`]) and wrap it in [`AssessmentService::new`]
//! - Call [`AssessmentService::generate_questions`] with the user's profile
//! - Collect one [`Answer`] per question and call [`AssessmentService::analyze_answers`]

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::decode::{decode_questions, decode_result, DecodeOptions};
use crate::error::{AssessmentError, PipelineError, TransportError};
use crate::interceptors::Interceptor;
use crate::json_utils::{extract_json, JsonKind};
use crate::models::{Answer, Question, TestResult, UserProfile};
use crate::prompts::{build_analysis_prompt, build_question_prompt, with_schema_guidance, Modality};

/// Low-level model client abstraction.
///
/// Implementors provide `ask_raw`, which sends one prompt and returns the raw
/// model text. One request, one response: no streaming and no retries.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn LowLevelClient>;
}

impl Clone for Box<dyn LowLevelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LowLevelClient for Box<dyn LowLevelClient> {
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError> {
        self.as_ref().ask_raw(prompt).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        self.as_ref().clone_box()
    }
}

/// The two public operations, used for logging and recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateQuestions,
    AnalyzeAnswers,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateQuestions => "generate_questions",
            Self::AnalyzeAnswers => "analyze_answers",
        }
    }
}

/// The batch produced by the last successful generation on a service.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub profile: UserProfile,
    pub questions: Vec<Question>,
    pub started_at: DateTime<Utc>,
}

/// Clears the in-flight flag when the operation ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Assessment facade over a [`LowLevelClient`].
///
/// One operation at a time per instance: an overlapping call fails fast with
/// [`AssessmentError::Busy`]. Analysis requires a batch generated by the same
/// instance.
#[derive(Debug)]
pub struct AssessmentService<C: LowLevelClient> {
    client: C,
    config: ServiceConfig,
    interceptor: Option<Arc<dyn Interceptor>>,
    session: Mutex<Option<QuizSession>>,
    in_flight: AtomicBool,
}

impl<C: LowLevelClient> AssessmentService<C> {
    pub fn new(client: C, config: ServiceConfig) -> Self {
        info!(
            modality_policy = ?config.modality_policy,
            schema_guidance = config.schema_guidance,
            "Creating new AssessmentService"
        );
        Self {
            client,
            config,
            interceptor: None,
            session: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Record every prompt/response exchange through `interceptor`.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of the current session, if a batch has been generated.
    pub fn session(&self) -> Option<QuizSession> {
        self.lock_session().clone()
    }

    pub fn has_session(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Forget the current batch; analysis is unavailable until the next generation.
    pub fn reset_session(&self) {
        *self.lock_session() = None;
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<QuizSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, AssessmentError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("Rejecting overlapping request");
                AssessmentError::Busy
            })?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Generate one batch of questions tailored to `profile`.
    ///
    /// Profiles with any disability get multiple-choice questions with four
    /// options; others get essay questions.
    #[instrument(target = "pasio::service", skip(self, profile), fields(has_disability = profile.has_disability()))]
    pub async fn generate_questions(&self, profile: &UserProfile) -> Result<Vec<Question>, AssessmentError> {
        if !profile.is_complete() {
            return Err(AssessmentError::InvalidProfile("name and age are required"));
        }
        let _guard = self.begin()?;

        let modality = Modality::for_profile(profile);
        let mut prompt = build_question_prompt(profile);
        if self.config.schema_guidance {
            prompt = with_schema_guidance::<Vec<Question>>(prompt);
        }
        info!(modality = ?modality, prompt_len = prompt.len(), "Generating questions");

        let questions = self.question_pipeline(prompt, modality).await.map_err(|e| {
            error!(error = %e, kind = ?e.kind(), "Question generation failed");
            AssessmentError::QuestionGeneration(e)
        })?;

        *self.lock_session() = Some(QuizSession {
            profile: profile.clone(),
            questions: questions.clone(),
            started_at: Utc::now(),
        });
        info!(count = questions.len(), "Question batch ready");
        Ok(questions)
    }

    /// Analyze the answers to the current batch.
    #[instrument(target = "pasio::service", skip(self, profile, answers), fields(answer_count = answers.len()))]
    pub async fn analyze_answers(&self, profile: &UserProfile, answers: &[Answer]) -> Result<TestResult, AssessmentError> {
        let _guard = self.begin()?;

        let batch_ids: HashSet<u32> = {
            let session = self.lock_session();
            match session.as_ref() {
                Some(s) => s.questions.iter().map(|q| q.id).collect(),
                None => {
                    warn!("Analysis requested before any question batch was generated");
                    return Err(AssessmentError::NotInitialized);
                }
            }
        };
        if let Some(stray) = answers.iter().find(|a| !batch_ids.contains(&a.question_id)) {
            return Err(AssessmentError::UnknownQuestion { question_id: stray.question_id });
        }
        if answers.len() < batch_ids.len() {
            debug!(answered = answers.len(), total = batch_ids.len(), "Analyzing a partial quiz");
        }

        let mut prompt = build_analysis_prompt(profile, answers);
        if self.config.schema_guidance {
            prompt = with_schema_guidance::<TestResult>(prompt);
        }
        info!(prompt_len = prompt.len(), "Analyzing answers");

        let result = self.analysis_pipeline(prompt).await.map_err(|e| {
            error!(error = %e, kind = ?e.kind(), "Answer analysis failed");
            AssessmentError::AnswerAnalysis(e)
        })?;

        info!(learning_style = %result.learning_style, "Analysis complete");
        Ok(result)
    }

    async fn question_pipeline(&self, prompt: String, modality: Modality) -> Result<Vec<Question>, PipelineError> {
        let raw = self.exchange(Operation::GenerateQuestions, prompt).await?;
        let json = extract_json(&raw, JsonKind::Array)?;
        decode_questions(json, &DecodeOptions::expecting(modality, self.config.modality_policy))
    }

    async fn analysis_pipeline(&self, prompt: String) -> Result<TestResult, PipelineError> {
        let raw = self.exchange(Operation::AnalyzeAnswers, prompt).await?;
        let json = extract_json(&raw, JsonKind::Object)?;
        decode_result(json)
    }

    async fn exchange(&self, operation: Operation, prompt: String) -> Result<String, TransportError> {
        let raw = match &self.interceptor {
            Some(interceptor) => {
                let raw = self.client.ask_raw(prompt.clone()).await?;
                if let Err(e) = interceptor.save(operation, &prompt, &raw).await {
                    warn!(error = %e, operation = operation.as_str(), "Failed to record exchange");
                }
                raw
            }
            None => self.client.ask_raw(prompt).await?,
        };
        debug!(response_len = raw.len(), operation = operation.as_str(), "Received raw response");
        Ok(raw)
    }
}
