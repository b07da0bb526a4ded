//! Headless application state for the assessment flow.
//!
//! Screens form a closed set with an explicit transition table. `Quiz` and
//! `Result` are only entered through [`AppState::start_quiz`] and
//! [`AppState::finish_quiz`]; everything else goes through [`AppState::navigate`].
//! Nothing here renders; a front-end reads the state and calls these methods.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{AssessmentService, LowLevelClient};
use crate::error::AssessmentError;
use crate::models::{Answer, Contrast, FontSize, HistoryEntry, Question, TestResult, UserProfile};

pub const PROFILE_INCOMPLETE_MSG: &str = "Lengkapi data profil terlebih dahulu";
pub const GENERATION_FAILED_MSG: &str = "Gagal generate pertanyaan. Periksa API Key Anda.";
pub const ANALYSIS_FAILED_MSG: &str = "Gagal menganalisis jawaban. Coba lagi.";
pub const BLANK_ANSWER_MSG: &str = "Mohon isi jawaban terlebih dahulu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    #[default]
    Home,
    Onboarding,
    Quiz,
    Result,
    History,
    Settings,
}

impl Screen {
    /// Screens reachable in one step from `self`.
    pub fn targets(self) -> &'static [Screen] {
        use Screen::*;
        match self {
            Home => &[Onboarding, History, Settings],
            Onboarding => &[Home, Quiz],
            Quiz => &[Quiz, Result],
            Result => &[Home, Onboarding],
            History => &[Home],
            Settings => &[Home],
        }
    }

    pub fn can_transition_to(self, to: Screen) -> bool {
        self.targets().contains(&to)
    }

    /// Screens that can only be entered by completing a step of the quiz flow.
    fn flow_only(self) -> bool {
        matches!(self, Screen::Quiz | Screen::Result)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("cannot go from {from:?} to {to:?}")]
    NotAllowed { from: Screen, to: Screen },
    #[error("{0:?} is only reachable through the quiz flow")]
    FlowOnly(Screen),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizInputError {
    #[error("no quiz in progress")]
    NotInQuiz,
    #[error("answer must not be blank")]
    BlankAnswer,
    #[error("option {index} out of range ({count} options)")]
    OptionOutOfRange { index: usize, count: usize },
    #[error("'{0}' is not one of the options")]
    UnknownOption(String),
    #[error("current question is {0}; use the matching input")]
    WrongInput(&'static str),
    #[error("every question has already been answered")]
    AlreadyComplete,
    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Input(#[from] QuizInputError),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
}

/// Outcome of recording one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProgress {
    /// Moved on to the question at this index.
    Next(usize),
    /// The last question was answered; call `finish_quiz`.
    Finished,
}

/// Everything a front-end needs, owned in one place.
#[derive(Debug, Default)]
pub struct AppState {
    screen: Screen,
    profile: UserProfile,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<Answer>,
    result: Option<TestResult>,
    history: Vec<HistoryEntry>,
    loading: bool,
    error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message to show the user, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.screen == Screen::Quiz {
            self.questions.get(self.current_index)
        } else {
            None
        }
    }

    /// 1-based position of the current question and the batch size.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.questions.len())
    }

    fn profile_locked(&self) -> bool {
        matches!(self.screen, Screen::Quiz | Screen::Result)
    }

    /// Returns false while a quiz is running, when the profile is frozen.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        if self.profile_locked() {
            return false;
        }
        self.profile.name = name.into();
        true
    }

    pub fn set_age(&mut self, age: impl Into<String>) -> bool {
        if self.profile_locked() {
            return false;
        }
        self.profile.age = age.into();
        true
    }

    pub fn toggle_disability(&mut self, label: &str) -> bool {
        if self.profile_locked() {
            return false;
        }
        self.profile.toggle_disability(label);
        true
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.profile.preferences.font_size = size;
    }

    pub fn set_contrast(&mut self, contrast: Contrast) {
        self.profile.preferences.contrast = contrast;
    }

    /// Move to `to` along the transition table. Leaving `Result` clears the quiz.
    pub fn navigate(&mut self, to: Screen) -> Result<(), NavigationError> {
        if to.flow_only() {
            return Err(NavigationError::FlowOnly(to));
        }
        if !self.screen.can_transition_to(to) {
            return Err(NavigationError::NotAllowed { from: self.screen, to });
        }
        if self.screen == Screen::Result {
            self.clear_quiz();
        }
        debug!(from = ?self.screen, to = ?to, "navigate");
        self.screen = to;
        self.error = None;
        Ok(())
    }

    /// Result → Home, dropping the finished quiz but keeping history.
    pub fn go_home(&mut self) -> Result<(), NavigationError> {
        self.navigate(Screen::Home)
    }

    /// Result → Onboarding for another attempt with the same profile.
    pub fn retake(&mut self) -> Result<(), NavigationError> {
        self.navigate(Screen::Onboarding)
    }

    fn clear_quiz(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.current_index = 0;
        self.result = None;
    }

    /// Onboarding → Quiz: generate a batch for the current profile.
    ///
    /// On failure the screen does not change and `error()` carries the message.
    pub async fn start_quiz<C: LowLevelClient>(&mut self, service: &AssessmentService<C>) -> Result<usize, FlowError> {
        if self.screen != Screen::Onboarding {
            return Err(NavigationError::NotAllowed { from: self.screen, to: Screen::Quiz }.into());
        }
        if !self.profile.is_complete() {
            self.error = Some(PROFILE_INCOMPLETE_MSG.to_string());
            return Err(AssessmentError::InvalidProfile("name and age are required").into());
        }

        self.loading = true;
        self.error = None;
        let outcome = service.generate_questions(&self.profile).await;
        self.loading = false;

        match outcome {
            Ok(questions) => {
                info!(count = questions.len(), "Quiz started");
                self.questions = questions;
                self.current_index = 0;
                self.answers.clear();
                self.result = None;
                self.screen = Screen::Quiz;
                Ok(self.questions.len())
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Could not start quiz");
                self.error = Some(GENERATION_FAILED_MSG.to_string());
                Err(e.into())
            }
        }
    }

    fn question_for_input(&self) -> Result<&Question, QuizInputError> {
        if self.screen != Screen::Quiz {
            return Err(QuizInputError::NotInQuiz);
        }
        if self.answers.len() >= self.questions.len() {
            return Err(QuizInputError::AlreadyComplete);
        }
        self.questions.get(self.current_index).ok_or(QuizInputError::NotInQuiz)
    }

    /// Answer the current question with free text (essay) or an option's text
    /// (multiple choice).
    pub fn submit_answer(&mut self, text: &str) -> Result<QuizProgress, QuizInputError> {
        let question = self.question_for_input()?.clone();
        let text = text.trim();
        if text.is_empty() {
            self.error = Some(BLANK_ANSWER_MSG.to_string());
            return Err(QuizInputError::BlankAnswer);
        }
        if !question.is_essay() && !question.options.iter().any(|o| o == text) {
            return Err(QuizInputError::UnknownOption(text.to_string()));
        }
        let answer = Answer::for_question(&question, text);
        Ok(self.record(answer))
    }

    /// Pick option `index` (0-based) of the current multiple-choice question.
    pub fn choose_option(&mut self, index: usize) -> Result<QuizProgress, QuizInputError> {
        let question = self.question_for_input()?;
        if question.is_essay() {
            return Err(QuizInputError::WrongInput(question.kind.as_str()));
        }
        let option = question
            .options
            .get(index)
            .ok_or(QuizInputError::OptionOutOfRange { index, count: question.options.len() })?;
        let answer = Answer::for_question(question, option.clone());
        Ok(self.record(answer))
    }

    fn record(&mut self, answer: Answer) -> QuizProgress {
        self.answers.push(answer);
        self.error = None;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            QuizProgress::Next(self.current_index)
        } else {
            QuizProgress::Finished
        }
    }

    /// Quiz → Result: analyze the collected answers.
    ///
    /// On failure the answers are kept and the call may be repeated.
    pub async fn finish_quiz<C: LowLevelClient>(&mut self, service: &AssessmentService<C>) -> Result<&TestResult, FlowError> {
        if self.screen != Screen::Quiz {
            return Err(QuizInputError::NotInQuiz.into());
        }
        if self.answers.len() < self.questions.len() {
            return Err(QuizInputError::Incomplete { answered: self.answers.len(), total: self.questions.len() }.into());
        }

        self.loading = true;
        self.error = None;
        let outcome = service.analyze_answers(&self.profile, &self.answers).await;
        self.loading = false;

        match outcome {
            Ok(result) => {
                self.history.push(HistoryEntry::now(result.clone()));
                self.screen = Screen::Result;
                let result = &*self.result.insert(result);
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Could not analyze answers");
                self.error = Some(ANALYSIS_FAILED_MSG.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        assert!(Screen::Home.can_transition_to(Screen::Onboarding));
        assert!(Screen::Quiz.can_transition_to(Screen::Quiz));
        assert!(!Screen::Home.can_transition_to(Screen::Result));
        assert!(!Screen::History.can_transition_to(Screen::Settings));
        assert!(!Screen::Quiz.can_transition_to(Screen::Home));
    }

    #[test]
    fn navigate_rejects_flow_only_and_unlisted_moves() {
        let mut app = AppState::new();
        assert_eq!(app.navigate(Screen::Quiz), Err(NavigationError::FlowOnly(Screen::Quiz)));
        assert_eq!(
            app.navigate(Screen::Home),
            Err(NavigationError::NotAllowed { from: Screen::Home, to: Screen::Home })
        );
        app.navigate(Screen::Settings).unwrap();
        app.set_font_size(FontSize::Xlarge);
        app.navigate(Screen::Home).unwrap();
        assert_eq!(app.profile().preferences.font_size, FontSize::Xlarge);
    }

    #[test]
    fn answers_rejected_outside_quiz() {
        let mut app = AppState::new();
        assert_eq!(app.submit_answer("x"), Err(QuizInputError::NotInQuiz));
        assert_eq!(app.choose_option(0), Err(QuizInputError::NotInQuiz));
    }
}
