use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    terminal,
};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// How long the interactive key prompt waits for input.
const KEY_PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when the model answers with a question type, or a multiple-choice
/// option count, other than the one requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModalityPolicy {
    /// Reject the batch with `SchemaError::ModalityMismatch` or `SchemaError::OptionsMismatch`.
    #[default]
    Strict,
    /// Accept any well-formed question regardless of type; odd option counts are logged.
    Lenient,
}

/// Behavior of an [`AssessmentService`](crate::core::AssessmentService).
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub modality_policy: ModalityPolicy,
    /// Append a JSON Schema of the expected output to every prompt.
    pub schema_guidance: bool,
}

impl ServiceConfig {
    #[must_use]
    pub const fn with_modality_policy(mut self, policy: ModalityPolicy) -> Self {
        self.modality_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_schema_guidance(mut self, enabled: bool) -> Self {
        self.schema_guidance = enabled;
        self
    }
}

/// Types that can retrieve their API key from the environment.
pub trait KeyFromEnv {
    /// Primary environment variable for this client's API key.
    const KEY_NAME: &'static str;
    /// Checked in order when `KEY_NAME` is unset.
    const FALLBACK_KEY_NAMES: &'static [&'static str] = &[];

    /// Look in the process environment, after loading `.env` if present.
    fn find_key() -> Option<String> {
        let _ = dotenvy::dotenv();

        std::iter::once(Self::KEY_NAME)
            .chain(Self::FALLBACK_KEY_NAMES.iter().copied())
            .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Like `find_key`, but asks on the terminal when nothing is configured and
    /// offers to persist the entered key to `.env`.
    fn find_key_with_user() -> Result<String, ConfigError> {
        if let Some(key) = Self::find_key() {
            return Ok(key);
        }

        print!(
            "Environment variable {} not found. Please enter the API key ({}s timeout): ",
            Self::KEY_NAME,
            KEY_PROMPT_TIMEOUT.as_secs()
        );
        io::stdout().flush()?;

        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let _ = sender.send(input.trim().to_string());
            }
        });

        let api_key = match receiver.recv_timeout(KEY_PROMPT_TIMEOUT) {
            Ok(input) if !input.is_empty() => input,
            _ => return Err(ConfigError::MissingKey(Self::KEY_NAME)),
        };

        if Self::prompt_save_to_env()? {
            match Self::save_to_env_file(&api_key) {
                Ok(()) => println!("API key saved to .env file"),
                Err(e) => warn!(error = %e, "failed to save API key to .env"),
            }
        }

        Ok(api_key)
    }

    /// Single keystroke y/N, falling back to a line read when raw mode is unavailable.
    fn prompt_save_to_env() -> Result<bool, ConfigError> {
        print!("Add {} to .env file? (y/N): ", Self::KEY_NAME);
        io::stdout().flush()?;

        match read_single_key() {
            Ok(yes) => {
                println!("{}", if yes { "y" } else { "n" });
                Ok(yes)
            }
            Err(e) => {
                debug!(error = %e, "raw mode unavailable, reading a line instead");
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                Ok(input.trim().eq_ignore_ascii_case("y"))
            }
        }
    }

    /// Append `KEY_NAME=<key>` to `.env` unless the key is already there.
    fn save_to_env_file(api_key: &str) -> Result<(), ConfigError> {
        if let Ok(content) = std::fs::read_to_string(".env") {
            if content.contains(&format!("{}=", Self::KEY_NAME)) {
                return Ok(());
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(".env")?;
        writeln!(file, "{}={}", Self::KEY_NAME, api_key)?;
        Ok(())
    }
}

fn read_single_key() -> io::Result<bool> {
    terminal::enable_raw_mode()?;
    let answer = poll_yes();
    terminal::disable_raw_mode()?;
    answer
}

fn poll_yes() -> io::Result<bool> {
    if !event::poll(KEY_PROMPT_TIMEOUT)? {
        return Ok(false);
    }
    Ok(matches!(event::read()?, Event::Key(KeyEvent { code: KeyCode::Char('y' | 'Y'), .. })))
}
