#[cfg(feature = "anthropic")]
pub mod claude;
#[cfg(feature = "deepseek")]
pub mod deepseek;
pub mod flexible;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod mock;

#[cfg(feature = "anthropic")]
pub use claude::*;
#[cfg(feature = "deepseek")]
pub use deepseek::*;
pub use flexible::*;
#[cfg(feature = "gemini")]
pub use gemini::*;
pub use mock::*;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::warn;

use crate::error::TransportError;

#[allow(dead_code)]
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default HTTP client");
        Client::new()
    })
}

/// Map a non-success status and body onto the transport taxonomy.
#[allow(dead_code)]
pub(crate) fn status_error(status: StatusCode, body: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimit,
        _ => TransportError::Api { status: status.as_u16(), message: body },
    }
}
