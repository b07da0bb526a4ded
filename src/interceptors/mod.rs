use async_trait::async_trait;
use std::fmt::Debug;

use crate::core::Operation;

/// Observer for every prompt/response pair exchanged with the model.
///
/// Recording failures are logged by the service and never fail the operation.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, operation: Operation, prompt: &str, response: &str) -> std::io::Result<()>;
}

pub mod file;
pub use file::FileInterceptor;
