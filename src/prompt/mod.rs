//! User interaction for confirmations and alerts
//!
//! The dashboard asks before deleting anything and tells the user when a
//! thumbnail is refused.

pub mod console;
pub mod mock;

pub use console::ConsolePrompt;
pub use mock::MockPrompt;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Prompt: Send + Sync {
    /// Yes/no question. `false` means the user declined.
    async fn confirm(&self, message: &str) -> Result<bool>;
    async fn alert(&self, message: &str) -> Result<()>;
}
