use super::Prompt;
use crate::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Terminal prompt reading answers from stdin.
pub struct ConsolePrompt {
    assume_yes: bool,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self { assume_yes: false }
    }

    /// Answers every confirmation with yes without reading stdin.
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Prompt for ConsolePrompt {
    async fn confirm(&self, message: &str) -> Result<bool> {
        if self.assume_yes {
            tracing::info!("Confirmed without asking: {}", message.replace('\n', " "));
            return Ok(true);
        }

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{}\n[y/N] ", message).as_bytes())
            .await?;
        stdout.flush().await?;

        let mut answer = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await?;
        Ok(is_affirmative(&answer))
    }

    async fn alert(&self, message: &str) -> Result<()> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(format!("{}\n", message).as_bytes()).await?;
        stderr.flush().await?;
        Ok(())
    }
}
