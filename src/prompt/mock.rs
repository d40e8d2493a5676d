use super::Prompt;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted prompt. Queued answers are used first, then the default.
#[derive(Clone)]
pub struct MockPrompt {
    answers: Arc<Mutex<VecDeque<bool>>>,
    default_answer: bool,
    confirmations: Arc<Mutex<Vec<String>>>,
    alerts: Arc<Mutex<Vec<String>>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            default_answer: true,
            confirmations: Arc::new(Mutex::new(Vec::new())),
            alerts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new()
    }

    pub fn declining() -> Self {
        Self::new().with_default_answer(false)
    }

    pub fn with_default_answer(mut self, answer: bool) -> Self {
        self.default_answer = answer;
        self
    }

    pub fn with_answer(self, answer: bool) -> Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn get_confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }

    pub fn get_alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Default for MockPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for MockPrompt {
    async fn confirm(&self, message: &str) -> Result<bool> {
        self.confirmations.lock().unwrap().push(message.to_string());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_answer);
        Ok(answer)
    }

    async fn alert(&self, message: &str) -> Result<()> {
        self.alerts.lock().unwrap().push(message.to_string());
        Ok(())
    }
}
