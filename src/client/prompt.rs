use std::{collections::VecDeque, sync::Mutex};

use super::error::ClientError;

/// Blocking pop-ups shown to the user.
pub trait Prompt {
    /// Show a message and wait until it is dismissed.
    fn alert(&self, message: &str);
    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> bool;
}

/// Report a failed action to the user.
pub fn show_error(prompt: &impl Prompt, err: &ClientError) {
    prompt.alert(&err.to_string());
}

/// [`Prompt`] that remembers everything it was shown and answers
/// confirmations from a script (defaulting to "yes").
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    answers: Mutex<VecDeque<bool>>,
    alerts: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    /// Prompt confirming every question.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answers for the next confirmations.
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Alerts shown so far.
    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }

    /// Confirmation questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }
}

impl Prompt for RecordingPrompt {
    fn alert(&self, message: &str) {
        lock(&self.alerts).push(message.to_owned());
    }

    fn confirm(&self, question: &str) -> bool {
        lock(&self.questions).push(question.to_owned());
        lock(&self.answers).pop_front().unwrap_or(true)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
