//! Operator interaction: blocking confirmations and alerts.

use dialoguer::Confirm;
use tracing::{info, warn};

/// How views ask before destructive actions and how they report outcomes.
pub trait Interaction: Send + Sync {
    /// Ask a yes/no question. Returning `false` cancels the action.
    fn confirm(&self, message: &str) -> bool;

    /// Show a message the operator must see (errors, action results).
    fn alert(&self, message: &str);
}

/// Terminal interaction. With `assume_yes` every confirmation is accepted.
pub struct Console {
    assume_yes: bool,
}

impl Console {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Interaction for Console {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            info!("Auto-confirmed: {}", message.replace('\n', " "));
            return true;
        }

        match Confirm::new().with_prompt(message).default(false).interact() {
            Ok(answer) => answer,
            Err(e) => {
                // No TTY (piped input, CI): treat as declined.
                warn!("Confirmation unavailable ({}), declining: {}", e, message);
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[cfg(test)]
pub mod testing {
    use super::Interaction;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted answers for confirmations; records everything shown.
    #[derive(Default)]
    pub struct Scripted {
        answers: Mutex<VecDeque<bool>>,
        pub confirmations: Mutex<Vec<String>>,
        pub alerts: Mutex<Vec<String>>,
    }

    impl Scripted {
        pub fn answering(answers: &[bool]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
                ..Default::default()
            }
        }

        pub fn last_alert(&self) -> Option<String> {
            self.alerts.lock().last().cloned()
        }

        pub fn last_confirmation(&self) -> Option<String> {
            self.confirmations.lock().last().cloned()
        }
    }

    impl Interaction for Scripted {
        fn confirm(&self, message: &str) -> bool {
            self.confirmations.lock().push(message.to_string());
            self.answers.lock().pop_front().unwrap_or(false)
        }

        fn alert(&self, message: &str) {
            self.alerts.lock().push(message.to_string());
        }
    }
}
