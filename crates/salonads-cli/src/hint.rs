//! What the CLI says when a session ends.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use salonads_client::LoginRedirect;

/// Login redirect hook for the terminal. An ended session prints a hint to
/// sign in again, unless the user asked for the logout.
#[derive(Debug, Default)]
pub struct SignInHint {
    expected: AtomicBool,
}

impl SignInHint {
    /// Marks the coming session end as requested by the user.
    pub fn expect_logout(&self) {
        self.expected.store(true, Ordering::SeqCst);
    }

    fn message(&self) -> Option<&'static str> {
        if self.expected.swap(false, Ordering::SeqCst) {
            None
        } else {
            Some("Session ended. Run `salonads login` to sign in again.")
        }
    }
}

impl LoginRedirect for SignInHint {
    fn redirect_to_login(&self, login_page: &str) {
        tracing::debug!(login_page, "Session ended");
        if let Some(message) = self.message() {
            eprintln!("{} {}", "!".yellow(), message);
        }
    }
}
