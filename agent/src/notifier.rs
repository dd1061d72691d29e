//! User-facing notices
//!
//! Orchestrators report progress (transaction hashes, caps, timeouts) through a
//! [`Notifier`] instead of returning formatted replies.

use tracing::{info, warn};

pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Emits notices as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        info!(target: "intents_agent::notice", "{}", message);
    }

    fn warn(&self, message: &str) {
        warn!(target: "intents_agent::notice", "{}", message);
    }
}
