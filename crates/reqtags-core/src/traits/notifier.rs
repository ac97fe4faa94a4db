//! Notification transport.

use serde::{Deserialize, Serialize};

use crate::errors::NotifyError;
use crate::types::Contact;

/// A rendered notice ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subsystem: String,
    pub recipients: Vec<Contact>,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Delivers notifications; the host provides the email transport.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
