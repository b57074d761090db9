//! Email composition and delivery
//!
//! `compose` renders the two message pairs (internal notification and
//! acknowledgement) from embedded tera templates; `transport` carries
//! them to one of the two external providers.

pub mod compose;
pub mod transport;

pub use compose::{acknowledgement, internal_notification};
pub use transport::{DeliveryResult, HttpTransport, MailTransport, MockTransport, Provider};

/// One fully rendered outgoing email.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: String,
    /// Display name attached to the sender address.
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub reply_to: Option<String>,
    pub text: String,
    pub html: String,
}
