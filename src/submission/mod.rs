//! Wire model for form submissions, schema validation, and the
//! derived per-request metadata
//!
//! Field names follow the form payload sent by the presentation tier
//! (`companyWebsite` is the honeypot, `turnstileToken` the challenge
//! token). Every field is defaulted during deserialization so that a
//! missing required field surfaces as a field-level validation error
//! rather than a parse failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Which form produced the submission; changes email subject and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Contact,
    Questionnaire,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Contact => "contact",
            Source::Questionnaire => "questionnaire",
        }
    }

    /// Title shown at the top of the internal notification.
    pub fn title(self) -> &'static str {
        match self {
            Source::Contact => "New Website Inquiry",
            Source::Questionnaire => "Website Questionnaire",
        }
    }

    /// Short form used in the internal notification subject.
    pub fn subject_prefix(self) -> &'static str {
        match self {
            Source::Contact => "Inquiry",
            Source::Questionnaire => "Questionnaire",
        }
    }
}

/// One form submission as received on the wire. Transient: consumed
/// during handling, never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Honeypot. Hidden on the form; any non-blank value marks spam.
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub turnstile_token: Option<String>,
    #[serde(default)]
    pub source: Source,
}

/// Violated constraints keyed by field name, suitable for the
/// `details` member of the 400 response.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

impl SubmissionRequest {
    /// Check every schema constraint, collecting all violations rather
    /// than stopping at the first.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let name_len = self.name.chars().count();
        if name_len < 2 {
            field_error(&mut errors, "name", "must be at least 2 characters");
        } else if name_len > 100 {
            field_error(&mut errors, "name", "must be at most 100 characters");
        }

        if self.email.chars().count() > 254 {
            field_error(&mut errors, "email", "must be at most 254 characters");
        } else if !is_valid_email(&self.email) {
            field_error(&mut errors, "email", "must be a valid email address");
        }

        if let Some(phone) = &self.phone {
            if phone.chars().count() > 50 {
                field_error(&mut errors, "phone", "must be at most 50 characters");
            }
        }

        let message_len = self.message.chars().count();
        if message_len < 10 {
            field_error(&mut errors, "message", "must be at least 10 characters");
        } else if message_len > 5000 {
            field_error(&mut errors, "message", "must be at most 5000 characters");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// A populated honeypot marks the submission as automated spam.
    pub fn is_spam(&self) -> bool {
        self.company_website
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    /// The challenge token, if one was supplied with real content.
    pub fn challenge_token(&self) -> Option<&str> {
        self.turnstile_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// The optional phone number, blank treated as absent.
    pub fn phone_display(&self) -> Option<&str> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}

fn field_error(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors.entry(field).or_default().push(message.to_string());
}

/// Pragmatic email syntax check: one `@`, non-empty local part, dotted
/// domain, no whitespace. Deliverability is the provider's problem.
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Values derived per request and interpolated into the outgoing
/// email. Read from the inbound request, never validated, never
/// stored.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Random correlation id echoed back to the caller.
    pub reference_id: String,
    pub submitted_at: DateTime<Utc>,
    /// Referring page URL (Referer header).
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

impl RequestMeta {
    pub fn new(
        page_url: Option<String>,
        user_agent: Option<String>,
        client_ip: Option<String>,
    ) -> Self {
        Self {
            reference_id: Uuid::new_v4().to_string(),
            submitted_at: Utc::now(),
            page_url,
            user_agent,
            client_ip,
        }
    }

    /// Human-friendly UTC timestamp for email bodies.
    pub fn submitted_at_display(&self) -> String {
        self.submitted_at
            .format("%Y-%m-%d %H:%M:%S%.3f UTC")
            .to_string()
    }
}
