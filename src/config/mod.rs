//! Environment-driven deployment configuration
//!
//! All configuration is read once at startup into [`RelayConfig`] and
//! injected into the handler state. Nothing reads the environment
//! mid-request, which keeps the pipeline testable with constructed
//! configurations.

use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";
pub const DEFAULT_MAILCHANNELS_API_URL: &str = "https://api.mailchannels.net/tx/v1/send";

/// Deployment configuration for the relay.
///
/// The `Option` fields are behavior toggles: a missing destination or
/// sender address turns every submission into a 500 configuration
/// error, a present challenge secret makes token verification
/// mandatory, and a present Resend API key selects the primary
/// provider and enables the acknowledgement email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Destination inbox for internal notifications.
    pub to_email: Option<String>,
    /// Sender address used for all outgoing mail.
    pub from_email: Option<String>,
    /// Turnstile shared secret; presence makes the challenge token mandatory.
    pub turnstile_secret: Option<String>,
    /// Resend API key; presence selects Resend over MailChannels.
    pub resend_api_key: Option<String>,
    pub site: SiteIdentity,
    pub endpoints: Endpoints,
}

/// Site identity interpolated into email copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteIdentity {
    pub name: String,
    pub url: String,
    pub contact_phone: String,
    pub contact_hours: String,
}

impl Default for SiteIdentity {
    fn default() -> Self {
        Self {
            name: "Website".to_string(),
            url: String::new(),
            contact_phone: String::new(),
            contact_hours: String::new(),
        }
    }
}

/// External service endpoints. Defaults are the production URLs;
/// overridable so tests can point the real transports at stub servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub turnstile_verify_url: String,
    pub resend_api_url: String,
    pub mailchannels_api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            turnstile_verify_url: DEFAULT_TURNSTILE_VERIFY_URL.to_string(),
            resend_api_url: DEFAULT_RESEND_API_URL.to_string(),
            mailchannels_api_url: DEFAULT_MAILCHANNELS_API_URL.to_string(),
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            to_email: env_opt("CONTACT_TO_EMAIL"),
            from_email: env_opt("CONTACT_FROM_EMAIL"),
            turnstile_secret: env_opt("TURNSTILE_SECRET_KEY"),
            resend_api_key: env_opt("RESEND_API_KEY"),
            site: SiteIdentity {
                name: env_opt("SITE_NAME").unwrap_or(defaults.site.name),
                url: env_opt("SITE_URL").unwrap_or(defaults.site.url),
                contact_phone: env_opt("CONTACT_PHONE").unwrap_or(defaults.site.contact_phone),
                contact_hours: env_opt("CONTACT_HOURS").unwrap_or(defaults.site.contact_hours),
            },
            endpoints: Endpoints {
                turnstile_verify_url: env_opt("TURNSTILE_VERIFY_URL")
                    .unwrap_or(defaults.endpoints.turnstile_verify_url),
                resend_api_url: env_opt("RESEND_API_URL")
                    .unwrap_or(defaults.endpoints.resend_api_url),
                mailchannels_api_url: env_opt("MAILCHANNELS_API_URL")
                    .unwrap_or(defaults.endpoints.mailchannels_api_url),
            },
        }
    }

    /// Whether both addresses required for delivery are present.
    pub fn delivery_configured(&self) -> bool {
        self.to_email.is_some() && self.from_email.is_some()
    }

    /// Whether the key-authenticated primary provider is configured.
    pub fn primary_provider_configured(&self) -> bool {
        self.resend_api_key.is_some()
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
