//! Bot-challenge verification seam
//!
//! [`ChallengeVerifier`] abstracts the external human-verification
//! service so the pipeline can be tested without network access.
//! [`TurnstileVerifier`] is the production implementation against
//! Cloudflare Turnstile's siteverify endpoint; [`MockVerifier`]
//! returns a scripted outcome and counts invocations.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Result of one verification attempt. `Failed` and `Unavailable` are
/// both client errors for the caller; verification never soft-passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Passed,
    Failed { codes: Vec<String> },
    Unavailable,
}

impl ChallengeOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, ChallengeOutcome::Passed)
    }
}

#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> ChallengeOutcome;
}

/// Calls the Turnstile siteverify endpoint with the shared secret, the
/// submitted token, and the caller's IP when known.
pub struct TurnstileVerifier {
    client: Client,
    secret: String,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(secret: String, verify_url: String) -> Self {
        Self {
            client: Client::new(),
            secret,
            verify_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[async_trait]
impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> ChallengeOutcome {
        let mut form = reqwest::multipart::Form::new()
            .text("secret", self.secret.clone())
            .text("response", token.to_string());
        if let Some(ip) = remote_ip {
            form = form.text("remoteip", ip.to_string());
        }

        let response = match self.client.post(&self.verify_url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("challenge verification service unreachable: {e}");
                return ChallengeOutcome::Unavailable;
            }
        };

        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "challenge verification service returned an error status"
            );
            return ChallengeOutcome::Unavailable;
        }

        match response.json::<SiteverifyResponse>().await {
            Ok(body) if body.success => {
                debug!("challenge token verified");
                ChallengeOutcome::Passed
            }
            Ok(body) => ChallengeOutcome::Failed {
                codes: body.error_codes,
            },
            Err(e) => {
                warn!("challenge verification response was unreadable: {e}");
                ChallengeOutcome::Unavailable
            }
        }
    }
}

/// Scripted verifier for tests. Records how often it was consulted.
pub struct MockVerifier {
    outcome: ChallengeOutcome,
    calls: AtomicUsize,
}

impl MockVerifier {
    pub fn passing() -> Self {
        Self::with_outcome(ChallengeOutcome::Passed)
    }

    pub fn failing(codes: Vec<String>) -> Self {
        Self::with_outcome(ChallengeOutcome::Failed { codes })
    }

    pub fn unavailable() -> Self {
        Self::with_outcome(ChallengeOutcome::Unavailable)
    }

    pub fn with_outcome(outcome: ChallengeOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengeVerifier for MockVerifier {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> ChallengeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
