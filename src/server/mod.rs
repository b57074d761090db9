//! HTTP surface: the preflight handler and the submission pipeline
//!
//! One endpoint, `/api/contact`, stateless per request. The POST
//! pipeline runs strictly in order: parse, validate, honeypot,
//! configuration guard, optional challenge verification, compose,
//! deliver, best-effort acknowledgement. Every external failure is
//! converted to a structured JSON error; nothing internal leaks to the
//! caller.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::mail::{self, DeliveryResult, HttpTransport, MailTransport, Provider};
use crate::submission::{RequestMeta, SubmissionRequest};
use crate::verify::{ChallengeVerifier, TurnstileVerifier};

/// Shared handler state: configuration plus the two external seams.
/// The verifier is present exactly when a challenge secret is
/// configured.
pub struct AppState {
    pub config: RelayConfig,
    pub verifier: Option<Arc<dyn ChallengeVerifier>>,
    pub transport: Arc<dyn MailTransport>,
}

impl AppState {
    /// Production wiring: Turnstile when a secret is configured, and
    /// the provider selected by API-key presence.
    pub fn new(config: RelayConfig) -> Self {
        let verifier = config.turnstile_secret.clone().map(|secret| {
            Arc::new(TurnstileVerifier::new(
                secret,
                config.endpoints.turnstile_verify_url.clone(),
            )) as Arc<dyn ChallengeVerifier>
        });
        let transport: Arc<dyn MailTransport> =
            Arc::new(HttpTransport::new(Provider::from_config(&config)));
        Self {
            config,
            verifier,
            transport,
        }
    }

    /// Test wiring with injected seams.
    pub fn with_parts(
        config: RelayConfig,
        verifier: Option<Arc<dyn ChallengeVerifier>>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            config,
            verifier,
            transport,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/contact", post(submit).options(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS preflight: 204 with allow-listed methods and headers,
/// cacheable for a day. Answered regardless of configuration state.
async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            ("access-control-allow-origin", "*"),
            ("access-control-allow-methods", "POST, OPTIONS"),
            ("access-control-allow-headers", "content-type"),
            ("access-control-max-age", "86400"),
        ],
    )
        .into_response()
}

async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return json_response(StatusCode::BAD_REQUEST, json!({ "error": "Invalid JSON." }))
        }
    };

    let submission: SubmissionRequest = match serde_json::from_value(payload) {
        Ok(submission) => submission,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid input.",
                    "details": { "body": [e.to_string()] },
                }),
            )
        }
    };

    if let Err(details) = submission.validate() {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid input.", "details": details }),
        );
    }

    // Honeypot: answer as if delivered so bots cannot learn the
    // difference, but perform no outbound call.
    if submission.is_spam() {
        debug!("honeypot field populated, dropping submission");
        return json_response(StatusCode::OK, json!({ "ok": true }));
    }

    let (Some(to), Some(from)) = (
        state.config.to_email.as_deref(),
        state.config.from_email.as_deref(),
    ) else {
        error!("destination or sender address missing, refusing submission");
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Server is not configured for email delivery." }),
        );
    };

    let meta = request_meta(&headers);

    if let Some(verifier) = &state.verifier {
        let Some(token) = submission.challenge_token() else {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Turnstile verification required." }),
            );
        };
        let outcome = verifier.verify(token, meta.client_ip.as_deref()).await;
        if !outcome.passed() {
            warn!(?outcome, "challenge verification rejected submission");
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Turnstile verification failed." }),
            );
        }
    }

    let site = &state.config.site;
    let notification = match mail::internal_notification(site, from, to, &submission, &meta) {
        Ok(message) => message,
        Err(e) => {
            error!("failed to render notification email: {e}");
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal error." }),
            );
        }
    };

    match state.transport.send(&notification).await {
        DeliveryResult::Accepted => {}
        DeliveryResult::Rejected { status, body } => {
            warn!(status, "provider rejected notification email: {body}");
            return json_response(
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Email delivery failed.", "status": status }),
            );
        }
    }

    // Acknowledgement is best-effort and only attempted on the primary
    // provider; a failure never turns the submission into an error.
    let mut auto_reply_sent = false;
    if state.config.primary_provider_configured() {
        match mail::acknowledgement(site, from, to, &submission, &meta) {
            Ok(ack) => {
                let result = state.transport.send(&ack).await;
                if let DeliveryResult::Rejected { status, body } = &result {
                    debug!(status, "acknowledgement email rejected: {body}");
                }
                auto_reply_sent = result.accepted();
            }
            Err(e) => warn!("failed to render acknowledgement email: {e}"),
        }
    }

    info!(
        reference_id = %meta.reference_id,
        source = submission.source.as_str(),
        auto_reply_sent,
        "relayed submission"
    );
    json_response(
        StatusCode::OK,
        json!({
            "ok": true,
            "referenceId": meta.reference_id,
            "autoReplySent": auto_reply_sent,
        }),
    )
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    RequestMeta::new(
        text("referer"),
        text("user-agent"),
        text("cf-connecting-ip").or_else(|| text("x-forwarded-for")),
    )
}

/// All POST responses carry an explicit JSON content type and disable
/// caching.
fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body.to_string(),
    )
        .into_response()
}
