//! Renders the internal notification and the acknowledgement email
//!
//! Each message is rendered twice: a plain-text body carrying the
//! submission verbatim, and an HTML document where every user-supplied
//! value goes through tera's HTML autoescaping (the `.html` template
//! names opt in).

use once_cell::sync::Lazy;
use tera::{Context, Tera};

use crate::config::SiteIdentity;
use crate::submission::{RequestMeta, Source, SubmissionRequest};
use crate::Result;

use super::EmailMessage;

static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("internal.txt", include_str!("templates/internal.txt")),
        ("internal.html", include_str!("templates/internal.html")),
        (
            "acknowledgement.txt",
            include_str!("templates/acknowledgement.txt"),
        ),
        (
            "acknowledgement.html",
            include_str!("templates/acknowledgement.html"),
        ),
    ])
    .expect("embedded email templates are valid");
    tera
});

/// The notification delivered to the configured destination inbox.
/// Reply-To is the submitter so the inbox can answer directly.
pub fn internal_notification(
    site: &SiteIdentity,
    from: &str,
    to: &str,
    submission: &SubmissionRequest,
    meta: &RequestMeta,
) -> Result<EmailMessage> {
    let mut context = Context::new();
    context.insert("site_name", &site.name);
    context.insert("title", submission.source.title());
    context.insert("reference_id", &meta.reference_id);
    context.insert("submitted_at", &meta.submitted_at_display());
    context.insert("name", &submission.name);
    context.insert("email", &submission.email);
    context.insert(
        "phone",
        submission.phone_display().unwrap_or("(not provided)"),
    );
    context.insert("source", submission.source.as_str());
    context.insert("page_url", meta.page_url.as_deref().unwrap_or("(unknown)"));
    context.insert(
        "client_ip",
        meta.client_ip.as_deref().unwrap_or("(unknown)"),
    );
    context.insert(
        "user_agent",
        meta.user_agent.as_deref().unwrap_or("(unknown)"),
    );
    context.insert("message", &submission.message);

    Ok(EmailMessage {
        from: from.to_string(),
        from_name: format!("{} Website", site.name),
        to: to.to_string(),
        subject: format!(
            "[{}] {} — {}",
            site.name,
            submission.source.subject_prefix(),
            submission.name
        ),
        reply_to: Some(submission.email.clone()),
        text: TEMPLATES.render("internal.txt", &context)?,
        html: TEMPLATES.render("internal.html", &context)?,
    })
}

/// The courtesy confirmation sent back to the submitter. Reply-To is
/// the destination inbox so replies land with the business.
pub fn acknowledgement(
    site: &SiteIdentity,
    from: &str,
    destination: &str,
    submission: &SubmissionRequest,
    meta: &RequestMeta,
) -> Result<EmailMessage> {
    let (title, kind) = match submission.source {
        Source::Contact => ("We received your message", "message"),
        Source::Questionnaire => ("We received your questionnaire", "questionnaire"),
    };

    let mut context = Context::new();
    context.insert("site_name", &site.name);
    context.insert("site_url", &site.url);
    context.insert("title", title);
    context.insert("kind", kind);
    context.insert("reference_id", &meta.reference_id);
    context.insert("submitted_at", &meta.submitted_at_display());
    context.insert("name", &submission.name);
    context.insert("contact_email", destination);
    context.insert("contact_phone", &site.contact_phone);
    context.insert("contact_hours", &site.contact_hours);
    context.insert("message", &submission.message);

    Ok(EmailMessage {
        from: from.to_string(),
        from_name: site.name.clone(),
        to: submission.email.clone(),
        subject: format!("{} — {}", title, site.name),
        reply_to: Some(destination.to_string()),
        text: TEMPLATES.render("acknowledgement.txt", &context)?,
        html: TEMPLATES.render("acknowledgement.html", &context)?,
    })
}
