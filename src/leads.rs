//! Lead capture: submissions of contact and event registration forms.
//!
//! Forms post a JSON body to `/api/leads`. Valid submissions are written to
//! the CMS as `lead` documents. There is no deduplication: submitting the
//! same data twice creates two leads.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    cms::ContentSource,
    locale::Locale,
    metrics::LeadOutcome,
    model::{Lead, LeadSource, RegistrationForm},
    prelude::*,
    schema,
};


/// Upper bound for the size of a submission body.
pub(crate) const MAX_BODY_SIZE: usize = 64 * 1024;

const MAX_EMAIL_LEN: usize = 254;
const MAX_FIELD_LEN: usize = 500;
const MAX_MESSAGE_LEN: usize = 5000;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});


/// The JSON body of a submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Submission {
    #[serde(default)]
    email: String,
    name: Option<String>,
    company: Option<String>,
    phone: Option<String>,
    message: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    consent: bool,
    source: LeadSource,
    form_id: Option<String>,
    locale: Option<String>,
}

/// JSON answer to a submission.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct Reply {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

#[derive(Debug)]
pub(crate) enum SubmitError {
    /// The submission itself is broken. Answered with 400.
    Invalid(String),
    /// The submission is fine, but could not be stored. Answered with 502.
    Failed(String),
}

impl SubmitError {
    pub(crate) fn outcome(&self) -> LeadOutcome {
        match self {
            SubmitError::Invalid(_) => LeadOutcome::Invalid,
            SubmitError::Failed(_) => LeadOutcome::Failed,
        }
    }

    pub(crate) fn reply(self) -> Reply {
        let msg = match self {
            SubmitError::Invalid(msg) | SubmitError::Failed(msg) => msg,
        };
        Reply { success: false, error: Some(msg) }
    }
}

impl Reply {
    pub(crate) fn ok() -> Self {
        Self { success: true, error: None }
    }
}


/// Parses, validates and stores one submission.
pub(crate) async fn submit(
    body: &[u8],
    source: &dyn ContentSource,
    now: DateTime<Utc>,
) -> Result<Lead, SubmitError> {
    let submission: Submission = serde_json::from_slice(body)
        .map_err(|e| SubmitError::Invalid(format!("invalid request: {e}")))?;
    let lead = validate(submission, now)?;

    if let Some(form) = governing_form(&lead, source).await? {
        if form.requires_consent() && !lead.consent {
            return Err(SubmitError::Invalid("consent is required".into()));
        }
    }

    // The CMS does not enforce its schema on API writes, so we do.
    let doc = serde_json::to_value(&lead)
        .map_err(|e| SubmitError::Failed(format!("could not encode lead: {e}")))?;
    if let Some(problem) = schema::validate("lead", &doc).into_iter().next() {
        warn!("Rejecting lead not matching the CMS schema: {problem}");
        return Err(SubmitError::Invalid(problem.to_string()));
    }

    source.create_lead(&lead).await.map_err(|e| {
        error!("Failed to store lead from {} '{}': {e:#}", lead.source.kind, lead.source.id);
        SubmitError::Failed("could not store your submission, please try again later".into())
    })?;

    debug!("Stored lead from {} '{}'", lead.source.kind, lead.source.id);
    Ok(lead)
}

/// The form whose rules apply to `lead`. Event leads are checked against the
/// registration form of the event itself, regardless of the `formId` the
/// client sent. Form leads name their form in `formId` or, if that is
/// missing, in the source ID.
async fn governing_form(
    lead: &Lead,
    source: &dyn ContentSource,
) -> Result<Option<RegistrationForm>, SubmitError> {
    let unavailable = |what: &str, id: &str, e: anyhow::Error| {
        error!("Failed to load {what} '{id}': {e:#}");
        SubmitError::Failed("could not verify the form, please try again later".into())
    };

    if lead.source.kind == "event" {
        let event_id = lead.source.id.as_str();
        let registration = source.event_registration(event_id).await
            .map_err(|e| unavailable("event", event_id, e))?
            .ok_or_else(|| SubmitError::Invalid(format!("unknown event '{event_id}'")))?;
        if let Some(form) = registration.registration_form {
            return Ok(Some(form));
        }
    }

    let form_id = match lead.source.kind.as_str() {
        "form" => Some(lead.form_id.as_deref().unwrap_or(&lead.source.id)),
        _ => lead.form_id.as_deref(),
    };
    let Some(form_id) = form_id else {
        return Ok(None);
    };

    source.registration_form(form_id).await
        .map_err(|e| unavailable("registration form", form_id, e))?
        .ok_or_else(|| SubmitError::Invalid(format!("unknown form '{form_id}'")))
        .map(Some)
}

/// Checks everything that can be checked without the CMS.
fn validate(s: Submission, now: DateTime<Utc>) -> Result<Lead, SubmitError> {
    let invalid = |msg: &str| SubmitError::Invalid(msg.to_owned());

    let email = s.email.trim().to_owned();
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if !is_valid_email(&email) {
        return Err(invalid("email address is invalid"));
    }

    let source = LeadSource {
        kind: s.source.kind.trim().to_owned(),
        id: s.source.id.trim().to_owned(),
        title: clean(s.source.title),
    };
    if source.kind.is_empty() || source.id.is_empty() {
        return Err(invalid("source is incomplete"));
    }

    let [name, company, phone] = [s.name, s.company, s.phone].map(clean);
    let too_long = [&name, &company, &phone, &source.title]
        .into_iter()
        .flatten()
        .any(|v| v.chars().count() > MAX_FIELD_LEN);
    let message = clean(s.message);
    if too_long || message.as_ref().is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN) {
        return Err(invalid("a field is too long"));
    }

    Ok(Lead {
        email,
        name,
        company,
        phone,
        message,
        consent: s.consent,
        source,
        form_id: clean(s.form_id),
        locale: s.locale.as_deref()
            .and_then(Locale::from_code)
            .map(|l| l.code.to_owned()),
        submitted_at: now,
    })
}

/// Rough check of the shape `local@domain.tld`. Whether the address exists
/// is not our business.
pub(crate) fn is_valid_email(s: &str) -> bool {
    s.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(s)
}

/// Trims the value and treats empty strings as absent.
fn clean(v: Option<String>) -> Option<String> {
    v.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
