use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};


/// A form definition authored in the CMS, used for event registration and
/// the generic form module.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationForm {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) title: Option<String>,
    pub(crate) submit_label: Option<String>,
    pub(crate) success_message: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) fields: Vec<FormField>,
    pub(crate) consent: Option<Consent>,
}

impl RegistrationForm {
    pub(crate) fn requires_consent(&self) -> bool {
        self.consent.as_ref().is_some_and(|c| c.required)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FormField {
    /// Name of the lead property this field fills, e.g. `email`.
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) kind: FieldKind,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) required: bool,
    pub(crate) placeholder: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FieldKind {
    Text,
    Email,
    Tel,
    Textarea,
    Checkbox,
}

impl FieldKind {
    /// Value for the `type` attribute of `<input>`. `None` for textareas.
    pub(crate) fn input_type(self) -> Option<&'static str> {
        match self {
            FieldKind::Text => Some("text"),
            FieldKind::Email => Some("email"),
            FieldKind::Tel => Some("tel"),
            FieldKind::Checkbox => Some("checkbox"),
            FieldKind::Textarea => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Consent {
    pub(crate) text: String,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) required: bool,
}

/// Registration setup of one event document, used to check leads that are
/// attributed to the event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventRegistration {
    pub(crate) registration_form: Option<RegistrationForm>,
}

/// A captured contact or registration, written to the CMS as `lead`
/// document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Lead {
    pub(crate) email: String,
    pub(crate) name: Option<String>,
    pub(crate) company: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) consent: bool,
    pub(crate) source: LeadSource,
    pub(crate) form_id: Option<String>,
    #[serde(rename = "language")]
    pub(crate) locale: Option<String>,
    pub(crate) submitted_at: DateTime<Utc>,
}

/// What the lead was captured from, e.g. the event someone registered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LeadSource {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) id: String,
    pub(crate) title: Option<String>,
}
