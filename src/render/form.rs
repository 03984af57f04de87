//! Lead forms. They are plain HTML forms that `site.js` submits as JSON to
//! `/api/leads`, showing the server's answer inline.

use maud::{html, Markup};

use crate::model::{FieldKind, FormModule, LeadSource, RegistrationForm};
use super::RenderContext;


/// Path the forms are submitted to.
pub(crate) const SUBMIT_PATH: &str = "/api/leads";

pub(super) fn form_module(m: &FormModule, ctx: &RenderContext<'_>) -> Markup {
    let source = LeadSource {
        kind: "form".into(),
        id: m.form.id.clone(),
        title: m.form.title.clone(),
    };

    html! {
        @if let Some(title) = &m.title { h2.module-title { (title) } }
        @if let Some(intro) = &m.intro { p.intro { (intro) } }
        (lead_form(&m.form, &source, ctx))
    }
}

/// Renders `form`. Submissions are attributed to `source`.
pub(crate) fn lead_form(form: &RegistrationForm, source: &LeadSource, ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let field_id = |name: &str| format!("{}-{}-{name}", source.id, form.id);
    let has_email_field = form.fields.iter().any(|f| f.name == "email");

    html! {
        form.lead-form method="post" action=(SUBMIT_PATH) novalidate
            data-lead-form
            data-source-type=(source.kind)
            data-source-id=(source.id)
            data-source-title=[source.title.as_deref()]
            data-form-id=(form.id)
            data-locale=(ctx.locale.code)
        {
            @if let Some(title) = &form.title { h3 { (title) } }

            // Every lead needs an email address, even if the editors forgot
            // the field.
            @if !has_email_field {
                (field_row(
                    &field_id("email"),
                    "email",
                    texts.email,
                    FieldKind::Email,
                    true,
                    None,
                    texts.required_field,
                ))
            }
            @for f in &form.fields {
                (field_row(
                    &field_id(&f.name),
                    &f.name,
                    &f.label,
                    f.kind,
                    f.required || f.name == "email",
                    f.placeholder.as_deref(),
                    texts.required_field,
                ))
            }

            @if let Some(consent) = &form.consent {
                div.field.checkbox {
                    input id=(field_id("consent")) type="checkbox" name="consent" value="true"
                        required[consent.required];
                    label for=(field_id("consent")) { (consent.text) }
                }
            }

            p.form-error role="alert" hidden {}
            button.button.button-primary type="submit" data-sending=(texts.sending) {
                (form.submit_label.as_deref().unwrap_or(texts.submit))
            }
        }
        div.form-success role="status" hidden {
            (form.success_message.as_deref().unwrap_or(texts.thank_you))
        }
    }
}

fn field_row(
    id: &str,
    name: &str,
    label: &str,
    kind: FieldKind,
    required: bool,
    placeholder: Option<&str>,
    required_text: &str,
) -> Markup {
    let label = html! {
        label for=(id) {
            (label)
            @if required { " " span.required title=(required_text) { "*" } }
        }
    };

    html! {
        div.field.checkbox[kind == FieldKind::Checkbox] {
            @match kind.input_type() {
                Some("checkbox") => {
                    input id=(id) type="checkbox" name=(name) value="true" required[required];
                    (label)
                },
                Some(ty) => {
                    (label)
                    input id=(id) type=(ty) name=(name) placeholder=[placeholder]
                        required[required]
                        autocomplete=[autocomplete(name)];
                },
                None => {
                    (label)
                    textarea id=(id) name=(name) rows="5" placeholder=[placeholder]
                        required[required] {}
                },
            }
        }
    }
}

fn autocomplete(name: &str) -> Option<&'static str> {
    match name {
        "email" => Some("email"),
        "name" => Some("name"),
        "company" => Some("organization"),
        "phone" => Some("tel"),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::cms::memory::{from_json, MemorySource};
    use crate::locale::Locale;
    use crate::render::testing::Fixture;
    use super::*;

    #[test]
    fn renders_fields_and_consent() {
        let fx = Fixture::new(MemorySource::default());
        let form: RegistrationForm = from_json(json!({
            "_id": "f1",
            "fields": [
                { "name": "name", "label": "Your name", "kind": "text" },
                { "name": "message", "label": "Message", "kind": "textarea", "required": true },
            ],
            "consent": { "text": "I agree", "required": true },
        }));
        let source = LeadSource { kind: "event".into(), id: "ev1".into(), title: None };
        let out = lead_form(&form, &source, &fx.ctx()).into_string();

        assert!(out.contains(r#"data-source-type="event""#));
        assert!(out.contains(r#"data-source-id="ev1""#));
        assert!(out.contains(r#"type="email" name="email""#));
        assert!(out.contains("<textarea"));
        assert!(out.contains(r#"name="consent" value="true" required"#));
        assert!(out.contains("I agree"));
    }

    #[test]
    fn missing_email_field_is_added_in_page_language() {
        let fx = Fixture::new(MemorySource::default());
        let form: RegistrationForm = from_json(json!({
            "_id": "f2",
            "fields": [{ "name": "name", "label": "Name", "kind": "text" }],
        }));
        let source = LeadSource { kind: "form".into(), id: "f2".into(), title: None };

        let en = lead_form(&form, &source, &fx.ctx()).into_string();
        assert!(en.contains(r#"<label for="f2-f2-email">Email"#));

        let de_ctx = RenderContext { locale: Locale::from_code("de").unwrap(), ..fx.ctx() };
        let de = lead_form(&form, &source, &de_ctx).into_string();
        assert!(de.contains(r#"<label for="f2-f2-email">E-Mail"#));
        assert!(de.contains(r#"type="email" name="email""#));
        assert!(!de.contains(">Email"));
    }
}
