use std::fmt;
use serde_json::Value;

use super::{lookup, FieldDef, FieldType, Rule, TypeDef};


/// A problem found in a document, located by a path like
/// `modules[2].links[0].label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidationError {
    pub(crate) path: String,
    pub(crate) message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path.is_empty() {
            true => f.write_str(&self.message),
            false => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Checks `value` against the definition of `type_name`. Fields that are not
/// part of the definition (including the CMS' own `_id`, `_key`, ...) are
/// ignored. Returns all problems found, not just the first.
pub(crate) fn validate(type_name: &str, value: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    match lookup(type_name) {
        Some(def) => check_object(def, value, "", &mut errors),
        None => errors.push(ValidationError {
            path: String::new(),
            message: format!("unknown type '{type_name}'"),
        }),
    }
    errors
}

struct Errors<'a> {
    path: &'a str,
    out: &'a mut Vec<ValidationError>,
}

impl Errors<'_> {
    fn push(&mut self, message: impl Into<String>) {
        self.out.push(ValidationError { path: self.path.to_owned(), message: message.into() });
    }
}

fn join(base: &str, name: &str) -> String {
    match base {
        "" => name.to_owned(),
        _ => format!("{base}.{name}"),
    }
}

fn check_object(def: &TypeDef, value: &Value, path: &str, out: &mut Vec<ValidationError>) {
    let Some(obj) = value.as_object() else {
        out.push(ValidationError { path: path.to_owned(), message: "expected an object".into() });
        return;
    };

    for field in &def.fields {
        let path = join(path, field.name);
        match obj.get(field.name) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    out.push(ValidationError { path, message: "is required".into() });
                }
            }
            Some(v) => check_field(field, v, &path, out),
        }
    }
}

fn check_field(field: &FieldDef, value: &Value, path: &str, out: &mut Vec<ValidationError>) {
    let mut errors = Errors { path, out };

    let type_ok = match &field.ty {
        FieldType::String | FieldType::Text => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Datetime => value.as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        FieldType::Url => value.as_str().is_some_and(is_url),
        FieldType::Slug => value.get("current")
            .and_then(Value::as_str)
            .is_some_and(is_slug),
        FieldType::Image => value.pointer("/asset/_ref").is_some_and(Value::is_string),
        FieldType::Reference { .. } => value.get("_ref").is_some_and(Value::is_string),
        FieldType::PortableText => value.is_array(),
        FieldType::Select { options } => value.as_str().is_some_and(|s| options.contains(&s)),
        FieldType::Array { of } => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_array_item(of, item, &format!("{path}[{i}]"), errors.out);
                }
                true
            }
            None => false,
        },
        FieldType::Object { of } => {
            if let (true, Some(def)) = (value.is_object(), lookup(of)) {
                check_object(def, value, path, errors.out);
            }
            value.is_object()
        }
    };

    if !type_ok {
        errors.push(match &field.ty {
            FieldType::Select { options } => format!("must be one of: {}", options.join(", ")),
            FieldType::Slug => "must be a slug of lowercase letters, digits and dashes".into(),
            other => format!("is not a valid {}", type_label(other)),
        });
        return;
    }

    for rule in &field.rules {
        if let Some(msg) = check_rule(rule, value) {
            errors.push(msg);
        }
    }
}

fn check_array_item(of: &[&str], item: &Value, path: &str, out: &mut Vec<ValidationError>) {
    if item.is_string() {
        if !of.contains(&"string") {
            out.push(ValidationError { path: path.to_owned(), message: "unexpected string".into() });
        }
        return;
    }

    // Arrays of references (people, speakers, ...) hold `{ _ref }` objects.
    if item.get("_ref").is_some() {
        return;
    }

    let ty = item.get("_type").and_then(Value::as_str);
    match ty {
        Some(ty) if of.contains(&ty) => {
            if let Some(def) = lookup(ty) {
                check_object(def, item, path, out);
            }
        }
        Some(ty) => out.push(ValidationError {
            path: path.to_owned(),
            message: format!("type '{ty}' is not allowed here"),
        }),
        // Items without `_type` are fine in arrays of a single object type.
        None => match of {
            [single] => {
                if let Some(def) = lookup(single) {
                    check_object(def, item, path, out);
                }
            }
            _ => out.push(ValidationError {
                path: path.to_owned(),
                message: "missing '_type'".into(),
            }),
        },
    }
}

fn check_rule(rule: &Rule, value: &Value) -> Option<String> {
    let len = match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        _ => None,
    };

    match *rule {
        Rule::MinLength { value: min } if len.is_some_and(|l| l < min) => {
            Some(format!("must have at least {min} characters or entries"))
        }
        Rule::MaxLength { value: max } if len.is_some_and(|l| l > max) => {
            Some(format!("must have at most {max} characters or entries"))
        }
        Rule::Min { value: min } if value.as_f64().is_some_and(|n| n < min) => {
            Some(format!("must be at least {min}"))
        }
        Rule::Max { value: max } if value.as_f64().is_some_and(|n| n > max) => {
            Some(format!("must be at most {max}"))
        }
        Rule::Email if !value.as_str().is_some_and(crate::leads::is_valid_email) => {
            Some("is not a valid email address".into())
        }
        Rule::Url if !value.as_str().is_some_and(is_url) => Some("is not a valid URL".into()),
        _ => None,
    }
}

/// Absolute URLs and site-relative paths.
fn is_url(s: &str) -> bool {
    s.starts_with('/') || url::Url::parse(s).is_ok_and(|u| {
        matches!(u.scheme(), "http" | "https" | "mailto" | "tel")
    })
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn type_label(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::String | FieldType::Text => "string",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
        FieldType::Datetime => "date and time",
        FieldType::Url => "URL",
        FieldType::Slug => "slug",
        FieldType::Image => "image",
        FieldType::Reference { .. } => "reference",
        FieldType::Array { .. } => "list",
        FieldType::Object { .. } => "object",
        FieldType::PortableText => "rich text",
        FieldType::Select { .. } => "option",
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn paths(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn valid_page() {
        let page = json!({
            "_id": "p1",
            "title": "Home",
            "slug": { "_type": "slug", "current": "home" },
            "language": "en",
            "modules": [
                { "_type": "hero", "_key": "a", "title": "Hi", "links": [
                    { "label": "Docs", "href": "/en/docs" },
                ] },
                { "_type": "logo-cloud", "limit": 12 },
            ],
            "seo": { "noIndex": false },
        });
        assert_eq!(validate("page", &page), vec![]);
    }

    #[test]
    fn reports_field_paths() {
        let page = json!({
            "title": "",
            "slug": { "current": "Not A Slug" },
            "language": "fr",
            "modules": [
                { "_type": "hero" },
                { "_type": "latest-articles", "limit": 100 },
                { "_type": "hero", "title": "x", "links": [{ "href": "javascript:alert(1)" }] },
                { "_type": "unknown-thing" },
            ],
        });
        let errors = validate("page", &page);
        assert_eq!(paths(&errors), vec![
            "slug",
            "language",
            "modules[0].title",
            "modules[1].limit",
            "modules[2].links[0].label",
            "modules[2].links[0].href",
            "modules[3]",
        ]);
    }

    #[test]
    fn lead_rules() {
        let lead = json!({
            "email": "nope",
            "language": "en",
            "source": { "type": "form" },
            "submittedAt": "2025-03-10T12:00:00Z",
        });
        let errors = validate("lead", &lead);
        assert_eq!(paths(&errors), vec!["email", "source.id"]);
        assert_eq!(errors[0].to_string(), "email: is not a valid email address");
    }

    #[test]
    fn event_duration_bounds() {
        let event = json!({
            "title": "Launch",
            "slug": { "current": "launch" },
            "language": "en",
            "startDateTime": "2025-03-10T12:00:00Z",
            "eventType": "webinar",
            "duration": 0,
            "speakers": [{ "_ref": "person-1" }],
        });
        let errors = validate("collection.events", &event);
        assert_eq!(paths(&errors), vec!["duration"]);
    }

    #[test]
    fn unknown_type_and_non_object() {
        assert_eq!(validate("nope", &json!({})).len(), 1);
        assert_eq!(validate("page", &json!([])), vec![ValidationError {
            path: String::new(),
            message: "expected an object".into(),
        }]);
    }
}
