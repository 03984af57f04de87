//! Supported locales and the glue to map URL paths to locales and back.

use std::fmt;


/// Writing direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// A locale the website is published in.
pub(crate) struct Locale {
    /// Code as used in URLs, the CMS `language` field and `<html lang>`.
    pub(crate) code: &'static str,
    /// Name in English.
    pub(crate) name: &'static str,
    /// Name in the language itself, used in the locale switcher.
    pub(crate) native_name: &'static str,
    pub(crate) dir: TextDirection,
    /// Locale used for formatting dates.
    pub(crate) date_locale: chrono::Locale,
}

/// All supported locales. The first one is the default locale.
pub(crate) static LOCALES: &[Locale] = &[
    Locale {
        code: "en",
        name: "English",
        native_name: "English",
        dir: TextDirection::Ltr,
        date_locale: chrono::Locale::en_GB,
    },
    Locale {
        code: "de",
        name: "German",
        native_name: "Deutsch",
        dir: TextDirection::Ltr,
        date_locale: chrono::Locale::de_DE,
    },
    Locale {
        code: "nb",
        name: "Norwegian Bokmål",
        native_name: "Norsk bokmål",
        dir: TextDirection::Ltr,
        date_locale: chrono::Locale::nb_NO,
    },
    Locale {
        code: "ar",
        name: "Arabic",
        native_name: "العربية",
        dir: TextDirection::Rtl,
        date_locale: chrono::Locale::ar_SA,
    },
];

impl Locale {
    pub(crate) fn from_code(code: &str) -> Option<&'static Locale> {
        LOCALES.iter().find(|l| l.code == code)
    }

    pub(crate) fn default_locale() -> &'static Locale {
        &LOCALES[0]
    }

    pub(crate) fn is_default(&self) -> bool {
        self.code == Self::default_locale().code
    }

    pub(crate) fn all() -> impl Iterator<Item = &'static Locale> {
        LOCALES.iter()
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Locale {}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locale({})", self.code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

/// Splits a leading locale segment off `path`. The returned remainder always
/// starts with `/`. If the first segment is not a supported locale, `None` and
/// the unchanged path are returned.
pub(crate) fn split_locale(path: &str) -> (Option<&'static Locale>, &str) {
    let Some(rest) = path.strip_prefix('/') else {
        return (None, path);
    };

    let (first, remainder) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    match Locale::from_code(first) {
        Some(locale) => (Some(locale), remainder),
        None => (None, path),
    }
}

/// Prefixes `path` with the locale segment. `"/"` maps to the locale root
/// without trailing slash.
pub(crate) fn localized_path(locale: &Locale, path: &str) -> String {
    match path.trim_start_matches('/') {
        "" => format!("/{}", locale.code),
        rest => format!("/{}/{}", locale.code, rest),
    }
}

/// Picks the best supported locale for an `Accept-Language` header value.
/// Region subtags are ignored (`de-AT` selects `de`), entries are ordered by
/// their quality value and, among equal ones, by their position.
pub(crate) fn negotiate(accept_language: Option<&str>) -> &'static Locale {
    let Some(header) = accept_language else {
        return Locale::default_locale();
    };

    let mut candidates = header.split(',')
        .enumerate()
        .filter_map(|(pos, entry)| {
            let mut parts = entry.trim().split(';');
            let tag = parts.next()?.trim();
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .map(|q| q.parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            (quality > 0.0).then_some((pos, tag, quality))
        })
        .collect::<Vec<_>>();

    // `sort_by` is stable, so equal qualities keep their header order.
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

    candidates.into_iter()
        .find_map(|(_, tag, _)| {
            let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
            match primary.as_str() {
                // Plain Norwegian and Nynorsk speakers are better served by
                // Bokmål than by English.
                "no" | "nn" => Locale::from_code("nb"),
                other => Locale::from_code(other),
            }
        })
        .unwrap_or_else(Locale::default_locale)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn loc(code: &str) -> &'static Locale {
        Locale::from_code(code).unwrap()
    }

    #[test]
    fn split() {
        assert_eq!(split_locale("/de/events/foo"), (Some(loc("de")), "/events/foo"));
        assert_eq!(split_locale("/de"), (Some(loc("de")), "/"));
        assert_eq!(split_locale("/de/"), (Some(loc("de")), "/"));
        assert_eq!(split_locale("/deutsch/x"), (None, "/deutsch/x"));
        assert_eq!(split_locale("/"), (None, "/"));
    }

    #[test]
    fn localize_roundtrips_with_split() {
        for locale in Locale::all() {
            for path in ["/", "/pricing", "/articles/hello-world"] {
                let localized = localized_path(locale, path);
                assert_eq!(split_locale(&localized), (Some(locale), path));
            }
        }
    }

    #[test]
    fn negotiation() {
        assert_eq!(negotiate(None).code, "en");
        assert_eq!(negotiate(Some("de-AT,de;q=0.9,en;q=0.8")).code, "de");
        assert_eq!(negotiate(Some("fr-FR, en;q=0.5, de;q=0.7")).code, "de");
        assert_eq!(negotiate(Some("nn-NO")).code, "nb");
        assert_eq!(negotiate(Some("ar;q=0, fr")).code, "en");
        assert_eq!(negotiate(Some("*")).code, "en");
    }

    #[test]
    fn exactly_one_rtl_entry_is_arabic() {
        let rtl = Locale::all().filter(|l| l.dir == TextDirection::Rtl).collect::<Vec<_>>();
        assert_eq!(rtl, [loc("ar")]);
    }
}
