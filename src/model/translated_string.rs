use std::{collections::HashMap, fmt};
use serde::{Deserialize, Serialize};

use crate::{locale::Locale, prelude::*};


/// A string specified in different locales. Entry 'default' is required and
/// used for all locales without explicit entry.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub(crate) struct TranslatedString {
    default: String,
    translations: HashMap<&'static str, String>,
}

impl TranslatedString {
    pub(crate) const DEFAULT_KEY: &'static str = "default";

    /// Returns the string for the given locale, falling back to the default.
    pub(crate) fn get(&self, locale: &Locale) -> &str {
        self.translations.get(locale.code).unwrap_or(&self.default)
    }

    pub(crate) fn default(&self) -> &str {
        &self.default
    }
}

impl TryFrom<HashMap<String, String>> for TranslatedString {
    type Error = anyhow::Error;

    fn try_from(mut map: HashMap<String, String>) -> Result<Self, Self::Error> {
        let default = map.remove(Self::DEFAULT_KEY)
            .ok_or_else(|| anyhow!("translated string must include 'default' entry"))?;

        let translations = map.into_iter()
            .map(|(key, value)| {
                let locale = Locale::from_code(&key)
                    .ok_or_else(|| anyhow!("'{key}' is not a supported locale code"))?;
                Ok((locale.code, value))
            })
            .collect::<Result<_>>()?;

        Ok(Self { default, translations })
    }
}

impl From<TranslatedString> for HashMap<String, String> {
    fn from(value: TranslatedString) -> Self {
        value.translations.into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .chain([(TranslatedString::DEFAULT_KEY.to_owned(), value.default)])
            .collect()
    }
}

impl fmt::Debug for TranslatedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TranslatedString ")?;
        f.debug_map()
            .entry(&Self::DEFAULT_KEY, &self.default)
            .entries(self.translations.iter())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::locale::Locale;
    use super::TranslatedString;

    fn parse(pairs: &[(&str, &str)]) -> anyhow::Result<TranslatedString> {
        pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .try_into()
    }

    #[test]
    fn falls_back_to_default() {
        let s = parse(&[("default", "Acme"), ("de", "Acme GmbH")]).unwrap();
        assert_eq!(s.get(Locale::from_code("de").unwrap()), "Acme GmbH");
        assert_eq!(s.get(Locale::from_code("nb").unwrap()), "Acme");
        assert_eq!(s.default(), "Acme");
    }

    #[test]
    fn requires_default_and_known_locales() {
        assert!(parse(&[("en", "Acme")]).is_err());
        assert!(parse(&[("default", "Acme"), ("xx", "?")]).is_err());
    }
}
