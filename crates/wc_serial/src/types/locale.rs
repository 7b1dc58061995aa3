use core::fmt;
use core::str::FromStr;

use wc_reflect::registry::{GetTypeMeta, TypeMeta};

/// A language with optional script and territory.
///
/// The default is the neutral `C` locale.
///
/// # Examples
///
/// ```
/// use wc_serial::types::Locale;
///
/// let locale: Locale = "de_AT".parse().unwrap();
/// assert_eq!(locale.bcp47_name(), "de-AT");
///
/// let locale: Locale = "zh-hant-tw".parse().unwrap();
/// assert_eq!(locale.script(), Some("Hant"));
/// assert_eq!(locale.name(), "zh_TW");
///
/// assert!("".parse::<Locale>().unwrap().is_c());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    script: Option<String>,
    territory: Option<String>,
}

/// Text that names no locale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("String cannot be interpreted as locale")]
pub struct LocaleParseError;

impl Default for Locale {
    fn default() -> Self {
        Self::c()
    }
}

impl Locale {
    /// The neutral locale.
    pub fn c() -> Self {
        Self {
            language: "C".to_owned(),
            script: None,
            territory: None,
        }
    }

    pub fn new(language: &str, script: Option<&str>, territory: Option<&str>) -> Result<Self, LocaleParseError> {
        if !is_language(language) {
            return Err(LocaleParseError);
        }
        let script = script.map(|s| is_script(s).then(|| title_case(s)).ok_or(LocaleParseError));
        let territory = territory.map(|t| is_territory(t).then(|| t.to_ascii_uppercase()).ok_or(LocaleParseError));
        Ok(Self {
            language: language.to_ascii_lowercase(),
            script: script.transpose()?,
            territory: territory.transpose()?,
        })
    }

    #[inline]
    pub fn is_c(&self) -> bool {
        self.language == "C"
    }

    #[inline]
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn territory(&self) -> Option<&str> {
        self.territory.as_deref()
    }

    /// The `lang_TERRITORY` name; the script is not part of it.
    pub fn name(&self) -> String {
        match &self.territory {
            Some(territory) => format!("{}_{territory}", self.language),
            None => self.language.clone(),
        }
    }

    /// The BCP 47 tag, `lang-Script-TERRITORY`.
    pub fn bcp47_name(&self) -> String {
        let mut name = self.language.clone();
        for part in [&self.script, &self.territory].into_iter().flatten() {
            name.push('-');
            name.push_str(part);
        }
        name
    }
}

impl FromStr for Locale {
    type Err = LocaleParseError;

    /// Accepts both `_` and `-` as separators, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("c") {
            return Ok(Self::c());
        }

        let mut parts = s.split(['_', '-']);
        let language = parts.next().ok_or(LocaleParseError)?;
        let mut script = None;
        let mut territory = None;
        for part in parts {
            if script.is_none() && territory.is_none() && is_script(part) {
                script = Some(part);
            } else if territory.is_none() && is_territory(part) {
                territory = Some(part);
            } else {
                return Err(LocaleParseError);
            }
        }
        Self::new(language, script, territory)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bcp47_name())
    }
}

impl GetTypeMeta for Locale {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::opaque::<Self>().with_default::<Self>()
    }
}

fn is_language(s: &str) -> bool {
    (2..=3).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_script(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_territory(s: &str) -> bool {
    (s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic()))
        || (s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()))
}

fn title_case(s: &str) -> String {
    let mut out = s.to_ascii_lowercase();
    if let Some(first) = out.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print() {
        let locale: Locale = "EN-us".parse().unwrap();
        assert_eq!(locale.language(), "en");
        assert_eq!(locale.territory(), Some("US"));
        assert_eq!(locale.name(), "en_US");
        assert_eq!(locale.to_string(), "en-US");

        let locale: Locale = "es_419".parse().unwrap();
        assert_eq!(locale.territory(), Some("419"));

        let locale: Locale = "sr-Latn".parse().unwrap();
        assert_eq!(locale.bcp47_name(), "sr-Latn");
        assert_eq!(locale.name(), "sr");
    }

    #[test]
    fn reject_garbage() {
        assert_eq!("english".parse::<Locale>(), Err(LocaleParseError));
        assert_eq!("de_AT_AT".parse::<Locale>(), Err(LocaleParseError));
        assert_eq!("d3".parse::<Locale>(), Err(LocaleParseError));
    }

    #[test]
    fn c_locale() {
        assert!("c".parse::<Locale>().unwrap().is_c());
        assert_eq!(Locale::default().bcp47_name(), "C");
    }
}
