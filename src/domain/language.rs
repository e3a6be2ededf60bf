//! Languages and the per-site language assignment
//!
//! A [`Language`] is a row of the languages table. The network keeps a
//! separate site-to-language mapping ([`SiteLanguage`]) that says which
//! locale each site represents; a site without an entry is not part of the
//! multilingual network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language known to the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// English display name (e.g., "German")
    pub english_name: String,

    /// Native display name (e.g., "Deutsch")
    pub native_name: String,

    /// Site-specific alternative title, if one is configured
    #[serde(default)]
    pub custom_name: Option<String>,

    /// Right-to-left script
    #[serde(default)]
    pub is_rtl: bool,

    /// ISO 639-1 code (e.g., "de")
    pub iso_639_1: String,

    /// ISO 639-2 code (e.g., "deu")
    #[serde(default)]
    pub iso_639_2: String,

    /// Locale (e.g., "de_DE")
    pub locale: String,

    /// HTTP language tag (e.g., "de-DE")
    pub http_name: String,

    /// Ordering weight, higher sorts first
    #[serde(default)]
    pub priority: i32,
}

impl Language {
    /// Creates a language from a locale such as `de_DE`, deriving the ISO
    /// and HTTP codes from it
    pub fn from_locale(locale: &str, english_name: &str, native_name: &str) -> Self {
        let iso = locale.split('_').next().unwrap_or(locale).to_lowercase();

        Self {
            english_name: english_name.to_string(),
            native_name: native_name.to_string(),
            custom_name: None,
            is_rtl: false,
            iso_639_1: iso,
            iso_639_2: String::new(),
            locale: locale.to_string(),
            http_name: locale.replace('_', "-"),
            priority: 1,
        }
    }

    /// Returns the requested representation of the language name
    ///
    /// Empty fields fall back to the native name, then the English name.
    pub fn name(&self, field: NameField) -> String {
        let value = match field {
            NameField::Native => self.native_name.clone(),
            NameField::English => self.english_name.clone(),
            NameField::Text => self.custom_name.clone().unwrap_or_default(),
            NameField::Http => self.http_name.clone(),
            NameField::Lang => self.iso_639_1.clone(),
            NameField::LanguageLong => self.locale.clone(),
            NameField::None => return String::new(),
        };

        if !value.is_empty() {
            return value;
        }

        [&self.native_name, &self.english_name]
            .into_iter()
            .find(|name| !name.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

/// Which representation of a language name to show
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    /// Native name ("Deutsch")
    #[default]
    Native,
    /// English name ("German")
    English,
    /// Site-specific alternative title
    Text,
    /// HTTP language tag ("de-DE")
    Http,
    /// Short ISO code ("de")
    Lang,
    /// Full locale ("de_DE")
    #[value(name = "language_long")]
    LanguageLong,
    /// No text at all
    None,
}

impl fmt::Display for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NameField::Native => "native",
            NameField::English => "english",
            NameField::Text => "text",
            NameField::Http => "http",
            NameField::Lang => "lang",
            NameField::LanguageLong => "language_long",
            NameField::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for NameField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "native" => Ok(NameField::Native),
            "english" => Ok(NameField::English),
            "text" => Ok(NameField::Text),
            "http" => Ok(NameField::Http),
            "lang" => Ok(NameField::Lang),
            "language_long" => Ok(NameField::LanguageLong),
            "none" => Ok(NameField::None),
            other => Err(format!("Unknown language name field: {}", other)),
        }
    }
}

/// Language assignment of one site, as stored in the network option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLanguage {
    /// Locale of the site (e.g., "de_DE"); "-1" marks an unassigned site
    pub lang: String,

    /// Alternative language title for the site
    #[serde(default)]
    pub text: String,
}

impl SiteLanguage {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: String::new(),
        }
    }

    /// Returns false for empty or placeholder assignments
    pub fn is_assigned(&self) -> bool {
        !self.lang.is_empty() && self.lang != "-1"
    }

    /// Returns the locale, or only its language part when `short` is set
    pub fn code(&self, short: bool) -> &str {
        if short {
            self.lang.split('_').next().unwrap_or(&self.lang)
        } else {
            &self.lang
        }
    }
}
