//! Tag name validation
//!
//! Names are normalized before every validation pass, then checked for
//! presence, length and character set. Uniqueness needs storage and is
//! checked by the repository, which adds its failure to the same error list.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ArchiveConfig;

pub const BLANK_MESSAGE: &str = "can't be blank";
pub const TAKEN_MESSAGE: &str = "has already been taken";
pub const TOO_LONG_MESSAGE: &str = "is too long -- try using less than %{max} characters or using commas to separate your tags.";
pub const FORMAT_MESSAGE: &str = "can only be made up of letters, numbers, spaces and basic punctuation, but not commas, asterisks or angle brackets.";

/// Letters, digits, spaces and basic punctuation. No commas, asterisks or angle brackets.
fn name_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| {
        Regex::new(r#"^[-a-zA-Z0-9 /?.!'":;|\[\]\{\}=~@#$%^&()_+]+$"#)
            .expect("tag name pattern is valid")
    })
}

/// ASCII whitespace and NUL; other Unicode spaces are part of the name
fn is_strippable(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b' || c == '\0'
}

/// Trim the name and collapse runs of spaces to one
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_space = false;
    for c in name.trim_matches(is_strippable).chars() {
        if c == ' ' {
            if last_space {
                continue;
            }
            last_space = true;
        } else {
            last_space = false;
        }
        out.push(c);
    }
    out
}

/// Message translation hook for validation errors
pub trait Translate: Send + Sync {
    fn translate(&self, message: &str) -> String;
}

/// Returns every message unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translate for Untranslated {
    fn translate(&self, message: &str) -> String {
        message.to_string()
    }
}

/// Translations for a single locale, falling back to the source message
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: String,
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            messages: HashMap::new(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn add_translation(&mut self, message: impl Into<String>, translation: impl Into<String>) {
        self.messages.insert(message.into(), translation.into());
    }
}

impl Translate for MessageCatalog {
    fn translate(&self, message: &str) -> String {
        self.messages
            .get(message)
            .cloned()
            .unwrap_or_else(|| message.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every rule a record failed, in the order they were checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded against one field
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Field name capitalized and joined with its message, e.g. "Name can't be blank"
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{} {}", humanize(&e.field), e.message))
            .collect()
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

fn humanize(field: &str) -> String {
    let text = field.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name rules with their configured limit and message translator
#[derive(Clone)]
pub struct NameRules {
    tag_max: usize,
    translator: Arc<dyn Translate>,
}

impl NameRules {
    pub fn new(config: &ArchiveConfig, translator: Arc<dyn Translate>) -> Self {
        Self {
            tag_max: config.tag_max,
            translator,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    /// Check an already-normalized name
    pub fn check(&self, name: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if name.is_empty() {
            errors.add("name", self.translator.translate(BLANK_MESSAGE));
        }
        if name.chars().count() > self.tag_max {
            let message = self
                .translator
                .translate(TOO_LONG_MESSAGE)
                .replace("%{max}", &self.tag_max.to_string());
            errors.add("name", message);
        }
        if !name_format().is_match(name) {
            errors.add("name", self.translator.translate(FORMAT_MESSAGE));
        }
        errors
    }

    pub fn taken_message(&self) -> String {
        self.translator.translate(TAKEN_MESSAGE)
    }
}

impl Default for NameRules {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default(), Arc::new(Untranslated))
    }
}

impl fmt::Debug for NameRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRules")
            .field("tag_max", &self.tag_max)
            .finish_non_exhaustive()
    }
}
