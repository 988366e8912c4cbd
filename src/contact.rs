//! Normalized contact types shared by the reader, the renderer and the
//! filename deriver.
//!
//! Every property is optional. A `Contact` is built once per input file and
//! never mutated afterwards; converting the same file again produces a new one.
//! Sequence fields keep the order in which the properties appeared in the card
//! and are never de-duplicated.

/// Label used when a property carries no `TYPE` parameter.
pub const DEFAULT_TYPE: &str = "DEFAULT";

/// A single value of a multi-valued property (`TEL`, `EMAIL`, `URL`) together
/// with its upper-cased type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    pub value: String,
    pub type_label: String,
}

impl TypedValue {
    pub fn new(value: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            type_label: type_label.into(),
        }
    }

    /// A value without a declared type.
    pub fn untyped(value: impl Into<String>) -> Self {
        Self::new(value, DEFAULT_TYPE)
    }
}

/// Structured `ADR` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub pobox: Option<String>,
    pub extended: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal: Option<String>,
    pub country: Option<String>,
    pub type_label: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            pobox: None,
            extended: None,
            street: None,
            locality: None,
            region: None,
            postal: None,
            country: None,
            type_label: DEFAULT_TYPE.to_string(),
        }
    }
}

impl Address {
    /// Components in output order, keyed by their frontmatter suffix.
    pub fn components(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("POBOX", self.pobox.as_deref()),
            ("EXTENDED", self.extended.as_deref()),
            ("STREET", self.street.as_deref()),
            ("LOCALITY", self.locality.as_deref()),
            ("REGION", self.region.as_deref()),
            ("POSTAL", self.postal.as_deref()),
            ("COUNTRY", self.country.as_deref()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.components().iter().all(|(_, v)| v.is_none())
    }
}

/// `PHOTO` property. Binary payloads are not retained, only the fact that
/// one was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Photo {
    Binary,
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    /// `UID`, used only to reconcile previously written notes.
    pub identifier: Option<String>,
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub organization: Option<String>,
    pub phone_numbers: Vec<TypedValue>,
    pub email_addresses: Vec<TypedValue>,
    pub urls: Vec<TypedValue>,
    pub addresses: Vec<Address>,
    /// Raw `BDAY` text, never parsed.
    pub birthday: Option<String>,
    pub photo: Option<Photo>,
    /// Raw comma-separated `CATEGORIES` text.
    pub categories: Option<String>,
    pub notes: Option<String>,
    /// The card's `VERSION`.
    pub format_version: Option<String>,
}

impl Contact {
    /// `"{given} {family}"` with surrounding whitespace removed, or `None` when
    /// both halves are missing.
    pub fn constructed_name(&self) -> Option<String> {
        let given = self.given_name.as_deref().unwrap_or("");
        let family = self.family_name.as_deref().unwrap_or("");
        let name = format!("{} {}", given, family).trim().to_string();
        if name.is_empty() { None } else { Some(name) }
    }

    /// Category names split on `,` and trimmed, with empty entries dropped.
    pub fn category_list(&self) -> Vec<&str> {
        self.categories
            .as_deref()
            .map(|c| c.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}
