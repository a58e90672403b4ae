//! Contact data handling
//!
//! A [`ContactProfile`] is the best-known set of a visitor's contact fields.
//! The [`extractor`] infers partial profiles from free text and the
//! [`store`] accumulates them across the turns of a session.

use serde::{Deserialize, Serialize};

pub mod extractor;
pub mod store;

pub use extractor::extract;
pub use store::{merge, ContactStore};

/// Partial contact record
///
/// Absent fields are `None` and are omitted when serialized, so the wire
/// form never carries `null` or empty strings. Field names follow the
/// webhook contract (`telefon`, `firma`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
    /// Person name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address, lowercase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number with collapsed whitespace
    #[serde(
        default,
        rename = "telefon",
        alias = "phone",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    /// Company name candidate
    #[serde(
        default,
        rename = "firma",
        alias = "company",
        skip_serializing_if = "Option::is_none"
    )]
    pub company: Option<String>,
}

impl ContactProfile {
    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.company.is_none()
    }

    /// True when a way to reach the visitor (email or phone) is known
    pub fn has_reachable_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    /// Drops fields holding empty or whitespace-only strings
    ///
    /// Profiles loaded from storage or received from older payloads may
    /// carry empty values; the invariant is absent, never empty.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.email,
            &mut self.phone,
            &mut self.company,
        ] {
            if field.as_deref().map(str::trim).is_some_and(str::is_empty) {
                *field = None;
            }
        }
        self
    }
}
