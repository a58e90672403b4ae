//! Session-scoped accumulation of contact data
//!
//! Extractions from successive turns are merged into one profile. A field
//! that is already present is never overwritten; later turns can only fill
//! gaps.

use super::ContactProfile;

/// Merge an extraction into an existing profile
///
/// For each field the existing value wins, otherwise the extracted value is
/// taken, otherwise the field stays absent. The operation is deterministic
/// and idempotent: `merge(&merge(e, x), x) == merge(e, x)`.
///
/// # Examples
///
/// ```
/// use domassist::contact::{merge, ContactProfile};
///
/// let existing = ContactProfile { email: Some("a@b.de".into()), ..Default::default() };
/// let extracted = ContactProfile {
///     email: Some("other@b.de".into()),
///     name: Some("Anna Schmidt".into()),
///     ..Default::default()
/// };
/// let merged = merge(&existing, &extracted);
/// assert_eq!(merged.email.as_deref(), Some("a@b.de"));
/// assert_eq!(merged.name.as_deref(), Some("Anna Schmidt"));
/// ```
pub fn merge(existing: &ContactProfile, extracted: &ContactProfile) -> ContactProfile {
    ContactProfile {
        name: existing.name.clone().or_else(|| extracted.name.clone()),
        email: existing.email.clone().or_else(|| extracted.email.clone()),
        phone: existing.phone.clone().or_else(|| extracted.phone.clone()),
        company: existing.company.clone().or_else(|| extracted.company.clone()),
    }
    .normalized()
}

/// Accumulated contact profile of a session
///
/// Besides the profile the store tracks whether a reachable contact (email
/// or phone) has ever been provided. The flag is sticky: it only resets on
/// [`ContactStore::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactStore {
    profile: ContactProfile,
    contact_provided: bool,
}

impl ContactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a previously persisted profile
    pub fn from_profile(profile: ContactProfile) -> Self {
        let profile = profile.normalized();
        let contact_provided = profile.has_reachable_contact();
        Self {
            profile,
            contact_provided,
        }
    }

    /// Merge an extraction and return the resulting profile
    pub fn absorb(&mut self, extracted: &ContactProfile) -> &ContactProfile {
        let merged = merge(&self.profile, extracted);
        if merged != self.profile {
            tracing::debug!(?merged, "Contact profile updated");
        }
        self.profile = merged;
        if self.profile.has_reachable_contact() && !self.contact_provided {
            tracing::info!("Reachable contact provided");
            self.contact_provided = true;
        }
        &self.profile
    }

    /// Current profile
    pub fn profile(&self) -> &ContactProfile {
        &self.profile
    }

    /// Whether email or phone has been present at any point
    pub fn contact_provided(&self) -> bool {
        self.contact_provided
    }

    /// Reset the profile and the contact flag
    pub fn clear(&mut self) {
        self.profile = ContactProfile::default();
        self.contact_provided = false;
    }
}
