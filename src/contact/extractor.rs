//! Heuristic contact extraction from free text
//!
//! [`extract`] runs an ordered pipeline of matchers over the input:
//! email, phone, company, name. Every matcher receives the residual text of
//! the previous one and returns an [`Extraction`]: the optional value it
//! found plus the text with its match removed. Later matchers therefore
//! never re-match a substring an earlier matcher already claimed, and
//! overlaps are resolved by pipeline order rather than position.
//!
//! The heuristics are best-effort and intentionally lossy. Absence of a
//! pattern leaves the field absent; no confidence score is produced.
//!
//! # Examples
//!
//! ```
//! use domassist::contact::extract;
//!
//! let profile = extract("Mein Name ist Anna Schmidt, anna@example.com, 0151 2345678");
//! assert_eq!(profile.name.as_deref(), Some("Anna Schmidt"));
//! assert_eq!(profile.email.as_deref(), Some("anna@example.com"));
//! assert_eq!(profile.phone.as_deref(), Some("0151 2345678"));
//! ```

use super::ContactProfile;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Characters inspected on each side of a legal-entity suffix
const COMPANY_WINDOW: usize = 50;

/// Capitalized words that open sentences or name topics rather than people
const NAME_STOPWORDS: &[&str] = &[
    "aber", "abend", "angebot", "bei", "beratung", "bitte", "danke", "das", "dem", "den", "der",
    "die", "ein", "eine", "email", "e-mail", "firma", "frage", "fragen", "frau", "für", "gern",
    "gerne", "gruß", "grüße", "guten", "hallo", "heute", "herr", "hey", "hi", "hier", "ich",
    "ihnen", "ihr", "ihre", "info", "infos", "informationen", "ja", "kann", "kontakt", "können",
    "könnten", "liebe", "mein", "meine", "mit", "morgen", "name", "nein", "nummer", "oder",
    "paket", "pakete", "preis", "preise", "sie", "tag", "telefon", "termin", "und", "unser",
    "unsere", "viele", "von", "wann", "warum", "was", "wie", "wir", "wo", "zu",
];

/// Result of a single matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Value found by the matcher
    pub value: Option<String>,
    /// Input with the claimed substring removed
    pub residual: String,
}

impl Extraction {
    fn none(text: &str) -> Self {
        Self {
            value: None,
            residual: text.to_string(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").expect("valid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+49\s?|0)\d{2,5}[\s\-/]?\d{3,10}[\s\-/]?\d{0,10}")
            .expect("valid phone regex")
    })
}

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"01[5-7]\d[\s\-]?\d{3,4}[\s\-]?\d{3,4}").expect("valid mobile regex")
    })
}

fn company_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:^|[^\p{L}\p{N}])(gmbh|ag|ug|e\.v\.|kg|ohg|gbr|ltd|inc)(?:[^\p{L}\p{N}]|$)",
        )
        .expect("valid company regex")
    })
}

fn honorific_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:Herr|Frau|Dr\.|Prof\.)\s+([A-ZÄÖÜ][a-zäöüß]+\s+[A-ZÄÖÜ][a-zäöüß]+)")
            .expect("valid honorific regex")
    })
}

fn introduction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i:mein name ist|ich bin|ich heiße|ich heisse|hier spricht)\s+([A-ZÄÖÜ][a-zäöüß]+(?:[ \t]+[A-ZÄÖÜ][a-zäöüß]+)?)",
        )
        .expect("valid introduction regex")
    })
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Removes `range` from `text` and trims the result
fn claim(text: &str, range: Range<usize>) -> String {
    let mut residual = String::with_capacity(text.len());
    residual.push_str(&text[..range.start]);
    residual.push_str(&text[range.end..]);
    residual.trim().to_string()
}

fn collapse_whitespace(s: &str) -> String {
    whitespace_regex().replace_all(s, " ").trim().to_string()
}

/// Extract a partial contact profile from free text
///
/// Pure function: no state is read or written.
pub fn extract(text: &str) -> ContactProfile {
    let email = match_email(text);
    let phone = match_phone(&email.residual);
    let company = match_company(&phone.residual);
    let name = match_name(&company.residual);

    ContactProfile {
        name: name.value,
        email: email.value,
        phone: phone.value,
        company: company.value,
    }
}

/// First `local@domain.tld` match, lowercased
pub fn match_email(text: &str) -> Extraction {
    match email_regex().find(text) {
        Some(m) => Extraction {
            value: Some(m.as_str().to_lowercase()),
            residual: claim(text, m.range()),
        },
        None => Extraction::none(text),
    }
}

/// Longest match of the landline and mobile patterns
///
/// Landline candidates are collected before mobile candidates; on equal
/// length the earlier candidate is kept.
pub fn match_phone(text: &str) -> Extraction {
    let mut best: Option<(usize, Range<usize>, String)> = None;

    for m in phone_regex().find_iter(text).chain(mobile_regex().find_iter(text)) {
        let normalized = collapse_whitespace(m.as_str());
        let len = normalized.chars().count();
        let longer = best
            .as_ref()
            .map_or(true, |(best_len, _, _)| len > *best_len);
        if longer {
            best = Some((len, m.range(), normalized));
        }
    }

    match best {
        Some((_, range, normalized)) => Extraction {
            value: Some(normalized),
            residual: claim(text, range),
        },
        None => Extraction::none(text),
    }
}

/// Company name around a legal-entity suffix
///
/// The window extends up to [`COMPANY_WINDOW`] characters around the
/// suffix but never across a clause break (`,;:!?|.` or a newline). Tokens
/// longer than two characters are kept, plus the suffix itself, which may
/// be as short as `AG`. The whole window is claimed, so the name matcher
/// never sees words that already belong to the company.
pub fn match_company(text: &str) -> Extraction {
    let Some(caps) = company_regex().captures(text) else {
        return Extraction::none(text);
    };
    let Some(suffix) = caps.get(1) else {
        return Extraction::none(text);
    };

    let mut start = suffix.start();
    for (taken, (i, c)) in text[..suffix.start()].char_indices().rev().enumerate() {
        if taken >= COMPANY_WINDOW || is_clause_break(c) {
            break;
        }
        start = i;
    }

    let suffix_len = suffix.as_str().chars().count();
    let mut end = suffix.end();
    for (taken, (i, c)) in text[suffix.end()..].char_indices().enumerate() {
        if suffix_len + taken >= COMPANY_WINDOW || is_clause_break(c) {
            break;
        }
        end = suffix.end() + i + c.len_utf8();
    }

    let candidate = text[start..end]
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 || w.eq_ignore_ascii_case(suffix.as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    if candidate.is_empty() {
        return Extraction::none(text);
    }

    Extraction {
        value: Some(candidate),
        residual: claim(text, start..end),
    }
}

fn is_clause_break(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '!' | '?' | '|' | '.' | '\n')
}

/// Person name
///
/// Tries, in order: an honorific followed by two capitalized words, a
/// self-introduction phrase, then the first two capitalized words of the
/// remaining text that are not common sentence openers.
pub fn match_name(text: &str) -> Extraction {
    for re in [honorific_regex(), introduction_regex()] {
        if let Some(group) = re.captures(text).and_then(|caps| caps.get(1)) {
            return Extraction {
                value: Some(collapse_whitespace(group.as_str())),
                residual: claim(text, group.range()),
            };
        }
    }

    let cleaned = text.replace([',', ';', '|', '.', '!', '?'], " ");
    let candidates: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .filter(|w| w.chars().all(|c| c.is_alphabetic() || c == '-'))
        .filter(|w| !NAME_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if candidates.len() < 2 {
        return Extraction::none(text);
    }

    Extraction {
        value: Some(candidates[..2].join(" ")),
        residual: text.to_string(),
    }
}
