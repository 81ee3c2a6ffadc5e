//! Language tags and `Accept-Language` negotiation.
//!
//! Tags are canonicalized on parse (`EN-us` -> `en-US`, `zh-hant-tw` -> `zh-Hant-TW`)
//! so matching and the `Content-Language` header see one spelling.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LangError {
    #[error("invalid language tag: {0:?}")]
    InvalidTag(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn english() -> Self {
        Self("en".to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, LangError> {
        let invalid = || LangError::InvalidTag(raw.to_string());

        let mut out = String::with_capacity(raw.len());
        for (i, subtag) in raw.trim().split(['-', '_']).enumerate() {
            let valid_len = (1..=8).contains(&subtag.len());
            if !valid_len || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid());
            }

            if i == 0 {
                if subtag.len() < 2 || !subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid());
                }
                out.push_str(&subtag.to_ascii_lowercase());
                continue;
            }

            out.push('-');
            let alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
            let digits = subtag.chars().all(|c| c.is_ascii_digit());
            match subtag.len() {
                // script
                4 if alpha && i == 1 => {
                    let (head, tail) = subtag.split_at(1);
                    out.push_str(&head.to_ascii_uppercase());
                    out.push_str(&tail.to_ascii_lowercase());
                }
                // region
                2 if alpha => out.push_str(&subtag.to_ascii_uppercase()),
                3 if digits => out.push_str(subtag),
                _ => out.push_str(&subtag.to_ascii_lowercase()),
            }
        }

        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag (`fa` for `fa-IR`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matcher over an ordered list of supported tags. The first tag is the
/// fallback when nothing in the request matches.
#[derive(Debug, Clone)]
pub struct LanguageMatcher {
    supported: Vec<LanguageTag>,
}

impl LanguageMatcher {
    /// An empty list falls back to English only.
    pub fn new<S: AsRef<str>>(tags: &[S]) -> Result<Self, LangError> {
        let mut supported = tags
            .iter()
            .map(|t| LanguageTag::parse(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if supported.is_empty() {
            supported.push(LanguageTag::english());
        }

        Ok(Self { supported })
    }

    pub fn supported(&self) -> &[LanguageTag] {
        &self.supported
    }

    pub fn default_tag(&self) -> &LanguageTag {
        // `new` never leaves the list empty.
        &self.supported[0]
    }

    /// Pick a supported tag for an `Accept-Language` header value.
    ///
    /// Preferences are tried by descending quality. Each preference first
    /// looks for an exact tag, then for a tag with the same primary language.
    /// Missing, empty or unparsable headers get the default tag.
    pub fn negotiate(&self, accept_language: Option<&str>) -> LanguageTag {
        let Some(header) = accept_language else {
            return self.default_tag().clone();
        };

        for desired in parse_accept_language(header) {
            let Some(desired) = desired else {
                // wildcard
                break;
            };

            if let Some(tag) = self.supported.iter().find(|s| **s == desired) {
                return tag.clone();
            }
            if let Some(tag) = self
                .supported
                .iter()
                .find(|s| s.primary() == desired.primary())
            {
                return tag.clone();
            }
        }

        self.default_tag().clone()
    }
}

/// Parse an `Accept-Language` value into tags ordered by descending quality.
/// `None` entries stand for `*`. Entries with `q=0` or a malformed tag/quality
/// are dropped.
fn parse_accept_language(header: &str) -> Vec<Option<LanguageTag>> {
    let mut entries: Vec<(f32, Option<LanguageTag>)> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }

            let mut q = 1.0_f32;
            for param in parts {
                let (key, value) = param.trim().split_once('=')?;
                if key.trim().eq_ignore_ascii_case("q") {
                    q = value.trim().parse::<f32>().ok()?;
                }
            }
            if !(q > 0.0 && q <= 1.0) {
                return None;
            }

            if tag == "*" {
                Some((q, None))
            } else {
                LanguageTag::parse(tag).ok().map(|t| (q, Some(t)))
            }
        })
        .collect();

    // stable: equal weights keep header order
    entries.sort_by(|a, b| b.0.total_cmp(&a.0));
    entries.into_iter().map(|(_, tag)| tag).collect()
}
