//! Short-form URL matching and canonical URL construction.

use crate::canonical::CanonicalUrl;
use crate::canonical::UrlForm;
use crate::config::NormalizerConfig;
use crate::params::ParameterSet;
use lf_core::RedirectResult;
use std::borrow::Cow;
use url::ParseError;
use url::Url;

// Placeholder origin for resolving path-absolute input; never emitted.
const RELATIVE_BASE: &str = "http://relative.invalid/";
const EXTRA_DELIMITERS: [char; 2] = ['&', ';'];
const FRAGMENT_MARKERS: [char; 3] = ['#', '!', '?'];

/// Rewrites `/shorts/<id>` URLs to the canonical watch form.
///
/// Inputs that do not match the short-form pattern are the common case and
/// come back untouched, which also makes the rewrite idempotent: a canonical
/// URL never matches again.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    needle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShortFormMatch<'a> {
    identifier: &'a str,
    extra: &'a str,
}

impl Default for Normalizer {
    fn default() -> Self {
        let config = NormalizerConfig::default();
        let needle = config.marker_needle().to_ascii_lowercase();
        Self { config, needle }
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> RedirectResult<Self> {
        config.validate()?;
        let needle = config.marker_needle().to_ascii_lowercase();
        Ok(Self { config, needle })
    }

    /// Lowercase `/shorts/` substring used for cheap pre-filtering.
    pub fn marker_needle(&self) -> &str {
        &self.needle
    }

    pub fn is_short_form(&self, input: &str) -> bool {
        parse_input(input)
            .is_some_and(|(url, _)| self.match_short_form(url.path()).is_some())
    }

    /// Builds the canonical URL for a short-form input, `None` otherwise.
    pub fn canonicalize(&self, input: &str) -> Option<CanonicalUrl> {
        let (url, form) = parse_input(input)?;
        let matched = self.match_short_form(url.path())?;

        let mut merged = ParameterSet::new();
        if let Some(extra) = matched.extra.strip_prefix(EXTRA_DELIMITERS) {
            // Either delimiter separates pairs inside the extra segment.
            merged.merge_tolerant(&extra.replace(';', "&"));
        }
        if let Some(query) = url.query() {
            merged.merge_query(query);
        }
        if let Some(fragment) = url.fragment() {
            merged.merge_tolerant(fragment.trim_start_matches(FRAGMENT_MARKERS));
        }

        let id_key = self.config.id_key.as_str();
        let mut output = ParameterSet::new();
        output.insert_if_absent(id_key, matched.identifier);

        for key in &self.config.carryover_keys {
            if key == id_key {
                continue;
            }
            if let Some(value) = merged.get(key) {
                output.insert_if_absent(key.as_str(), value);
            }
        }

        if self.config.carry_all_parameters {
            for (key, value) in merged.iter() {
                if key == id_key {
                    continue;
                }
                output.insert_if_absent(key, value);
            }
        }

        let origin = match form {
            UrlForm::Absolute => Some(url.origin().ascii_serialization()),
            UrlForm::PathAbsolute => None,
        };

        Some(CanonicalUrl::new(
            origin,
            self.config.watch_path.clone(),
            output,
        ))
    }

    /// Returns the canonical form of `input`, or `input` itself when there is
    /// nothing to rewrite.
    pub fn normalize<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self.canonicalize(input) {
            Some(canonical) if canonical.as_str() != input => Cow::Owned(canonical.into_string()),
            _ => Cow::Borrowed(input),
        }
    }

    fn match_short_form<'a>(&self, path: &'a str) -> Option<ShortFormMatch<'a>> {
        let rest = path.strip_prefix('/')?;
        let (marker, rest) = rest.split_once('/')?;
        if !marker.eq_ignore_ascii_case(&self.config.short_marker) {
            return None;
        }

        let segment = rest.split_once('/').map_or(rest, |(segment, _)| segment);
        let id_len = segment
            .bytes()
            .take_while(|byte| is_identifier_byte(*byte))
            .count();
        if id_len == 0 {
            return None;
        }

        let (identifier, extra) = segment.split_at(id_len);
        Some(ShortFormMatch { identifier, extra })
    }
}

fn parse_input(input: &str) -> Option<(Url, UrlForm)> {
    let trimmed = input.trim();
    match Url::parse(trimmed) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https").then_some((url, UrlForm::Absolute))
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            // Document-relative and network-path inputs need the page base.
            if !trimmed.starts_with('/') || trimmed.starts_with("//") {
                return None;
            }
            let base = Url::parse(RELATIVE_BASE).ok()?;
            let url = base.join(trimmed).ok()?;
            Some((url, UrlForm::PathAbsolute))
        }
        Err(_) => None,
    }
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}
