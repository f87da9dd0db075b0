//! Canonical watch URL value.

use crate::params::ParameterSet;
use core::fmt;

/// Shape of the URL text a normalization started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlForm {
    /// `https://host/shorts/id` style input; output keeps scheme and host.
    Absolute,
    /// `/shorts/id` style input; output is path and query only.
    PathAbsolute,
}

/// Canonical long-form URL. Has no fragment; only the normalizer builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    href: String,
    path: String,
    query: ParameterSet,
    form: UrlForm,
}

impl CanonicalUrl {
    pub(crate) fn new(origin: Option<String>, path: String, query: ParameterSet) -> Self {
        let serialized = query.to_query_string();
        let path_and_query = if serialized.is_empty() {
            path.clone()
        } else {
            format!("{path}?{serialized}")
        };

        let (href, form) = match origin {
            Some(origin) => (format!("{origin}{path_and_query}"), UrlForm::Absolute),
            None => (path_and_query, UrlForm::PathAbsolute),
        };

        Self {
            href,
            path,
            query,
            form,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.href
    }

    pub fn into_string(self) -> String {
        self.href
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_parameters(&self) -> &ParameterSet {
        &self.query
    }

    pub fn form(&self) -> UrlForm {
        self.form
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.href
    }
}
