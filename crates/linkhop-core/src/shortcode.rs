use crate::base62;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated short code identifying a link.
///
/// Codes use the base-62 alphabet only. Generated codes start at six symbols
/// and may grow; user aliases are bounded more tightly (see [`ShortCode::alias`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

pub const MAX_LENGTH: usize = 64;
pub const ALIAS_MIN_LENGTH: usize = 3;
pub const ALIAS_MAX_LENGTH: usize = 50;

/// Path segments the HTTP surface routes itself. Matched case-insensitively.
pub const RESERVED_ALIASES: [&str; 3] = ["health", "links", "debug"];

impl ShortCode {
    /// Parses a code received from a lookup, e.g. a request path segment.
    ///
    /// Valid codes are 1-64 characters from `[0-9a-zA-Z]`.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code, 1, MAX_LENGTH)?;
        Ok(Self(code))
    }

    /// Parses a user-supplied custom alias.
    ///
    /// Aliases must be 3-50 characters from `[0-9a-zA-Z]` and must not be
    /// one of [`RESERVED_ALIASES`].
    pub fn alias(alias: impl Into<String>) -> Result<Self, CoreError> {
        let alias = alias.into();
        Self::validate(&alias, ALIAS_MIN_LENGTH, ALIAS_MAX_LENGTH)?;
        if RESERVED_ALIASES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&alias))
        {
            return Err(CoreError::InvalidShortCode(format!(
                "'{alias}' is a reserved path"
            )));
        }
        Ok(Self(alias))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. the code generator, or rows read back from the store).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(code: &str, min: usize, max: usize) -> Result<(), CoreError> {
        if code.len() < min || code.len() > max {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                min,
                max,
                code.len()
            )));
        }

        if !base62::is_base62(code) {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only letters and digits: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
