//! Security utilities for datalens.
//!
//! Column names and filter values come from upstream JSON and from user input,
//! and both end up inside SQL text handed to DataFusion. This module quotes
//! them safely and keeps the API key out of logs.

use crate::error::{LensError, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum identifier length accepted in generated SQL.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Convert to a regular string. The SecureString will be zeroized.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// SQL quoting for identifiers and literals.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates a column or table name and wraps it in double quotes.
    ///
    /// Upstream column names may contain spaces or punctuation, so any
    /// printable name is accepted; embedded double quotes are doubled.
    ///
    /// ```rust
    /// use datalens::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("rainfall_mm").unwrap(), "\"rainfall_mm\"");
    /// assert_eq!(SqlSecurity::quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");
    /// assert!(SqlSecurity::quote_identifier("").is_err());
    /// ```
    pub fn quote_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Validates an identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(LensError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(LensError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        if identifier.chars().any(char::is_control) {
            return Err(LensError::SecurityError(
                "SQL identifier cannot contain control characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Quotes a string literal, doubling embedded single quotes.
    ///
    /// ```rust
    /// use datalens::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_literal("Jammu & Kashmir"), "'Jammu & Kashmir'");
    /// assert_eq!(SqlSecurity::quote_literal("O'Brien"), "'O''Brien'");
    /// ```
    pub fn quote_literal(value: &str) -> String {
        let escaped = value.replace('\0', "").replace('\'', "''");
        format!("'{escaped}'")
    }
}
