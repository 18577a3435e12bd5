use std::fmt;

use serde::Serialize;

use crate::error::{Result, WeatherError};

/// A validated five-digit US ZIP code. Leading zeros are significant, so it stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 5 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WeatherError::invalid(format!(
                "invalid ZIP code format: {raw}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ZipCode {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
