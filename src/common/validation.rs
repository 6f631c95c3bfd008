use regex::Regex;

use crate::common::errors::BoxError;

pub const DEFAULT_RESPONSE_CODE: &str = "200";
pub const NO_LOCATION: &str = "/none";

const PATH_PATTERN: &str = r"[0-9a-zA-Z]+";
const CODE_PATTERN: &str = r"^[0-9]{3}$";
const LOCATION_PATTERN: &str = r"\S";

/// Compiled request patterns, built once at startup.
#[derive(Debug, Clone)]
pub struct Validator {
    path: Regex,
    code: Regex,
    location: Regex,
}

impl Validator {
    pub fn new() -> Result<Self, BoxError> {
        Ok(Self {
            path: Regex::new(PATH_PATTERN)?,
            code: Regex::new(CODE_PATTERN)?,
            location: Regex::new(LOCATION_PATTERN)?,
        })
    }

    pub fn is_valid_path(&self, path: &str) -> bool {
        self.path.is_match(path)
    }

    pub fn response_code<'a>(&self, code: Option<&'a str>) -> &'a str {
        code.filter(|code| self.code.is_match(code))
            .unwrap_or(DEFAULT_RESPONSE_CODE)
    }

    pub fn location<'a>(&self, location: Option<&'a str>) -> &'a str {
        location
            .filter(|location| self.location.is_match(location))
            .unwrap_or(NO_LOCATION)
    }
}

/// `None` when the resolved location means "don't redirect".
pub fn redirect_target(location: &str) -> Option<&str> {
    (location != NO_LOCATION && !location.is_empty()).then_some(location)
}
