//! Split a pasted curl command into a structured request and labeled sections.
//!
//! This crate turns the text of a `curl` invocation, as copied from browser dev tools or API
//! docs, into a [`ParsedRequest`]: method, URL, query parameters, headers, body, cookies, basic
//! auth and the common boolean flags. It's particularly useful for:
//!
//! - Reading a long pasted command one piece at a time ([`sections`])
//! - Turning examples from API docs into programmatic requests
//! - Feeding the extracted pieces to tooling as JSON
//!
//! # Design Goals
//!
//! - **Forgiving**: parsing never fails. Bad input is reported inside the result
//!   ([`ParsedRequest::error`], [`ParsedRequest::parse_error`]) so a caller can always render
//!   whatever was extracted.
//! - **Predictable**: every field is extracted by an ordered list of patterns and the first one
//!   that matches wins. A command with two `-d` flags yields only the first body.
//! - **Faithful**: values are kept exactly as written. Header names keep their case and the raw
//!   command is retained.
//!
//! # Architecture
//!
//! 1. **Normalization**: line continuations and whitespace runs collapse into one line
//! 2. **Extraction**: independent rules pull each field out of the normalized line
//! 3. **Decoding**: query strings and bodies are decoded (JSON first, then url-encoded pairs)
//!
//! The conversions in [`ParsedRequest::header_map`], [`ParsedRequest::uri`] and (with the
//! `reqwest` feature) `reqwest::RequestBuilder::try_from` build real requests from the result.
//!
//! # Examples
//!
//! ```
//! let parsed = curl_sections::parse(
//!     r#"curl 'https://api.example.com/users?page=1' -X POST \
//!     -H 'Content-Type: application/json' \
//!     -H 'Authorization: Bearer abc123' \
//!     -d '{"name":"John"}'"#,
//! );
//! assert!(parsed.is_valid());
//! assert_eq!(parsed.method, "POST");
//! assert_eq!(parsed.base_url, "https://api.example.com/users");
//! assert_eq!(parsed.query_params["page"], "1");
//! assert_eq!(parsed.authorization.as_deref(), Some("Bearer abc123"));
//! ```
//!
//! Strict parsing with templated values:
//!
//! ```
//! use curl_sections::ParsedRequest;
//! use serde_json::json;
//! # fn main() -> Result<(), curl_sections::Error> {
//! let curl = r#"curl 'https://api.example.com/users' -H 'Authorization: Bearer {{ token }}'"#;
//! let request = ParsedRequest::load(curl, json!({ "token": "123456" }))?;
//! assert_eq!(request.authorization.as_deref(), Some("Bearer 123456"));
//! # Ok(())
//! # }
//! ```

pub(crate) mod error;
mod parser;
mod request;
pub mod sections;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub use error::{Error, INVALID_COMMAND};
pub use parser::{CurlParser, looks_like_curl, parse, parse_value};
pub use sections::{Section, SectionKind, SectionSettings, render_sections};

/// Everything extracted from one curl command.
///
/// Built in a single pass by [`parse`] and never mutated afterwards. Check [`Self::is_valid`]
/// (or [`Self::failure`]) before trusting the other fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequest {
    /// Upper-cased HTTP method, `GET` unless `-X`/`--request` says otherwise.
    pub method: String,
    /// The URL exactly as written in the command.
    pub url: String,
    /// `url` without its query string.
    pub base_url: String,
    pub query_params: IndexMap<String, String>,
    /// Header names keep the case used in the command.
    pub headers: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// `body` decoded as JSON, or as url-encoded pairs when it is not JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_parsed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    /// `user:pass` from `-u`/`--user`, unparsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    pub compressed: bool,
    pub insecure: bool,
    pub follow_redirects: bool,
    pub raw_command: String,
    /// Set when the input was rejected before parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when extraction itself failed; fields extracted so far are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_owned(),
            url: String::new(),
            base_url: String::new(),
            query_params: IndexMap::new(),
            headers: IndexMap::with_capacity(8), // Pre-allocate for typical header count
            authorization: None,
            body: None,
            body_parsed: None,
            cookies: None,
            auth: None,
            compressed: false,
            insecure: false,
            follow_redirects: false,
            raw_command: String::new(),
            error: None,
            parse_error: None,
        }
    }
}

impl ParsedRequest {
    pub(crate) fn with_raw(command: &str) -> Self {
        Self {
            raw_command: command.trim().to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn rejected() -> Self {
        Self {
            error: Some(INVALID_COMMAND.to_owned()),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.failure().is_none()
    }

    /// The rejection or extraction message, if either was recorded.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().or(self.parse_error.as_deref())
    }

    /// Turn a recorded failure into an [`Error`].
    pub fn check(&self) -> Result<(), Error> {
        if self.error.is_some() {
            return Err(Error::InvalidCommand);
        }
        match &self.parse_error {
            Some(message) => Err(Error::Extraction {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// `self` if nothing was recorded, else the recorded failure.
    pub fn into_checked(self) -> Result<Self, Error> {
        self.check()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_parse_error() -> ParsedRequest {
        ParsedRequest {
            method: "POST".to_owned(),
            url: "https://x.com".to_owned(),
            parse_error: Some("unexpected token".to_owned()),
            ..ParsedRequest::with_raw(" curl https://x.com -X POST ")
        }
    }

    #[test]
    fn parse_error_should_fail_every_strict_path() {
        let parsed = with_parse_error();
        assert!(!parsed.is_valid());
        assert_eq!(parsed.failure(), Some("unexpected token"));
        assert!(matches!(
            parsed.check(),
            Err(Error::Extraction { message }) if message == "unexpected token"
        ));
        assert!(matches!(
            render_sections(&parsed, &SectionSettings::default()),
            Err(Error::Extraction { .. })
        ));
        assert!(matches!(
            parsed.clone().into_checked(),
            Err(Error::Extraction { .. })
        ));
    }

    #[test]
    fn parse_error_should_keep_extracted_fields() {
        let parsed = with_parse_error();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.url, "https://x.com");
        assert_eq!(parsed.raw_command, "curl https://x.com -X POST");
        assert_eq!(parsed.error, None);

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["parseError"], "unexpected token");
        assert_eq!(json["method"], "POST");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_should_take_precedence_over_parse_error() {
        let parsed = ParsedRequest {
            parse_error: Some("late".to_owned()),
            ..ParsedRequest::rejected()
        };
        assert_eq!(parsed.failure(), Some(INVALID_COMMAND));
        assert!(matches!(parsed.check(), Err(Error::InvalidCommand)));
    }

    #[test]
    fn valid_request_should_pass_checks() {
        let parsed = ParsedRequest::with_raw("curl https://x.com");
        assert!(parsed.is_valid());
        assert!(parsed.check().is_ok());
        assert!(parsed.into_checked().is_ok());
    }
}
