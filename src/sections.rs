//! Labeled, copyable sections of a parsed curl command.
//!
//! A [`ParsedRequest`] is split into up to ten [`Section`]s in a fixed order. Which ones are
//! produced is controlled by an explicit [`SectionSettings`] value, typically loaded from a
//! config file by the caller.

use crate::{ParsedRequest, error::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    RequestLine,
    BaseUrl,
    QueryParameters,
    Authorization,
    Headers,
    RawBody,
    ParsedBody,
    Cookies,
    BasicAuth,
    Options,
}

impl SectionKind {
    /// Rendering order.
    pub const ALL: [SectionKind; 10] = [
        SectionKind::RequestLine,
        SectionKind::BaseUrl,
        SectionKind::QueryParameters,
        SectionKind::Authorization,
        SectionKind::Headers,
        SectionKind::RawBody,
        SectionKind::ParsedBody,
        SectionKind::Cookies,
        SectionKind::BasicAuth,
        SectionKind::Options,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::RequestLine => "REQUEST LINE",
            SectionKind::BaseUrl => "BASE URL",
            SectionKind::QueryParameters => "QUERY PARAMETERS",
            SectionKind::Authorization => "AUTHORIZATION",
            SectionKind::Headers => "HEADERS",
            SectionKind::RawBody => "REQUEST BODY (RAW)",
            SectionKind::ParsedBody => "REQUEST BODY (PARSED)",
            SectionKind::Cookies => "COOKIES",
            SectionKind::BasicAuth => "BASIC AUTHENTICATION",
            SectionKind::Options => "OPTIONS & FLAGS",
        }
    }
}

/// Which sections to render. Every section is enabled unless turned off.
///
/// ```toml
/// raw_body = false
/// options = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionSettings {
    pub request_line: bool,
    pub base_url: bool,
    pub query_parameters: bool,
    pub authorization: bool,
    pub headers: bool,
    pub raw_body: bool,
    pub parsed_body: bool,
    pub cookies: bool,
    pub basic_auth: bool,
    pub options: bool,
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            request_line: true,
            base_url: true,
            query_parameters: true,
            authorization: true,
            headers: true,
            raw_body: true,
            parsed_body: true,
            cookies: true,
            basic_auth: true,
            options: true,
        }
    }
}

impl SectionSettings {
    /// Settings with only the given kinds enabled.
    pub fn only(kinds: &[SectionKind]) -> Self {
        let mut settings = Self {
            request_line: false,
            base_url: false,
            query_parameters: false,
            authorization: false,
            headers: false,
            raw_body: false,
            parsed_body: false,
            cookies: false,
            basic_auth: false,
            options: false,
        };
        for kind in kinds {
            *settings.flag_mut(*kind) = true;
        }
        settings
    }

    pub fn is_enabled(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::RequestLine => self.request_line,
            SectionKind::BaseUrl => self.base_url,
            SectionKind::QueryParameters => self.query_parameters,
            SectionKind::Authorization => self.authorization,
            SectionKind::Headers => self.headers,
            SectionKind::RawBody => self.raw_body,
            SectionKind::ParsedBody => self.parsed_body,
            SectionKind::Cookies => self.cookies,
            SectionKind::BasicAuth => self.basic_auth,
            SectionKind::Options => self.options,
        }
    }

    fn flag_mut(&mut self, kind: SectionKind) -> &mut bool {
        match kind {
            SectionKind::RequestLine => &mut self.request_line,
            SectionKind::BaseUrl => &mut self.base_url,
            SectionKind::QueryParameters => &mut self.query_parameters,
            SectionKind::Authorization => &mut self.authorization,
            SectionKind::Headers => &mut self.headers,
            SectionKind::RawBody => &mut self.raw_body,
            SectionKind::ParsedBody => &mut self.parsed_body,
            SectionKind::Cookies => &mut self.cookies,
            SectionKind::BasicAuth => &mut self.basic_auth,
            SectionKind::Options => &mut self.options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    /// The copyable text.
    pub content: String,
}

impl Section {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "── {} ──", self.title())?;
        write!(f, "{}", self.content)
    }
}

/// Split a parsed request into sections, skipping disabled and empty ones.
///
/// Fails when the request carries an `error` or `parse_error`.
pub fn render_sections(req: &ParsedRequest, settings: &SectionSettings) -> Result<Vec<Section>> {
    req.check()?;

    let mut sections = Vec::with_capacity(SectionKind::ALL.len());
    for kind in SectionKind::ALL {
        if !settings.is_enabled(kind) {
            continue;
        }
        if let Some(content) = section_content(req, kind)? {
            sections.push(Section { kind, content });
        }
    }
    Ok(sections)
}

fn section_content(req: &ParsedRequest, kind: SectionKind) -> Result<Option<String>> {
    let content = match kind {
        SectionKind::RequestLine => Some(format!("{} {}", req.method, req.url)),
        SectionKind::BaseUrl => non_empty(&req.base_url),
        SectionKind::QueryParameters => lines(
            req.query_params
                .iter()
                .map(|(key, value)| format!("{key} = {value}")),
        ),
        SectionKind::Authorization => req.authorization.clone(),
        // authorization has its own section
        SectionKind::Headers => lines(
            req.headers
                .iter()
                .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
                .map(|(name, value)| format!("{name}: {value}")),
        ),
        SectionKind::RawBody => req.body.as_deref().and_then(non_empty),
        SectionKind::ParsedBody => match req.body_parsed.as_ref().filter(|v| is_truthy(v)) {
            Some(value) => Some(serde_json::to_string_pretty(value).context(SerializeBodySnafu)?),
            None => None,
        },
        SectionKind::Cookies => req.cookies.as_deref().and_then(non_empty),
        SectionKind::BasicAuth => req.auth.as_deref().and_then(non_empty),
        SectionKind::Options => {
            let flags = [
                (req.compressed, "Compression enabled"),
                (req.insecure, "SSL verification disabled"),
                (req.follow_redirects, "Follow redirects"),
            ];
            lines(
                flags
                    .into_iter()
                    .filter(|(set, _)| *set)
                    .map(|(_, label)| label.to_owned()),
            )
        }
    };
    Ok(content)
}

// `0`, `false` and `""` decode fine but carry nothing worth a section.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

fn lines(items: impl Iterator<Item = String>) -> Option<String> {
    let joined = items.collect::<Vec<_>>().join("\n");
    non_empty(&joined)
}
