use crate::{ParsedRequest, error::*};
use indexmap::IndexMap;
use minijinja::Environment;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use snafu::ResultExt;
use std::{borrow::Cow, str::FromStr, sync::LazyLock};
use tracing::{debug, trace, warn};

// Only the value folds case: `-x` is curl's proxy flag.
const METHOD_PATTERNS: &[&str] = &[r#"(?:-X|--request)\s+['"]?((?i:[a-z]+))['"]?"#];

// The URL is the first argument after `curl`; `--url` is the explicit spelling.
const URL_PATTERNS: &[&str] = &[
    r#"curl\s+'([^']+)'"#,
    r#"curl\s+"([^"]+)""#,
    r#"curl\s+([^\s'"-]+)"#,
    r#"--url\s+'([^']+)'"#,
    r#"--url\s+"([^"]+)""#,
    r#"--url\s+([^\s'"-]+)"#,
];

const HEADER_PATTERN: &str = r#"(?:-H|--header)\s+['"]([^'"]+?)['"]"#;

const BODY_PATTERNS: &[&str] = &[
    r#"-d\s+'([^']+?)'"#,
    r#"-d\s+"([^"]+?)""#,
    r#"--data\s+'([^']+?)'"#,
    r#"--data\s+"([^"]+?)""#,
    r#"--data-raw\s+'([^']+?)'"#,
    r#"--data-raw\s+"([^"]+?)""#,
    r#"--data-binary\s+'([^']+?)'"#,
    r#"--data-binary\s+"([^"]+?)""#,
];

// Bare values are matched against the command with quoted spans blanked, so a
// `-d word` inside a quoted header value is never taken for a flag.
const BARE_BODY_PATTERNS: &[&str] = &[
    r#"(?:^|\s)-d\s+([^\s'"-][^\s]*)"#,
    r#"(?:^|\s)--data\s+([^\s'"-][^\s]*)"#,
    r#"(?:^|\s)--data-raw\s+([^\s'"-][^\s]*)"#,
    r#"(?:^|\s)--data-binary\s+([^\s'"-][^\s]*)"#,
];

const COOKIE_PATTERNS: &[&str] = &[
    r#"--cookie\s+'([^']+?)'"#,
    r#"--cookie\s+"([^"]+?)""#,
    r#"-b\s+'([^']+?)'"#,
    r#"-b\s+"([^"]+?)""#,
];

const AUTH_PATTERNS: &[&str] = &[
    r#"--user\s+'([^']+?)'"#,
    r#"--user\s+"([^"]+?)""#,
    r#"-u\s+'([^']+?)'"#,
    r#"-u\s+"([^"]+?)""#,
];

const BARE_AUTH_PATTERNS: &[&str] = &[
    r#"(?:^|\s)--user\s+([^\s'"-]+)"#,
    r#"(?:^|\s)-u\s+([^\s'"-]+)"#,
];

const COMPRESSED_PATTERNS: &[&str] = &["--compressed"];
const INSECURE_PATTERNS: &[&str] = &[r"(?:^|\s)(?:--insecure|-k)(?:\s|$)"];
const LOCATION_PATTERNS: &[&str] = &[r"(?:^|\s)(?:--location|-L)(?:\s|$)"];

static SHARED: LazyLock<Result<CurlParser, String>> = LazyLock::new(|| {
    CurlParser::new().map_err(|e| {
        warn!(error = %e, "failed to compile curl extraction rules");
        e.to_string()
    })
});

/// Candidate patterns for one field, tried in order.
#[derive(Debug)]
struct Rule {
    field: &'static str,
    patterns: Vec<Regex>,
}

impl Rule {
    fn new(field: &'static str, sources: &[&str]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).context(CompilePatternSnafu { field }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { field, patterns })
    }

    /// Capture group 1 of the first pattern that matches.
    fn first_match<'a>(&self, input: &'a str) -> Option<&'a str> {
        let (idx, value) = self.patterns.iter().enumerate().find_map(|(idx, re)| {
            re.captures(input)
                .and_then(|caps| caps.get(1))
                .map(|m| (idx, m.as_str()))
        })?;
        trace!(field = self.field, pattern = idx, "rule matched");
        Some(value)
    }

    fn is_match(&self, input: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(input))
    }
}

/// Compiled extraction rules for curl commands.
///
/// Build one with [`CurlParser::new`] and reuse it; the free [`parse`] function shares a lazily
/// built instance.
#[derive(Debug)]
pub struct CurlParser {
    line_continuation: Regex,
    whitespace: Regex,
    method: Rule,
    url: Rule,
    header: Regex,
    body: Rule,
    bare_body: Rule,
    cookies: Rule,
    auth: Rule,
    bare_auth: Rule,
    compressed: Rule,
    insecure: Rule,
    location: Rule,
}

impl CurlParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            line_continuation: Regex::new(r"\\\r?\n").context(CompilePatternSnafu {
                field: "line continuation",
            })?,
            whitespace: Regex::new(r"\s+").context(CompilePatternSnafu {
                field: "whitespace",
            })?,
            method: Rule::new("method", METHOD_PATTERNS)?,
            url: Rule::new("url", URL_PATTERNS)?,
            header: Regex::new(HEADER_PATTERN).context(CompilePatternSnafu { field: "header" })?,
            body: Rule::new("body", BODY_PATTERNS)?,
            bare_body: Rule::new("bare body", BARE_BODY_PATTERNS)?,
            cookies: Rule::new("cookies", COOKIE_PATTERNS)?,
            auth: Rule::new("auth", AUTH_PATTERNS)?,
            bare_auth: Rule::new("bare auth", BARE_AUTH_PATTERNS)?,
            compressed: Rule::new("compressed", COMPRESSED_PATTERNS)?,
            insecure: Rule::new("insecure", INSECURE_PATTERNS)?,
            location: Rule::new("location", LOCATION_PATTERNS)?,
        })
    }

    /// Parse a curl command. Never fails: an empty command comes back with
    /// [`ParsedRequest::error`] set.
    pub fn parse(&self, command: &str) -> ParsedRequest {
        if command.is_empty() {
            return ParsedRequest::rejected();
        }
        debug!(len = command.len(), "parsing curl command");

        let mut parsed = ParsedRequest::with_raw(command);
        let cmd = self.normalize(command);

        if let Some(method) = self.method.first_match(&cmd) {
            parsed.method = method.to_uppercase();
        }

        if let Some(url) = self.url.first_match(&cmd) {
            parsed.url = url.to_owned();
            let (base, query) = split_url(url);
            parsed.base_url = base.to_owned();
            parsed.query_params = parse_query(query);
        }

        for caps in self.header.captures_iter(&cmd) {
            let Some((name, value)) = caps.get(1).and_then(|m| m.as_str().split_once(':')) else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if name.eq_ignore_ascii_case("authorization") {
                parsed.authorization = Some(value.to_owned());
            }
            parsed.headers.insert(name.to_owned(), value.to_owned());
        }

        let unquoted = blank_quoted(&cmd);
        let body = self
            .body
            .first_match(&cmd)
            .or_else(|| self.bare_body.first_match(&unquoted));
        if let Some(body) = body {
            parsed.body_parsed = decode_body(body);
            parsed.body = Some(body.to_owned());
        }

        parsed.cookies = self.cookies.first_match(&cmd).map(str::to_owned);
        parsed.auth = self
            .auth
            .first_match(&cmd)
            .or_else(|| self.bare_auth.first_match(&unquoted))
            .map(str::to_owned);

        parsed.compressed = self.compressed.is_match(&cmd);
        parsed.insecure = self.insecure.is_match(&cmd);
        parsed.follow_redirects = self.location.is_match(&cmd);

        debug!(
            method = %parsed.method,
            url = %parsed.url,
            headers = parsed.headers.len(),
            has_body = parsed.body.is_some(),
            "parsed curl command"
        );
        parsed
    }

    /// Fold line continuations and whitespace runs into a single line.
    fn normalize(&self, command: &str) -> String {
        let joined = self.line_continuation.replace_all(command, " ");
        self.whitespace.replace_all(&joined, " ").trim().to_owned()
    }
}

/// Parse a curl command with the shared rule set.
///
/// Never fails: rejected input sets [`ParsedRequest::error`], and a failure while extracting
/// sets [`ParsedRequest::parse_error`].
pub fn parse(command: &str) -> ParsedRequest {
    match SHARED.as_ref() {
        Ok(parser) => parser.parse(command),
        Err(_) if command.is_empty() => ParsedRequest::rejected(),
        Err(message) => ParsedRequest {
            parse_error: Some(message.clone()),
            ..ParsedRequest::with_raw(command)
        },
    }
}

/// Parse a dynamically typed value. Anything but a string is rejected.
pub fn parse_value(input: &Value) -> ParsedRequest {
    match input.as_str() {
        Some(command) => parse(command),
        None => ParsedRequest::rejected(),
    }
}

/// Whether the text mentions `curl` at all.
pub fn looks_like_curl(input: &str) -> bool {
    input.to_lowercase().contains("curl")
}

impl ParsedRequest {
    /// Render `{{ var }}` placeholders in `input` with `context`, then parse strictly.
    pub fn load(input: &str, context: impl Serialize) -> Result<Self> {
        let env = Environment::new();
        let input = env.render_str(input, context).context(RenderSnafu)?;
        input.parse()
    }
}

impl FromStr for ParsedRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s).into_checked()
    }
}

/// Replace everything between matching quotes with spaces, keeping the quotes.
/// An unterminated quote blanks the rest of the line.
fn blank_quoted(cmd: &str) -> String {
    let mut open: Option<char> = None;
    cmd.chars()
        .map(|c| match open {
            Some(quote) if c == quote => {
                open = None;
                c
            }
            Some(_) => ' ',
            None => {
                if c == '\'' || c == '"' {
                    open = Some(c);
                }
                c
            }
        })
        .collect()
}

fn split_url(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

fn parse_query(query: &str) -> IndexMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn decode_body(body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) if body.contains('=') => Some(Value::Object(decode_pairs(body))),
        Err(_) => None,
    }
}

fn decode_pairs(body: &str) -> Map<String, Value> {
    let mut map = Map::new();
    for pair in body.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key.is_empty() {
            continue;
        }
        match (decode_component(key), decode_component(value)) {
            (Some(key), Some(value)) => map.insert(key, Value::String(value)),
            _ => map.insert(key.to_owned(), Value::String(value.to_owned())),
        };
    }
    map
}

/// Percent-decode one component. `None` on a malformed escape or invalid UTF-8.
fn decode_component(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let well_formed = s.match_indices('%').all(|(at, _)| {
        bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return None;
    }
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}
