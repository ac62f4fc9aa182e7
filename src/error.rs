use snafu::Snafu;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Message recorded on inputs that are not a non-empty string.
pub const INVALID_COMMAND: &str = "Invalid cURL command";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Invalid cURL command"))]
    InvalidCommand,
    #[snafu(display("Failed to extract request from curl command: {message}"))]
    Extraction { message: String },
    #[snafu(display("Failed to compile {field} pattern"))]
    CompilePattern {
        field: &'static str,
        source: regex::Error,
    },

    #[snafu(display("Failed to parse HTTP method"))]
    ParseMethod { source: http::method::InvalidMethod },
    #[snafu(display("URL is required for http call"))]
    RequiredUrl,
    #[snafu(display("Failed to parse URL"))]
    ParseUrl { source: http::uri::InvalidUri },
    #[snafu(display("Failed to parse header name"))]
    ParseHeaderName {
        source: http::header::InvalidHeaderName,
    },
    #[snafu(display("Failed to parse header value"))]
    ParseHeaderValue {
        source: http::header::InvalidHeaderValue,
    },

    #[snafu(display("Failed to build HTTP client"))]
    BuildClient {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Failed to serialize parsed body"))]
    SerializeBody { source: serde_json::Error },

    #[snafu(display("Failed to render request template"))]
    Render { source: minijinja::Error },
}
