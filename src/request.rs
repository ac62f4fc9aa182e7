use crate::{ParsedRequest, error::*};
use base64::{Engine, engine::general_purpose::STANDARD};
use http::{
    HeaderMap, HeaderValue, Method, Uri,
    header::{AUTHORIZATION, COOKIE, HeaderName},
};
use snafu::{ResultExt, ensure};
use std::str::FromStr;

impl ParsedRequest {
    pub fn http_method(&self) -> Result<Method> {
        self.method.parse().context(ParseMethodSnafu)
    }

    /// The URL as an [`Uri`]. Like curl, a URL without a scheme is taken as `http://`.
    pub fn uri(&self) -> Result<Uri> {
        ensure!(!self.url.is_empty(), RequiredUrlSnafu);
        if self.url.contains("://") {
            self.url.parse().context(ParseUrlSnafu)
        } else {
            format!("http://{}", self.url).parse().context(ParseUrlSnafu)
        }
    }

    /// `Basic <base64(user:pass)>` built from `-u`/`--user`.
    pub fn basic_auth_header(&self) -> Option<String> {
        self.auth
            .as_ref()
            .map(|auth| format!("Basic {}", STANDARD.encode(auth.as_bytes())))
    }

    /// All headers, plus `Cookie` from `-b` and `Authorization` from `-u` when the command
    /// didn't set them explicitly.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.headers.len() + 2);
        for (name, value) in &self.headers {
            headers.append(
                HeaderName::from_str(name).context(ParseHeaderNameSnafu)?,
                HeaderValue::from_str(value).context(ParseHeaderValueSnafu)?,
            );
        }
        if let Some(cookies) = &self.cookies
            && !headers.contains_key(COOKIE)
        {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookies).context(ParseHeaderValueSnafu)?,
            );
        }
        if !headers.contains_key(AUTHORIZATION)
            && let Some(basic_auth) = self.basic_auth_header()
        {
            headers.insert(
                AUTHORIZATION,
                basic_auth.parse().context(ParseHeaderValueSnafu)?,
            );
        }
        Ok(headers)
    }

    /// `query_params` re-encoded as `application/x-www-form-urlencoded`.
    pub fn query_string(&self) -> String {
        let mut encoded = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query_params {
            encoded.append_pair(key, value);
        }
        encoded.finish()
    }

    /// `base_url` with the re-encoded query string appended.
    pub fn rebuilt_url(&self) -> String {
        if self.query_params.is_empty() {
            return self.base_url.clone();
        }
        format!("{}?{}", self.base_url, self.query_string())
    }
}

#[cfg(feature = "reqwest")]
impl TryFrom<&ParsedRequest> for reqwest::RequestBuilder {
    type Error = Error;

    fn try_from(req: &ParsedRequest) -> Result<Self, Self::Error> {
        req.check()?;
        let redirect = if req.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(req.insecure)
            .redirect(redirect)
            .gzip(req.compressed)
            .build()
            .map_err(|e| Error::BuildClient {
                source: Box::new(e),
            })?;

        let req_builder = client
            .request(req.http_method()?, req.uri()?.to_string())
            .headers(req.header_map()?);

        let req_builder = if let Some(body) = &req.body {
            req_builder.body(body.clone())
        } else {
            req_builder
        };

        Ok(req_builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use anyhow::Result;
    use http::header::CONTENT_TYPE;

    #[test]
    fn header_map_should_include_basic_auth_and_cookies() -> Result<()> {
        let parsed = parse(
            r#"curl https://api.stripe.com/v1/charges -u 'sk_test_4eC39HqLyjWDarjtT1zdp7dc:' -b 'a=1' -H "Stripe-Version: 2022-11-15""#,
        );
        let headers = parsed.header_map()?;
        assert_eq!(
            headers.get(AUTHORIZATION),
            Some(&HeaderValue::from_static(
                "Basic c2tfdGVzdF80ZUMzOUhxTHlqV0Rhcmp0VDF6ZHA3ZGM6"
            ))
        );
        assert_eq!(headers.get(COOKIE), Some(&HeaderValue::from_static("a=1")));
        assert_eq!(
            headers.get("stripe-version"),
            Some(&HeaderValue::from_static("2022-11-15"))
        );
        Ok(())
    }

    #[test]
    fn explicit_authorization_should_win_over_user() -> Result<()> {
        let parsed = parse(
            "curl https://x.com -u 'alice:secret' -H 'Authorization: Bearer t' -H 'Content-Type: text/plain'",
        );
        let headers = parsed.header_map()?;
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(
            headers.get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer t"))
        );
        assert_eq!(
            headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/plain"))
        );
        Ok(())
    }

    #[test]
    fn invalid_header_name_should_fail() {
        let parsed = parse("curl https://x.com -H 'Bad Name: v'");
        assert!(matches!(
            parsed.header_map(),
            Err(Error::ParseHeaderName { .. })
        ));
    }

    #[test]
    fn uri_should_default_to_http() -> Result<()> {
        assert_eq!(parse("curl 'ifconfig.me'").uri()?.to_string(), "http://ifconfig.me/");
        assert_eq!(
            parse(r#"curl "https://ifconfig.me/""#).uri()?.to_string(),
            "https://ifconfig.me/"
        );
        assert!(matches!(
            parse("curl -X GET").uri(),
            Err(Error::RequiredUrl)
        ));
        Ok(())
    }

    #[test]
    fn http_method_should_parse() -> Result<()> {
        assert_eq!(parse("curl https://x.com -X patch").http_method()?, Method::PATCH);
        Ok(())
    }

    #[test]
    fn rebuilt_url_should_round_trip_query() {
        let parsed = parse("curl 'https://x.com/s?q=a+b&name=J%C3%B6rg&q=c%26d'");
        let reparsed = parse(&format!("curl '{}'", parsed.rebuilt_url()));
        assert_eq!(reparsed.base_url, parsed.base_url);
        assert_eq!(reparsed.query_params, parsed.query_params);
        assert_eq!(parse("curl https://x.com").rebuilt_url(), "https://x.com");
    }

    #[cfg(feature = "reqwest")]
    #[test]
    fn reqwest_builder_should_carry_request() -> Result<()> {
        let parsed = parse(
            r#"curl 'https://api.example.com/users?page=1' -X POST -H 'Content-Type: application/json' -d '{"name":"John"}' -k"#,
        );
        let request = reqwest::RequestBuilder::try_from(&parsed)?.build()?;
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().as_str(), "https://api.example.com/users?page=1");
        assert_eq!(
            request.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(br#"{"name":"John"}"#.as_slice())
        );
        Ok(())
    }

    #[cfg(feature = "reqwest")]
    #[test]
    fn reqwest_builder_should_reject_invalid() {
        let parsed = parse("");
        assert!(matches!(
            reqwest::RequestBuilder::try_from(&parsed),
            Err(Error::InvalidCommand)
        ));
    }
}
