use std::sync::Arc;

use reqwest::{
    cookie::Jar,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Url,
};

use crate::{config::Config, Error, Result};

/// Splits a raw `Cookie` header value (`a=1; b=2`) into name/value pairs.
pub fn bake_cookies(raw_cookie: &str) -> Result<Vec<(String, String)>> {
    raw_cookie
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            // Values may themselves contain `=`, only the first one separates.
            pair.split_once('=')
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| Error::Cookie(pair.to_string()))
        })
        .collect()
}

/// Pre-authenticated HTTP client for the search service.
#[derive(Debug, Clone)]
pub struct Session {
    pub client: Client,
    pub endpoint: String,
}

impl Session {
    pub fn new(config: &Config, bearer_token: &str, raw_cookie: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {bearer_token}"))
            .map_err(|_| Error::Config("bearer token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-zivi-locale",
            HeaderValue::from_str(&config.locale)
                .map_err(|_| Error::Config(format!("locale `{}`", config.locale)))?,
        );

        let url = Url::parse(&config.endpoint)
            .map_err(|e| Error::Config(format!("endpoint `{}`: {e}", config.endpoint)))?;
        let jar = Jar::default();
        for (name, value) in bake_cookies(raw_cookie)? {
            jar.add_cookie_str(&format!("{name}={value}"), &url);
        }

        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::new(jar))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}
