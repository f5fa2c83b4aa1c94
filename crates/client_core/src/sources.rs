use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use shared::{
    domain::{NormalizedJoke, SourceKind},
    error::{SourceUnavailable, UnavailableReason},
    protocol::{
        JokeApiJoke, OfficialJoke, JOKE_API_BLACKLIST_FLAGS, JOKE_API_LABEL, OFFICIAL_JOKE_LABEL,
    },
};
use tracing::debug;
use url::Url;

use crate::{config::parse_url, error::ClientError, JokeSource};

/// Shared HTTP client; the timeout bounds every upstream request so a hung
/// source surfaces as [`UnavailableReason::Timeout`].
pub fn build_http_client(timeout: Duration) -> Result<Client, ClientError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("daily-jokes/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// SourceA: `{setup, punchline}` jokes from the Official Joke API.
pub struct OfficialJokeClient {
    http: Client,
    url: Url,
}

impl OfficialJokeClient {
    pub fn new(http: Client, url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            url: parse_url("official_joke_url", url)?,
        })
    }

    pub async fn fetch_joke(&self) -> Result<OfficialJoke, SourceUnavailable> {
        let kind = SourceKind::Primary;
        debug!(url = %self.url, "official joke api: requesting joke");
        let body = fetch_body(kind, self.http.get(self.url.clone())).await?;
        OfficialJoke::parse(&body).map_err(|reason| SourceUnavailable::new(kind, reason))
    }
}

#[async_trait]
impl JokeSource for OfficialJokeClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Primary
    }

    fn label(&self) -> &str {
        OFFICIAL_JOKE_LABEL
    }

    async fn fetch(&self) -> Result<NormalizedJoke, SourceUnavailable> {
        let joke = self.fetch_joke().await?;
        Ok(NormalizedJoke::new(
            self.kind(),
            self.label(),
            joke.display_text(),
        ))
    }
}

/// SourceB: JokeAPI.dev with the content blacklist applied.
pub struct JokeApiClient {
    http: Client,
    url: Url,
}

impl JokeApiClient {
    pub fn new(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut url = parse_url("joke_api_url", base_url)?;
        url.query_pairs_mut()
            .append_pair("blacklistFlags", &JOKE_API_BLACKLIST_FLAGS.join(","));
        Ok(Self { http, url })
    }

    pub fn request_url(&self) -> &Url {
        &self.url
    }

    pub async fn fetch_joke(&self) -> Result<JokeApiJoke, SourceUnavailable> {
        let kind = SourceKind::Secondary;
        debug!(url = %self.url, "jokeapi: requesting joke");
        let body = fetch_body(kind, self.http.get(self.url.clone())).await?;
        JokeApiJoke::parse(&body).map_err(|reason| SourceUnavailable::new(kind, reason))
    }
}

#[async_trait]
impl JokeSource for JokeApiClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Secondary
    }

    fn label(&self) -> &str {
        JOKE_API_LABEL
    }

    async fn fetch(&self) -> Result<NormalizedJoke, SourceUnavailable> {
        let joke = self.fetch_joke().await?;
        Ok(NormalizedJoke::new(
            self.kind(),
            self.label(),
            joke.display_text(),
        ))
    }
}

async fn fetch_body(
    kind: SourceKind,
    request: RequestBuilder,
) -> Result<Vec<u8>, SourceUnavailable> {
    let response = request
        .send()
        .await
        .map_err(|err| SourceUnavailable::new(kind, classify_reqwest_error(&err)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceUnavailable::new(
            kind,
            UnavailableReason::Status(status.as_u16()),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| SourceUnavailable::new(kind, classify_reqwest_error(&err)))?;
    Ok(body.to_vec())
}

fn classify_reqwest_error(err: &reqwest::Error) -> UnavailableReason {
    if err.is_timeout() {
        UnavailableReason::Timeout
    } else if let Some(status) = err.status() {
        UnavailableReason::Status(status.as_u16())
    } else if err.is_decode() {
        UnavailableReason::Malformed(err.to_string())
    } else {
        UnavailableReason::Transport(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/sources_tests.rs"]
mod tests;
