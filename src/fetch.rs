//! Upstream fetch against the FMI open data WFS.

use crate::cache::resolver::LocationQuery;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use thiserror::Error;

const HOST: &str = "https://data.fmi.fi";
const STORED_QUERY_ID: &str = "fmi::forecast::hirlam::surface::point::multipointcoverage";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body for {0}")]
    BodyRead(String, #[source] reqwest::Error),

    /// The upstream reported a resolver failure inside an OK response.
    #[error("could not connect to the upstream weather service")]
    UpstreamUnreachable,

    #[error("weather data unavailable for the requested location")]
    LocationUnavailable,

    #[error("upstream payload failed to decode")]
    Encoding,
}

/// Fetches raw WFS payloads for location queries.
pub struct ForecastFetcher {
    client: Client,
    api_key: String,
}

impl ForecastFetcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Builds the stored-query URL for `query`, with the forecast window
    /// starting at `now` floored to the hour.
    pub fn request_url(&self, query: &LocationQuery, now: DateTime<Utc>) -> String {
        let start = floor_to_hour(now).format("%Y-%m-%dT%H:%M:%SZ");
        let mut url = format!(
            "{HOST}/fmi-apikey/{}/wfs?request=getFeature&storedquery_id={STORED_QUERY_ID}&starttime={start}",
            self.api_key
        );
        match query {
            LocationQuery::Name(name) => {
                url.push_str("&place=");
                url.push_str(&encode_query_component(name));
            }
            LocationQuery::Position(position) => {
                url.push_str(&format!(
                    "&latlon={},{}",
                    position.latitude, position.longitude
                ));
            }
        }
        url
    }

    /// Retrieves the WFS payload for `query`.
    ///
    /// HTTP failures and the upstream's in-band error markers surface as
    /// typed errors; the API key is scrubbed from the payload and from any
    /// URL carried in an error.
    pub async fn fetch(&self, query: &LocationQuery, now: DateTime<Utc>) -> Result<String, FetchError> {
        let url = self.request_url(query, now);
        let public_url = self.scrub(&url);
        info!("requesting forecast for {query:?}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(public_url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!("upstream returned an error status for {public_url}: {e}");
                return Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url: public_url,
                        status,
                        source: e,
                    },
                    None => FetchError::NetworkRequest(public_url, e),
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::BodyRead(public_url, e))?;

        check_for_upstream_errors(&body)?;
        Ok(self.scrub(&body))
    }

    fn scrub(&self, content: &str) -> String {
        content.replace(&self.api_key, "")
    }
}

/// Recognizes the error markers the upstream embeds in otherwise successful
/// responses.
fn check_for_upstream_errors(content: &str) -> Result<(), FetchError> {
    if content.contains("getaddrinfo") {
        Err(FetchError::UpstreamUnreachable)
    } else if content.contains("No data available for")
        || content.contains("No locations found")
    {
        Err(FetchError::LocationUnavailable)
    } else if content.contains("invalid byte sequence") {
        Err(FetchError::Encoding)
    } else {
        Ok(())
    }
}

fn floor_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    let secs = instant.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(instant)
}

fn encode_query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
