//! The main entry point for fetching cached, astronomically enriched point
//! forecasts.

use crate::cache::resolver::LocationQuery;
use crate::cache::store::WeatherStore;
use crate::error::FmiWeatherError;
use crate::fetch::ForecastFetcher;
use crate::types::weather_data::WeatherData;
use crate::wfs;
use bon::bon;
use chrono::Utc;
use log::info;
use tokio::sync::Mutex;

/// Client over the FMI point-forecast service with an in-memory record
/// cache.
///
/// One instance owns one cache; construct it once and share it by reference.
/// The cache sits behind a single mutex so that every lookup or insertion,
/// including the staleness and eviction scans inside them, is atomic with
/// respect to concurrent requests.
///
/// # Examples
///
/// ```no_run
/// # use fmi_weather::{FmiWeather, FmiWeatherError};
/// # async fn run() -> Result<(), FmiWeatherError> {
/// let client = FmiWeather::new("my-api-key");
///
/// let by_name = client.forecast().location("Helsinki").call().await?;
/// let by_position = client.forecast().location("60.17,24.94").call().await?;
/// println!("{} sunrise list: {:?}", by_name.location, by_name.sun_events.rises);
/// # Ok(())
/// # }
/// ```
pub struct FmiWeather {
    fetcher: ForecastFetcher,
    store: Mutex<WeatherStore>,
}

#[bon]
impl FmiWeather {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            fetcher: ForecastFetcher::new(api_key),
            store: Mutex::new(WeatherStore::new()),
        }
    }

    /// Returns the forecast for `location`, served from the cache when a
    /// fresh record exists for the name, one of its aliases, or a position
    /// within 2.5 km.
    ///
    /// `location` is either a place name or a `"lat,lon"` pair; anything
    /// else fails with [`FmiWeatherError::InvalidLocation`] before the cache
    /// or the network is touched. On a cache miss the upstream is queried
    /// and the assembled record cached before it is returned; a name query
    /// additionally registers the typed name as an alias.
    #[builder]
    pub async fn forecast(&self, location: &str) -> Result<WeatherData, FmiWeatherError> {
        let query: LocationQuery = location.parse()?;
        let now = Utc::now();

        {
            let mut store = self.store.lock().await;
            if let Some(record) = store.get(&query, now) {
                info!("cache hit for {location}");
                return Ok(record);
            }
        }
        info!("cache miss for {location}, querying upstream");

        let payload = self.fetcher.fetch(&query, now).await?;
        let tokens = wfs::extract_tokens(&payload)?;

        let record = WeatherData::assemble()
            .timestamp(tokens.timestamp)
            .start_time(tokens.start_time)
            .location(tokens.location)
            .maybe_country(tokens.country)
            .position_field(&tokens.position_field)
            .timezone(&tokens.timezone)
            .headers(&tokens.headers)
            .values(&tokens.values)
            .call()?;

        let alias = match &query {
            LocationQuery::Name(name) => Some(name.as_str()),
            LocationQuery::Position(_) => None,
        };
        let mut store = self.store.lock().await;
        store.add(record.clone(), alias, now);

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_location_fails_before_any_io() {
        let client = FmiWeather::new("key");
        let err = client.forecast().location("60,24,12").call().await.unwrap_err();
        assert!(matches!(err, FmiWeatherError::InvalidLocation(_)));
    }
}
