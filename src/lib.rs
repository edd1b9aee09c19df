mod astro;
mod cache;
mod client;
mod error;
mod fetch;
mod record;
mod types;
mod wfs;

pub use client::FmiWeather;
pub use error::FmiWeatherError;

pub use cache::resolver::{canonical_key, LocationQuery, ParseLocationError};
pub use cache::store::{
    AliasEntry, WeatherStore, DEFAULT_ALIAS_CAPACITY, DEFAULT_RECORD_CAPACITY,
    PROXIMITY_THRESHOLD_KM,
};

pub use astro::events::{find_celestial_events, MAX_SEARCH_SAMPLES};
pub use astro::{moon, rise_set, sun};
pub use astro::{CelestialBody, MoonIllumination, MoonPosition, RiseSet, SunPosition};

pub use record::{AssembleError, FORMAT_VERSION};

pub use types::position::Position;
pub use types::weather_data::{CelestialEvents, WeatherData, WeatherSample};

pub use fetch::{FetchError, ForecastFetcher};
pub use wfs::{extract_tokens, ForecastTokens, WfsError};
