//! Query-shape resolution: a user-typed location is either a place name or a
//! `"lat,lon"` coordinate pair, decided once at the API boundary.

use crate::types::position::Position;
use std::str::FromStr;
use thiserror::Error;

/// A parsed location query.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// A place name, matched against canonical identities and aliases.
    Name(String),
    /// A coordinate, matched against cached records by proximity.
    Position(Position),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseLocationError {
    #[error("location must be a place name or a \"lat,lon\" coordinate pair")]
    InvalidFormat,
}

impl FromStr for LocationQuery {
    type Err = ParseLocationError;

    /// A single token is a name; exactly two comma-separated numeric tokens
    /// are a latitude/longitude pair; anything else is invalid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(',').collect();
        match tokens.as_slice() {
            [name] => Ok(LocationQuery::Name((*name).to_string())),
            [lat, lon] => {
                let latitude = lat
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ParseLocationError::InvalidFormat)?;
                let longitude = lon
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ParseLocationError::InvalidFormat)?;
                Ok(LocationQuery::Position(Position::new(latitude, longitude)))
            }
            _ => Err(ParseLocationError::InvalidFormat),
        }
    }
}

/// Normalizes a user-typed name to the cache's canonical key form.
pub fn canonical_key(name: &str) -> String {
    name.trim().to_uppercase()
}
