//! Read-only church projection returned by every search operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Confessional classification of a church.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefType {
    /// Eastern and Oriental Orthodox
    Orthodox,
    /// Roman Catholic
    RomanCatholic,
    /// Protestant denominations
    Protestant,
    /// Anglican communion
    Anglican,
    /// Any other tradition
    Other,
    /// Classified, but tradition not known
    Unknown,
}

impl BeliefType {
    /// Every classification, in wire order.
    pub const ALL: [BeliefType; 6] = [
        Self::Orthodox,
        Self::RomanCatholic,
        Self::Protestant,
        Self::Anglican,
        Self::Other,
        Self::Unknown,
    ];

    /// Wire name used by the backend and in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orthodox => "orthodox",
            Self::RomanCatholic => "roman_catholic",
            Self::Protestant => "protestant",
            Self::Anglican => "anglican",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BeliefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeliefType {
    type Err = String;

    /// Accepts wire names case-insensitively, with `-` or spaces in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|belief| belief.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown belief type '{s}', expected one of: orthodox, roman_catholic, \
                     protestant, anglican, other, unknown"
                )
            })
    }
}

/// One church's public directory data.
///
/// Coordinates are nullable because not every church has been geocoded.
/// `distance_m` is only populated by distance-bearing lookups (radius and
/// nearby) and is omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchRecord {
    /// Stable backend identifier
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name
    pub name: String,
    /// WGS84 longitude, absent when not geocoded
    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,
    /// WGS84 latitude, absent when not geocoded
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    /// City, town or village
    #[serde(default)]
    pub locality: Option<String>,
    /// Region, state or province
    #[serde(default)]
    pub region: Option<String>,
    /// Country
    #[serde(default)]
    pub country: Option<String>,
    /// Public website
    #[serde(default)]
    pub website: Option<String>,
    /// Confessional classification
    #[serde(default)]
    pub belief_type: Option<BeliefType>,
    /// Languages services are held in, in backend order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_languages: Vec<String>,
    /// Meters from the query center, distance-bearing lookups only
    #[serde(
        default,
        alias = "distance",
        skip_serializing_if = "Option::is_none"
    )]
    pub distance_m: Option<f64>,
}

impl ChurchRecord {
    /// Longitude and latitude, when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.longitude.zip(self.latitude)
    }

    /// True when the record can be placed on a map.
    pub fn is_plottable(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// Backend identifiers may be integer keys or UUID strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Int(number) => number.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
