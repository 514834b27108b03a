//! Landmarks shown as callouts on the globe.
//!
//! A built-in set is always available. A JSON file can replace it, and extra
//! landmarks can be given one at a time on the command line.

use std::{fmt, path::Path, str::FromStr};

use globe_anim::{GeoCoordinate, GeoParseError};
use serde::Deserialize;

/// A single annotated place.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Landmark {
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(flatten)]
    pub coordinate: GeoCoordinate,
    /// Asset path of the image revealed on hover.
    #[serde(default)]
    pub image: Option<String>,
}

impl Landmark {
    fn builtin(name: &str, subtitle: &str, latitude: f64, longitude: f64, image: &str) -> Self {
        Self {
            name: name.to_string(),
            subtitle: subtitle.to_string(),
            coordinate: GeoCoordinate::new(latitude, longitude),
            image: Some(format!("images/{image}.jpg")),
        }
    }
}

/// Parses `NAME@LAT,LON`.
impl FromStr for Landmark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, coordinate) = s
            .rsplit_once('@')
            .ok_or_else(|| format!("expected NAME@LAT,LON, got '{s}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing name in '{s}'"));
        }
        let coordinate = coordinate
            .parse::<GeoCoordinate>()
            .map_err(|e: GeoParseError| e.to_string())?;
        Ok(Self {
            name: name.to_string(),
            subtitle: coordinate.to_string(),
            coordinate,
            image: None,
        })
    }
}

/// The New Seven Wonders of the World.
pub fn builtin() -> Vec<Landmark> {
    vec![
        Landmark::builtin("Chichén Itzá", "Yucatán, Mexico", 20.6843, -88.5678, "chichen_itza"),
        Landmark::builtin("Christ the Redeemer", "Rio de Janeiro, Brazil", -22.9519, -43.2105, "christ_the_redeemer"),
        Landmark::builtin("Machu Picchu", "Cusco Region, Peru", -13.1631, -72.5450, "machu_picchu"),
        Landmark::builtin("Colosseum", "Rome, Italy", 41.8902, 12.4922, "colosseum"),
        Landmark::builtin("Petra", "Ma'an, Jordan", 30.3285, 35.4444, "petra"),
        Landmark::builtin("Taj Mahal", "Agra, India", 27.1751, 78.0421, "taj_mahal"),
        Landmark::builtin("Great Wall of China", "Mutianyu, China", 40.4319, 116.5704, "great_wall"),
    ]
}

// File loading is only reachable from the native CLI.

/// Errors from reading a landmarks file.
#[derive(Debug)]
#[cfg_attr(target_family = "wasm", allow(dead_code))]
pub enum LandmarkFileError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for LandmarkFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read landmarks file: {e}"),
            Self::Parse(e) => write!(f, "invalid landmarks file: {e}"),
        }
    }
}

impl std::error::Error for LandmarkFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LandmarkFileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LandmarkFileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// Parses a JSON array of landmarks.
#[cfg_attr(target_family = "wasm", allow(dead_code))]
pub fn parse_json(json: &str) -> Result<Vec<Landmark>, LandmarkFileError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads a JSON array of landmarks from disk.
#[cfg_attr(target_family = "wasm", allow(dead_code))]
pub fn load_file(path: &Path) -> Result<Vec<Landmark>, LandmarkFileError> {
    let json = std::fs::read_to_string(path)?;
    let landmarks = parse_json(&json)?;
    tracing::info!("Loaded {} landmarks from {}", landmarks.len(), path.display());
    Ok(landmarks)
}
