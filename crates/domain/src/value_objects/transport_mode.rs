//! Transport mode value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transport mode of a line, using the mode vocabulary of the Motis API
///
/// EFA product classes are mapped onto the same set by the EFA client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    /// City or regional bus
    Bus,
    /// Long distance bus
    Coach,
    /// Tram / Straßenbahn
    Tram,
    /// U-Bahn
    Subway,
    /// Light rail / Stadtbahn
    Metro,
    /// S-Bahn
    Suburban,
    /// Generic rail service
    Rail,
    /// RB
    RegionalRail,
    /// RE
    RegionalFastRail,
    /// IC / EC
    LongDistance,
    /// ICE
    HighspeedRail,
    /// Night train
    NightRail,
    /// Ferry
    Ferry,
    /// Cable car
    CableCar,
    /// Funicular
    Funicular,
    /// Gondola / aerial lift
    AerialLift,
    /// On-demand service (AST, Rufbus)
    Odm,
    /// Airplane
    Airplane,
    /// Anything not covered above
    Other,
}

impl TransportMode {
    /// Parse a Motis mode string, falling back to [`TransportMode::Other`]
    #[must_use]
    pub fn from_motis(mode: &str) -> Self {
        match mode {
            "BUS" => Self::Bus,
            "COACH" => Self::Coach,
            "TRAM" => Self::Tram,
            "SUBWAY" => Self::Subway,
            "METRO" => Self::Metro,
            "SUBURBAN" => Self::Suburban,
            "RAIL" => Self::Rail,
            "REGIONAL_RAIL" => Self::RegionalRail,
            "REGIONAL_FAST_RAIL" => Self::RegionalFastRail,
            "LONG_DISTANCE" => Self::LongDistance,
            "HIGHSPEED_RAIL" => Self::HighspeedRail,
            "NIGHT_RAIL" => Self::NightRail,
            "FERRY" => Self::Ferry,
            "CABLE_CAR" => Self::CableCar,
            "FUNICULAR" => Self::Funicular,
            // Motis has shipped both spellings
            "AERIAL_LIFT" | "AREAL_LIFT" => Self::AerialLift,
            "ODM" => Self::Odm,
            "AIRPLANE" => Self::Airplane,
            _ => Self::Other,
        }
    }

    /// Wire name as used by the Motis API and in persisted line records
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bus => "BUS",
            Self::Coach => "COACH",
            Self::Tram => "TRAM",
            Self::Subway => "SUBWAY",
            Self::Metro => "METRO",
            Self::Suburban => "SUBURBAN",
            Self::Rail => "RAIL",
            Self::RegionalRail => "REGIONAL_RAIL",
            Self::RegionalFastRail => "REGIONAL_FAST_RAIL",
            Self::LongDistance => "LONG_DISTANCE",
            Self::HighspeedRail => "HIGHSPEED_RAIL",
            Self::NightRail => "NIGHT_RAIL",
            Self::Ferry => "FERRY",
            Self::CableCar => "CABLE_CAR",
            Self::Funicular => "FUNICULAR",
            Self::AerialLift => "AERIAL_LIFT",
            Self::Odm => "ODM",
            Self::Airplane => "AIRPLANE",
            Self::Other => "OTHER",
        }
    }

    /// Material Design icon name for a sensor of this mode
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Bus => "mdi:bus",
            Self::Coach => "mdi:bus-side",
            Self::Tram => "mdi:tram",
            Self::Subway | Self::Metro => "mdi:subway",
            Self::Suburban
            | Self::Rail
            | Self::RegionalRail
            | Self::RegionalFastRail
            | Self::LongDistance
            | Self::HighspeedRail
            | Self::NightRail => "mdi:train",
            Self::Ferry => "mdi:ferry",
            Self::CableCar | Self::AerialLift => "mdi:gondola",
            Self::Funicular => "mdi:train-variant",
            Self::Odm => "mdi:taxi",
            Self::Airplane => "mdi:airplane",
            Self::Other => "mdi:train-bus",
        }
    }

    /// German display label, as shown in the `transport_type` attribute
    #[must_use]
    pub const fn label_de(&self) -> &'static str {
        match self {
            Self::Bus => "Bus",
            Self::Coach => "Fernbus",
            Self::Tram => "Tram",
            Self::Subway => "U-Bahn",
            Self::Metro => "Stadtbahn",
            Self::Suburban => "S-Bahn",
            Self::Rail | Self::RegionalRail | Self::RegionalFastRail => "Zug",
            Self::LongDistance | Self::HighspeedRail | Self::NightRail => "Fernzug",
            Self::Ferry => "Fähre",
            Self::CableCar | Self::AerialLift => "Seilbahn",
            Self::Funicular => "Standseilbahn",
            Self::Odm => "Rufbus",
            Self::Airplane => "Flugzeug",
            Self::Other => "Unbekannt",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_motis(&s.to_ascii_uppercase()))
    }
}
