//! Coordinate Reference System codes understood by the layer pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes that forecast geometry may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// ETRS89 / UTM zone N (EPSG:258zz), used by Norwegian mapping agencies
    Etrs89Utm(u8),
    /// WGS84 / UTM zone N northern hemisphere (EPSG:326zz)
    Wgs84UtmNorth(u8),
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:25833"
    /// - "CRS:84"
    /// - "urn:ogc:def:crs:EPSG::3857"
    /// - "urn:ogc:def:crs:OGC:1.3:CRS84"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "CRS:84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84" | "URN:OGC:DEF:CRS:OGC::CRS84" => {
                return Ok(CrsCode::Epsg4326)
            }
            _ => {}
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;
        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Self::from_epsg(code).ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Map a numeric EPSG code onto a supported CRS.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(CrsCode::Epsg4326),
            3857 | 900913 => Some(CrsCode::Epsg3857),
            25801..=25860 => Some(CrsCode::Etrs89Utm((code - 25800) as u8)),
            32601..=32660 => Some(CrsCode::Wgs84UtmNorth((code - 32600) as u8)),
            _ => None,
        }
    }

    /// Numeric EPSG code.
    pub fn epsg_code(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Etrs89Utm(zone) => 25800 + *zone as u32,
            CrsCode::Wgs84UtmNorth(zone) => 32600 + *zone as u32,
        }
    }

    /// UTM zone for transverse Mercator codes.
    pub fn utm_zone(&self) -> Option<u8> {
        match self {
            CrsCode::Etrs89Utm(zone) | CrsCode::Wgs84UtmNorth(zone) => Some(*zone),
            _ => None,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
