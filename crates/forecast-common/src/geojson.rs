//! GeoJSON feature collections carrying forecast region polygons.
//!
//! Region geometry arrives as a FeatureCollection whose features hold the
//! polygon of one avalanche problem area plus its attributes (at least
//! `problem_id`). The optional legacy `crs` member names the source CRS;
//! without it RFC 7946 positions are WGS84 lon/lat.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::crs::{CrsCode, CrsParseError};
use crate::ordered::OrderedMap;

/// A position: `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Named CRS (GeoJSON 2008 style).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,

    /// Array of features.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            crs: None,
            features: Vec::new(),
        }
    }

    /// Add a feature to the collection.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Declare the CRS the positions are expressed in.
    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(NamedCrs::from_code(crs));
        self
    }

    /// CRS of the positions; EPSG:4326 when not declared.
    pub fn source_crs(&self) -> Result<CrsCode, CrsParseError> {
        match &self.crs {
            Some(named) => CrsCode::parse(&named.properties.name),
            None => Ok(CrsCode::Epsg4326),
        }
    }

    /// Extent of every position in the collection.
    pub fn bbox(&self) -> BoundingBox {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .fold(BoundingBox::empty(), |acc, g| acc.union(&g.bbox()))
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// Legacy named CRS member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedCrs {
    #[serde(rename = "type")]
    pub type_: String,
    pub properties: NamedCrsProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedCrsProperties {
    pub name: String,
}

impl NamedCrs {
    pub fn from_code(code: CrsCode) -> Self {
        Self {
            type_: "name".to_string(),
            properties: NamedCrsProperties {
                name: format!("urn:ogc:def:crs:EPSG::{}", code.epsg_code()),
            },
        }
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// The geometry of this feature; `null` is allowed.
    pub geometry: Option<Geometry>,

    /// Attribute values, in document order.
    #[serde(default)]
    pub properties: Option<OrderedMap<serde_json::Value>>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry,
            properties: None,
        }
    }

    /// Set a single property.
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties
            .get_or_insert_with(OrderedMap::new)
            .insert(name, value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }
}

/// The RFC 7946 geometry types.
///
/// Every type parses so a feed with an odd feature still loads; only
/// polygonal geometry can be written as a layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },

    MultiPoint {
        coordinates: Vec<Position>,
    },

    LineString {
        coordinates: Vec<Position>,
    },

    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },

    /// Linear rings; the first is the exterior, the rest are holes.
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },

    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },

    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    pub fn polygon(rings: Vec<Vec<Position>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Every position in the geometry.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                Box::new(coordinates.iter())
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                Box::new(coordinates.iter().flatten())
            }
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten())
            }
            Geometry::GeometryCollection { geometries } => {
                Box::new(geometries.iter().flat_map(Geometry::positions))
            }
        }
    }

    /// Mutable access to every position, for in-place reprojection.
    pub fn positions_mut(&mut self) -> Box<dyn Iterator<Item = &mut Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                Box::new(coordinates.iter_mut())
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                Box::new(coordinates.iter_mut().flatten())
            }
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter_mut().flatten().flatten())
            }
            Geometry::GeometryCollection { geometries } => {
                Box::new(geometries.iter_mut().flat_map(Geometry::positions_mut))
            }
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for p in self.positions() {
            if p.len() >= 2 {
                bbox.expand(p[0], p[1]);
            }
        }
        bbox
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}
