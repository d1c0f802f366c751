//! ESRI shapefile writer for problem polygons.
//!
//! Writes the main file (`.shp`), its index (`.shx`) and attribute table
//! (`.dbf`), plus `.prj` and `.cpg` sidecars so that Mapnik and desktop GIS
//! tools agree on projection and text encoding.
//!
//! Layout follows the ESRI Shapefile Technical Description (1998): a
//! 100-byte header shared by `.shp` and `.shx`, big-endian framing fields
//! and little-endian geometry. Every file is built in memory first, so a
//! geometry error never leaves a partial set on disk.

use chrono::NaiveDate;
use forecast_common::{BoundingBox, CrsCode, FeatureCollection, Geometry, Position};
use projection::ProjectionError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::dbf::DbfTable;
use crate::error::ShapefileError;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_BYTES: usize = 100;
const RECORD_HEADER_BYTES: usize = 8;

const SHAPE_NULL: i32 = 0;
const SHAPE_POLYGON: i32 = 5;

const WEB_MERCATOR_WKT: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",0.0],PARAMETER["Standard_Parallel_1",0.0],PARAMETER["Auxiliary_Sphere_Type",0.0],UNIT["Meter",1.0]]"#;

const WGS84_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

const CODE_PAGE: &str = "UTF-8";

/// What was written for one shapefile.
#[derive(Debug, Clone)]
pub struct ShapefileSummary {
    /// Path of the `.shp` file.
    pub path: PathBuf,
    /// Every file written, main file first.
    pub files: Vec<PathBuf>,
    pub records: usize,
    pub bbox: BoundingBox,
}

/// One shape record: rings of a polygon, or nothing.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Null,
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl Shape {
    fn from_geometry(feature: usize, geometry: Option<&Geometry>) -> Result<Self, ShapefileError> {
        let polygons: Vec<&Vec<Vec<Position>>> = match geometry {
            None => return Ok(Shape::Null),
            Some(Geometry::Polygon { coordinates }) => vec![coordinates],
            Some(Geometry::MultiPolygon { coordinates }) => coordinates.iter().collect(),
            Some(other) => {
                return Err(ShapefileError::UnsupportedGeometry {
                    feature,
                    kind: other.type_name(),
                })
            }
        };

        let mut parts = Vec::new();
        for rings in polygons {
            for (i, ring) in rings.iter().enumerate() {
                let ring = close_ring(feature, ring)?;
                if ring.is_empty() {
                    continue;
                }
                parts.push(orient_ring(ring, i == 0));
            }
        }

        if parts.is_empty() {
            Ok(Shape::Null)
        } else {
            Ok(Shape::Polygon(parts))
        }
    }

    fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        if let Shape::Polygon(parts) = self {
            for &(x, y) in parts.iter().flatten() {
                bbox.expand(x, y);
            }
        }
        bbox
    }

    /// Record content length in bytes.
    fn content_length(&self) -> usize {
        match self {
            Shape::Null => 4,
            Shape::Polygon(parts) => {
                let points: usize = parts.iter().map(Vec::len).sum();
                44 + 4 * parts.len() + 16 * points
            }
        }
    }

    fn write_content(&self, buf: &mut Vec<u8>) {
        match self {
            Shape::Null => buf.extend_from_slice(&SHAPE_NULL.to_le_bytes()),
            Shape::Polygon(parts) => {
                buf.extend_from_slice(&SHAPE_POLYGON.to_le_bytes());
                write_bbox(buf, &self.bbox());

                let points: usize = parts.iter().map(Vec::len).sum();
                buf.extend_from_slice(&(parts.len() as i32).to_le_bytes());
                buf.extend_from_slice(&(points as i32).to_le_bytes());

                let mut start = 0i32;
                for part in parts {
                    buf.extend_from_slice(&start.to_le_bytes());
                    start += part.len() as i32;
                }
                for &(x, y) in parts.iter().flatten() {
                    buf.extend_from_slice(&x.to_le_bytes());
                    buf.extend_from_slice(&y.to_le_bytes());
                }
            }
        }
    }
}

/// Ring as x/y pairs, closed if the source left it open.
fn close_ring(feature: usize, ring: &[Position]) -> Result<Vec<(f64, f64)>, ShapefileError> {
    let mut points = Vec::with_capacity(ring.len() + 1);
    for position in ring {
        if position.len() < 2 {
            return Err(ShapefileError::InvalidPosition {
                feature,
                len: position.len(),
            });
        }
        points.push((position[0], position[1]));
    }

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            points.push(first);
        }
    }
    Ok(points)
}

/// Twice the signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[(f64, f64)]) -> f64 {
    ring.windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum()
}

/// Outer rings run clockwise, holes counter-clockwise.
fn orient_ring(mut ring: Vec<(f64, f64)>, outer: bool) -> Vec<(f64, f64)> {
    let clockwise = signed_area(&ring) < 0.0;
    if clockwise != outer {
        ring.reverse();
    }
    ring
}

fn write_bbox(buf: &mut Vec<u8>, bbox: &BoundingBox) {
    for v in [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Shared `.shp`/`.shx` header. Length is in 16-bit words.
fn write_header(buf: &mut Vec<u8>, file_bytes: usize, bbox: &BoundingBox) {
    buf.extend_from_slice(&FILE_CODE.to_be_bytes());
    buf.extend_from_slice(&[0u8; 20]);
    buf.extend_from_slice(&((file_bytes / 2) as i32).to_be_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&SHAPE_POLYGON.to_le_bytes());
    write_bbox(buf, &bbox.or_zero());
    // Z and M ranges
    buf.extend_from_slice(&[0u8; 32]);
}

/// Encoded `.shp` and `.shx` contents.
struct EncodedShapes {
    shp: Vec<u8>,
    shx: Vec<u8>,
    bbox: BoundingBox,
}

fn encode_shapes(shapes: &[Shape]) -> EncodedShapes {
    let bbox = shapes
        .iter()
        .fold(BoundingBox::empty(), |acc, s| acc.union(&s.bbox()));

    let shp_bytes = HEADER_BYTES
        + shapes
            .iter()
            .map(|s| RECORD_HEADER_BYTES + s.content_length())
            .sum::<usize>();
    let shx_bytes = HEADER_BYTES + RECORD_HEADER_BYTES * shapes.len();

    let mut shp = Vec::with_capacity(shp_bytes);
    let mut shx = Vec::with_capacity(shx_bytes);
    write_header(&mut shp, shp_bytes, &bbox);
    write_header(&mut shx, shx_bytes, &bbox);

    for (i, shape) in shapes.iter().enumerate() {
        let offset_words = (shp.len() / 2) as i32;
        let length_words = (shape.content_length() / 2) as i32;

        shp.extend_from_slice(&(i as i32 + 1).to_be_bytes());
        shp.extend_from_slice(&length_words.to_be_bytes());
        shape.write_content(&mut shp);

        shx.extend_from_slice(&offset_words.to_be_bytes());
        shx.extend_from_slice(&length_words.to_be_bytes());
    }

    EncodedShapes { shp, shx, bbox }
}

/// ESRI WKT for the CRS, when one is known.
fn projection_wkt(crs: CrsCode) -> Option<&'static str> {
    match crs {
        CrsCode::Epsg3857 => Some(WEB_MERCATOR_WKT),
        CrsCode::Epsg4326 => Some(WGS84_WKT),
        _ => None,
    }
}

/// `base` with an extension appended, so `2024-01-10` keeps its dots intact.
fn sidecar(base: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

fn write_file(path: PathBuf, contents: &[u8]) -> Result<PathBuf, ShapefileError> {
    std::fs::write(&path, contents).map_err(|source| ShapefileError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write `collection` as a polygon shapefile at `base` (no extension).
///
/// Positions are written as they are; the `.prj` sidecar describes the
/// collection's declared CRS. `updated` is stamped into the `.dbf` header.
/// Existing files are overwritten.
pub fn write_shapefile(
    base: impl AsRef<Path>,
    collection: &FeatureCollection,
    updated: NaiveDate,
) -> Result<ShapefileSummary, ShapefileError> {
    let base = base.as_ref();
    let crs = collection.source_crs().map_err(ProjectionError::from)?;

    let shapes = collection
        .features
        .iter()
        .enumerate()
        .map(|(i, f)| Shape::from_geometry(i, f.geometry.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let table = DbfTable::from_features(&collection.features)?;

    let encoded = encode_shapes(&shapes);
    let dbf = table.encode(updated);

    let mut files = vec![
        write_file(sidecar(base, "shp"), &encoded.shp)?,
        write_file(sidecar(base, "shx"), &encoded.shx)?,
        write_file(sidecar(base, "dbf"), &dbf)?,
    ];
    match projection_wkt(crs) {
        Some(wkt) => files.push(write_file(sidecar(base, "prj"), wkt.as_bytes())?),
        None => debug!(crs = %crs, "No WKT known for CRS, skipping .prj"),
    }
    files.push(write_file(sidecar(base, "cpg"), CODE_PAGE.as_bytes())?);

    let path = files[0].clone();
    info!(
        path = %path.display(),
        records = shapes.len(),
        fields = table.fields.len(),
        "Wrote shapefile"
    );

    Ok(ShapefileSummary {
        path,
        files,
        records: shapes.len(),
        bbox: encoded.bbox.or_zero(),
    })
}
