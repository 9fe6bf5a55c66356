//! Binary view payload decoder
//!
//! The server answers each view request with one big-endian buffer holding
//! the overview raster followed by the Voronoi cells:
//!
//! ```text
//! u32 bins_x, u32 bins_y
//! u32[bins_x * bins_y] raster counts (row-major)
//! u32 polygon count
//! per polygon:
//!     u32 point count
//!     f64 area
//!     u8  clipped (1 = true)
//!     f64 data point x, f64 data point y
//!     f64 centroid x, f64 centroid y
//!     f64 x, f64 y  (point count times)
//! ```

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor};
use thiserror::Error;

use crate::types::{Point, Polygon, RasterImage, VoronoiSet};

/// Bytes of fixed header per polygon: count, area, flag, data point, centroid.
const POLYGON_HEADER_BYTES: u64 = 4 + 8 + 1 + 16 + 16;
const POINT_BYTES: u64 = 16;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Payload truncated at byte {offset} while reading {field}")]
    Truncated { offset: u64, field: &'static str },

    #[error("Payload declares {count} {what}, more than the {available} bytes remaining")]
    CountTooLarge {
        what: &'static str,
        count: u64,
        available: u64,
    },

    #[error("Invalid area scale: {0}")]
    InvalidAreaScale(f64),
}

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Ratio between draw-buffer pixels and data-space units, used to express
/// server-reported cell areas in data space.
pub fn area_scale(draw_width: f64, draw_height: f64, view_width: f64, view_height: f64) -> f64 {
    (draw_width * draw_height) / (view_width * view_height)
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    fn truncated(&self, field: &'static str) -> impl FnOnce(io::Error) -> PayloadError {
        let offset = self.cursor.position();
        move |_| PayloadError::Truncated { offset, field }
    }

    fn u8(&mut self, field: &'static str) -> PayloadResult<u8> {
        let err = self.truncated(field);
        self.cursor.read_u8().map_err(err)
    }

    fn u32(&mut self, field: &'static str) -> PayloadResult<u32> {
        let err = self.truncated(field);
        self.cursor.read_u32::<BigEndian>().map_err(err)
    }

    fn f64(&mut self, field: &'static str) -> PayloadResult<f64> {
        let err = self.truncated(field);
        self.cursor.read_f64::<BigEndian>().map_err(err)
    }

    fn point(&mut self, field: &'static str) -> PayloadResult<Point> {
        Ok(Point::new(self.f64(field)?, self.f64(field)?))
    }

    /// Reject counts whose minimal encoding cannot fit in the rest of the
    /// buffer before allocating for them.
    fn ensure(&self, what: &'static str, count: u64, unit: u64) -> PayloadResult<()> {
        let available = self.remaining();
        match count.checked_mul(unit) {
            Some(needed) if needed <= available => Ok(()),
            _ => Err(PayloadError::CountTooLarge { what, count, available }),
        }
    }
}

/// Decode a view payload. Cell areas are multiplied by `area_scale`.
pub fn decode(buf: &[u8], area_scale: f64) -> PayloadResult<(RasterImage, VoronoiSet)> {
    if !area_scale.is_finite() {
        return Err(PayloadError::InvalidAreaScale(area_scale));
    }

    let mut reader = Reader::new(buf);

    let width = reader.u32("raster width")?;
    let height = reader.u32("raster height")?;
    let bins = (width as u64).checked_mul(height as u64).unwrap_or(u64::MAX);
    reader.ensure("raster bins", bins, 4)?;

    let mut data = Vec::with_capacity(bins as usize);
    for _ in 0..bins {
        data.push(reader.u32("raster counts")?);
    }
    let raster = RasterImage::new(width, height, data);

    let count = reader.u32("polygon count")? as u64;
    reader.ensure("polygons", count, POLYGON_HEADER_BYTES)?;

    let mut polygons = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let num_points = reader.u32("point count")? as u64;
        let area = reader.f64("area")? * area_scale;
        let clipped = reader.u8("clipped flag")? == 1;
        let data_point = reader.point("data point")?;
        let centroid = reader.point("centroid")?;

        reader.ensure("polygon points", num_points, POINT_BYTES)?;
        let mut points = Vec::with_capacity(num_points as usize);
        for _ in 0..num_points {
            points.push(reader.point("polygon points")?);
        }

        polygons.push(Polygon {
            points,
            area,
            clipped,
            centroid,
            data_point,
        });
    }

    if reader.remaining() > 0 {
        log::debug!("Ignoring {} trailing payload bytes", reader.remaining());
    }
    log::debug!(
        "Decoded payload: {}x{} raster, {} polygons",
        raster.width,
        raster.height,
        polygons.len()
    );

    Ok((raster, VoronoiSet::new(polygons)))
}
