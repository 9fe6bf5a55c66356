//! Density (raster) layer
//!
//! Bin counts are painted into a bitmap at native bin resolution and then
//! blitted onto the plot with nearest-neighbour sampling, so bin edges stay
//! sharp at any zoom.

use hicvis_core::RasterImage;
use image::{Rgba, RgbaImage};

use crate::canvas::{Affine, DrawContext};
use crate::colour::{Colour, ColourScale};
use crate::frame::PlotGeometry;

/// Map bin counts to pixels. Row 0 of the result holds the lowest y bins.
///
/// Without a colour scale the count is shown in grayscale, saturating at
/// `threshold`. With one, nonzero bins take the scale colour and empty bins
/// stay black.
pub fn render_bitmap(raster: &RasterImage, threshold: u32, scale: Option<&ColourScale>) -> RgbaImage {
    let threshold = threshold.max(1) as f64;
    let mut bitmap = RgbaImage::new(raster.width, raster.height);

    for (x, y, px) in bitmap.enumerate_pixels_mut() {
        let count = raster.get(x, y).unwrap_or(0);
        let colour = match scale {
            Some(scale) if count > 0 => scale.colour(count as f64),
            Some(_) => Colour::BLACK,
            None => Colour::gray((count as f64 / threshold * 255.0).clamp(0.0, 255.0) as u8),
        };
        *px = Rgba([colour.r, colour.g, colour.b, 255]);
    }
    bitmap
}

/// Make bins below the diagonal transparent, leaving the upper triangle that
/// the triangle view shows.
pub fn mask_lower_triangle(bitmap: &mut RgbaImage) {
    let (w, h) = (bitmap.width() as f64, bitmap.height() as f64);
    for (x, y, px) in bitmap.enumerate_pixels_mut() {
        if (x as f64 + 0.5) / w > (y as f64 + 0.5) / h {
            px[3] = 0;
        }
    }
}

/// Blit `bitmap` so it fills the plot area.
pub fn paint(ctx: &mut dyn DrawContext, bitmap: &RgbaImage, plot: &PlotGeometry) {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        log::debug!("Empty density bitmap, nothing to paint");
        return;
    }
    let to_plot = Affine::scale_non_uniform(
        plot.width / bitmap.width() as f64,
        plot.height / bitmap.height() as f64,
    );
    ctx.draw_bitmap(bitmap, &(plot.transform * to_plot));
}
