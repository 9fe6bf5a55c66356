/*!
# Drawing Contexts

All renderers draw through [`DrawContext`], so the same routines produce the
interactive raster and the exported SVG. Coordinates are canvas pixels with
the origin at the top left and y growing downwards.
*/

use anyhow::{Context, Result};
use hicvis_core::Point;
use image::{Rgba, RgbaImage};
pub use kurbo::{Affine, BezPath};
use kurbo::PathEl;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::colour::Colour;

/// Point mapping between `hicvis_core` points and kurbo transforms.
pub trait MapPoint {
    fn map_point(&self, p: Point) -> Point;
}

impl MapPoint for Affine {
    fn map_point(&self, p: Point) -> Point {
        let q = *self * kurbo::Point::new(p.x, p.y);
        Point::new(q.x, q.y)
    }
}

/// Closed path through `points`; `None` for fewer than three finite points.
pub fn polygon_path(points: &[Point]) -> Option<BezPath> {
    if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
        return None;
    }
    let mut path = BezPath::new();
    path.move_to((points[0].x, points[0].y));
    for p in &points[1..] {
        path.line_to((p.x, p.y));
    }
    path.close_path();
    Some(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub anchor: TextAnchor,
    /// Clockwise rotation in degrees about the anchor point
    pub rotation: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_size: 14.0,
            anchor: TextAnchor::Middle,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    fill: Colour,
    stroke: Colour,
    line_width: f64,
    alpha: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: Colour::BLACK,
            stroke: Colour::BLACK,
            line_width: 1.0,
            alpha: 1.0,
        }
    }
}

/// Minimal 2D drawing surface.
pub trait DrawContext {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn set_fill(&mut self, colour: Colour);
    fn set_stroke(&mut self, colour: Colour, width: f64);
    /// Opacity applied to everything drawn afterwards.
    fn set_alpha(&mut self, alpha: f64);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_path(&mut self, path: &BezPath);
    fn stroke_path(&mut self, path: &BezPath);
    fn line(&mut self, from: Point, to: Point);
    fn text(&mut self, at: Point, text: &str, style: &TextStyle);

    /// Draw `bitmap` with nearest-neighbour sampling; `transform` maps
    /// bitmap pixel coordinates onto the canvas.
    fn draw_bitmap(&mut self, bitmap: &RgbaImage, transform: &Affine);

    fn fill_polygon(&mut self, points: &[Point]) {
        if let Some(path) = polygon_path(points) {
            self.fill_path(&path);
        }
    }

    fn stroke_polygon(&mut self, points: &[Point]) {
        if let Some(path) = polygon_path(points) {
            self.stroke_path(&path);
        }
    }
}

// ----- Raster -----

fn skia_transform(t: &Affine) -> Transform {
    let [a, b, c, d, e, f] = t.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn to_pixmap(bitmap: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width(), bitmap.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(bitmap.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// In-memory RGBA canvas rasterised with tiny-skia. Anti-aliasing is off
/// so cell and bin boundaries land on whole pixels.
pub struct PixelCanvas {
    pixmap: Pixmap,
    state: DrawState,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32, background: Colour) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Cannot allocate a {}x{} canvas", width, height))?;
        pixmap.fill(tiny_skia::Color::from_rgba8(background.r, background.g, background.b, 255));
        Ok(Self {
            pixmap,
            state: DrawState::default(),
        })
    }

    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image
    }

    pub fn into_image(self) -> RgbaImage {
        self.to_image()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }

    fn paint(&self, colour: Colour) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (self.state.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        paint.set_color_rgba8(colour.r, colour.g, colour.b, alpha);
        paint.anti_alias = false;
        paint
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.state.line_width.max(0.0) as f32,
            ..Stroke::default()
        }
    }
}

impl DrawContext for PixelCanvas {
    fn width(&self) -> f64 {
        self.pixmap.width() as f64
    }

    fn height(&self) -> f64 {
        self.pixmap.height() as f64
    }

    fn set_fill(&mut self, colour: Colour) {
        self.state.fill = colour;
    }

    fn set_stroke(&mut self, colour: Colour, width: f64) {
        self.state.stroke = colour;
        self.state.line_width = width;
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let Some(rect) = tiny_skia::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        let paint = self.paint(self.state.fill);
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Even-odd fill sampled at pixel centres.
    fn fill_path(&mut self, path: &BezPath) {
        let Some(path) = skia_path(path) else {
            return;
        };
        let paint = self.paint(self.state.fill);
        self.pixmap
            .fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }

    fn stroke_path(&mut self, path: &BezPath) {
        let Some(path) = skia_path(path) else {
            return;
        };
        let paint = self.paint(self.state.stroke);
        let stroke = self.stroke();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn line(&mut self, from: Point, to: Point) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let mut path = BezPath::new();
        path.move_to((from.x, from.y));
        path.line_to((to.x, to.y));
        self.stroke_path(&path);
    }

    fn text(&mut self, _at: Point, text: &str, _style: &TextStyle) {
        // No font rasteriser; labels only appear in SVG output.
        log::trace!("Skipping raster text '{}'", text);
    }

    fn draw_bitmap(&mut self, bitmap: &RgbaImage, transform: &Affine) {
        if transform.determinant().abs() < 1e-12 {
            log::warn!("Skipping bitmap with a singular transform");
            return;
        }
        let Some(source) = to_pixmap(bitmap) else {
            log::debug!("Skipping empty {}x{} bitmap", bitmap.width(), bitmap.height());
            return;
        };
        let paint = PixmapPaint {
            opacity: self.state.alpha.clamp(0.0, 1.0) as f32,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, skia_transform(transform), None);
    }
}

// ----- SVG -----

/// Accumulates SVG elements; serialised with [`SvgCanvas::to_svg_string`].
pub struct SvgCanvas {
    width: f64,
    height: f64,
    elements: Vec<String>,
    top_comments: Vec<String>,
    state: DrawState,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            elements: Vec::new(),
            top_comments: Vec::new(),
            state: DrawState::default(),
        }
    }

    pub fn add_comment(&mut self, text: &str) {
        self.top_comments.push(text.to_string());
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn opacity_attr(&self) -> String {
        if self.state.alpha < 1.0 {
            format!(r#" opacity="{}""#, num(self.state.alpha))
        } else {
            String::new()
        }
    }

    fn path_data(path: &BezPath) -> String {
        let pt = |p: kurbo::Point| format!("{},{}", num(p.x), num(p.y));
        path.elements()
            .iter()
            .map(|el| match *el {
                PathEl::MoveTo(p) => format!("M{}", pt(p)),
                PathEl::LineTo(p) => format!("L{}", pt(p)),
                PathEl::QuadTo(p1, p2) => format!("Q{} {}", pt(p1), pt(p2)),
                PathEl::CurveTo(p1, p2, p3) => format!("C{} {} {}", pt(p1), pt(p2), pt(p3)),
                PathEl::ClosePath => "Z".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
            w = num(self.width),
            h = num(self.height)
        ));
        out.push('\n');
        for c in &self.top_comments {
            for line in c.lines() {
                out.push_str(&format!("  <!-- {} -->\n", line.replace("--", "- -")));
            }
        }
        for element in &self.elements {
            out.push_str("  ");
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_svg_string().as_bytes())?;
        Ok(())
    }
}

impl DrawContext for SvgCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn set_fill(&mut self, colour: Colour) {
        self.state.fill = colour;
    }

    fn set_stroke(&mut self, colour: Colour, width: f64) {
        self.state.stroke = colour;
        self.state.line_width = width;
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.elements.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"{}/>"#,
            num(x),
            num(y),
            num(w),
            num(h),
            self.state.fill.to_hex(),
            self.opacity_attr()
        ));
    }

    fn fill_path(&mut self, path: &BezPath) {
        self.elements.push(format!(
            r#"<path d="{}" fill="{}" fill-rule="evenodd"{}/>"#,
            Self::path_data(path),
            self.state.fill.to_hex(),
            self.opacity_attr()
        ));
    }

    fn stroke_path(&mut self, path: &BezPath) {
        self.elements.push(format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
            Self::path_data(path),
            self.state.stroke.to_hex(),
            num(self.state.line_width),
            self.opacity_attr()
        ));
    }

    fn line(&mut self, from: Point, to: Point) {
        self.elements.push(format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"{}/>"#,
            num(from.x),
            num(from.y),
            num(to.x),
            num(to.y),
            self.state.stroke.to_hex(),
            num(self.state.line_width),
            self.opacity_attr()
        ));
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        let rotate = if style.rotation != 0.0 {
            format!(
                r#" transform="rotate({} {} {})""#,
                num(style.rotation),
                num(at.x),
                num(at.y)
            )
        } else {
            String::new()
        };
        self.elements.push(format!(
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}px" text-anchor="{}" fill="{}"{}>{}</text>"#,
            num(at.x),
            num(at.y),
            style.font_family,
            num(style.font_size),
            style.anchor.svg(),
            self.state.fill.to_hex(),
            rotate,
            escape(text)
        ));
    }

    /// Emits one rect per run of identical pixels in each bitmap row.
    fn draw_bitmap(&mut self, bitmap: &RgbaImage, transform: &Affine) {
        let mut group = vec![format!(
            r#"<g transform="{}" shape-rendering="crispEdges"{}>"#,
            svg_matrix(transform),
            self.opacity_attr()
        )];
        for y in 0..bitmap.height() {
            let mut x = 0;
            while x < bitmap.width() {
                let px = *bitmap.get_pixel(x, y);
                let mut run = 1;
                while x + run < bitmap.width() && *bitmap.get_pixel(x + run, y) == px {
                    run += 1;
                }
                if px[3] > 0 {
                    let opacity = if px[3] < 255 {
                        format!(r#" fill-opacity="{}""#, num(px[3] as f64 / 255.0))
                    } else {
                        String::new()
                    };
                    group.push(format!(
                        r#"  <rect x="{}" y="{}" width="{}" height="1" fill="{}"{}/>"#,
                        x,
                        y,
                        run,
                        Colour::rgb(px[0], px[1], px[2]).to_hex(),
                        opacity
                    ));
                }
                x += run;
            }
        }
        group.push("</g>".to_string());
        self.elements.push(group.join("\n  "));
    }
}

fn svg_matrix(t: &Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

/// Compact fixed-precision number for SVG attributes.
fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_map_point_composes_in_order() {
        // Scale first, then translate.
        let t = Affine::translate((10.0, -5.0)) * Affine::scale_non_uniform(2.0, 3.0);
        let p = t.map_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, -2.0));

        let back = t.inverse().map_point(p);
        assert_relative_eq!(back.x, 1.0);
        assert_relative_eq!(back.y, 1.0);
    }

    #[test]
    fn test_polygon_path_rejects_degenerate_rings() {
        assert!(polygon_path(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_none());
        assert!(polygon_path(&[Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0), Point::new(1.0, 0.0)]).is_none());
        let path = polygon_path(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]).unwrap();
        assert_eq!(path.elements().len(), 4);
    }

    #[test]
    fn test_fill_polygon_covers_pixel_centres() {
        let mut canvas = PixelCanvas::new(10, 10, Colour::WHITE).unwrap();
        canvas.set_fill(Colour::BLACK);
        canvas.fill_polygon(&[
            Point::new(2.0, 2.0),
            Point::new(6.0, 2.0),
            Point::new(6.0, 5.0),
            Point::new(2.0, 5.0),
        ]);
        let image = canvas.to_image();
        let black = image.pixels().filter(|p| p[0] == 0).count();
        assert_eq!(black, 12);
        assert_eq!(image.get_pixel(2, 2)[0], 0);
        assert_eq!(image.get_pixel(6, 2)[0], 255);
    }

    #[test]
    fn test_alpha_blend() {
        let mut canvas = PixelCanvas::new(1, 1, Colour::WHITE).unwrap();
        canvas.set_fill(Colour::BLACK);
        canvas.set_alpha(0.5);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0);
        let px = *canvas.to_image().get_pixel(0, 0);
        assert!((126..=129).contains(&px[0]), "got {:?}", px);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_raster_text_leaves_pixels_untouched() {
        let mut canvas = PixelCanvas::new(20, 20, Colour::WHITE).unwrap();
        canvas.set_fill(Colour::BLACK);
        canvas.text(Point::new(10.0, 10.0), "chr1", &TextStyle::default());
        assert!(canvas.to_image().pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_zero_sized_canvas_is_an_error() {
        assert!(PixelCanvas::new(0, 10, Colour::WHITE).is_err());
    }

    #[test]
    fn test_bitmap_nearest_neighbour() {
        let mut bitmap = RgbaImage::new(2, 1);
        bitmap.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        bitmap.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut canvas = PixelCanvas::new(4, 2, Colour::WHITE).unwrap();
        canvas.draw_bitmap(&bitmap, &Affine::scale(2.0));
        let image = canvas.to_image();
        assert_eq!(image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(2, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_singular_bitmap_transform_is_skipped() {
        let bitmap = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let mut canvas = PixelCanvas::new(2, 2, Colour::WHITE).unwrap();
        canvas.draw_bitmap(&bitmap, &Affine::scale_non_uniform(0.0, 1.0));
        assert!(canvas.to_image().pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_svg_elements() {
        let mut svg = SvgCanvas::new(100, 50);
        svg.set_fill(Colour::rgb(255, 0, 0));
        svg.fill_polygon(&[Point::new(0.0, 0.0), Point::new(10.5, 0.0), Point::new(10.0, 10.25)]);
        svg.text(Point::new(5.0, 5.0), "a < b", &TextStyle::default());
        let out = svg.to_svg_string();
        assert!(out.contains(r##"<path d="M0,0 L10.5,0 L10,10.25 Z" fill="#ff0000" fill-rule="evenodd"/>"##));
        assert!(out.contains("a &lt; b"));
        assert!(out.starts_with("<?xml"));
    }

    #[test]
    fn test_svg_matrix_uses_canvas_coefficient_order() {
        let t = Affine::new([1.0, 0.0, 0.0, -1.0, 50.0, 750.0]);
        assert_eq!(svg_matrix(&t), "matrix(1 0 0 -1 50 750)");
    }

    #[test]
    fn test_num_format() {
        assert_eq!(num(3.0), "3");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(2.345), "2.35");
    }
}
