/*!
# Frame Export

Writes the current view as SVG or PNG. Both formats go through the same
drawing routines as the interactive canvas; only the [`DrawContext`] differs.
The PNG has no text, since the raster canvas has no font rasteriser.
*/

use anyhow::{Context, Result};
use hicvis_core::{AxisLayout, Point};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::canvas::{DrawContext, PixelCanvas, SvgCanvas, TextAnchor, TextStyle};
use crate::colour::{Colour, ColourScale};
use crate::frame::{render_frame, Layer, RenderConfig, Scene};
use crate::legend::{draw_legend, LegendRect};

const LEGEND_HEIGHT: f64 = 60.0;
const LEGEND_GAP: f64 = 10.0;
const FOOTER_HEIGHT: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    /// Version and timestamp line at the bottom. Disable for reproducible output.
    #[serde(default = "default_true")]
    pub show_footer: bool,
    #[serde(default = "default_background")]
    pub background_colour: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub provenance_comment: Option<String>,
}

fn default_size() -> u32 {
    800
}
fn default_true() -> bool {
    true
}
fn default_background() -> String {
    "#ffffff".to_string()
}
fn default_font_family() -> String {
    "Arial, sans-serif".to_string()
}
fn default_font_size() -> f64 {
    12.0
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            title: None,
            show_legend: true,
            show_footer: true,
            background_colour: default_background(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            provenance_comment: None,
        }
    }
}

pub struct Exporter {
    config: ExportConfig,
    render: RenderConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            render: RenderConfig::default(),
        }
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn text_style(&self) -> TextStyle {
        TextStyle {
            font_family: self.config.font_family.clone(),
            font_size: self.config.font_size,
            anchor: TextAnchor::Middle,
            rotation: 0.0,
        }
    }

    fn reserved_height(&self) -> f64 {
        let legend = if self.config.show_legend { LEGEND_HEIGHT + LEGEND_GAP } else { 0.0 };
        let footer = if self.config.show_footer { FOOTER_HEIGHT } else { 0.0 };
        legend + footer
    }

    /// Draw the whole export page onto `ctx`.
    pub fn draw(&self, ctx: &mut dyn DrawContext, scene: &Scene) -> Result<()> {
        let (w, h) = (self.config.width as f64, self.config.height as f64);
        let frame_height = h - self.reserved_height();
        let margin = scene.config.axis_margin;
        if frame_height <= 2.0 * margin || w <= 2.0 * margin {
            anyhow::bail!(
                "export size {}x{} leaves no room for the plot",
                self.config.width,
                self.config.height
            );
        }

        let background = Colour::parse_hex(&self.config.background_colour).unwrap_or_else(|| {
            log::warn!("Invalid background colour '{}', using white", self.config.background_colour);
            Colour::WHITE
        });
        ctx.set_alpha(1.0);
        ctx.set_fill(background);
        ctx.fill_rect(0.0, 0.0, w, h);

        let mut view = scene.view.clone();
        view.layout = AxisLayout::new(w, frame_height, margin);
        let page = Scene {
            view: &view,
            dataset: scene.dataset,
            voronoi_scale: scene.voronoi_scale,
            density_scale: scene.density_scale,
            triangle: scene.triangle,
            config: scene.config,
        };
        let text = self.text_style();
        render_frame(ctx, &page, &self.render, &text);

        if let Some(title) = &self.config.title {
            ctx.set_fill(Colour::BLACK);
            let style = TextStyle {
                font_size: text.font_size + 4.0,
                ..text.clone()
            };
            ctx.text(Point::new(w / 2.0, margin / 2.0 + style.font_size / 3.0), title, &style);
        }

        if self.config.show_legend {
            self.draw_legend(ctx, &page, frame_height);
        }

        if self.config.show_footer {
            let footer = format!(
                "HiCVis v{} | {} | Generated: {}",
                crate::VERSION,
                view_label(&page),
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            );
            ctx.set_fill(Colour::GRAY);
            let style = TextStyle {
                anchor: TextAnchor::Start,
                font_size: (text.font_size - 2.0).max(6.0),
                ..text
            };
            ctx.text(Point::new(10.0, h - 8.0), &footer, &style);
        }
        Ok(())
    }

    fn draw_legend(&self, ctx: &mut dyn DrawContext, scene: &Scene, top: f64) {
        let Some(dataset) = scene.dataset else {
            return;
        };
        let (histogram, scale) = match self.render.layer {
            Layer::Voronoi => (dataset.area_histogram.as_ref(), scene.voronoi_scale),
            Layer::Density => (dataset.density_histogram.as_ref(), scene.density_scale),
        };
        let (Some(histogram), Some(scale)) = (histogram, scale) else {
            log::debug!("No histogram for the {:?} layer, legend skipped", self.render.layer);
            return;
        };
        let l = scene.view.layout;
        let rect = LegendRect::new(l.offset_x, top + LEGEND_GAP, l.axis_width(), LEGEND_HEIGHT);
        draw_legend(ctx, histogram, &ColourScale::new(scale), &rect);
    }

    pub fn render_svg(&self, scene: &Scene) -> Result<SvgCanvas> {
        let mut svg = SvgCanvas::new(self.config.width, self.config.height);
        if let Some(comment) = &self.config.provenance_comment {
            svg.add_comment(comment);
        }
        svg.add_comment(&format!("view: {}", view_label(scene)));
        self.draw(&mut svg, scene)?;
        Ok(svg)
    }

    /// Rasterise the frame. Titles, tick labels, legend captions and the
    /// footer are omitted; use [`Exporter::render_svg`] when text is needed.
    pub fn render_png(&self, scene: &Scene) -> Result<RgbaImage> {
        let mut canvas = PixelCanvas::new(self.config.width, self.config.height, Colour::WHITE)?;
        self.draw(&mut canvas, scene)?;
        Ok(canvas.into_image())
    }

    pub fn export_svg<P: AsRef<Path>>(&self, scene: &Scene, path: P) -> Result<()> {
        let path = path.as_ref();
        let svg = self.render_svg(scene)?;
        svg.write_to_file(path)
            .with_context(|| format!("Failed to write SVG to {}", path.display()))?;
        log::info!("Exported SVG to {}", path.display());
        Ok(())
    }

    /// Write the text-free raster from [`Exporter::render_png`].
    pub fn export_png<P: AsRef<Path>>(&self, scene: &Scene, path: P) -> Result<()> {
        let path = path.as_ref();
        let img = self.render_png(scene)?;
        img.save(path)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?;
        log::info!("Exported PNG to {}", path.display());
        Ok(())
    }
}

fn view_label(scene: &Scene) -> String {
    let v = scene.view.view_bounds();
    format!(
        "{}:{:.0}-{:.0} x {}:{:.0}-{:.0}",
        scene.view.source().name,
        v.min_x,
        v.max_x,
        scene.view.target().name,
        v.min_y,
        v.max_y
    )
}
