//! Render command: decode a server payload for one view and export it as
//! SVG or PNG.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hicvis_core::{
    DomainOverride, FetchRequest, GenomeBrowser, Locus, ResponseOutcome, ScaleTarget, Session, UrlState,
};
use hicvis_render::{Exporter, Layer, Scene};
use std::path::{Path, PathBuf};

use crate::commands::{load_catalog, load_interactions, read_payload};
use crate::config::Config;
use crate::error::CliError;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerArg {
    Density,
    Voronoi,
}

impl From<LayerArg> for Layer {
    fn from(layer: LayerArg) -> Self {
        match layer {
            LayerArg::Density => Layer::Density,
            LayerArg::Voronoi => Layer::Voronoi,
        }
    }
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Raw payload returned by the server for this view
    #[arg(long, required = true)]
    pub payload: PathBuf,

    /// Chromosome details JSON
    #[arg(long, required = true)]
    pub catalog: PathBuf,

    /// Interactions JSON feed
    #[arg(long)]
    pub interactions: Option<PathBuf>,

    /// UCSC interact track
    #[arg(long)]
    pub interact: Option<PathBuf>,

    /// View as a URL query (srcChrom=...&srcStart=...)
    #[arg(long, conflicts_with_all = ["x", "y"])]
    pub view: Option<String>,

    /// X-axis locus, e.g. chr2L:1,000-50,000
    #[arg(long)]
    pub x: Option<Locus>,

    /// Y-axis locus; defaults to the X locus in triangle view
    #[arg(long)]
    pub y: Option<Locus>,

    /// Show the chromosome against itself, upper triangle only
    #[arg(long)]
    pub triangle: bool,

    /// Output file (SVG/PNG)
    #[arg(short, long, required = true)]
    pub out: PathBuf,

    /// Output format (auto-detected from extension); PNG output carries no text
    #[arg(long)]
    pub format: Option<RenderFormat>,

    /// Layer to draw
    #[arg(long)]
    pub layer: Option<LayerArg>,

    /// Width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long)]
    pub title: Option<String>,

    /// Omit the version/timestamp footer
    #[arg(long)]
    pub no_footer: bool,

    #[arg(long)]
    pub no_legend: bool,

    /// Draw Voronoi cell edges
    #[arg(long)]
    pub edges: bool,

    /// Mark cell centroids
    #[arg(long)]
    pub centroids: bool,

    /// Mark cell data points
    #[arg(long)]
    pub data_points: bool,

    /// Legend bin to use as the low end of the colour domain
    #[arg(long)]
    pub low_bin: Option<usize>,

    /// Legend bin to use as the high end of the colour domain
    #[arg(long)]
    pub high_bin: Option<usize>,
}

/// Genome browser stand-in that reports where it would navigate.
struct LoggingBrowser {
    axis: &'static str,
}

impl GenomeBrowser for LoggingBrowser {
    fn search(&mut self, locus: &str) {
        log::info!("{} browser: {}", self.axis, locus);
    }
}

pub fn execute(config: &Config, args: RenderArgs) -> Result<()> {
    log::info!("Starting view rendering");
    log::info!("Payload: {}", args.payload.display());
    log::info!("Output file: {}", args.out.display());

    let render_format = args.format.unwrap_or_else(|| detect_render_format(&args.out));
    log::info!("Output format: {:?}", render_format);

    let catalog = load_catalog(&args.catalog)?;
    let interactions = load_interactions(args.interactions.as_deref(), args.interact.as_deref())?;

    let initial = initial_view(&args)?;
    if let Some(url) = &initial {
        for chrom in [&url.src_chrom, &url.tar_chrom] {
            catalog
                .get(chrom)
                .map_err(|e| CliError::invalid_view(e.to_string()))?;
        }
    }

    let mut session = Session::new(config.viewer.clone(), catalog, interactions, initial)
        .context("Failed to start viewer session")?;

    let request = first_request(&mut session, args.triangle);
    log::info!("Request: {}", request.query_string());

    let bytes = read_payload(&args.payload)?;
    match session.complete(request.id, Ok(bytes)) {
        ResponseOutcome::Applied(change) => log::debug!("View change: {:?}", change),
        ResponseOutcome::Stale => {
            return Err(CliError::response(format!("request {} is no longer current", request.id)).into())
        }
        ResponseOutcome::Failed(e) => {
            return Err(e).with_context(|| format!("Failed to apply payload {}", args.payload.display()))
        }
    }

    let mut render = config.render.clone();
    if let Some(layer) = args.layer {
        render.layer = layer.into();
    }
    render.voronoi.edges |= args.edges;
    render.voronoi.centroids |= args.centroids;
    render.voronoi.data_points |= args.data_points;

    apply_legend_overrides(&mut session, render.layer, args.low_bin, args.high_bin)?;

    session.sync_browsers(&mut LoggingBrowser { axis: "X" }, &mut LoggingBrowser { axis: "Y" });

    let mut export = config.export.clone();
    export.width = args.width.unwrap_or(export.width);
    export.height = args.height.unwrap_or(export.height);
    if args.title.is_some() {
        export.title = args.title;
    }
    export.show_footer &= !args.no_footer;
    export.show_legend &= !args.no_legend;
    if export.provenance_comment.is_none() {
        export.provenance_comment = Some(format!("request: {}", request.query_string()));
    }

    let exporter = Exporter::new(export).with_render(render);
    let scene = Scene::from_session(&session);
    match render_format {
        RenderFormat::Svg => exporter.export_svg(&scene, &args.out)?,
        RenderFormat::Png => {
            log::info!("PNG output omits labels; use SVG for a titled frame");
            exporter.export_png(&scene, &args.out)?
        }
    }

    log::info!("View URL: ?{}", session.current_url().to_query());
    Ok(())
}

/// View to start from: an explicit URL query, or `--x`/`--y` loci.
fn initial_view(args: &RenderArgs) -> Result<Option<UrlState>> {
    if let Some(query) = &args.view {
        let url = UrlState::from_query(query)
            .ok_or_else(|| CliError::invalid_view(format!("cannot parse view query '{}'", query)))?;
        return Ok(Some(url));
    }

    let y = match (&args.x, &args.y) {
        (None, None) => return Ok(None),
        (Some(x), None) if args.triangle => x.clone(),
        (Some(_), Some(y)) => y.clone(),
        _ => return Err(CliError::invalid_view("both --x and --y are needed outside triangle view").into()),
    };
    let x = args.x.clone().unwrap_or_else(|| y.clone());
    let y = if args.triangle { x.clone() } else { y };

    Ok(Some(UrlState {
        src_chrom: x.chr,
        src_start: x.start,
        src_end: x.end,
        tar_chrom: y.chr,
        tar_start: y.start,
        tar_end: y.end,
        triangle_view: args.triangle,
    }))
}

fn first_request(session: &mut Session, triangle: bool) -> FetchRequest {
    let toggled = if triangle { session.set_triangle_view(true) } else { None };
    toggled.unwrap_or_else(|| session.request_current_view())
}

fn apply_legend_overrides(
    session: &mut Session,
    layer: Layer,
    low_bin: Option<usize>,
    high_bin: Option<usize>,
) -> Result<()> {
    let target = match layer {
        Layer::Voronoi => ScaleTarget::Voronoi,
        Layer::Density => ScaleTarget::Density,
    };

    for (bin, low) in [(low_bin, true), (high_bin, false)] {
        let Some(bin) = bin else { continue };
        let value = session.legend_value(target, bin).ok_or_else(|| {
            CliError::invalid_view(format!("no {:?} histogram to take bin {} from", target, bin))
        })?;
        log::info!("Legend bin {} -> domain value {:.4}", bin, value);
        let change = if low { DomainOverride::Low(value) } else { DomainOverride::High(value) };
        session.override_domain(target, change);
    }
    Ok(())
}

fn detect_render_format(path: &Path) -> RenderFormat {
    match path.extension().and_then(|s| s.to_str()) {
        Some("svg") => RenderFormat::Svg,
        Some("png") => RenderFormat::Png,
        _ => {
            log::warn!("Could not detect output format from extension, defaulting to SVG");
            RenderFormat::Svg
        }
    }
}
