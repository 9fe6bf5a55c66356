//! Application state for one viewer session
//!
//! A [`Session`] owns everything that changes while the user browses: the
//! applied view, the debounced request coalescer, the last decoded dataset,
//! the colour-scale domains and the URL history. Events come in through its
//! methods; fetches go out as [`FetchRequest`] values and come back through
//! [`Session::complete`].

use std::time::Instant;

use crate::catalog::ChromosomeCatalog;
use crate::config::ViewerConfig;
use crate::error::{HicvisError, HicvisResult};
use crate::histogram::{percentile_threshold, DomainOverride, Histogram, QuantizeScale, Transform};
use crate::interact::InteractionIndex;
use crate::payload;
use crate::request::{FetchRequest, RequestCoalescer};
use crate::types::{Chromosome, Dimension, Locus, RasterImage, VoronoiSet};
use crate::url::UrlState;
use crate::view::{Bounds, RegionSelected, ViewChange, ViewState};

/// Genome-browser widget driven by the session.
pub trait GenomeBrowser {
    /// Navigate to a `chr:start-end` locus.
    fn search(&mut self, locus: &str);
}

/// Which colour scale a legend event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleTarget {
    Voronoi,
    Density,
}

/// Decoded payload plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub raster: RasterImage,
    pub voronoi: VoronoiSet,
    /// `ln(area)` over cells that do not touch the data boundary
    pub area_histogram: Option<Histogram>,
    /// Nonzero raster bin counts
    pub density_histogram: Option<Histogram>,
    pub density_threshold: u32,
}

#[derive(Debug)]
pub enum ResponseOutcome {
    Applied(ViewChange),
    /// A newer request has been issued since; the response was dropped.
    Stale,
    /// The fetch or decode failed; the previous view is kept.
    Failed(HicvisError),
}

pub struct Session {
    config: ViewerConfig,
    catalog: ChromosomeCatalog,
    interactions: InteractionIndex,
    view: ViewState,
    coalescer: RequestCoalescer,
    next_request_id: u64,
    in_flight: Option<FetchRequest>,
    triangle_view: bool,
    dataset: Option<Dataset>,
    voronoi_scale: Option<QuantizeScale>,
    density_scale: Option<QuantizeScale>,
    history: Vec<UrlState>,
}

impl Session {
    /// Start a session at the view named by `initial`, or at the first
    /// chromosome against itself when the URL state is absent or names
    /// unknown chromosomes.
    pub fn new(
        config: ViewerConfig,
        catalog: ChromosomeCatalog,
        interactions: InteractionIndex,
        initial: Option<UrlState>,
    ) -> HicvisResult<Self> {
        config.validate()?;
        let first = catalog
            .first()
            .cloned()
            .ok_or_else(|| HicvisError::config("chromosome catalog is empty"))?;

        let resolved = initial.as_ref().and_then(|url| {
            let source = catalog.get(&url.src_chrom).ok()?.clone();
            let target = if url.triangle_view {
                source.clone()
            } else {
                catalog.get(&url.tar_chrom).ok()?.clone()
            };
            Some((url, source, target))
        });

        let mut view = ViewState::new(first.clone(), first, config.layout());
        view.tick_count = config.tick_count;
        view.tick_decimals = config.tick_decimals;
        let mut triangle_view = false;

        match resolved {
            Some((url, source, target)) => {
                // The triangle view only shows a chromosome against itself.
                let (tar_start, tar_end) = if url.triangle_view {
                    if url.tar_chrom != url.src_chrom {
                        log::warn!(
                            "Triangle view of {} ignores target {}",
                            url.src_chrom,
                            url.tar_chrom
                        );
                    }
                    (url.src_start, url.src_end)
                } else {
                    (url.tar_start, url.tar_end)
                };
                view.set_chrom_pair(source, target);
                view.update_view(
                    url.src_start as f64,
                    url.src_end as f64,
                    tar_start as f64,
                    tar_end as f64,
                );
                triangle_view = url.triangle_view;
            }
            None => {
                if let Some(url) = &initial {
                    log::warn!(
                        "URL names unknown chromosomes {} / {}; starting at full extent",
                        url.src_chrom,
                        url.tar_chrom
                    );
                }
            }
        }

        let interactions_in_view = interactions.for_pair(view.source(), view.target());
        view.set_interactions(interactions_in_view);

        Ok(Self {
            coalescer: RequestCoalescer::new(config.debounce()),
            config,
            catalog,
            interactions,
            view,
            next_request_id: 0,
            in_flight: None,
            triangle_view,
            dataset: None,
            voronoi_scale: None,
            density_scale: None,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ChromosomeCatalog {
        &self.catalog
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn scale(&self, target: ScaleTarget) -> Option<QuantizeScale> {
        match target {
            ScaleTarget::Voronoi => self.voronoi_scale,
            ScaleTarget::Density => self.density_scale,
        }
    }

    pub fn triangle_view(&self) -> bool {
        self.triangle_view
    }

    /// Every applied view, oldest first.
    pub fn history(&self) -> &[UrlState] {
        &self.history
    }

    pub fn in_flight(&self) -> Option<&FetchRequest> {
        self.in_flight.as_ref()
    }

    pub fn current_url(&self) -> UrlState {
        let v = self.view.view_bounds();
        UrlState {
            src_chrom: self.view.source().name.clone(),
            src_start: v.min_x.round() as i64,
            src_end: v.max_x.round() as i64,
            tar_chrom: self.view.target().name.clone(),
            tar_start: v.min_y.round() as i64,
            tar_end: v.max_y.round() as i64,
            triangle_view: self.triangle_view,
        }
    }

    /// Loci of the applied view, for the X and Y genome browsers.
    pub fn browser_loci(&self) -> (Locus, Locus) {
        let url = self.current_url();
        (url.source_locus(), url.target_locus())
    }

    pub fn sync_browsers(&self, x: &mut dyn GenomeBrowser, y: &mut dyn GenomeBrowser) {
        let (x_locus, y_locus) = self.browser_loci();
        x.search(&x_locus.to_string());
        y.search(&y_locus.to_string());
    }

    /// Feed a per-axis locus change from a genome browser.
    ///
    /// Returns `false` when the locus matches the applied view on that
    /// axis, in which case the debounce window is left alone.
    pub fn request_axis(&mut self, dimension: Dimension, locus: Locus, now: Instant) -> bool {
        let v = self.view.view_bounds();
        let (chrom, start, end) = match dimension {
            Dimension::X => (self.view.source(), v.min_x, v.max_x),
            Dimension::Y => (self.view.target(), v.min_y, v.max_y),
        };
        let unchanged =
            chrom.name == locus.chr && start.round() as i64 == locus.start && end.round() as i64 == locus.end;
        if unchanged {
            return false;
        }

        self.coalescer.update(dimension, locus, now);
        true
    }

    /// Drag-selected region: queue it on both axes and return the loci the
    /// genome browsers should be moved to.
    pub fn select_region(&mut self, region: RegionSelected, now: Instant) -> (Locus, Locus) {
        let x = Locus::new(
            self.view.source().name.clone(),
            region.min.x.round() as i64,
            region.max.x.round() as i64,
        );
        let y = Locus::new(
            self.view.target().name.clone(),
            region.min.y.round() as i64,
            region.max.y.round() as i64,
        );
        self.request_axis(Dimension::X, x.clone(), now);
        self.request_axis(Dimension::Y, y.clone(), now);
        (x, y)
    }

    /// Release a fetch once the debounce window has closed with both axes
    /// known. An unknown chromosome drops that request only.
    pub fn poll(&mut self, now: Instant) -> Option<FetchRequest> {
        let (x, y) = self.coalescer.poll(now)?;
        match self.resolve(&x, &y) {
            Ok(request) => Some(request),
            Err(e) => {
                log::warn!("Rejected view request {} x {}: {}", x, y, e);
                None
            }
        }
    }

    fn resolve(&mut self, x: &Locus, y: &Locus) -> HicvisResult<FetchRequest> {
        let source = self.catalog.get(&x.chr)?.clone();
        let (target, mut y_range) = if self.triangle_view {
            (source.clone(), (x.start, x.end))
        } else {
            (self.catalog.get(&y.chr)?.clone(), (y.start, y.end))
        };
        let mut x_range = (x.start.max(0), x.end);
        y_range.0 = y_range.0.max(0);

        let pair_changed = &source != self.view.source() || &target != self.view.target();
        if pair_changed {
            x_range = (0, source.length as i64);
            y_range = (0, target.length as i64);
        }

        let bounds = Bounds::new(
            x_range.0 as f64,
            x_range.1 as f64,
            y_range.0 as f64,
            y_range.1 as f64,
        )
        .clamped_to(&Bounds::of_pair(&source, &target));

        Ok(self.issue(source, target, bounds))
    }

    fn issue(&mut self, source: Chromosome, target: Chromosome, bounds: Bounds) -> FetchRequest {
        self.next_request_id += 1;
        let sizing = self.config.bin_sizing();
        let request = FetchRequest {
            id: self.next_request_id,
            source_chrom: source.name,
            target_chrom: target.name,
            bounds,
            smoothing_iterations: self.config.smoothing_iterations,
            bin_size_x: sizing.bin_size(bounds.width()),
            bin_size_y: sizing.bin_size(bounds.height()),
            area_scale: payload::area_scale(
                self.config.draw_width as f64,
                self.config.draw_height as f64,
                bounds.width().max(1.0),
                bounds.height().max(1.0),
            ),
        };
        log::debug!("Issuing request {}: {}", request.id, request.query_string());
        self.in_flight = Some(request.clone());
        request
    }

    /// Fetch the currently applied view again, e.g. on start-up.
    pub fn request_current_view(&mut self) -> FetchRequest {
        let source = self.view.source().clone();
        let target = self.view.target().clone();
        self.issue(source, target, self.view.view_bounds())
    }

    /// Double-click: fetch the full extent of the current pair.
    pub fn reset_view(&mut self) -> FetchRequest {
        let source = self.view.source().clone();
        let target = self.view.target().clone();
        self.issue(source, target, self.view.data_bounds())
    }

    /// Toggle the triangle (self-comparison) display. Turning it on fetches
    /// the X chromosome and range against itself.
    pub fn set_triangle_view(&mut self, enabled: bool) -> Option<FetchRequest> {
        if self.triangle_view == enabled {
            return None;
        }
        self.triangle_view = enabled;
        if !enabled {
            return None;
        }

        let source = self.view.source().clone();
        let v = self.view.view_bounds();
        let bounds = Bounds::new(v.min_x, v.max_x, v.min_x, v.max_x);
        Some(self.issue(source.clone(), source, bounds))
    }

    /// Apply a fetch result. Only the most recently issued request is
    /// applied; earlier ones are reported stale and ignored.
    pub fn complete<B: AsRef<[u8]>>(&mut self, id: u64, response: HicvisResult<B>) -> ResponseOutcome {
        let request = match &self.in_flight {
            Some(r) if r.id == id => r.clone(),
            _ => {
                log::debug!("Dropping stale response {}", id);
                return ResponseOutcome::Stale;
            }
        };
        self.in_flight = None;

        let bytes = match response {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Request {} failed: {}", id, e);
                return ResponseOutcome::Failed(e);
            }
        };

        let (raster, voronoi) = match payload::decode(bytes.as_ref(), request.area_scale) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::error!("Request {} returned an unreadable payload: {}", id, e);
                return ResponseOutcome::Failed(e.into());
            }
        };

        let (source, target) = match (
            self.catalog.get(&request.source_chrom),
            self.catalog.get(&request.target_chrom),
        ) {
            (Ok(s), Ok(t)) => (s.clone(), t.clone()),
            (Err(e), _) | (_, Err(e)) => return ResponseOutcome::Failed(e),
        };

        self.apply_dataset(raster, voronoi);

        if &source != self.view.source() || &target != self.view.target() {
            self.view.set_chrom_pair(source, target);
        }
        let b = request.bounds;
        let change = self.view.update_view(b.min_x, b.max_x, b.min_y, b.max_y);
        let (x, y) = self.browser_loci();
        self.coalescer.sync(x, y);

        let interactions = self.interactions.for_pair(self.view.source(), self.view.target());
        self.view.set_interactions(interactions);

        self.history.push(self.current_url());
        log::info!(
            "Applied view {} ({} cells)",
            self.current_url().to_query(),
            self.dataset.as_ref().map(|d| d.voronoi.len()).unwrap_or(0)
        );
        ResponseOutcome::Applied(change)
    }

    fn apply_dataset(&mut self, raster: RasterImage, voronoi: VoronoiSet) {
        let bins = self.config.histogram_bins;
        let colours = self.config.colour_count;

        let area_histogram = Histogram::build(
            voronoi.polygons.iter().filter(|p| !p.clipped).map(|p| p.area),
            bins,
            Transform::Ln,
        );
        let density_histogram =
            Histogram::build(raster.nonzero_values().map(f64::from), bins, Transform::Identity);
        let density_threshold = percentile_threshold(raster.data.iter().copied(), self.config.percentile);

        self.voronoi_scale = area_histogram.as_ref().map(|h| QuantizeScale::from_histogram(h, colours));
        self.density_scale = density_histogram
            .as_ref()
            .map(|h| QuantizeScale::from_histogram(h, colours));

        self.dataset = Some(Dataset {
            raster,
            voronoi,
            area_histogram,
            density_histogram,
            density_threshold,
        });
    }

    /// Domain value under a legend bin, if that histogram exists.
    pub fn legend_value(&self, target: ScaleTarget, bin: usize) -> Option<f64> {
        let dataset = self.dataset.as_ref()?;
        let histogram = match target {
            ScaleTarget::Voronoi => dataset.area_histogram.as_ref(),
            ScaleTarget::Density => dataset.density_histogram.as_ref(),
        }?;
        Some(histogram.value_at(bin))
    }

    /// Recalibrate one scale. Geometry is untouched; the next paint uses the
    /// new domain.
    pub fn override_domain(&mut self, target: ScaleTarget, change: DomainOverride) -> bool {
        let slot = match target {
            ScaleTarget::Voronoi => &mut self.voronoi_scale,
            ScaleTarget::Density => &mut self.density_scale,
        };
        match slot {
            Some(scale) => {
                *scale = scale.with_override(change);
                true
            }
            None => false,
        }
    }
}
