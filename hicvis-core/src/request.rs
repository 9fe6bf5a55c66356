//! Debounced view requests and the fetch query they turn into

use std::time::{Duration, Instant};

use crate::types::{Dimension, Locus};
use crate::view::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerState {
    Idle,
    PendingX,
    PendingY,
    PendingXY,
}

/// Collapses bursts of per-axis locus updates into one request.
///
/// Each update restarts the quiet period. When it expires the latest X and
/// Y loci are released together, but only if both axes have been reported;
/// a lone axis update is dropped.
#[derive(Debug, Clone)]
pub struct RequestCoalescer {
    state: CoalescerState,
    interval: Duration,
    deadline: Option<Instant>,
    x: Option<Locus>,
    y: Option<Locus>,
}

impl RequestCoalescer {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: CoalescerState::Idle,
            interval,
            deadline: None,
            x: None,
            y: None,
        }
    }

    pub fn state(&self) -> CoalescerState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn update(&mut self, dimension: Dimension, locus: Locus, now: Instant) {
        match dimension {
            Dimension::X => self.x = Some(locus),
            Dimension::Y => self.y = Some(locus),
        }

        self.state = match (self.state, dimension) {
            (CoalescerState::PendingXY, _) => CoalescerState::PendingXY,
            (CoalescerState::PendingX, Dimension::Y) | (CoalescerState::PendingY, Dimension::X) => {
                CoalescerState::PendingXY
            }
            (_, Dimension::X) if self.y.is_some() => CoalescerState::PendingXY,
            (_, Dimension::Y) if self.x.is_some() => CoalescerState::PendingXY,
            (_, Dimension::X) => CoalescerState::PendingX,
            (_, Dimension::Y) => CoalescerState::PendingY,
        };
        self.deadline = Some(now + self.interval);
    }

    /// Release the coalesced `(x, y)` pair once the quiet period has passed.
    pub fn poll(&mut self, now: Instant) -> Option<(Locus, Locus)> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        let state = std::mem::replace(&mut self.state, CoalescerState::Idle);
        self.deadline = None;
        match (state, &self.x, &self.y) {
            (CoalescerState::PendingXY, Some(x), Some(y)) => Some((x.clone(), y.clone())),
            _ => {
                log::debug!("Debounce expired with only one axis known; no fetch");
                None
            }
        }
    }

    /// Record the loci of the view that was actually applied.
    ///
    /// Does not arm the deadline. An axis with an update still waiting to be
    /// released keeps its pending locus.
    pub fn sync(&mut self, x: Locus, y: Locus) {
        let (keep_x, keep_y) = match self.state {
            CoalescerState::Idle => (false, false),
            CoalescerState::PendingX => (true, false),
            CoalescerState::PendingY => (false, true),
            CoalescerState::PendingXY => (true, true),
        };
        if !keep_x {
            self.x = Some(x);
        }
        if !keep_y {
            self.y = Some(y);
        }
    }
}

/// Bin-size limits applied when sizing a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSizing {
    pub desired_bins: u32,
    pub min_bin_size: f64,
    pub max_bin_count: u32,
}

impl BinSizing {
    /// Bin size for a span: `span / desired_bins`, raised to the minimum bin
    /// size and to whatever keeps the count under the maximum.
    pub fn bin_size(&self, span: f64) -> u64 {
        let span = span.max(0.0);
        let candidate = span / self.desired_bins.max(1) as f64;
        let for_max_count = span / self.max_bin_count.max(1) as f64;
        candidate.max(self.min_bin_size).max(for_max_count).max(1.0).ceil() as u64
    }
}

/// One outgoing data fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub id: u64,
    pub source_chrom: String,
    pub target_chrom: String,
    pub bounds: Bounds,
    pub smoothing_iterations: u32,
    pub bin_size_x: u64,
    pub bin_size_y: u64,
    /// Multiplier that turns server cell areas into data-space areas.
    pub area_scale: f64,
}

impl FetchRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let b = self.bounds;
        vec![
            ("smoothingIterations", self.smoothing_iterations.to_string()),
            ("binSizeX", self.bin_size_x.to_string()),
            ("binSizeY", self.bin_size_y.to_string()),
            ("sourceChrom", self.source_chrom.clone()),
            ("targetChrom", self.target_chrom.clone()),
            ("xStart", format!("{}", b.min_x.round() as i64)),
            ("xEnd", format!("{}", b.max_x.round() as i64)),
            ("yStart", format!("{}", b.min_y.round() as i64)),
            ("yEnd", format!("{}", b.max_y.round() as i64)),
        ]
    }

    pub fn query_string(&self) -> String {
        encode_query(&self.query_pairs())
    }
}

pub(crate) fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    fn locus(chr: &str, start: i64, end: i64) -> Locus {
        Locus::new(chr, start, end)
    }

    #[test]
    fn test_x_then_y_fires_once() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 0, 10), t0);
        assert_eq!(c.state(), CoalescerState::PendingX);
        c.update(Dimension::Y, locus("chr2", 5, 15), t0 + Duration::from_millis(20));
        assert_eq!(c.state(), CoalescerState::PendingXY);

        // Deadline moved by the second update.
        assert!(c.poll(t0 + Duration::from_millis(60)).is_none());
        let (x, y) = c.poll(t0 + Duration::from_millis(70)).unwrap();
        assert_eq!(x, locus("chr1", 0, 10));
        assert_eq!(y, locus("chr2", 5, 15));
        assert_eq!(c.state(), CoalescerState::Idle);
        assert!(c.poll(t0 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_sync_does_not_fire_on_its_own() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.sync(locus("chr1", 0, 100), locus("chr1", 0, 100));
        assert_eq!(c.state(), CoalescerState::Idle);
        assert!(c.deadline().is_none());
        assert!(c.poll(t0 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_single_axis_after_sync_uses_synced_other_axis() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 0, 10), t0);
        c.update(Dimension::Y, locus("chr2", 0, 10), t0);
        assert!(c.poll(t0 + INTERVAL).is_some());

        // The applied view widened to another pair.
        c.sync(locus("chr3", 0, 500), locus("chr4", 0, 800));
        c.update(Dimension::Y, locus("chr4", 100, 200), t0 + INTERVAL);
        assert_eq!(c.state(), CoalescerState::PendingXY);
        let (x, y) = c.poll(t0 + INTERVAL * 2).unwrap();
        assert_eq!(x, locus("chr3", 0, 500));
        assert_eq!(y, locus("chr4", 100, 200));
    }

    #[test]
    fn test_sync_keeps_pending_axis() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 40, 60), t0);
        c.sync(locus("chr1", 0, 100), locus("chr2", 0, 100));
        assert_eq!(c.state(), CoalescerState::PendingX);
        c.update(Dimension::Y, locus("chr2", 10, 20), t0);
        let (x, y) = c.poll(t0 + INTERVAL).unwrap();
        assert_eq!(x, locus("chr1", 40, 60));
        assert_eq!(y, locus("chr2", 10, 20));
    }

    #[test]
    fn test_single_axis_never_fires() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 0, 10), t0);
        assert!(c.poll(t0 + Duration::from_secs(1)).is_none());
        assert_eq!(c.state(), CoalescerState::Idle);
    }

    #[test]
    fn test_latest_values_win() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 0, 10), t0);
        c.update(Dimension::Y, locus("chr1", 0, 10), t0);
        c.update(Dimension::X, locus("chr1", 3, 7), t0);
        let (x, _) = c.poll(t0 + INTERVAL).unwrap();
        assert_eq!(x, locus("chr1", 3, 7));
    }

    #[test]
    fn test_known_axis_completes_later_update() {
        let t0 = Instant::now();
        let mut c = RequestCoalescer::new(INTERVAL);
        c.update(Dimension::X, locus("chr1", 0, 10), t0);
        c.update(Dimension::Y, locus("chr1", 0, 10), t0);
        assert!(c.poll(t0 + INTERVAL).is_some());

        // Both loci are remembered, so one further axis update is enough.
        c.update(Dimension::Y, locus("chr1", 2, 8), t0 + INTERVAL);
        assert_eq!(c.state(), CoalescerState::PendingXY);
        assert!(c.poll(t0 + INTERVAL * 2).is_some());
    }

    #[test]
    fn test_bin_size_negotiation() {
        let sizing = BinSizing {
            desired_bins: 200,
            min_bin_size: 1000.0,
            max_bin_count: 1000,
        };
        assert_eq!(sizing.bin_size(10_000_000.0), 50_000);
        assert_eq!(sizing.bin_size(20_000.0), 1000);

        let capped = BinSizing {
            desired_bins: 5000,
            min_bin_size: 1.0,
            max_bin_count: 100,
        };
        assert_eq!(capped.bin_size(10_000.0), 100);
    }

    #[test]
    fn test_query_string() {
        let req = FetchRequest {
            id: 1,
            source_chrom: "chr1".into(),
            target_chrom: "chr X".into(),
            bounds: Bounds::new(0.0, 100.4, 10.0, 20.0),
            smoothing_iterations: 1,
            bin_size_x: 5,
            bin_size_y: 6,
            area_scale: 1.0,
        };
        assert_eq!(
            req.query_string(),
            "smoothingIterations=1&binSizeX=5&binSizeY=6&sourceChrom=chr1&targetChrom=chr%20X&xStart=0&xEnd=100&yStart=10&yEnd=20"
        );
    }
}
