use byteorder::{BigEndian, WriteBytesExt};
use hicvis_core::{
    Chromosome, ChromosomeCatalog, Dimension, DomainOverride, GenomeBrowser, HicvisError, InteractionIndex, Locus,
    Bounds, ResponseOutcome, ScaleTarget, Session, UrlState, ViewerConfig,
};
use std::time::{Duration, Instant};

fn catalog() -> ChromosomeCatalog {
    ChromosomeCatalog::from_json(
        r#"{"Genome": "dm6", "Chromosomes": [
            {"Name": "chr2L", "Length": 20000},
            {"Name": "chr3R", "Length": 30000}
        ]}"#,
    )
    .expect("parse catalog")
}

fn interactions() -> InteractionIndex {
    InteractionIndex::from_json(
        r#"{"Interactions": {"chr3R-chr2L": [
            {"SourceChrom": "chr3R", "SourceStart": 100, "SourceEnd": 200,
             "TargetChrom": "chr2L", "TargetStart": 300, "TargetEnd": 400}
        ]}}"#,
    )
    .expect("parse interactions")
}

/// One raster row and three cells, one of which touches the boundary.
fn payload() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<BigEndian>(3).unwrap();
    buf.write_u32::<BigEndian>(1).unwrap();
    for c in [0u32, 2, 8] {
        buf.write_u32::<BigEndian>(c).unwrap();
    }
    buf.write_u32::<BigEndian>(3).unwrap();
    for (area, clipped) in [(20.0, false), (400.0, false), (9000.0, true)] {
        buf.write_u32::<BigEndian>(3).unwrap();
        buf.write_f64::<BigEndian>(area).unwrap();
        buf.write_u8(clipped as u8).unwrap();
        for v in [10.0, 10.0, 12.0, 12.0] {
            buf.write_f64::<BigEndian>(v).unwrap();
        }
        for (x, y) in [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)] {
            buf.write_f64::<BigEndian>(x).unwrap();
            buf.write_f64::<BigEndian>(y).unwrap();
        }
    }
    buf
}

/// Pan both axes, release the fetch and apply it.
fn apply_view(s: &mut Session, x: Locus, y: Locus, t0: Instant) {
    s.request_axis(Dimension::X, x, t0);
    s.request_axis(Dimension::Y, y, t0);
    let request = s.poll(t0 + Duration::from_millis(50)).expect("fetch");
    assert!(matches!(s.complete(request.id, Ok(payload())), ResponseOutcome::Applied(_)));
}

fn session() -> Session {
    Session::new(ViewerConfig::default(), catalog(), interactions(), None).expect("create session")
}

#[derive(Default)]
struct RecordingBrowser {
    searches: Vec<String>,
}

impl GenomeBrowser for RecordingBrowser {
    fn search(&mut self, locus: &str) {
        self.searches.push(locus.to_string());
    }
}

#[test]
fn x_then_y_within_window_fetches_once() {
    let mut s = session();
    let t0 = Instant::now();

    assert!(s.request_axis(Dimension::X, Locus::new("chr2L", 1000, 5000), t0));
    assert!(s.poll(t0 + Duration::from_millis(10)).is_none());
    assert!(s.request_axis(Dimension::Y, Locus::new("chr2L", 2000, 6000), t0 + Duration::from_millis(20)));

    let request = s.poll(t0 + Duration::from_millis(70)).expect("one fetch");
    assert_eq!(request.source_chrom, "chr2L");
    assert_eq!(request.bounds.min_x, 1000.0);
    assert_eq!(request.bounds.max_y, 6000.0);
    assert!(s.poll(t0 + Duration::from_millis(500)).is_none());
}

#[test]
fn x_only_never_fetches() {
    let mut s = session();
    let t0 = Instant::now();
    s.request_axis(Dimension::X, Locus::new("chr2L", 1000, 5000), t0);
    assert!(s.poll(t0 + Duration::from_secs(5)).is_none());
}

#[test]
fn applied_response_updates_everything() {
    let mut s = session();
    let t0 = Instant::now();
    s.request_axis(Dimension::X, Locus::new("chr3R", 0, 1), t0);
    s.request_axis(Dimension::Y, Locus::new("chr2L", 0, 1), t0);
    let request = s.poll(t0 + Duration::from_millis(50)).expect("fetch");

    match s.complete(request.id, Ok(payload())) {
        ResponseOutcome::Applied(change) => assert_eq!(change.view.max_x, 30000.0),
        other => panic!("expected applied, got {:?}", other),
    }

    assert_eq!(s.view().source().name, "chr3R");
    assert_eq!(s.view().target().name, "chr2L");
    assert_eq!(s.view().interactions().len(), 1);

    let dataset = s.dataset().expect("dataset");
    assert_eq!(dataset.voronoi.len(), 3);
    assert_eq!(dataset.density_threshold, 8);
    let areas = dataset.area_histogram.as_ref().expect("area histogram");
    assert_eq!(areas.counts.iter().sum::<u32>(), 2);

    assert_eq!(s.history().len(), 1);
    assert_eq!(s.history()[0].to_query(), "srcChrom=chr3R&srcStart=0&srcEnd=30000&tarChrom=chr2L&tarStart=0&tarEnd=20000&triangleView=false");

    let (mut bx, mut by) = (RecordingBrowser::default(), RecordingBrowser::default());
    s.sync_browsers(&mut bx, &mut by);
    assert_eq!(bx.searches, vec!["chr3R:0-30000"]);
    assert_eq!(by.searches, vec!["chr2L:0-20000"]);

    let low = s.legend_value(ScaleTarget::Voronoi, 1).expect("legend value");
    assert!(s.override_domain(ScaleTarget::Voronoi, DomainOverride::Low(low)));
    assert_eq!(s.scale(ScaleTarget::Voronoi).unwrap().domain.0, low);
}

#[test]
fn stale_response_is_discarded() {
    let mut s = session();
    let first = s.request_current_view();
    let second = s.reset_view();
    assert!(second.id > first.id);

    assert!(matches!(s.complete(first.id, Ok(payload())), ResponseOutcome::Stale));
    assert!(s.dataset().is_none());
    assert!(matches!(s.complete(second.id, Ok(payload())), ResponseOutcome::Applied(_)));
    assert!(matches!(s.complete(second.id, Ok(payload())), ResponseOutcome::Stale));
}

#[test]
fn truncated_payload_keeps_previous_state() {
    let mut s = session();
    let ok = s.request_current_view();
    assert!(matches!(s.complete(ok.id, Ok(payload())), ResponseOutcome::Applied(_)));

    let bad = s.reset_view();
    let mut truncated = payload();
    truncated.truncate(20);
    match s.complete(bad.id, Ok(truncated)) {
        ResponseOutcome::Failed(HicvisError::Payload(_)) => {}
        other => panic!("expected payload failure, got {:?}", other),
    }
    assert_eq!(s.dataset().unwrap().voronoi.len(), 3);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn region_selection_is_rounded_and_queued() {
    let mut s = session();
    let t0 = Instant::now();
    let region = hicvis_core::RegionSelected {
        min: hicvis_core::Point::new(100.4, 200.6),
        max: hicvis_core::Point::new(900.5, 1200.2),
    };
    let (x, y) = s.select_region(region, t0);
    assert_eq!(x, Locus::new("chr2L", 100, 901));
    assert_eq!(y, Locus::new("chr2L", 201, 1200));

    let request = s.poll(t0 + Duration::from_millis(50)).expect("fetch");
    assert_eq!(request.bounds.min_y, 201.0);
    assert_eq!(Chromosome::new("chr2L", 20000).name, request.target_chrom);
}

#[test]
fn pan_after_pair_change_uses_widened_extent() {
    let mut s = session();
    let t0 = Instant::now();
    apply_view(&mut s, Locus::new("chr3R", 0, 1), Locus::new("chr2L", 0, 1), t0);
    assert_eq!(s.view().view_bounds(), Bounds::new(0.0, 30000.0, 0.0, 20000.0));

    // Browsers echo the widened view back; nothing new to fetch.
    let (x, y) = s.browser_loci();
    assert!(!s.request_axis(Dimension::X, x, t0));
    assert!(!s.request_axis(Dimension::Y, y, t0));

    let t1 = t0 + Duration::from_secs(1);
    assert!(s.request_axis(Dimension::Y, Locus::new("chr2L", 1000, 2000), t1));
    let request = s.poll(t1 + Duration::from_millis(50)).expect("fetch");
    assert_eq!(request.source_chrom, "chr3R");
    assert_eq!(request.target_chrom, "chr2L");
    assert_eq!(request.bounds, Bounds::new(0.0, 30000.0, 1000.0, 2000.0));
}

#[test]
fn pan_after_reset_keeps_full_extent_on_other_axis() {
    let mut s = session();
    let t0 = Instant::now();
    apply_view(&mut s, Locus::new("chr2L", 1000, 5000), Locus::new("chr2L", 2000, 6000), t0);

    let reset = s.reset_view();
    assert!(matches!(s.complete(reset.id, Ok(payload())), ResponseOutcome::Applied(_)));
    assert_eq!(s.view().view_bounds(), Bounds::new(0.0, 20000.0, 0.0, 20000.0));

    let t1 = t0 + Duration::from_secs(1);
    assert!(s.request_axis(Dimension::X, Locus::new("chr2L", 100, 900), t1));
    let request = s.poll(t1 + Duration::from_millis(50)).expect("fetch");
    assert_eq!(request.bounds, Bounds::new(100.0, 900.0, 0.0, 20000.0));
}

#[test]
fn pan_after_triangle_toggle_uses_folded_bounds() {
    let mut s = session();
    let t0 = Instant::now();
    apply_view(&mut s, Locus::new("chr2L", 1000, 5000), Locus::new("chr2L", 2000, 6000), t0);

    let folded = s.set_triangle_view(true).expect("triangle fetch");
    assert!(matches!(s.complete(folded.id, Ok(payload())), ResponseOutcome::Applied(_)));
    assert!(s.set_triangle_view(false).is_none());
    assert_eq!(s.view().view_bounds(), Bounds::new(1000.0, 5000.0, 1000.0, 5000.0));

    let t1 = t0 + Duration::from_secs(1);
    assert!(s.request_axis(Dimension::X, Locus::new("chr2L", 1500, 2500), t1));
    let request = s.poll(t1 + Duration::from_millis(50)).expect("fetch");
    assert_eq!(request.bounds, Bounds::new(1500.0, 2500.0, 1000.0, 5000.0));
}

#[test]
fn triangle_url_starts_on_source_against_itself() {
    let url = UrlState::from_query(
        "srcChrom=chr3R&srcStart=100&srcEnd=200&tarChrom=chr2L&tarStart=0&tarEnd=20000&triangleView=true",
    )
    .expect("parse url");
    let mut s = Session::new(ViewerConfig::default(), catalog(), interactions(), Some(url)).expect("create session");

    assert_eq!(s.view().target().name, "chr3R");
    let request = s.request_current_view();
    assert_eq!(request.target_chrom, "chr3R");
    assert_eq!(request.bounds, Bounds::new(100.0, 200.0, 100.0, 200.0));
    assert!(s.current_url().to_query().ends_with("tarChrom=chr3R&tarStart=100&tarEnd=200&triangleView=true"));
}
