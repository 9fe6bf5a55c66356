use byteorder::{BigEndian, WriteBytesExt};
use hicvis_core::{ChromosomeCatalog, InteractionIndex, ResponseOutcome, Session, ViewerConfig};

pub const LENGTH: f64 = 20_000.0;

/// 4x4 raster plus a 5x5 grid of square cells covering one chromosome.
pub fn payload() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<BigEndian>(4).unwrap();
    buf.write_u32::<BigEndian>(4).unwrap();
    for i in 0..16u32 {
        buf.write_u32::<BigEndian>((i * 7) % 11).unwrap();
    }

    let side = LENGTH / 5.0;
    buf.write_u32::<BigEndian>(25).unwrap();
    for i in 0..25 {
        let (x0, y0) = ((i % 5) as f64 * side, (i / 5) as f64 * side);
        // Vary the areas so the colour scale has a spread.
        let area = side * side * (1.0 + i as f64 / 5.0);
        buf.write_u32::<BigEndian>(4).unwrap();
        buf.write_f64::<BigEndian>(area).unwrap();
        buf.write_u8((i % 5 == 4) as u8).unwrap();
        let centre = (x0 + side / 2.0, y0 + side / 2.0);
        for v in [centre.0, centre.1, centre.0, centre.1] {
            buf.write_f64::<BigEndian>(v).unwrap();
        }
        for (x, y) in [(x0, y0), (x0 + side, y0), (x0 + side, y0 + side), (x0, y0 + side)] {
            buf.write_f64::<BigEndian>(x).unwrap();
            buf.write_f64::<BigEndian>(y).unwrap();
        }
    }
    buf
}

/// Session with one applied response for chr2L against itself.
pub fn loaded_session() -> Session {
    let catalog = ChromosomeCatalog::from_json(r#"{"Chromosomes": [{"Name": "chr2L", "Length": 20000}]}"#)
        .expect("parse catalog");
    let interactions = InteractionIndex::from_json(
        r#"{"Interactions": {"chr2L-chr2L": [
            {"SourceChrom": "chr2L", "SourceStart": 2000, "SourceEnd": 3000,
             "TargetChrom": "chr2L", "TargetStart": 12000, "TargetEnd": 13000}
        ]}}"#,
    )
    .expect("parse interactions");

    let mut session = Session::new(ViewerConfig::default(), catalog, interactions, None).expect("create session");
    let request = session.request_current_view();
    match session.complete(request.id, Ok(payload())) {
        ResponseOutcome::Applied(_) => session,
        other => panic!("payload not applied: {:?}", other),
    }
}
