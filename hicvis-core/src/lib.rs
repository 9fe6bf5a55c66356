//! HiCVis Core Library
//!
//! Data model, payload decoding, polygon clipping, histogram calibration and
//! the view/session state behind the HiCVis contact map viewer.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod interact;
pub mod payload;
pub mod request;
pub mod session;
pub mod types;
pub mod url;
pub mod view;

// Re-export commonly used types and functions
pub use catalog::ChromosomeCatalog;
pub use config::{ContactStyle, ViewerConfig};
pub use error::{HicvisError, HicvisResult};
pub use geometry::ClipRegion;
pub use histogram::{DomainOverride, Histogram, QuantizeScale, Transform};
pub use interact::InteractionIndex;
pub use payload::{decode, PayloadError};
pub use request::{FetchRequest, RequestCoalescer};
pub use session::{Dataset, GenomeBrowser, ResponseOutcome, ScaleTarget, Session};
pub use types::{Chromosome, Dimension, Interaction, Locus, Point, Polygon, RasterImage, VoronoiSet};
pub use url::UrlState;
pub use view::{AxisLayout, Bounds, DragSelection, RegionSelected, ViewChange, ViewState};

/// Version information for the HiCVis core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
