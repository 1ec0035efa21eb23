//! # tilegrid
//!
//! A slippy-map tile grid engine inspired by Leaflet's `GridLayer`.
//!
//! Given a geographic viewport (center, zoom) the engine projects WGS84
//! coordinates into Web Mercator pixel space, determines the minimal set of
//! fixed-size tiles covering the viewport, and drives the asynchronous
//! lifecycle of those tiles (request, load, error, fade-in, prune) so the
//! visible surface stays correct and memory-bounded.
//!
//! Rendering, tile fetching and frame scheduling are injected capabilities
//! (see [`traits`]), so the engine itself stays free of network and GUI code.

pub mod core;
pub mod grid;
pub mod prelude;
pub mod traits;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    geo::{LatLng, Point},
    transform::Transform,
};

pub use crate::grid::{
    cache::{TileCache, TilePhase, TileRecord},
    coords::{TileCoord, TileKey, TileRange},
    GridEvent, GridOptions, TileGrid, UpdateKind,
};

pub use crate::traits::{
    DeferredStep, FetchOutcome, FrameScheduler, ResourceHandle, TileFetcher, TileSink,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, GridError>;

/// Per-tile load failure, recorded on the tile record and surfaced via
/// [`GridEvent::TileError`]. Isolated to its record; never aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tile load failed: {0}")]
pub struct TileLoadError(pub String);

/// Errors that abort a grid operation. Per-tile load failures are not part
/// of this taxonomy: they are [`TileLoadError`]s recovered locally on the
/// tile record. Out-of-bounds coordinates are filtered during enumeration
/// and never surface as errors at all.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The computed tile range contains non-finite bounds. Fatal to the
    /// current update cycle; enumeration is never attempted over it.
    #[error("attempted to derive an unbounded tile range")]
    DegenerateRange,
}

/// Error type alias for convenience
pub type Error = GridError;
