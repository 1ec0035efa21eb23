//! Prelude module for common tilegrid types and traits
//!
//! Re-exports the most commonly used types for easy importing with
//! `use tilegrid::prelude::*;`

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

pub use crate::{Error as GridError, Result, TileLoadError};

pub use std::time::{Duration, Instant};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
