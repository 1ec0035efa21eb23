//! The tile grid: one owner for the tile cache, the update scheduler and the
//! per-tile lifecycle machinery.

pub mod cache;
pub mod coords;
mod lifecycle;
mod scheduler;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::grid::cache::TileCache;
use crate::grid::coords::TileCoord;
use crate::prelude::Duration;
use crate::traits::{FetchOutcome, FrameScheduler, TileFetcher, TileSink};
use crate::TileLoadError;

/// Recognized grid configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridOptions {
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Extra tile margin beyond the viewport kept alive during panning.
    pub keep_buffer: u32,
    /// Ramp freshly loaded tiles from transparent to opaque.
    pub fade_animated: bool,
    pub fade_duration: Duration,
    /// Delay before the post-batch prune when fading; must exceed
    /// `fade_duration` so a tile is never pruned mid-ramp.
    pub prune_grace: Duration,
    /// Zoom jumps larger than this lose fade continuity on reset.
    pub zoom_animation_threshold: u8,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            tile_size: 256,
            min_zoom: 0,
            max_zoom: 18,
            keep_buffer: 2,
            fade_animated: true,
            fade_duration: Duration::from_millis(200),
            prune_grace: Duration::from_millis(250),
            zoom_animation_threshold: 4,
        }
    }
}

/// Synchronous notifications emitted while the grid works.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// First fetch issuance of a batch (edge-triggered).
    Loading,
    /// A tile was requested and handed to the fetcher.
    TileLoadStart { coords: TileCoord },
    /// A tile resource arrived and was attached.
    TileLoad { coords: TileCoord },
    /// A tile fetch failed; recorded on its record, batch continues.
    TileError {
        coords: TileCoord,
        error: TileLoadError,
    },
    /// Every requested tile of the batch has settled.
    Load,
}

/// How an update cycle was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Full view reset: the target zoom was re-derived and the range rebuilt
    /// from scratch. Taken on the first view and on zoom jumps beyond one
    /// level, where incremental tile math is invalid.
    Reset,
    /// Incremental range diff against the cached tiles.
    Incremental,
}

/// Slippy-map tile grid engine.
///
/// Drives the tile cache from external view-change events, fetch completions
/// and deferred frame steps. All three entry points ([`update`],
/// [`process_fetch_results`], [`run_step`]) are discrete non-overlapping
/// steps; only the fetches themselves run concurrently.
///
/// [`update`]: TileGrid::update
/// [`process_fetch_results`]: TileGrid::process_fetch_results
/// [`run_step`]: TileGrid::run_step
pub struct TileGrid {
    pub(crate) options: GridOptions,
    pub(crate) cache: TileCache,
    /// Zoom level the cached grid is built for; `None` before the first view.
    pub(crate) tile_zoom: Option<u8>,
    pub(crate) loading: bool,
    pub(crate) fetcher: Box<dyn TileFetcher>,
    pub(crate) sink: Box<dyn TileSink>,
    pub(crate) frames: Box<dyn FrameScheduler>,
    pub(crate) completions_tx: Sender<FetchOutcome>,
    pub(crate) completions_rx: Receiver<FetchOutcome>,
    pub(crate) events: Option<Box<dyn FnMut(&GridEvent)>>,
}

impl TileGrid {
    pub fn new(
        options: GridOptions,
        fetcher: Box<dyn TileFetcher>,
        sink: Box<dyn TileSink>,
        frames: Box<dyn FrameScheduler>,
    ) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        Self {
            options,
            cache: TileCache::new(),
            tile_zoom: None,
            loading: false,
            fetcher,
            sink,
            frames,
            completions_tx,
            completions_rx,
            events: None,
        }
    }

    /// Registers the synchronous event observer.
    pub fn on_event(&mut self, observer: impl FnMut(&GridEvent) + 'static) {
        self.events = Some(Box::new(observer));
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn tile_zoom(&self) -> Option<u8> {
        self.tile_zoom
    }

    /// Whether a fetch batch is still settling.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn fire(&mut self, event: GridEvent) {
        if let Some(observer) = self.events.as_mut() {
            observer(&event);
        }
    }
}
