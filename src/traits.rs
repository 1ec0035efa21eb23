//! Capability traits at the grid's external boundaries.
//!
//! The grid never talks to the network, the screen or a frame clock directly.
//! A [`TileFetcher`] produces tile resources, a [`TileSink`] positions them on
//! whatever surface the host renders to, and a [`FrameScheduler`] defers the
//! fade and prune steps. All three are injected at construction, which keeps
//! the scheduling logic synchronous and deterministic under test.

use crossbeam_channel::Sender;
use std::time::Duration;

use crate::core::geo::Point;
use crate::grid::coords::TileCoord;
use crate::TileLoadError;

/// Opaque token for a loaded tile resource. Minted by the [`TileFetcher`],
/// interpreted only by the [`TileSink`]; the grid just carries it between the
/// two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Completion report for a single issued fetch.
///
/// `coord` is the coordinate the fetch was issued for, captured at issuance.
/// The grid settles the record keyed by this coordinate and nothing else, so
/// a completion that arrives after its record was evicted is simply dropped.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub coord: TileCoord,
    pub result: Result<ResourceHandle, TileLoadError>,
}

/// Asynchronous tile resource loader.
///
/// `fetch` must not block: implementations hand the work to whatever
/// concurrency primitive they like and deliver exactly one [`FetchOutcome`]
/// per issued fetch through `done`, in any order, at any time. There is no
/// cancellation; an outcome for a tile the grid no longer tracks is ignored.
pub trait TileFetcher {
    fn fetch(&mut self, coord: TileCoord, done: Sender<FetchOutcome>);
}

/// Rendering surface for positioned tile resources.
pub trait TileSink {
    /// Place a loaded resource at its pixel position (tile-zoom pixel space).
    fn attach(&mut self, handle: ResourceHandle, position: Point);

    /// Adjust the opacity of an attached resource, 0.0 (transparent) to 1.0.
    fn set_opacity(&mut self, handle: ResourceHandle, opacity: f32);

    /// Release a resource back to the renderer.
    fn detach(&mut self, handle: ResourceHandle);
}

/// Deferred lifecycle steps the grid asks the host to run later via
/// [`TileGrid::run_step`](crate::grid::TileGrid::run_step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredStep {
    /// Advance the opacity ramp of freshly loaded tiles.
    FadeTick,
    /// Sweep records that fell out of the current range.
    Prune,
}

/// Host frame clock. `schedule_frame` runs a step on the next frame,
/// `schedule_after` runs it once the delay elapses. The host drives both by
/// calling back into the grid; steps never overlap with `update` calls.
pub trait FrameScheduler {
    fn schedule_frame(&mut self, step: DeferredStep);
    fn schedule_after(&mut self, delay: Duration, step: DeferredStep);
}
