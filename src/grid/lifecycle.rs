//! Per-tile async lifecycle: fetch settlement, fade-in, batch completion and
//! staged eviction.

use crate::core::geo::Point;
use crate::grid::cache::TilePhase;
use crate::grid::{GridEvent, TileGrid};
use crate::prelude::Instant;
use crate::traits::{DeferredStep, FetchOutcome};

#[cfg(feature = "debug")]
use log;

impl TileGrid {
    /// Drains queued fetch completions and settles each tile. Call this from
    /// the host event loop; completions may have arrived in any order and at
    /// any time since the fetches were issued.
    pub fn process_fetch_results(&mut self) {
        let pending: Vec<FetchOutcome> = self.completions_rx.try_iter().collect();
        for outcome in pending {
            self.tile_ready(outcome);
        }
    }

    /// Runs a deferred step previously handed to the frame scheduler.
    pub fn run_step(&mut self, step: DeferredStep) {
        match step {
            DeferredStep::FadeTick => self.advance_fade(),
            DeferredStep::Prune => self.prune_tiles(),
        }
    }

    /// Settles one tile. The mutation is keyed strictly by the outcome's
    /// coordinate: a completion for a record that was evicted while the
    /// fetch was in flight is a no-op, never a reinsertion.
    fn tile_ready(&mut self, outcome: FetchOutcome) {
        let coords = outcome.coord.normalized();
        let key = coords.key();

        if let Err(error) = &outcome.result {
            self.fire(GridEvent::TileError {
                coords,
                error: error.clone(),
            });
        }

        let fade = self.options.fade_animated;
        let tile_size = self.options.tile_size as f64;
        let mut loaded = false;
        let mut fade_started = false;
        match self.cache.get_mut(&key) {
            // Evicted while in flight, or a duplicate completion: drop it.
            None => return,
            Some(record) if record.is_settled() => return,
            Some(record) => {
                record.loaded_at = Some(Instant::now());
                match outcome.result {
                    Ok(handle) => {
                        record.handle = Some(handle);
                        record.phase = if fade {
                            TilePhase::Loaded
                        } else {
                            TilePhase::Active
                        };
                        loaded = true;
                        let position = Point::new(
                            record.coords.x as f64 * tile_size,
                            record.coords.y as f64 * tile_size,
                        );
                        self.sink.attach(handle, position);
                        if fade {
                            self.sink.set_opacity(handle, 0.0);
                            fade_started = true;
                        }
                    }
                    Err(error) => {
                        record.phase = TilePhase::Errored;
                        record.error = Some(error);
                    }
                }
            }
        }

        if loaded {
            self.fire(GridEvent::TileLoad { coords });
        }
        if fade_started {
            self.frames.schedule_frame(DeferredStep::FadeTick);
        } else if loaded {
            // No fade: the tile is active right away and stale neighbours
            // can go in the same breath.
            self.prune_tiles();
        }

        self.finish_batch_if_settled();
    }

    /// Batch-level completion detection: once every requested tile has
    /// settled (success or error alike), clear the loading flag, notify and
    /// schedule a prune pass, delayed past the fade when animating so no
    /// tile is pruned mid-ramp, next frame otherwise.
    fn finish_batch_if_settled(&mut self) {
        if !self.loading {
            return;
        }
        if self.cache.values().any(|record| !record.is_settled()) {
            return;
        }

        self.loading = false;
        self.fire(GridEvent::Load);

        if self.options.fade_animated {
            self.frames
                .schedule_after(self.options.prune_grace, DeferredStep::Prune);
        } else {
            self.frames.schedule_frame(DeferredStep::Prune);
        }
    }

    /// Opacity ramp for freshly loaded tiles. Promotes a tile to `Active`
    /// once fully opaque and keeps rescheduling itself while any tile is
    /// still ramping.
    fn advance_fade(&mut self) {
        let now = Instant::now();
        let duration = self.options.fade_duration;
        let mut still_fading = false;

        for record in self.cache.values_mut() {
            if record.phase != TilePhase::Loaded {
                continue;
            }
            let Some(handle) = record.handle else { continue };
            let elapsed = record
                .loaded_at
                .map(|at| now.saturating_duration_since(at))
                .unwrap_or_default();
            let opacity = if duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
            };
            self.sink.set_opacity(handle, opacity);
            if opacity >= 1.0 {
                record.phase = TilePhase::Active;
            } else {
                still_fading = true;
            }
        }

        if still_fading {
            self.frames.schedule_frame(DeferredStep::FadeTick);
        }
    }

    /// Evicts every record outside the current range and releases its
    /// resource back to the sink. Records with `current == true` are never
    /// pruned, not even ones still waiting on their fetch.
    pub fn prune_tiles(&mut self) {
        let evicted = self.cache.take_not_current();

        #[cfg(feature = "debug")]
        if !evicted.is_empty() {
            log::debug!(
                "pruned {} tiles ({} remain)",
                evicted.len(),
                self.cache.len()
            );
        }

        for record in evicted {
            if let Some(handle) = record.handle {
                self.sink.detach(handle);
            }
        }
    }
}
