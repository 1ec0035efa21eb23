//! View-change handling: range computation, cache diffing and ordered fetch
//! issuance.

use crate::core::bounds::Bounds;
use crate::core::geo::{LatLng, Point};
use crate::core::transform::{project_to_pixel, zoom_scale};
use crate::grid::cache::TileRecord;
use crate::grid::coords::{TileCoord, TileRange};
use crate::grid::{GridEvent, TileGrid, UpdateKind};
use crate::prelude::HashSet;
use crate::Result;

#[cfg(feature = "debug")]
use log;

impl TileGrid {
    /// Handles a view-change event `(center, zoom, viewport size in pixels)`.
    ///
    /// Computes the tile range covering the viewport at the (clamped) target
    /// zoom, diffs it against the cache, marks records that fell out of range
    /// as stale and issues center-out ordered fetches for the missing tiles.
    /// When the cache already covers the range this is a cheap no-op: no
    /// fetches, no loading state, no events.
    ///
    /// A zoom jump of more than one level invalidates incremental tile math,
    /// so the grid takes the full reset path instead and reports it through
    /// the returned [`UpdateKind`].
    pub fn update(&mut self, center: LatLng, zoom: u8, viewport: Point) -> Result<UpdateKind> {
        let target = zoom.clamp(self.options.min_zoom, self.options.max_zoom);

        let kind = match self.tile_zoom {
            Some(current) if (i16::from(current) - i16::from(target)).abs() > 1 => {
                self.reset_view(target);
                UpdateKind::Reset
            }
            Some(_) => UpdateKind::Incremental,
            None => UpdateKind::Reset,
        };
        self.tile_zoom = Some(target);

        self.refresh(center, zoom, viewport)?;
        Ok(kind)
    }

    /// Full view reset: every cached record is invalidated and the range is
    /// rebuilt from scratch by the following refresh. Beyond the animation
    /// threshold the old tiles are dropped immediately; there is no
    /// transition they could fade through.
    fn reset_view(&mut self, target: u8) {
        #[cfg(feature = "debug")]
        log::debug!(
            "zoom jump {:?} -> {}: resetting view",
            self.tile_zoom,
            target
        );

        let jump = self
            .tile_zoom
            .map(|current| (i16::from(current) - i16::from(target)).unsigned_abs() as u8)
            .unwrap_or(0);

        self.cache.mark_not_current(|_| true);
        if jump > self.options.zoom_animation_threshold {
            self.prune_tiles();
        }
    }

    fn refresh(&mut self, center: LatLng, map_zoom: u8, viewport: Point) -> Result<()> {
        let tile_zoom = self.tile_zoom.unwrap_or(self.options.min_zoom);
        let tile_size = self.options.tile_size;

        // Pixel bounds of the viewport at the tile zoom. The scale ratio
        // rescales the viewport extent when the requested zoom was clamped.
        let pixel_center = project_to_pixel(&center, tile_zoom, tile_size).floor();
        let scale = zoom_scale(map_zoom, tile_zoom, tile_size);
        let half = Point::new(viewport.x / (scale * 2.0), viewport.y / (scale * 2.0));
        let pixel_bounds = Bounds::from_center_and_half_extent(pixel_center, half);

        // Fails before any cache mutation if the range is unbounded.
        let range = TileRange::from_pixel_bounds(&pixel_bounds, tile_size, tile_zoom)?;
        let retention = range.expanded(self.options.keep_buffer as i32);

        // Staleness sweep: wrong zoom, or outside the retention margin.
        self.cache.mark_not_current(|record| {
            record.coords.z != tile_zoom || !retention.contains(record.coords.x, record.coords.y)
        });

        // Partition candidates into already-cached and to-fetch. Enumeration
        // is lazy; invalid coordinates are skipped silently and wrapped
        // duplicates (range wider than the world) collapse onto one key.
        let mut queue: Vec<TileCoord> = Vec::new();
        let mut queued = HashSet::default();
        for coord in range.coords() {
            if !coord.is_valid(self.options.min_zoom, self.options.max_zoom) {
                continue;
            }
            let key = coord.key();
            if let Some(record) = self.cache.get_mut(&key) {
                record.mark_current();
            } else if queued.insert(key) {
                queue.push(coord);
            }
        }

        // Steady-state path: nothing to fetch, nothing to report.
        if queue.is_empty() {
            return Ok(());
        }

        if !self.loading {
            self.loading = true;
            self.fire(GridEvent::Loading);
        }

        // Center-out ordering: the viewport center is the most visually
        // salient region, load it first.
        let range_center = range.center();
        queue.sort_by(|a, b| {
            let da = Point::new(a.x as f64, a.y as f64).distance_to(&range_center);
            let db = Point::new(b.x as f64, b.y as f64).distance_to(&range_center);
            da.total_cmp(&db)
        });

        #[cfg(feature = "debug")]
        log::debug!(
            "issuing {} fetches at z{} ({} cached records)",
            queue.len(),
            tile_zoom,
            self.cache.len()
        );

        for coord in queue {
            let record = TileRecord::requested(coord);
            let coords = record.coords;
            self.cache.insert(record);
            self.fire(GridEvent::TileLoadStart { coords });
            // The completion is bound to the issued coordinate: whatever the
            // grid looks like when it resolves, only this key is touched.
            self.fetcher.fetch(coords, self.completions_tx.clone());
        }

        Ok(())
    }
}
