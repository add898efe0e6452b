//! Nearest-neighbour inversion from a power reading back to a control setting.
//!
//! The result is always a stored grid point; there is no interpolation. Among
//! samples at equal minimal distance the one that comes first in map order
//! wins, whichever search strategy is used.

use inio_traits::{PowerReading, Temperature};
use tracing::{debug, warn};

use crate::config::SearchKind;
use crate::error::InioError;
use crate::map::{CalibrationMap, Sample};

/// Squared Euclidean distance in the (cold, warm) plane.
#[inline]
pub fn distance(a: PowerReading, b: PowerReading) -> f64 {
    let dc = a.cold - b.cold;
    let dw = a.warm - b.warm;
    dc * dc + dw * dw
}

/// Best match for an observed reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub sample: &'a Sample,
    /// Position of `sample` in the map.
    pub index: usize,
    /// Squared distance to the observation.
    pub distance: f64,
}

#[derive(Debug)]
enum Search {
    Linear,
    Grid(GridIndex),
}

/// Owns a calibration map and answers nearest-neighbour queries against it.
/// The map is immutable after construction; share the estimator via `Arc`.
#[derive(Debug)]
pub struct Estimator {
    map: CalibrationMap,
    search: Search,
}

impl Estimator {
    /// Linear-scan estimator. Fails on an empty map.
    pub fn new(map: CalibrationMap) -> Result<Self, InioError> {
        Self::with_search(map, SearchKind::Linear)
    }

    pub fn with_search(map: CalibrationMap, kind: SearchKind) -> Result<Self, InioError> {
        if map.is_empty() {
            return Err(InioError::EmptyMap);
        }
        if let SearchKind::Grid { cell_size } = kind
            && !(cell_size.is_finite() && cell_size > 0.0)
        {
            return Err(InioError::Config(format!(
                "grid cell size must be positive, got {cell_size}"
            )));
        }
        let finite = map
            .iter()
            .all(|s| s.power.cold.is_finite() && s.power.warm.is_finite());
        let search = match kind {
            SearchKind::Linear => Search::Linear,
            SearchKind::Grid { .. } if !finite => {
                warn!("map holds non-finite readings; using linear search");
                Search::Linear
            }
            SearchKind::Grid { cell_size } => {
                Search::Grid(GridIndex::build(map.samples(), cell_size))
            }
        };
        debug!(samples = map.len(), search = ?kind, "estimator ready");
        Ok(Self { map, search })
    }

    pub fn map(&self) -> &CalibrationMap {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn nearest(&self, observed: PowerReading) -> Match<'_> {
        let samples = self.map.samples();
        let finite = observed.cold.is_finite() && observed.warm.is_finite();
        let (index, d) = match &self.search {
            Search::Grid(grid) if finite => grid.nearest(samples, observed),
            _ => linear_nearest(samples, observed),
        };
        Match {
            sample: &samples[index],
            index,
            distance: d,
        }
    }

    pub fn estimate(&self, observed: PowerReading) -> Temperature {
        self.nearest(observed).sample.temperature
    }
}

/// First index with minimal distance. `samples` must be non-empty.
fn linear_nearest(samples: &[Sample], observed: PowerReading) -> (usize, f64) {
    let mut best = 0;
    let mut best_d = distance(samples[0].power, observed);
    for (i, s) in samples.iter().enumerate().skip(1) {
        let d = distance(s.power, observed);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    (best, best_d)
}

/// Upper bound on bucket count; the cell size is grown to stay under it.
const MAX_BUCKETS: usize = 1 << 20;

/// Square-cell partition of the power plane. Each bucket keeps sample indices
/// in ascending order so ties can be resolved the same way as the linear scan.
#[derive(Debug)]
pub struct GridIndex {
    cell: f64,
    min_cold: f64,
    min_warm: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<u32>>,
}

impl GridIndex {
    pub fn build(samples: &[Sample], cell_size: f64) -> Self {
        let (mut min_c, mut max_c) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_w, mut max_w) = (f64::INFINITY, f64::NEG_INFINITY);
        for s in samples {
            min_c = min_c.min(s.power.cold);
            max_c = max_c.max(s.power.cold);
            min_w = min_w.min(s.power.warm);
            max_w = max_w.max(s.power.warm);
        }
        if !(min_c.is_finite() && min_w.is_finite()) {
            (min_c, max_c, min_w, max_w) = (0.0, 0.0, 0.0, 0.0);
        }

        let mut cell = cell_size;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let span = |lo: f64, hi: f64, cell: f64| -> usize {
            ((hi - lo) / cell).floor().min(1e15) as usize + 1
        };
        while span(min_c, max_c, cell).saturating_mul(span(min_w, max_w, cell)) > MAX_BUCKETS {
            cell *= 2.0;
        }
        let cols = span(min_c, max_c, cell);
        let rows = span(min_w, max_w, cell);

        let mut index = GridIndex {
            cell,
            min_cold: min_c,
            min_warm: min_w,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        };
        for (i, s) in samples.iter().enumerate() {
            let (cx, cy) = index.cell_of(s.power);
            let cx = usize::try_from(cx).unwrap_or(0).min(cols - 1);
            let cy = usize::try_from(cy).unwrap_or(0).min(rows - 1);
            #[allow(clippy::cast_possible_truncation)]
            index.buckets[cy * cols + cx].push(i as u32);
        }
        index
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    /// Cell coordinates of `p`, possibly outside the grid. Clamped so ring
    /// arithmetic cannot overflow for absurd readings.
    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: PowerReading) -> (i64, i64) {
        const LIMIT: f64 = (1u64 << 40) as f64;
        let axis = |v: f64, lo: f64| ((v - lo) / self.cell).floor().clamp(-LIMIT, LIMIT) as i64;
        (axis(p.cold, self.min_cold), axis(p.warm, self.min_warm))
    }

    /// Ring search outward from the query's cell. Rings are visited until no
    /// unvisited cell can hold anything closer than the current best.
    fn nearest(&self, samples: &[Sample], observed: PowerReading) -> (usize, f64) {
        let (qx, qy) = self.cell_of(observed);
        let cols = self.cols as i64;
        let rows = self.rows as i64;
        let outside = |q: i64, n: i64| if q < 0 { -q } else if q >= n { q - n + 1 } else { 0 };
        let r_min = outside(qx, cols).max(outside(qy, rows));
        let r_max = qx.max(cols - 1 - qx).max(qy).max(rows - 1 - qy);

        let mut best: Option<(f64, usize)> = None;

        let mut r = r_min;
        while r <= r_max {
            let (x0, x1, y0, y1) = (qx - r, qx + r, qy - r, qy + r);
            for x in x0.max(0)..=x1.min(cols - 1) {
                self.scan(samples, observed, x, y0, &mut best);
                if r > 0 {
                    self.scan(samples, observed, x, y1, &mut best);
                }
            }
            for y in (y0 + 1).max(0)..=(y1 - 1).min(rows - 1) {
                self.scan(samples, observed, x0, y, &mut best);
                if r > 0 {
                    self.scan(samples, observed, x1, y, &mut best);
                }
            }
            if let Some((bd, _)) = best {
                // one ring of slack against rounding at cell edges
                #[allow(clippy::cast_precision_loss)]
                let reach = (r - 1).max(0) as f64 * self.cell;
                if bd < reach * reach {
                    break;
                }
            }
            r += 1;
        }

        match best {
            Some((d, i)) => (i, d),
            None => linear_nearest(samples, observed),
        }
    }

    /// Fold one cell into `best`, preferring the lower index on equal distance.
    fn scan(
        &self,
        samples: &[Sample],
        observed: PowerReading,
        x: i64,
        y: i64,
        best: &mut Option<(f64, usize)>,
    ) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= self.cols || y >= self.rows {
            return;
        }
        for &i in &self.buckets[y * self.cols + x] {
            let i = i as usize;
            let d = distance(samples[i].power, observed);
            let better = match *best {
                None => true,
                Some((bd, bi)) => d < bd || (d == bd && i < bi),
            };
            if better {
                *best = Some((d, i));
            }
        }
    }
}
