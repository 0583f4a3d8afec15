//! Queue-based flood fill over the cell grid.
//!
//! Grows one blob of a single palette index, breadth-first from a seed
//! cell. Each popped cell is checked against the visited mask and the
//! target color; accepted cells are marked, drawn, and have all four
//! neighbours enqueued without any pre-check. Rejected pops are dropped.
//!
//! Visit order is strict FIFO and neighbours are enqueued as +x, -x, +y,
//! -y. Both determine the move order and must not change.
//!
//! The queue can hold many stale entries at once (already-marked cells,
//! off-image cells). It still drains: each cell can be accepted at most
//! once, because acceptance marks it, and a rejected pop enqueues nothing.

use std::collections::VecDeque;

use crate::palette::Quantizer;
use crate::plan::{MoveSink, PathPlanner, Step};
use crate::sample::BlockSampler;
use crate::types::{ConvertError, GridPoint};
use crate::visited::VisitedMask;

/// Counts for one traced blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobStats {
    /// Cells accepted and drawn.
    pub cells: usize,
    /// Queue entries popped, accepted or not.
    pub pops: usize,
    /// Largest queue length observed.
    pub peak_queue: usize,
    /// Jumps emitted while drawing this blob.
    pub jumps: usize,
}

/// Flood-fill the blob of `color_index` containing `seed`, emitting its
/// moves through `planner` into `sink`.
///
/// # Errors
///
/// Returns [`ConvertError::Sink`] if the sink fails and
/// [`ConvertError::InvariantViolation`] if the quantizer misbehaves.
pub fn trace_blob<Q, S>(
    sampler: &BlockSampler<'_, Q>,
    mask: &mut VisitedMask,
    planner: &mut PathPlanner,
    sink: &mut S,
    color_index: usize,
    seed: GridPoint,
) -> Result<BlobStats, ConvertError>
where
    Q: Quantizer + ?Sized,
    S: MoveSink + ?Sized,
{
    let diameter = sampler.diameter();
    let mut stats = BlobStats::default();
    let mut pending = VecDeque::from([seed]);
    stats.peak_queue = 1;

    while let Some(p) = pending.pop_front() {
        stats.pops += 1;

        if mask.is_region_touched(p.x, p.y) {
            continue;
        }
        if !sampler.matches(color_index, p.x, p.y)? {
            continue;
        }

        mask.mark_cell(p.x, p.y);
        if planner.visit(p, sink)? == Step::Jump {
            stats.jumps += 1;
        }
        stats.cells += 1;

        pending.extend(p.neighbors(diameter));
        stats.peak_queue = stats.peak_queue.max(pending.len());
    }

    Ok(stats)
}
