//! Region scanning: find every blob of one palette color.
//!
//! Raster-scans the cell grid row by row (y outer, x inner) and seeds a
//! flood fill at each untouched cell of the target color. The first
//! untouched match in scan order is the next blob drawn, so this order
//! fixes the overall drawing order.

use crate::flood::trace_blob;
use crate::palette::Quantizer;
use crate::plan::{MoveSink, PathPlanner};
use crate::sample::BlockSampler;
use crate::types::{ConvertError, GridPoint};
use crate::visited::VisitedMask;

/// Counts for one color's scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Blobs found and traced.
    pub blobs: usize,
    /// Cells drawn across those blobs.
    pub cells: usize,
    /// Jumps emitted across those blobs.
    pub jumps: usize,
    /// Largest flood-fill queue seen in any blob.
    pub peak_queue: usize,
}

/// Trace every remaining blob of `color_index`.
///
/// # Errors
///
/// Propagates errors from [`trace_blob`] and from quantizing scan cells.
pub fn scan_color<Q, S>(
    sampler: &BlockSampler<'_, Q>,
    mask: &mut VisitedMask,
    planner: &mut PathPlanner,
    sink: &mut S,
    color_index: usize,
) -> Result<ScanStats, ConvertError>
where
    Q: Quantizer + ?Sized,
    S: MoveSink + ?Sized,
{
    let dims = sampler.dimensions();
    let step = usize::try_from(sampler.diameter()).unwrap_or(1);
    let mut stats = ScanStats::default();

    for y in (0..i64::from(dims.height)).step_by(step) {
        for x in (0..i64::from(dims.width)).step_by(step) {
            if mask.is_region_touched(x, y) {
                continue;
            }
            if !sampler.matches(color_index, x, y)? {
                continue;
            }

            let blob = trace_blob(
                sampler,
                mask,
                planner,
                sink,
                color_index,
                GridPoint::new(x, y),
            )?;
            stats.blobs += 1;
            stats.cells += blob.cells;
            stats.jumps += blob.jumps;
            stats.peak_queue = stats.peak_queue.max(blob.peak_queue);
            log::debug!(
                "color {color_index}: blob {} at ({x}, {y}), {} cells, peak queue {}",
                stats.blobs,
                blob.cells,
                blob.peak_queue,
            );
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::palette::Palette;
    use crate::types::{Dimensions, Move, Pen};

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn scan(
        image: &RgbImage,
        palette: &Palette,
        diameter: u32,
        mask: &mut VisitedMask,
        planner: &mut PathPlanner,
        moves: &mut Vec<Move>,
        color_index: usize,
    ) -> ScanStats {
        let sampler = BlockSampler::new(image, palette, diameter);
        let result = scan_color(&sampler, mask, planner, moves, color_index);
        assert!(result.is_ok(), "scan failed: {result:?}");
        result.unwrap_or_default()
    }

    #[test]
    fn red_block_is_drawn_once_and_blocks_black_scan() {
        // 2x2 cells of 4px: top-left red, the rest black.
        let img = RgbImage::from_fn(8, 8, |x, y| if x < 4 && y < 4 { RED } else { BLACK });
        let palette = Palette::default();
        let mut mask = VisitedMask::new(Dimensions::of(&img), 4);
        let mut planner = PathPlanner::new(4, GridPoint::new(4, 4));
        let mut moves = Vec::new();

        let red = scan(&img, &palette, 4, &mut mask, &mut planner, &mut moves, 1);
        assert_eq!(red.blobs, 1);
        assert_eq!(red.cells, 1);
        assert_eq!(moves, vec![Move::new(GridPoint::new(0, 0), Pen::Down)]);
        assert!(mask.is_region_touched(0, 0));

        moves.clear();
        let black = scan(&img, &palette, 4, &mut mask, &mut planner, &mut moves, 0);
        assert_eq!(black.blobs, 1);
        assert_eq!(black.cells, 3);
        assert!(
            moves.iter().all(|m| m.point() != GridPoint::new(0, 0)),
            "black scan revisited the red block: {moves:?}"
        );
    }

    #[test]
    fn disjoint_blobs_are_found_in_raster_order() {
        // Black squares at the four corners of a white 24x24 image,
        // one 4px cell each, separated by white.
        let img = RgbImage::from_fn(24, 24, |x, y| {
            let corner_x = x < 4 || (16..20).contains(&x);
            let corner_y = y < 4 || (16..20).contains(&y);
            if corner_x && corner_y { BLACK } else { WHITE }
        });
        let palette = Palette::default();
        let mut mask = VisitedMask::new(Dimensions::of(&img), 4);
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();

        let stats = scan(&img, &palette, 4, &mut mask, &mut planner, &mut moves, 0);
        assert_eq!(stats.blobs, 4);
        let drawn: Vec<GridPoint> = moves
            .iter()
            .filter(|m| m.pen == Pen::Down)
            .map(Move::point)
            .collect();
        assert_eq!(
            drawn,
            vec![
                GridPoint::new(0, 0),
                GridPoint::new(16, 0),
                GridPoint::new(0, 16),
                GridPoint::new(16, 16),
            ]
        );
        // The first blob is adjacent to the start; the other three jump.
        assert_eq!(stats.jumps, 3);
    }

    #[test]
    fn background_color_scan_still_works_when_requested() {
        let img = RgbImage::from_pixel(8, 8, WHITE);
        let palette = Palette::default();
        let mut mask = VisitedMask::new(Dimensions::of(&img), 4);
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        let stats = scan(&img, &palette, 4, &mut mask, &mut planner, &mut moves, 4);
        assert_eq!(stats.cells, 4);
    }

    #[test]
    fn every_matching_cell_is_covered() {
        let img = RgbImage::from_fn(30, 20, |x, y| {
            if (x * 7 + y * 3) % 11 < 5 { BLACK } else { RED }
        });
        let palette = Palette::default();
        let d = 2;
        let mut mask = VisitedMask::new(Dimensions::of(&img), d);
        let mut planner = PathPlanner::new(d, GridPoint::new(15, 10));
        let mut moves = Vec::new();

        for index in 0..4 {
            scan(&img, &palette, d, &mut mask, &mut planner, &mut moves, index);
        }

        let sampler = BlockSampler::new(&img, &palette, d);
        for y in (0..20).step_by(2) {
            for x in (0..30).step_by(2) {
                let index = sampler.quantize_cell(x, y).unwrap_or(4);
                if !palette.is_background(index) {
                    assert!(mask.is_region_touched(x, y), "cell ({x}, {y}) missed");
                }
            }
        }
    }
}
