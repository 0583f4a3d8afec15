//! Move emission: decide between drawing on and jumping.
//!
//! The [`PathPlanner`] owns the run-wide [`Cursor`]. Every cell accepted by
//! the flood fill goes through [`PathPlanner::visit`], which compares it to
//! the previous position regardless of which blob or color that position
//! belonged to:
//!
//! - within `sqrt(2) * diameter` (a side or diagonal neighbour): one
//!   pen-down move;
//! - farther: lift at the old position, travel pen-up, lower at the new
//!   position.
//!
//! Moves leave through a [`MoveSink`]. Any sink error aborts the run.

use std::convert::Infallible;

use crate::color::Color;
use crate::types::{ConvertError, GridPoint, Move, Pen};

/// Consumer of the move sequence (device command serializer, preview
/// renderer, or a plain `Vec<Move>`).
pub trait MoveSink {
    /// Error reported by the sink. Always fatal to the run.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called before each palette color is scanned so the sink can swap
    /// tools. The default does nothing.
    ///
    /// # Errors
    ///
    /// Sink-specific; aborts the run.
    fn select_tool(&mut self, index: usize, color: Color) -> Result<(), Self::Error> {
        let _ = (index, color);
        Ok(())
    }

    /// Consume one move.
    ///
    /// # Errors
    ///
    /// Sink-specific; aborts the run.
    fn move_to(&mut self, mv: Move) -> Result<(), Self::Error>;

    /// Called once after the parking move. The default does nothing.
    ///
    /// # Errors
    ///
    /// Sink-specific; aborts the run.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl MoveSink for Vec<Move> {
    type Error = Infallible;

    fn move_to(&mut self, mv: Move) -> Result<(), Infallible> {
        self.push(mv);
        Ok(())
    }
}

impl<S: MoveSink + ?Sized> MoveSink for &mut S {
    type Error = S::Error;

    fn select_tool(&mut self, index: usize, color: Color) -> Result<(), Self::Error> {
        (**self).select_tool(index, color)
    }

    fn move_to(&mut self, mv: Move) -> Result<(), Self::Error> {
        (**self).move_to(mv)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}

/// Wrap a sink failure as a fatal conversion error.
pub(crate) fn sink_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> ConvertError {
    ConvertError::Sink(Box::new(err))
}

/// Last emitted tool position and pen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Last emitted position.
    pub position: GridPoint,
    /// Last pen state.
    pub pen: Pen,
}

impl Cursor {
    /// A cursor at `position` with the pen lifted.
    #[must_use]
    pub const fn new(position: GridPoint) -> Self {
        Self {
            position,
            pen: Pen::Up,
        }
    }
}

/// Outcome of a single [`PathPlanner::visit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The point was close enough to draw on from the cursor.
    Continue,
    /// The pen was lifted and the tool relocated.
    Jump,
}

/// Running counts kept by the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerStats {
    /// Moves handed to the sink.
    pub moves: usize,
    /// Jump sequences emitted.
    pub jumps: usize,
    /// Pen state changes from down to up.
    pub pen_lifts: usize,
    /// Pen state changes from up to down.
    pub pen_drops: usize,
}

/// Turns accepted cells into moves and keeps the run-wide cursor.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    cursor: Cursor,
    jump_threshold: i64,
    stats: PlannerStats,
}

impl PathPlanner {
    /// A planner for cells of `diameter` pixels, starting at `start` with
    /// the pen up.
    #[must_use]
    pub fn new(diameter: u32, start: GridPoint) -> Self {
        let d = i64::from(diameter.max(1));
        Self {
            cursor: Cursor::new(start),
            jump_threshold: d.saturating_mul(d).saturating_mul(2),
            stats: PlannerStats::default(),
        }
    }

    /// Current cursor.
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Counts so far.
    #[must_use]
    pub const fn stats(&self) -> PlannerStats {
        self.stats
    }

    /// Squared distance beyond which a visit becomes a jump.
    #[must_use]
    pub const fn jump_threshold(&self) -> i64 {
        self.jump_threshold
    }

    /// Record that the pen has been lifted without moving, e.g. after a
    /// tool change. No move is emitted.
    pub fn lift(&mut self) {
        if self.cursor.pen == Pen::Down {
            self.stats.pen_lifts += 1;
        }
        self.cursor.pen = Pen::Up;
    }

    /// Emit the moves that bring the tool onto `point` with the pen down.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Sink`] if the sink rejects a move.
    pub fn visit<S: MoveSink + ?Sized>(
        &mut self,
        point: GridPoint,
        sink: &mut S,
    ) -> Result<Step, ConvertError> {
        let last = self.cursor.position;
        let step = if point.distance_squared(last) > self.jump_threshold {
            log::trace!(
                "jump ({}, {}) -> ({}, {})",
                last.x,
                last.y,
                point.x,
                point.y
            );
            self.emit(Move::new(last, Pen::Up), sink)?;
            self.emit(Move::new(point, Pen::Up), sink)?;
            self.emit(Move::new(point, Pen::Down), sink)?;
            self.stats.jumps += 1;
            Step::Jump
        } else {
            self.emit(Move::new(point, Pen::Down), sink)?;
            Step::Continue
        };
        Ok(step)
    }

    /// Lift the pen and travel to the image origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Sink`] if the sink rejects the move.
    pub fn park<S: MoveSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ConvertError> {
        self.emit(Move::new(GridPoint::new(0, 0), Pen::Up), sink)
    }

    fn emit<S: MoveSink + ?Sized>(&mut self, mv: Move, sink: &mut S) -> Result<(), ConvertError> {
        sink.move_to(mv).map_err(sink_error)?;
        match (self.cursor.pen, mv.pen) {
            (Pen::Down, Pen::Up) => self.stats.pen_lifts += 1,
            (Pen::Up, Pen::Down) => self.stats.pen_drops += 1,
            _ => {}
        }
        self.cursor = Cursor {
            position: mv.point(),
            pen: mv.pen,
        };
        self.stats.moves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that fails on the n-th move.
    struct FailingSink {
        remaining: usize,
        accepted: Vec<Move>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("device unplugged")]
    struct Unplugged;

    impl MoveSink for FailingSink {
        type Error = Unplugged;

        fn move_to(&mut self, mv: Move) -> Result<(), Unplugged> {
            if self.remaining == 0 {
                return Err(Unplugged);
            }
            self.remaining -= 1;
            self.accepted.push(mv);
            Ok(())
        }
    }

    #[test]
    fn far_point_emits_jump_sequence() {
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        let step = planner.visit(GridPoint::new(10, 10), &mut moves).ok();
        assert_eq!(step, Some(Step::Jump));
        assert_eq!(
            moves,
            vec![
                Move::new(GridPoint::new(0, 0), Pen::Up),
                Move::new(GridPoint::new(10, 10), Pen::Up),
                Move::new(GridPoint::new(10, 10), Pen::Down),
            ]
        );
    }

    #[test]
    fn near_point_emits_single_move() {
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        let step = planner.visit(GridPoint::new(2, 2), &mut moves).ok();
        assert_eq!(step, Some(Step::Continue));
        assert_eq!(moves, vec![Move::new(GridPoint::new(2, 2), Pen::Down)]);
    }

    #[test]
    fn diagonal_neighbour_is_exactly_on_threshold() {
        // d^2 = 32 = 2 * 4^2 is not strictly greater: draw on.
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        let step = planner.visit(GridPoint::new(4, 4), &mut moves).ok();
        assert_eq!(step, Some(Step::Continue));
        assert_eq!(planner.jump_threshold(), 32);
    }

    #[test]
    fn huge_diameter_saturates_threshold() {
        let mut planner = PathPlanner::new(u32::MAX, GridPoint::new(0, 0));
        assert_eq!(planner.jump_threshold(), i64::MAX);
        let mut moves = Vec::new();
        let step = planner.visit(GridPoint::new(1 << 40, 1 << 40), &mut moves).ok();
        assert_eq!(step, Some(Step::Continue));
    }

    #[test]
    fn cursor_follows_every_visit() {
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        planner.visit(GridPoint::new(4, 0), &mut moves).ok();
        planner.visit(GridPoint::new(40, 0), &mut moves).ok();
        assert_eq!(
            planner.cursor(),
            Cursor {
                position: GridPoint::new(40, 0),
                pen: Pen::Down
            }
        );
        // Second visit restates (4, 0) before travelling.
        assert_eq!(moves[1], Move::new(GridPoint::new(4, 0), Pen::Up));
    }

    #[test]
    fn pen_changes_are_counted_only_on_change() {
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut moves = Vec::new();
        planner.visit(GridPoint::new(0, 4), &mut moves).ok();
        planner.visit(GridPoint::new(0, 8), &mut moves).ok();
        planner.visit(GridPoint::new(0, 12), &mut moves).ok();
        let stats = planner.stats();
        assert_eq!(stats.moves, 3);
        assert_eq!(stats.pen_drops, 1);
        assert_eq!(stats.pen_lifts, 0);

        planner.lift();
        planner.lift();
        assert_eq!(planner.stats().pen_lifts, 1);
        assert_eq!(planner.cursor().pen, Pen::Up);
    }

    #[test]
    fn park_returns_to_origin_pen_up() {
        let mut planner = PathPlanner::new(2, GridPoint::new(6, 6));
        let mut moves = Vec::new();
        planner.park(&mut moves).ok();
        assert_eq!(moves, vec![Move::new(GridPoint::new(0, 0), Pen::Up)]);
    }

    #[test]
    fn sink_failure_aborts_mid_jump() {
        let mut planner = PathPlanner::new(4, GridPoint::new(0, 0));
        let mut sink = FailingSink {
            remaining: 1,
            accepted: Vec::new(),
        };
        let result = planner.visit(GridPoint::new(100, 100), &mut sink);
        assert!(matches!(result, Err(ConvertError::Sink(_))));
        assert_eq!(sink.accepted.len(), 1);
        assert_eq!(planner.stats().jumps, 0);
    }
}
