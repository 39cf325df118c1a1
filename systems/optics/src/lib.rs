#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Optics simulation engine that marches beams across a Laser Maze board.
//!
//! Every beam starts at an emitter and advances one cell per step. The piece
//! in each entered cell decides whether the beam keeps going, turns, lights a
//! receiver or stops. Rays always terminate: each one is capped at
//! [`MAX_STEPS`] steps and stops as soon as it re-enters a cell in a direction
//! it already travelled.

use std::collections::BTreeSet;

use laser_maze_core::{
    Cell, CellCoord, Direction, ExternalEmitter, Mirror, MirrorKind, Segment, BEAM_CYAN,
};
use laser_maze_world::Grid;

mod march;

/// Upper bound on the number of steps a single ray may take.
pub const MAX_STEPS: usize = 100;

/// Outcome of a beam entering a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// The beam leaves the cell travelling in the contained direction.
    Continue(Direction),
    /// The beam lights the receiver in the cell and continues unchanged.
    Activate,
    /// The beam stops inside the cell.
    Absorb,
}

/// Resolves what happens when a beam travelling `incoming` enters `cell`.
#[must_use]
pub fn interact(cell: &Cell, incoming: Direction) -> Interaction {
    match cell {
        Cell::Empty => Interaction::Continue(incoming),
        Cell::Wall | Cell::Emitter { .. } => Interaction::Absorb,
        Cell::Receiver => Interaction::Activate,
        Cell::Mirror(mirror) => {
            reflect(mirror, incoming).map_or(Interaction::Absorb, Interaction::Continue)
        }
    }
}

/// Direction a beam leaves `mirror` in, or `None` when the mirror absorbs it.
///
/// * Triangle: one reflective corner. Rotation 0 turns RIGHT to UP and DOWN to
///   LEFT; each further rotation moves the corner a quarter turn.
/// * Line: rotation 0 is `/`, rotation 1 is `\`. Diagonal beams are absorbed.
/// * Octagon: rotation selects a cardinal axis `c` and a diagonal axis `d`
///   (UP and UP_RIGHT, RIGHT and UP_RIGHT, RIGHT and DOWN_RIGHT, DOWN and
///   DOWN_RIGHT). Beams travelling against `c` leave along `d`, beams
///   travelling against `d` leave along `c`, and the reverse paths mirror
///   that.
/// * Square: diagonal beams leave UP, RIGHT, DOWN or LEFT by rotation.
///   Cardinal beams are absorbed.
/// * Omni: every beam leaves in the direction encoded by the rotation.
#[must_use]
pub fn reflect(mirror: &Mirror, incoming: Direction) -> Option<Direction> {
    use Direction::{Down, DownLeft, DownRight, Left, Right, Up, UpLeft, UpRight};

    let rotation = mirror.rotation();
    match mirror.kind() {
        MirrorKind::Triangle => match (rotation, incoming) {
            (0, Right) => Some(Up),
            (0, Down) => Some(Left),
            (1, Right) => Some(Down),
            (1, Up) => Some(Left),
            (2, Left) => Some(Down),
            (2, Up) => Some(Right),
            (3, Left) => Some(Up),
            (3, Down) => Some(Right),
            _ => None,
        },
        MirrorKind::Line => match (rotation, incoming) {
            (0, Right) => Some(Up),
            (0, Up) => Some(Right),
            (0, Left) => Some(Down),
            (0, Down) => Some(Left),
            (_, Right) => Some(Down),
            (_, Down) => Some(Right),
            (_, Left) => Some(Up),
            (_, Up) => Some(Left),
            _ => None,
        },
        MirrorKind::Octagon => {
            let (cardinal, diagonal) = match rotation {
                0 => (Up, UpRight),
                1 => (Right, UpRight),
                2 => (Right, DownRight),
                _ => (Down, DownRight),
            };
            if incoming == cardinal.opposite() {
                Some(diagonal)
            } else if incoming == diagonal.opposite() {
                Some(cardinal)
            } else if incoming == cardinal {
                Some(diagonal.opposite())
            } else if incoming == diagonal {
                Some(cardinal.opposite())
            } else {
                None
            }
        }
        MirrorKind::Square => match incoming {
            UpRight | DownRight | DownLeft | UpLeft => {
                Some(Direction::from_index_wrapping(rotation % 4))
            }
            Up | Right | Down | Left => None,
        },
        MirrorKind::Omni => Some(Direction::from_index_wrapping(rotation)),
    }
}

/// Result of one simulation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Simulation {
    segments: Vec<Segment>,
    active_receivers: BTreeSet<CellCoord>,
}

impl Simulation {
    /// Drawable beam segments in emission order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Receivers crossed by at least one beam.
    #[must_use]
    pub fn active_receivers(&self) -> &BTreeSet<CellCoord> {
        &self.active_receivers
    }

    /// Splits the simulation into its segments and lit receivers.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Segment>, BTreeSet<CellCoord>) {
        (self.segments, self.active_receivers)
    }
}

struct SegmentRecorder {
    segments: Vec<Segment>,
}

impl march::RayObserver for SegmentRecorder {
    fn advance(&mut self, from: CellCoord, to: CellCoord) {
        self.segments.push(Segment::new(from, to, BEAM_CYAN));
    }
}

/// Casts every beam on the board and records its drawable path.
///
/// Emitters outside the grid cast first in list order, followed by emitter
/// cells in row-major order.
#[must_use]
pub fn simulate(grid: &Grid, emitters: &[ExternalEmitter]) -> Simulation {
    let mut recorder = SegmentRecorder {
        segments: Vec::new(),
    };
    let active_receivers = march::march(grid, emitters, &mut recorder);
    Simulation {
        segments: recorder.segments,
        active_receivers,
    }
}

/// Side-effect-free simulation used by search code.
///
/// Shares the ray-marching routine with [`simulate`], so both report the same
/// receivers for every board.
pub mod headless {
    use std::collections::BTreeSet;

    use laser_maze_core::{CellCoord, ExternalEmitter};
    use laser_maze_world::Grid;

    use crate::march::{self, RayObserver, Silent};

    /// Receivers lit by the board's beams.
    #[must_use]
    pub fn simulate_headless(grid: &Grid, emitters: &[ExternalEmitter]) -> BTreeSet<CellCoord> {
        march::march(grid, emitters, &mut Silent)
    }

    /// Lit receivers together with every in-grid cell a beam entered.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct BeamTrace {
        /// Receivers crossed by at least one beam.
        pub active_receivers: BTreeSet<CellCoord>,
        /// Cells entered by at least one beam, including the cell that absorbed it.
        pub lit_cells: BTreeSet<CellCoord>,
    }

    struct LitCells<'a> {
        grid: &'a Grid,
        cells: BTreeSet<CellCoord>,
    }

    impl RayObserver for LitCells<'_> {
        fn advance(&mut self, _from: CellCoord, to: CellCoord) {
            if self.grid.contains(to) {
                let _ = self.cells.insert(to);
            }
        }
    }

    /// Traces every beam and reports which cells they cross.
    #[must_use]
    pub fn trace_headless(grid: &Grid, emitters: &[ExternalEmitter]) -> BeamTrace {
        let mut observer = LitCells {
            grid,
            cells: BTreeSet::new(),
        };
        let active_receivers = march::march(grid, emitters, &mut observer);
        BeamTrace {
            active_receivers,
            lit_cells: observer.cells,
        }
    }
}
