#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Laser Maze engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and pure systems. Levels travel between components as
//! [`LevelDescriptor`] values. During play, adapters submit [`Command`] values
//! describing desired board mutations, the world executes those commands via
//! its `apply` entry point, and then reports the outcome as [`Event`] values.
//! The optics, solver and generator systems only ever read grids built from
//! these contracts.

use serde::{Deserialize, Serialize};

mod level;

pub use level::{GridSize, ItemKind, LevelDescriptor, LevelError, PlacedItem};

/// Colour applied to every beam segment produced by the optics engine.
pub const BEAM_CYAN: BeamColor = BeamColor::from_rgb(0x00, 0xf3, 0xff);

/// One of the eight discrete travel directions available to a beam.
///
/// The declaration order doubles as the numeric encoding `0..=7`, which the
/// omni mirror uses directly as its rotation index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Travel toward decreasing row indices.
    Up,
    /// Travel toward increasing column indices.
    Right,
    /// Travel toward increasing row indices.
    Down,
    /// Travel toward decreasing column indices.
    Left,
    /// Diagonal travel up and to the right.
    UpRight,
    /// Diagonal travel down and to the right.
    DownRight,
    /// Diagonal travel down and to the left.
    DownLeft,
    /// Diagonal travel up and to the left.
    UpLeft,
}

impl Direction {
    /// Every direction in encoding order.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::UpRight,
        Direction::DownRight,
        Direction::DownLeft,
        Direction::UpLeft,
    ];

    /// The four axis-aligned directions.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// The four diagonal directions.
    pub const DIAGONAL: [Direction; 4] = [
        Direction::UpRight,
        Direction::DownRight,
        Direction::DownLeft,
        Direction::UpLeft,
    ];

    /// Numeric encoding of the direction in the range `0..=7`.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
            Self::UpRight => 4,
            Self::DownRight => 5,
            Self::DownLeft => 6,
            Self::UpLeft => 7,
        }
    }

    /// Decodes a direction from its numeric encoding, wrapping modulo eight.
    #[must_use]
    pub const fn from_index_wrapping(index: u8) -> Self {
        Self::ALL[(index % 8) as usize]
    }

    /// Column and row offsets of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::UpRight => (1, -1),
            Self::DownRight => (1, 1),
            Self::DownLeft => (-1, 1),
            Self::UpLeft => (-1, -1),
        }
    }

    /// Reports whether the direction is axis-aligned.
    #[must_use]
    pub const fn is_cardinal(self) -> bool {
        matches!(self, Self::Up | Self::Right | Self::Down | Self::Left)
    }

    /// Reports whether the direction combines a horizontal and vertical step.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        !self.is_cardinal()
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::UpRight => Self::DownLeft,
            Self::DownRight => Self::UpLeft,
            Self::DownLeft => Self::UpRight,
            Self::UpLeft => Self::DownRight,
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed because external emitters sit one cell outside the
/// grid, at column or row `-1`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    #[serde(rename = "y")]
    row: i32,
    #[serde(rename = "x")]
    column: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { row, column }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Neighbouring cell one step away in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            column: self.column.saturating_add(dx),
            row: self.row.saturating_add(dy),
        }
    }

    /// Centre of the cell in grid units, as consumed by renderers.
    #[must_use]
    pub fn center(self) -> (f32, f32) {
        (self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Visual appearance applied to a beam segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeamColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl BeamColor {
    /// Creates a new beam color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Drawable line between the centres of two consecutive cells on a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    from: CellCoord,
    to: CellCoord,
    color: BeamColor,
}

impl Segment {
    /// Creates a segment joining two cell centres.
    #[must_use]
    pub const fn new(from: CellCoord, to: CellCoord, color: BeamColor) -> Self {
        Self { from, to, color }
    }

    /// Cell whose centre starts the segment.
    #[must_use]
    pub const fn from(&self) -> CellCoord {
        self.from
    }

    /// Cell whose centre ends the segment. May lie outside the grid.
    #[must_use]
    pub const fn to(&self) -> CellCoord {
        self.to
    }

    /// Colour used to draw the segment.
    #[must_use]
    pub const fn color(&self) -> BeamColor {
        self.color
    }
}

/// The five rotatable mirror families.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MirrorKind {
    /// M1: a single reflective corner face.
    Triangle,
    /// M2: a double-sided 45° reflector.
    Line,
    /// M3: bends between one cardinal and one diagonal axis.
    Octagon,
    /// M4: bends diagonal beams onto a cardinal direction.
    Square,
    /// M5: universal redirector.
    Omni,
}

impl MirrorKind {
    /// Every mirror kind in inventory order.
    pub const ALL: [MirrorKind; 5] = [
        MirrorKind::Triangle,
        MirrorKind::Line,
        MirrorKind::Octagon,
        MirrorKind::Square,
        MirrorKind::Omni,
    ];

    /// Number of distinct rotation states supported by the kind.
    #[must_use]
    pub const fn rotation_count(self) -> u8 {
        match self {
            Self::Triangle | Self::Octagon | Self::Square => 4,
            Self::Line => 2,
            Self::Omni => 8,
        }
    }

    /// Folds an arbitrary rotation index into the kind's valid range.
    #[must_use]
    pub const fn normalize(self, rotation: u8) -> u8 {
        rotation % self.rotation_count()
    }

    /// Short label used by adapters (`M1`..`M5`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Triangle => "M1",
            Self::Line => "M2",
            Self::Octagon => "M3",
            Self::Square => "M4",
            Self::Omni => "M5",
        }
    }
}

/// Orientation and lock state of a mirror occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mirror {
    kind: MirrorKind,
    rotation: u8,
    locked: bool,
    fixed_rotation: bool,
}

impl Mirror {
    /// Creates a freely placed, unlocked mirror.
    #[must_use]
    pub const fn new(kind: MirrorKind, rotation: u8) -> Self {
        Self {
            kind,
            rotation: kind.normalize(rotation),
            locked: false,
            fixed_rotation: false,
        }
    }

    /// Creates a mirror embedded by level design.
    ///
    /// Locked mirrors cannot be removed by the player; `fixed_rotation`
    /// additionally forbids rotating them.
    #[must_use]
    pub const fn locked(kind: MirrorKind, rotation: u8, fixed_rotation: bool) -> Self {
        Self {
            kind,
            rotation: kind.normalize(rotation),
            locked: true,
            fixed_rotation,
        }
    }

    /// Family the mirror belongs to.
    #[must_use]
    pub const fn kind(&self) -> MirrorKind {
        self.kind
    }

    /// Current rotation index, always below the kind's rotation count.
    #[must_use]
    pub const fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Reports whether the mirror is part of the level layout.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Reports whether the mirror refuses rotation requests.
    #[must_use]
    pub const fn is_rotation_fixed(&self) -> bool {
        self.locked && self.fixed_rotation
    }

    /// Copy of the mirror turned to a different rotation index.
    #[must_use]
    pub const fn with_rotation(self, rotation: u8) -> Self {
        Self {
            rotation: self.kind.normalize(rotation),
            ..self
        }
    }
}

/// Families of beam sources, distinguished by the directions they may face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmitterKind {
    /// Faces one of the four cardinal directions.
    Orthogonal,
    /// Faces one of the four diagonal directions.
    Diagonal,
    /// Faces any of the eight directions.
    Omni,
}

impl EmitterKind {
    /// Reports whether the emitter kind may face the provided direction.
    #[must_use]
    pub const fn permits(self, direction: Direction) -> bool {
        match self {
            Self::Orthogonal => direction.is_cardinal(),
            Self::Diagonal => direction.is_diagonal(),
            Self::Omni => true,
        }
    }

    /// Direction assumed when a level omits one.
    #[must_use]
    pub const fn default_direction(self) -> Direction {
        match self {
            Self::Orthogonal | Self::Omni => Direction::Right,
            Self::Diagonal => Direction::DownLeft,
        }
    }
}

/// Content of a single grid position.
///
/// Every optics rule matches on this enum exhaustively so that adding a piece
/// without teaching the engine how it behaves fails to compile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// Opaque block that absorbs beams.
    Wall,
    /// Beam source embedded in the grid. Absorbs beams arriving from elsewhere.
    Emitter {
        /// Family of the emitter.
        kind: EmitterKind,
        /// Direction of the emitted beam.
        direction: Direction,
    },
    /// Target that lights up when crossed. Beams pass straight through.
    Receiver,
    /// Rotatable optical piece.
    Mirror(Mirror),
}

impl Cell {
    /// Reports whether the cell is free for placement.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Mirror occupying the cell, if any.
    #[must_use]
    pub const fn mirror(&self) -> Option<&Mirror> {
        match self {
            Self::Mirror(mirror) => Some(mirror),
            _ => None,
        }
    }
}

/// Beam source positioned just outside the grid, pointing inward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalEmitter {
    #[serde(flatten)]
    cell: CellCoord,
    direction: Direction,
}

impl ExternalEmitter {
    /// Creates an emitter at the provided position.
    #[must_use]
    pub const fn new(cell: CellCoord, direction: Direction) -> Self {
        Self { cell, direction }
    }

    /// Position of the emitter. Usually outside the grid.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Direction of the emitted beam.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Per-kind count of mirrors the player may still place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    mirror1: u32,
    mirror2: u32,
    mirror3: u32,
    mirror4: u32,
    mirror5: u32,
}

impl Inventory {
    /// Builder-style helper returning the inventory with `count` units of `kind`.
    #[must_use]
    pub fn with(mut self, kind: MirrorKind, count: u32) -> Self {
        *self.slot_mut(kind) = count;
        self
    }

    /// Number of units of the provided kind.
    #[must_use]
    pub const fn count(&self, kind: MirrorKind) -> u32 {
        match kind {
            MirrorKind::Triangle => self.mirror1,
            MirrorKind::Line => self.mirror2,
            MirrorKind::Octagon => self.mirror3,
            MirrorKind::Square => self.mirror4,
            MirrorKind::Omni => self.mirror5,
        }
    }

    /// Returns one unit of `kind` to the inventory.
    pub fn add(&mut self, kind: MirrorKind) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(1);
    }

    /// Removes one unit of `kind`, reporting whether a unit was available.
    pub fn take(&mut self, kind: MirrorKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Total number of units across all kinds.
    #[must_use]
    pub fn total(&self) -> u32 {
        MirrorKind::ALL
            .iter()
            .map(|kind| self.count(*kind))
            .fold(0, u32::saturating_add)
    }

    /// Reports whether no units remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Expands the counts into one entry per unit, in kind order.
    #[must_use]
    pub fn units(&self) -> Vec<MirrorKind> {
        MirrorKind::ALL
            .iter()
            .flat_map(|kind| std::iter::repeat(*kind).take(self.count(*kind) as usize))
            .collect()
    }

    fn slot_mut(&mut self, kind: MirrorKind) -> &mut u32 {
        match kind {
            MirrorKind::Triangle => &mut self.mirror1,
            MirrorKind::Line => &mut self.mirror2,
            MirrorKind::Octagon => &mut self.mirror3,
            MirrorKind::Square => &mut self.mirror4,
            MirrorKind::Omni => &mut self.mirror5,
        }
    }
}

/// Commands that express all permissible board mutations during play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests placement of an inventory mirror on an empty cell.
    PlaceMirror {
        /// Kind of mirror taken from the inventory.
        kind: MirrorKind,
        /// Cell that should receive the mirror.
        cell: CellCoord,
    },
    /// Requests a one-step counter-clockwise rotation of a mirror.
    RotateMirror {
        /// Cell holding the mirror.
        cell: CellCoord,
    },
    /// Requests that a player-placed mirror return to the inventory.
    RemoveMirror {
        /// Cell holding the mirror.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a mirror was placed on the board.
    MirrorPlaced {
        /// Kind of the placed mirror.
        kind: MirrorKind,
        /// Cell now holding the mirror.
        cell: CellCoord,
    },
    /// Confirms that a mirror turned to a new rotation.
    MirrorRotated {
        /// Cell holding the mirror.
        cell: CellCoord,
        /// Rotation index after the turn.
        rotation: u8,
    },
    /// Confirms that a mirror left the board and returned to the inventory.
    MirrorRemoved {
        /// Kind of the removed mirror.
        kind: MirrorKind,
        /// Cell the mirror vacated.
        cell: CellCoord,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Kind of mirror requested for placement.
        kind: MirrorKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a rotation request was rejected.
    RotationRejected {
        /// Cell provided in the rotation request.
        cell: CellCoord,
        /// Specific reason the rotation failed.
        reason: RotationError,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Cell provided in the removal request.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell already holds a piece.
    Occupied,
    /// No unit of the requested kind remains in the inventory.
    OutOfStock,
}

/// Reasons a rotation request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell does not hold a mirror.
    NotAMirror,
    /// The mirror is locked at a fixed rotation.
    FixedRotation,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell does not hold a mirror.
    NotAMirror,
    /// The mirror belongs to the level layout.
    Locked,
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, Inventory, Mirror, MirrorKind};

    #[test]
    fn direction_encoding_matches_declaration_order() {
        for (index, direction) in Direction::ALL.iter().enumerate() {
            assert_eq!(usize::from(direction.index()), index);
            assert_eq!(Direction::from_index_wrapping(direction.index()), *direction);
        }
        assert_eq!(Direction::from_index_wrapping(9), Direction::Right);
    }

    #[test]
    fn opposite_directions_cancel_out() {
        let origin = CellCoord::new(3, 3);
        for direction in Direction::ALL {
            assert_eq!(origin.step(direction).step(direction.opposite()), origin);
            assert_eq!(direction.is_cardinal(), !direction.is_diagonal());
        }
    }

    #[test]
    fn diagonal_steps_move_on_both_axes() {
        let next = CellCoord::new(1, 1).step(Direction::DownLeft);
        assert_eq!(next, CellCoord::new(0, 2));
    }

    #[test]
    fn mirror_rotation_is_normalized_per_kind() {
        assert_eq!(Mirror::new(MirrorKind::Triangle, 4).rotation(), 0);
        assert_eq!(Mirror::new(MirrorKind::Line, 3).rotation(), 1);
        assert_eq!(Mirror::new(MirrorKind::Omni, 7).rotation(), 7);
        assert!(!Mirror::locked(MirrorKind::Line, 0, false).is_rotation_fixed());
        assert!(Mirror::locked(MirrorKind::Line, 0, true).is_rotation_fixed());
        assert!(!Mirror::new(MirrorKind::Line, 0).is_rotation_fixed());
    }

    #[test]
    fn inventory_take_stops_at_zero() {
        let mut inventory = Inventory::default().with(MirrorKind::Line, 1);
        assert!(inventory.take(MirrorKind::Line));
        assert!(!inventory.take(MirrorKind::Line));
        assert!(!inventory.take(MirrorKind::Triangle));
        inventory.add(MirrorKind::Omni);
        assert_eq!(inventory.total(), 1);
    }

    #[test]
    fn inventory_units_expand_in_kind_order() {
        let inventory = Inventory::default()
            .with(MirrorKind::Octagon, 1)
            .with(MirrorKind::Triangle, 2);
        assert_eq!(
            inventory.units(),
            vec![MirrorKind::Triangle, MirrorKind::Triangle, MirrorKind::Octagon]
        );
    }

    #[test]
    fn inventory_defaults_missing_counts_to_zero() {
        let inventory: Inventory =
            serde_json::from_str(r#"{ "mirror1": 2 }"#).expect("inventory parses");
        assert_eq!(inventory.count(MirrorKind::Triangle), 2);
        assert_eq!(inventory.count(MirrorKind::Omni), 0);
    }
}
