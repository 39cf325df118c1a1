use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Cell, CellCoord, Direction, EmitterKind, ExternalEmitter, Inventory, Mirror, MirrorKind,
};

/// Dimensions of a level grid measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reports whether the coordinate addresses a cell inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= 0
            && cell.row() >= 0
            && (cell.column() as i64) < self.width as i64
            && (cell.row() as i64) < self.height as i64
    }

    /// Reports whether the coordinate lies on the one-cell ring around the
    /// grid, excluding its four corners.
    #[must_use]
    pub const fn on_border_ring(&self, cell: CellCoord) -> bool {
        let x = cell.column() as i64;
        let y = cell.row() as i64;
        let width = self.width as i64;
        let height = self.height as i64;
        let column_inside = x >= 0 && x < width;
        let row_inside = y >= 0 && y < height;
        let column_on_ring = x == -1 || x == width;
        let row_on_ring = y == -1 || y == height;
        (column_on_ring && row_inside) || (row_on_ring && column_inside)
    }
}

/// Tag identifying the piece described by a [`PlacedItem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Opaque wall.
    Wall,
    /// Beam target.
    Receiver,
    /// Orthogonal emitter embedded in the grid.
    Emitter,
    /// Diagonal emitter embedded in the grid.
    EmitterDiagonal,
    /// Omni-directional emitter embedded in the grid.
    EmitterOmni,
    /// Pre-placed M1 mirror.
    MirrorTriangle,
    /// Pre-placed M2 mirror.
    MirrorLine,
    /// Pre-placed M3 mirror.
    MirrorOctagon,
    /// Pre-placed M4 mirror.
    MirrorSquare,
    /// Pre-placed M5 mirror.
    MirrorOmni,
}

impl ItemKind {
    /// Mirror family described by the tag, if it names a mirror.
    #[must_use]
    pub const fn mirror_kind(self) -> Option<MirrorKind> {
        match self {
            Self::MirrorTriangle => Some(MirrorKind::Triangle),
            Self::MirrorLine => Some(MirrorKind::Line),
            Self::MirrorOctagon => Some(MirrorKind::Octagon),
            Self::MirrorSquare => Some(MirrorKind::Square),
            Self::MirrorOmni => Some(MirrorKind::Omni),
            Self::Wall
            | Self::Receiver
            | Self::Emitter
            | Self::EmitterDiagonal
            | Self::EmitterOmni => None,
        }
    }

    /// Emitter family described by the tag, if it names an emitter.
    #[must_use]
    pub const fn emitter_kind(self) -> Option<EmitterKind> {
        match self {
            Self::Emitter => Some(EmitterKind::Orthogonal),
            Self::EmitterDiagonal => Some(EmitterKind::Diagonal),
            Self::EmitterOmni => Some(EmitterKind::Omni),
            _ => None,
        }
    }

    /// Tag describing a mirror of the provided family.
    #[must_use]
    pub const fn for_mirror(kind: MirrorKind) -> Self {
        match kind {
            MirrorKind::Triangle => Self::MirrorTriangle,
            MirrorKind::Line => Self::MirrorLine,
            MirrorKind::Octagon => Self::MirrorOctagon,
            MirrorKind::Square => Self::MirrorSquare,
            MirrorKind::Omni => Self::MirrorOmni,
        }
    }
}

/// Piece fixed by the level layout at a specific cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    /// Cell the item occupies.
    #[serde(flatten)]
    pub cell: CellCoord,
    /// Kind of piece.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Rotation index for mirrors. Defaults to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u8>,
    /// Facing for emitters. Defaults per emitter kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Whether the player is barred from removing the piece.
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    /// Whether the player is barred from rotating the piece.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fixed_rotation: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PlacedItem {
    fn bare(cell: CellCoord, kind: ItemKind) -> Self {
        Self {
            cell,
            kind,
            rotation: None,
            direction: None,
            locked: false,
            fixed_rotation: false,
        }
    }

    /// Wall at the provided cell.
    #[must_use]
    pub fn wall(cell: CellCoord) -> Self {
        Self::bare(cell, ItemKind::Wall)
    }

    /// Receiver at the provided cell.
    #[must_use]
    pub fn receiver(cell: CellCoord) -> Self {
        Self::bare(cell, ItemKind::Receiver)
    }

    /// Orthogonal emitter at the provided cell.
    #[must_use]
    pub fn emitter(cell: CellCoord, direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            ..Self::bare(cell, ItemKind::Emitter)
        }
    }

    /// Locked mirror that belongs to the level layout.
    #[must_use]
    pub fn fixed_mirror(
        cell: CellCoord,
        mirror: MirrorKind,
        rotation: u8,
        fixed_rotation: bool,
    ) -> Self {
        Self {
            rotation: Some(mirror.normalize(rotation)),
            locked: true,
            fixed_rotation,
            ..Self::bare(cell, ItemKind::for_mirror(mirror))
        }
    }

    /// Grid cell content described by the item.
    #[must_use]
    pub fn to_cell(&self) -> Cell {
        if let Some(kind) = self.kind.mirror_kind() {
            let rotation = self.rotation.unwrap_or(0);
            let mirror = if self.locked {
                Mirror::locked(kind, rotation, self.fixed_rotation)
            } else {
                Mirror::new(kind, rotation)
            };
            return Cell::Mirror(mirror);
        }
        if let Some(kind) = self.kind.emitter_kind() {
            return Cell::Emitter {
                kind,
                direction: self.direction.unwrap_or(kind.default_direction()),
            };
        }
        match self.kind {
            ItemKind::Wall => Cell::Wall,
            _ => Cell::Receiver,
        }
    }
}

/// Structural problems detected while validating a [`LevelDescriptor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The grid has no cells.
    #[error("grid dimensions {width}x{height} must both be positive")]
    InvalidDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// An item lies outside the grid.
    #[error("item at ({}, {}) lies outside the grid", .cell.column(), .cell.row())]
    ItemOutOfBounds {
        /// Offending position.
        cell: CellCoord,
    },
    /// Two pieces claim the same cell.
    #[error("more than one piece occupies ({}, {})", .cell.column(), .cell.row())]
    DuplicateItem {
        /// Contested position.
        cell: CellCoord,
    },
    /// An emitter faces a direction its kind cannot emit along.
    #[error("{kind:?} emitter at ({}, {}) cannot face {direction:?}", .cell.column(), .cell.row())]
    EmitterDirection {
        /// Emitter position.
        cell: CellCoord,
        /// Emitter family.
        kind: EmitterKind,
        /// Rejected facing.
        direction: Direction,
    },
    /// An external emitter is neither inside the grid nor adjacent to its edge.
    #[error("external emitter at ({}, {}) is not on the grid border", .cell.column(), .cell.row())]
    ExternalEmitterOutsideRing {
        /// Emitter position.
        cell: CellCoord,
    },
    /// An external emitter's beam leaves the grid on its first step.
    #[error("external emitter at ({}, {}) points away from the grid", .cell.column(), .cell.row())]
    ExternalEmitterFacesAway {
        /// Emitter position.
        cell: CellCoord,
    },
}

/// Complete description of a puzzle: grid size, fixed pieces, beam sources
/// and the player's inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Display name of the level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Grid dimensions.
    pub grid: GridSize,
    /// Pieces fixed by the layout.
    #[serde(default)]
    pub items: Vec<PlacedItem>,
    /// Beam sources. Entries outside the grid are external emitters.
    #[serde(default)]
    pub emitters: Vec<ExternalEmitter>,
    /// Mirrors the player may place.
    #[serde(default)]
    pub inventory: Inventory,
}

impl LevelDescriptor {
    /// Creates an empty level of the provided size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            name: None,
            grid: GridSize::new(width, height),
            items: Vec::new(),
            emitters: Vec::new(),
            inventory: Inventory::default(),
        }
    }

    /// Checks the structural rules every playable level satisfies.
    ///
    /// # Errors
    ///
    /// Returns the first [`LevelError`] encountered, scanning items before
    /// emitters.
    pub fn validate(&self) -> Result<(), LevelError> {
        let GridSize { width, height } = self.grid;
        if width == 0 || height == 0 {
            return Err(LevelError::InvalidDimensions { width, height });
        }

        let mut occupied = BTreeSet::new();
        for item in &self.items {
            if !self.grid.contains(item.cell) {
                return Err(LevelError::ItemOutOfBounds { cell: item.cell });
            }
            if !occupied.insert(item.cell) {
                return Err(LevelError::DuplicateItem { cell: item.cell });
            }
            if let Cell::Emitter { kind, direction } = item.to_cell() {
                if !kind.permits(direction) {
                    return Err(LevelError::EmitterDirection {
                        cell: item.cell,
                        kind,
                        direction,
                    });
                }
            }
        }

        for emitter in &self.emitters {
            let cell = emitter.cell();
            if self.grid.contains(cell) {
                if !occupied.insert(cell) {
                    return Err(LevelError::DuplicateItem { cell });
                }
                if !EmitterKind::Orthogonal.permits(emitter.direction()) {
                    return Err(LevelError::EmitterDirection {
                        cell,
                        kind: EmitterKind::Orthogonal,
                        direction: emitter.direction(),
                    });
                }
                continue;
            }
            if !self.grid.on_border_ring(cell) {
                return Err(LevelError::ExternalEmitterOutsideRing { cell });
            }
            if !self.grid.contains(cell.step(emitter.direction())) {
                return Err(LevelError::ExternalEmitterFacesAway { cell });
            }
        }

        Ok(())
    }

    /// Number of receivers placed by the layout.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Receiver)
            .count()
    }

    /// Emitters positioned outside the grid, in declaration order.
    #[must_use]
    pub fn external_emitters(&self) -> Vec<ExternalEmitter> {
        self.emitters
            .iter()
            .filter(|emitter| !self.grid.contains(emitter.cell()))
            .copied()
            .collect()
    }

    /// Emitter entries that sit inside the grid and act as emitter cells.
    #[must_use]
    pub fn embedded_emitters(&self) -> Vec<ExternalEmitter> {
        self.emitters
            .iter()
            .filter(|emitter| self.grid.contains(emitter.cell()))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_LEVEL: &str = r#"{
        "name": "Level 1",
        "grid": { "width": 4, "height": 4 },
        "items": [ { "x": 0, "y": 2, "type": "receiver" } ],
        "emitters": [ { "x": 1, "y": -1, "direction": "DOWN" } ],
        "inventory": { "mirror1": 1, "mirror2": 0 }
    }"#;

    #[test]
    fn parses_interchange_json() {
        let level: LevelDescriptor = serde_json::from_str(FIRST_LEVEL).expect("level parses");
        assert_eq!(level.grid, GridSize::new(4, 4));
        assert_eq!(level.items, vec![PlacedItem::receiver(CellCoord::new(0, 2))]);
        assert_eq!(
            level.emitters,
            vec![ExternalEmitter::new(CellCoord::new(1, -1), Direction::Down)]
        );
        assert_eq!(level.inventory.count(MirrorKind::Triangle), 1);
        assert_eq!(level.receiver_count(), 1);
        assert_eq!(level.validate(), Ok(()));
    }

    #[test]
    fn item_fields_use_camel_case() {
        let item = PlacedItem::fixed_mirror(CellCoord::new(2, 3), MirrorKind::Line, 1, true);
        let json = serde_json::to_value(item).expect("item serializes");
        assert_eq!(json["type"], "mirrorLine");
        assert_eq!(json["fixedRotation"], true);
        assert_eq!(json["x"], 2);
        assert_eq!(json["y"], 3);
    }

    #[test]
    fn missing_direction_uses_kind_default() {
        let item: PlacedItem =
            serde_json::from_str(r#"{ "x": 1, "y": 1, "type": "emitterDiagonal" }"#)
                .expect("item parses");
        assert_eq!(
            item.to_cell(),
            Cell::Emitter {
                kind: EmitterKind::Diagonal,
                direction: Direction::DownLeft,
            }
        );
    }

    #[test]
    fn oversized_rotation_wraps() {
        let item: PlacedItem =
            serde_json::from_str(r#"{ "x": 0, "y": 0, "type": "mirrorTriangle", "rotation": 5 }"#)
                .expect("item parses");
        assert_eq!(item.to_cell(), Cell::Mirror(Mirror::new(MirrorKind::Triangle, 1)));
    }

    #[test]
    fn rejects_duplicate_positions() {
        let mut level = LevelDescriptor::new(3, 3);
        level.items.push(PlacedItem::wall(CellCoord::new(1, 1)));
        level.items.push(PlacedItem::receiver(CellCoord::new(1, 1)));
        assert_eq!(
            level.validate(),
            Err(LevelError::DuplicateItem {
                cell: CellCoord::new(1, 1),
            })
        );
    }

    #[test]
    fn rejects_emitters_off_the_ring_or_facing_away() {
        let mut level = LevelDescriptor::new(3, 3);
        level
            .emitters
            .push(ExternalEmitter::new(CellCoord::new(-2, 0), Direction::Right));
        assert_eq!(
            level.validate(),
            Err(LevelError::ExternalEmitterOutsideRing {
                cell: CellCoord::new(-2, 0),
            })
        );

        level.emitters = vec![ExternalEmitter::new(CellCoord::new(-1, 0), Direction::Left)];
        assert_eq!(
            level.validate(),
            Err(LevelError::ExternalEmitterFacesAway {
                cell: CellCoord::new(-1, 0),
            })
        );

        level.emitters = vec![ExternalEmitter::new(CellCoord::new(-1, -1), Direction::DownRight)];
        assert!(level.validate().is_err(), "corners are not on the ring");
    }

    #[test]
    fn rejects_emitter_direction_outside_its_kind() {
        let mut level = LevelDescriptor::new(3, 3);
        level.items.push(PlacedItem {
            direction: Some(Direction::Up),
            ..PlacedItem::bare(CellCoord::new(0, 0), ItemKind::EmitterDiagonal)
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::EmitterDirection {
                kind: EmitterKind::Diagonal,
                ..
            })
        ));
    }

    #[test]
    fn splits_external_and_embedded_emitters() {
        let mut level = LevelDescriptor::new(3, 3);
        level.emitters = vec![
            ExternalEmitter::new(CellCoord::new(0, 3), Direction::Up),
            ExternalEmitter::new(CellCoord::new(1, 1), Direction::Left),
        ];
        assert_eq!(level.external_emitters().len(), 1);
        assert_eq!(level.embedded_emitters()[0].cell(), CellCoord::new(1, 1));
        assert_eq!(level.validate(), Ok(()));
    }
}
