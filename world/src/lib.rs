#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for Laser Maze.
//!
//! The [`Grid`] is the storage shared by every system. The [`World`] wraps a
//! grid with the level's external emitters and the player's inventory, and is
//! only mutated through [`apply`].

mod grid;

pub use grid::Grid;

use laser_maze_core::{
    Cell, CellCoord, Command, Event, ExternalEmitter, Inventory, LevelDescriptor, LevelError,
    Mirror, MirrorKind, PlacementError, RemovalError, RotationError,
};

/// Play-time state of a loaded level.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    emitters: Vec<ExternalEmitter>,
    inventory: Inventory,
    receivers: Vec<CellCoord>,
}

impl World {
    /// Loads a level after checking its structure.
    ///
    /// # Errors
    ///
    /// Returns the [`LevelError`] reported by [`LevelDescriptor::validate`].
    pub fn from_level(level: &LevelDescriptor) -> Result<Self, LevelError> {
        level.validate()?;
        let grid = Grid::from_level(level);
        let receivers = grid.receivers();
        Ok(Self {
            grid,
            emitters: level.external_emitters(),
            inventory: level.inventory,
            receivers,
        })
    }

    fn place(&mut self, kind: MirrorKind, cell: CellCoord) -> Result<(), PlacementError> {
        match self.grid.get(cell) {
            None => return Err(PlacementError::OutOfBounds),
            Some(Cell::Empty) => {}
            Some(_) => return Err(PlacementError::Occupied),
        }
        if !self.inventory.take(kind) {
            return Err(PlacementError::OutOfStock);
        }
        let _ = self.grid.set(cell, Cell::Mirror(Mirror::new(kind, 0)));
        Ok(())
    }

    fn rotate(&mut self, cell: CellCoord) -> Result<u8, RotationError> {
        let mirror = match self.grid.get(cell) {
            None => return Err(RotationError::OutOfBounds),
            Some(Cell::Mirror(mirror)) => mirror,
            Some(_) => return Err(RotationError::NotAMirror),
        };
        if mirror.is_rotation_fixed() {
            return Err(RotationError::FixedRotation);
        }
        let count = mirror.kind().rotation_count();
        let turned = mirror.with_rotation(mirror.rotation() + count - 1);
        let _ = self.grid.set(cell, Cell::Mirror(turned));
        Ok(turned.rotation())
    }

    fn remove(&mut self, cell: CellCoord) -> Result<MirrorKind, RemovalError> {
        let mirror = match self.grid.get(cell) {
            None => return Err(RemovalError::OutOfBounds),
            Some(Cell::Mirror(mirror)) => mirror,
            Some(_) => return Err(RemovalError::NotAMirror),
        };
        if mirror.is_locked() {
            return Err(RemovalError::Locked);
        }
        let _ = self.grid.clear(cell);
        self.inventory.add(mirror.kind());
        Ok(mirror.kind())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceMirror { kind, cell } => match world.place(kind, cell) {
            Ok(()) => out_events.push(Event::MirrorPlaced { kind, cell }),
            Err(reason) => out_events.push(Event::PlacementRejected { kind, cell, reason }),
        },
        Command::RotateMirror { cell } => match world.rotate(cell) {
            Ok(rotation) => out_events.push(Event::MirrorRotated { cell, rotation }),
            Err(reason) => out_events.push(Event::RotationRejected { cell, reason }),
        },
        Command::RemoveMirror { cell } => match world.remove(cell) {
            Ok(kind) => out_events.push(Event::MirrorRemoved { kind, cell }),
            Err(reason) => out_events.push(Event::RemovalRejected { cell, reason }),
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use super::{Grid, World};
    use laser_maze_core::{CellCoord, ExternalEmitter, Inventory};

    /// Current board.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Beam sources that sit outside the board.
    #[must_use]
    pub fn emitters(world: &World) -> &[ExternalEmitter] {
        &world.emitters
    }

    /// Mirrors the player may still place.
    #[must_use]
    pub fn inventory(world: &World) -> &Inventory {
        &world.inventory
    }

    /// Receivers on the board in row-major order.
    #[must_use]
    pub fn receivers(world: &World) -> &[CellCoord] {
        &world.receivers
    }

    /// Reports whether the level is won for the provided set of lit receivers.
    ///
    /// A level without receivers is never won.
    #[must_use]
    pub fn is_solved(world: &World, active_receivers: &BTreeSet<CellCoord>) -> bool {
        !world.receivers.is_empty()
            && world
                .receivers
                .iter()
                .all(|receiver| active_receivers.contains(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_maze_core::{Direction, PlacedItem};

    fn level() -> LevelDescriptor {
        let mut level = LevelDescriptor::new(4, 4);
        level.items.push(PlacedItem::receiver(CellCoord::new(0, 2)));
        level
            .items
            .push(PlacedItem::fixed_mirror(CellCoord::new(3, 3), MirrorKind::Line, 0, true));
        level
            .emitters
            .push(ExternalEmitter::new(CellCoord::new(1, -1), Direction::Down));
        level.inventory = Inventory::default().with(MirrorKind::Triangle, 1);
        level
    }

    #[test]
    fn from_level_captures_receivers_and_emitters() {
        let world = World::from_level(&level()).expect("level is valid");
        assert_eq!(query::receivers(&world), &[CellCoord::new(0, 2)]);
        assert_eq!(query::emitters(&world).len(), 1);
        assert_eq!(query::inventory(&world).count(MirrorKind::Triangle), 1);
    }

    #[test]
    fn from_level_rejects_invalid_levels() {
        let mut broken = level();
        broken.items.push(PlacedItem::wall(CellCoord::new(9, 0)));
        assert_eq!(
            World::from_level(&broken).err(),
            Some(LevelError::ItemOutOfBounds {
                cell: CellCoord::new(9, 0),
            })
        );
    }

    #[test]
    fn rotating_a_triangle_turns_counter_clockwise() {
        let mut world = World::from_level(&level()).expect("level is valid");
        let mut events = Vec::new();
        let cell = CellCoord::new(1, 2);

        apply(
            &mut world,
            Command::PlaceMirror {
                kind: MirrorKind::Triangle,
                cell,
            },
            &mut events,
        );
        apply(&mut world, Command::RotateMirror { cell }, &mut events);
        apply(&mut world, Command::RotateMirror { cell }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::MirrorPlaced {
                    kind: MirrorKind::Triangle,
                    cell,
                },
                Event::MirrorRotated { cell, rotation: 3 },
                Event::MirrorRotated { cell, rotation: 2 },
            ]
        );
    }

    #[test]
    fn fixed_mirrors_refuse_rotation_and_removal() {
        let mut world = World::from_level(&level()).expect("level is valid");
        let mut events = Vec::new();
        let cell = CellCoord::new(3, 3);

        apply(&mut world, Command::RotateMirror { cell }, &mut events);
        apply(&mut world, Command::RemoveMirror { cell }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::RotationRejected {
                    cell,
                    reason: RotationError::FixedRotation,
                },
                Event::RemovalRejected {
                    cell,
                    reason: RemovalError::Locked,
                },
            ]
        );
    }
}
