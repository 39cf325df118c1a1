//! Shared ray-marching routine behind both simulators.

use std::collections::{BTreeSet, HashSet};

use laser_maze_core::{Cell, CellCoord, Direction, ExternalEmitter};
use laser_maze_world::Grid;

use crate::{interact, Interaction, MAX_STEPS};

/// Receives every step a ray takes, including the final step that leaves the
/// grid or re-enters an already visited state.
pub(crate) trait RayObserver {
    fn advance(&mut self, from: CellCoord, to: CellCoord);
}

/// Observer that ignores ray geometry.
pub(crate) struct Silent;

impl RayObserver for Silent {
    fn advance(&mut self, _from: CellCoord, _to: CellCoord) {}
}

/// Casts one ray per emitter and returns every receiver crossed by any ray.
///
/// External emitters that sit inside the grid are skipped; the grid's own
/// emitter cells cast in row-major order after the external ones.
pub(crate) fn march<O: RayObserver>(
    grid: &Grid,
    emitters: &[ExternalEmitter],
    observer: &mut O,
) -> BTreeSet<CellCoord> {
    let mut active = BTreeSet::new();
    for (origin, direction) in ray_sources(grid, emitters) {
        cast_ray(grid, origin, direction, &mut active, observer);
    }
    active
}

fn ray_sources(grid: &Grid, emitters: &[ExternalEmitter]) -> Vec<(CellCoord, Direction)> {
    let external = emitters
        .iter()
        .filter(|emitter| !grid.contains(emitter.cell()))
        .map(|emitter| (emitter.cell(), emitter.direction()));
    let embedded = grid.iter().filter_map(|(coord, cell)| match cell {
        Cell::Emitter { direction, .. } => Some((coord, direction)),
        _ => None,
    });
    external.chain(embedded).collect()
}

fn cast_ray<O: RayObserver>(
    grid: &Grid,
    origin: CellCoord,
    mut direction: Direction,
    active: &mut BTreeSet<CellCoord>,
    observer: &mut O,
) {
    let mut position = origin;
    let mut visited = HashSet::new();
    let _ = visited.insert((position, direction));

    for _ in 0..MAX_STEPS {
        let next = position.step(direction);
        observer.advance(position, next);

        let Some(cell) = grid.get(next) else {
            break;
        };
        if !visited.insert((next, direction)) {
            break;
        }

        match interact(&cell, direction) {
            Interaction::Continue(turned) => direction = turned,
            Interaction::Activate => {
                let _ = active.insert(next);
            }
            Interaction::Absorb => break,
        }
        position = next;
    }
}
