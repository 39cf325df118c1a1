//! Builds one candidate level by planting beam paths from the border.
//!
//! Each emitter sits on the border ring facing inward. A random walk then
//! advances the beam, dropping a turning mirror every time it stops, until
//! the path is long enough or the walk gets stuck. The receiver goes on the
//! cell right after the last mirror.
//!
//! Only the cells holding a piece block later strides. Cells a planted beam
//! merely crosses stay open for other beams to cross, but never receive a
//! mirror or a decoy wall, so every planted route still lights its receiver.

use std::collections::BTreeSet;

use laser_maze_core::{
    CellCoord, Direction, ExternalEmitter, GridSize, LevelDescriptor, Mirror, MirrorKind,
    PlacedItem,
};
use laser_maze_system_optics::reflect;
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::{tiers::TierParameters, Tuning};

/// Attempts at finding a free border cell for one emitter.
const BORDER_PLACEMENT_TRIES: usize = 10;

/// Reason a candidate was thrown away before reaching the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub(crate) enum Rejection {
    /// No border cell with a free entry cell was found for an emitter.
    #[error("no free border cell for an emitter")]
    NoEntry,
    /// The cell after the last mirror is off the board or holds a piece.
    #[error("receiver cell {0:?} is blocked")]
    ReceiverBlocked(CellCoord),
    /// The planted paths hold fewer mirrors than the tier requires.
    #[error("planted paths hold {length} mirrors, {required} required")]
    PathTooShort { length: usize, required: usize },
}

/// Mirror dropped by the walk, before it becomes a fixed piece or inventory.
#[derive(Clone, Copy, Debug)]
struct PathMirror {
    cell: CellCoord,
    kind: MirrorKind,
    rotation: u8,
}

/// Where a walk ended and the mirrors it planted.
#[derive(Debug)]
struct Walk {
    end: CellCoord,
    heading: Direction,
    mirrors: Vec<PathMirror>,
}

/// Cells claimed by the candidate so far.
#[derive(Debug, Default)]
struct Claims {
    /// Cells holding a mirror or receiver. Strides stop in front of them.
    pieces: BTreeSet<CellCoord>,
    /// Cells a planted beam travels through.
    route: BTreeSet<CellCoord>,
}

impl Claims {
    fn is_untouched(&self, cell: CellCoord) -> bool {
        !self.pieces.contains(&cell) && !self.route.contains(&cell)
    }
}

pub(crate) fn build<R: Rng + ?Sized>(
    params: &TierParameters,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<LevelDescriptor, Rejection> {
    let size = GridSize::new(params.width, params.height);
    let mut level = LevelDescriptor::new(params.width, params.height);
    let mut claims = Claims::default();
    let mut planted = Vec::new();

    for _ in 0..params.emitter_count {
        let emitter =
            border_emitter(size, &level.emitters, &claims, rng).ok_or(Rejection::NoEntry)?;
        let entry = emitter.cell().step(emitter.direction());
        let _ = claims.route.insert(entry);
        level.emitters.push(emitter);

        let walk = walk_path(size, entry, emitter.direction(), params, tuning, &mut claims, rng);
        let receiver = walk.end.step(walk.heading);
        if !size.contains(receiver) || claims.pieces.contains(&receiver) {
            return Err(Rejection::ReceiverBlocked(receiver));
        }
        let _ = claims.pieces.insert(receiver);
        level.items.push(PlacedItem::receiver(receiver));
        planted.extend(walk.mirrors);
    }

    if planted.len() < params.min_path_length {
        return Err(Rejection::PathTooShort {
            length: planted.len(),
            required: params.min_path_length,
        });
    }

    for mirror in planted {
        if rng.gen_bool(tuning.fixed_piece_probability) {
            let fixed_rotation = rng.gen_bool(tuning.fixed_rotation_probability);
            level.items.push(PlacedItem::fixed_mirror(
                mirror.cell,
                mirror.kind,
                mirror.rotation,
                fixed_rotation,
            ));
        } else {
            level.inventory.add(mirror.kind);
        }
    }

    scatter_walls(&mut level, size, tuning, &mut claims, rng);
    Ok(level)
}

/// Picks a free border cell facing into the board whose entry cell holds no
/// piece.
fn border_emitter<R: Rng + ?Sized>(
    size: GridSize,
    placed: &[ExternalEmitter],
    claims: &Claims,
    rng: &mut R,
) -> Option<ExternalEmitter> {
    let width = size.width as i32;
    let height = size.height as i32;
    for _ in 0..BORDER_PLACEMENT_TRIES {
        let emitter = match rng.gen_range(0..4) {
            0 => ExternalEmitter::new(
                CellCoord::new(rng.gen_range(0..width), -1),
                Direction::Down,
            ),
            1 => ExternalEmitter::new(
                CellCoord::new(width, rng.gen_range(0..height)),
                Direction::Left,
            ),
            2 => ExternalEmitter::new(
                CellCoord::new(rng.gen_range(0..width), height),
                Direction::Up,
            ),
            _ => ExternalEmitter::new(
                CellCoord::new(-1, rng.gen_range(0..height)),
                Direction::Right,
            ),
        };
        let taken = placed.iter().any(|other| other.cell() == emitter.cell());
        let entry = emitter.cell().step(emitter.direction());
        if !taken && !claims.pieces.contains(&entry) {
            return Some(emitter);
        }
    }
    None
}

/// Advances the beam in random strides, turning it with a mirror after each.
///
/// A stride stops in front of the first piece or the board edge. It may cross
/// an earlier route, but its mirror lands on the last cell no beam crosses.
fn walk_path<R: Rng + ?Sized>(
    size: GridSize,
    entry: CellCoord,
    heading: Direction,
    params: &TierParameters,
    tuning: &Tuning,
    claims: &mut Claims,
    rng: &mut R,
) -> Walk {
    let reach = ((params.width.max(params.height) + 1) / 2).max(1);
    let mut walk = Walk {
        end: entry,
        heading,
        mirrors: Vec::new(),
    };

    for _ in 0..tuning.max_walk_steps {
        if walk.mirrors.len() >= params.min_path_length {
            break;
        }

        let stride = rng.gen_range(1..=reach);
        let mut position = walk.end;
        let mut stop = walk.end;
        for _ in 0..stride {
            let next = position.step(walk.heading);
            if !size.contains(next) || claims.pieces.contains(&next) {
                break;
            }
            position = next;
            if !claims.route.contains(&next) {
                stop = next;
            }
        }
        if stop == walk.end {
            break;
        }

        let mut crossed = walk.end;
        while crossed != stop {
            crossed = crossed.step(walk.heading);
            let _ = claims.route.insert(crossed);
        }
        let _ = claims.pieces.insert(stop);
        walk.end = stop;

        let Some(&kind) = params.allowed_mirrors.choose(rng) else {
            break;
        };
        let Some((rotation, turned)) = turning_rotation(kind, walk.heading, rng) else {
            break;
        };
        walk.mirrors.push(PathMirror {
            cell: stop,
            kind,
            rotation,
        });
        walk.heading = turned;
    }
    walk
}

/// Finds a rotation of `kind` that deflects `incoming` onto a new heading,
/// trying rotations in random order.
fn turning_rotation<R: Rng + ?Sized>(
    kind: MirrorKind,
    incoming: Direction,
    rng: &mut R,
) -> Option<(u8, Direction)> {
    let mut rotations: Vec<u8> = (0..kind.rotation_count()).collect();
    rotations.shuffle(rng);
    rotations.into_iter().find_map(|rotation| {
        reflect(&Mirror::new(kind, rotation), incoming)
            .filter(|&outgoing| outgoing != incoming)
            .map(|outgoing| (rotation, outgoing))
    })
}

/// Drops decoy walls on random free cells.
fn scatter_walls<R: Rng + ?Sized>(
    level: &mut LevelDescriptor,
    size: GridSize,
    tuning: &Tuning,
    claims: &mut Claims,
    rng: &mut R,
) {
    let area = f64::from(size.width) * f64::from(size.height);
    let attempts = (area * tuning.decoy_wall_density).floor() as usize;
    for _ in 0..attempts {
        let cell = CellCoord::new(
            rng.gen_range(0..size.width as i32),
            rng.gen_range(0..size.height as i32),
        );
        if claims.is_untouched(cell) {
            let _ = claims.pieces.insert(cell);
            level.items.push(PlacedItem::wall(cell));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::Difficulty;
    use laser_maze_core::{Cell, ItemKind};
    use laser_maze_system_optics::headless::simulate_headless;
    use laser_maze_world::Grid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn all_fixed() -> Tuning {
        Tuning {
            fixed_piece_probability: 1.0,
            ..Tuning::default()
        }
    }

    #[test]
    fn planted_paths_light_every_receiver() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let tuning = all_fixed();
        let mut built = 0;
        for difficulty in Difficulty::ALL {
            for _ in 0..40 {
                let params = TierParameters::roll(difficulty, &mut rng);
                let Ok(level) = build(&params, &tuning, &mut rng) else {
                    continue;
                };
                built += 1;
                assert!(level.inventory.is_empty(), "every mirror was fixed");
                assert_eq!(level.validate(), Ok(()));

                let grid = Grid::from_level(&level);
                let active = simulate_headless(&grid, &level.external_emitters());
                assert_eq!(
                    active.len(),
                    level.receiver_count(),
                    "planted route missed a receiver in {level:?}"
                );
            }
        }
        assert!(built > 0, "no candidate survived");
    }

    #[test]
    fn candidates_keep_one_receiver_per_emitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tuning = Tuning::default();
        for _ in 0..40 {
            let params = TierParameters::roll(Difficulty::Medium, &mut rng);
            if let Ok(level) = build(&params, &tuning, &mut rng) {
                assert_eq!(level.receiver_count(), level.emitters.len());
                let mirrors = level
                    .items
                    .iter()
                    .filter(|item| item.kind.mirror_kind().is_some())
                    .count();
                assert!(
                    mirrors + level.inventory.total() as usize >= params.min_path_length,
                    "mirrors went missing"
                );
            }
        }
    }

    #[test]
    fn short_paths_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = TierParameters {
            width: 3,
            height: 3,
            emitter_count: 1,
            min_path_length: 50,
            allowed_mirrors: vec![MirrorKind::Triangle],
        };
        for _ in 0..10 {
            let rejection = build(&params, &Tuning::default(), &mut rng)
                .expect_err("a 3x3 board cannot hold fifty mirrors");
            assert!(matches!(
                rejection,
                Rejection::PathTooShort { .. } | Rejection::ReceiverBlocked(_)
            ));
        }
    }

    #[test]
    fn turning_rotations_change_the_heading() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for kind in MirrorKind::ALL {
            for incoming in Direction::ALL {
                if let Some((rotation, outgoing)) = turning_rotation(kind, incoming, &mut rng) {
                    assert_ne!(outgoing, incoming);
                    assert_eq!(
                        reflect(&Mirror::new(kind, rotation), incoming),
                        Some(outgoing)
                    );
                }
            }
        }
        assert!(
            turning_rotation(MirrorKind::Triangle, Direction::UpRight, &mut rng).is_none(),
            "triangles never turn diagonal beams"
        );
    }

    #[test]
    fn decoy_walls_only_use_free_cells() {
        let mut level = LevelDescriptor::new(4, 4);
        let size = level.grid;
        let mut claims = Claims::default();
        claims.route = (0..4).map(|x| CellCoord::new(x, 0)).collect();
        let _ = claims.pieces.insert(CellCoord::new(0, 1));
        let tuning = Tuning {
            decoy_wall_density: 1.0,
            ..Tuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        scatter_walls(&mut level, size, &tuning, &mut claims, &mut rng);

        assert!(!level.items.is_empty());
        for item in &level.items {
            assert_eq!(item.kind, ItemKind::Wall);
            assert_ne!(item.cell.row(), 0, "wall dropped on a beam route");
            assert_ne!(item.cell, CellCoord::new(0, 1), "wall dropped on a piece");
            assert_eq!(item.to_cell(), Cell::Wall);
        }
    }

    #[test]
    fn walks_cross_earlier_routes_without_landing_on_them() {
        let params = TierParameters {
            width: 7,
            height: 7,
            emitter_count: 1,
            min_path_length: 1,
            allowed_mirrors: vec![MirrorKind::Triangle],
        };
        let mut crossed = false;
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut claims = Claims::default();
            claims.route = (0..7).map(|row| CellCoord::new(3, row)).collect();
            let entry = CellCoord::new(0, 3);

            let walk = walk_path(
                GridSize::new(params.width, params.height),
                entry,
                Direction::Right,
                &params,
                &Tuning::default(),
                &mut claims,
                &mut rng,
            );

            assert_eq!(walk.mirrors.len(), 1, "nothing blocks the first stride");
            let mirror = walk.mirrors[0].cell;
            assert_ne!(mirror.column(), 3, "mirror dropped on an earlier route");
            assert!(claims.pieces.contains(&mirror));
            crossed |= mirror.column() > 3;
        }
        assert!(crossed, "no walk crossed the earlier route");
    }

    #[test]
    fn pieces_stop_a_stride_short() {
        let params = TierParameters {
            width: 7,
            height: 1,
            emitter_count: 1,
            min_path_length: 1,
            allowed_mirrors: vec![MirrorKind::Line],
        };
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut claims = Claims::default();
            let _ = claims.pieces.insert(CellCoord::new(2, 0));

            let walk = walk_path(
                GridSize::new(params.width, params.height),
                CellCoord::new(0, 0),
                Direction::Right,
                &params,
                &Tuning::default(),
                &mut claims,
                &mut rng,
            );

            assert!(walk.mirrors.iter().all(|mirror| mirror.cell.column() < 2));
        }
    }

    #[test]
    fn hard_tiers_still_yield_candidates() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let tuning = Tuning::default();
        let built = (0..400)
            .filter(|_| {
                let params = TierParameters::roll(Difficulty::Hard, &mut rng);
                build(&params, &tuning, &mut rng).is_ok()
            })
            .count();
        assert!(built > 0, "every hard candidate was rejected");
    }
}
