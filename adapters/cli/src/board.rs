//! ASCII rendering of a board and the beams crossing it.

use std::{collections::BTreeSet, fmt::Write as _};

use laser_maze_core::{Cell, CellCoord, Direction, ExternalEmitter, MirrorKind};
use laser_maze_world::Grid;

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::Up => '^',
        Direction::Right => '>',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::UpRight => '9',
        Direction::DownRight => '3',
        Direction::DownLeft => '1',
        Direction::UpLeft => '7',
    }
}

fn glyph(
    cell: Cell,
    coord: CellCoord,
    lit: &BTreeSet<CellCoord>,
    active: &BTreeSet<CellCoord>,
) -> [char; 2] {
    match cell {
        Cell::Empty if lit.contains(&coord) => [' ', '*'],
        Cell::Empty => [' ', '.'],
        Cell::Wall => ['#', '#'],
        Cell::Receiver if active.contains(&coord) => ['R', '*'],
        Cell::Receiver => ['R', ' '],
        Cell::Emitter { direction, .. } => ['E', arrow(direction)],
        Cell::Mirror(mirror) => {
            let kind = match mirror.kind() {
                MirrorKind::Triangle => '1',
                MirrorKind::Line => '2',
                MirrorKind::Octagon => '3',
                MirrorKind::Square => '4',
                MirrorKind::Omni => '5',
            };
            [kind, char::from(b'0' + mirror.rotation())]
        }
    }
}

/// Draws the grid framed by the ring of border cells external emitters sit on.
///
/// Each cell takes two characters: `.` empty, `*` lit, `##` wall, `R` a
/// receiver (`R*` once active), `E` plus an arrow for emitters, and the mirror
/// number followed by its rotation for mirrors. Diagonal arrows use the
/// numeric keypad digits.
pub(crate) fn render(
    grid: &Grid,
    emitters: &[ExternalEmitter],
    lit: &BTreeSet<CellCoord>,
    active: &BTreeSet<CellCoord>,
) -> String {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let mut out = String::new();
    for row in -1..=height {
        for column in -1..=width {
            let coord = CellCoord::new(column, row);
            let [first, second] = match grid.get(coord) {
                Some(cell) => glyph(cell, coord, lit, active),
                None => match emitters.iter().find(|emitter| emitter.cell() == coord) {
                    Some(emitter) => [' ', arrow(emitter.direction())],
                    None => [' ', ' '],
                },
            };
            out.push(first);
            out.push(second);
        }
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        let _ = writeln!(out);
    }
    out
}
