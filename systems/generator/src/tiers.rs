//! Difficulty tiers and the board parameters they roll.

use laser_maze_core::MirrorKind;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Named difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Small board, one beam, triangles only.
    Easy,
    /// Medium board, occasionally two beams, triangles and lines.
    Medium,
    /// Large board, often two beams, triangles, lines and octagons.
    Hard,
}

impl Difficulty {
    /// Every tier from easiest to hardest.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Upper-case label used in generated level names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }

    /// Picks a tier when the caller did not ask for one: hard 30% of the
    /// time, otherwise medium or easy with equal odds.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.3) {
            Self::Hard
        } else if rng.gen_bool(0.5) {
            Self::Medium
        } else {
            Self::Easy
        }
    }
}

/// Board parameters for one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierParameters {
    /// Columns of the board.
    pub width: u32,
    /// Rows of the board.
    pub height: u32,
    /// Number of external emitters, each with its own planted path.
    pub emitter_count: usize,
    /// Minimum number of mirrors across all planted paths.
    pub min_path_length: usize,
    /// Mirror kinds the random walk may use.
    pub allowed_mirrors: Vec<MirrorKind>,
}

impl TierParameters {
    /// Rolls the parameters of a tier. Emitter count and the hard board size
    /// are random.
    pub fn roll<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                width: 6,
                height: 6,
                emitter_count: 1,
                min_path_length: 4,
                allowed_mirrors: vec![MirrorKind::Triangle],
            },
            Difficulty::Medium => Self {
                width: 7,
                height: 7,
                emitter_count: if rng.gen_bool(0.3) { 2 } else { 1 },
                min_path_length: 5,
                allowed_mirrors: vec![MirrorKind::Triangle, MirrorKind::Line],
            },
            Difficulty::Hard => {
                let side = rng.gen_range(8..=10);
                Self {
                    width: side,
                    height: side,
                    emitter_count: if rng.gen_bool(0.5) { 2 } else { 1 },
                    min_path_length: 7,
                    allowed_mirrors: vec![
                        MirrorKind::Triangle,
                        MirrorKind::Line,
                        MirrorKind::Octagon,
                    ],
                }
            }
        }
    }
}
