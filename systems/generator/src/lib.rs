#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural level generator.
//!
//! Levels are grown backwards from a known answer: beams are walked from the
//! border across the board, mirrors are planted wherever they turn, and the
//! receivers go where the walks end. Some planted mirrors stay on the board
//! as locked pieces and the rest become the player's inventory. Every
//! candidate is then handed to the solver, and only solvable levels are
//! returned. All randomness flows from a single seed, so a seed always
//! reproduces the same level.

mod candidate;
mod tiers;

pub use tiers::{Difficulty, TierParameters};

use laser_maze_core::{LevelDescriptor, MirrorKind};
use laser_maze_system_solver::{Config, Solver};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Candidates built before generation gives up.
pub const MAX_ATTEMPTS: u32 = 50;

/// Strides a single beam walk may take.
pub const MAX_WALK_STEPS: u32 = 20;

/// Longest board side the generator accepts.
pub const MAX_BOARD_SIDE: u32 = 64;

/// Knobs controlling candidate construction and verification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Candidates built before generation gives up.
    pub max_attempts: u32,
    /// Strides a single beam walk may take.
    pub max_walk_steps: u32,
    /// Probability that a planted mirror stays on the board as a locked piece.
    pub fixed_piece_probability: f64,
    /// Probability that a locked piece also refuses rotation.
    pub fixed_rotation_probability: f64,
    /// Share of the board's area spent on attempts to drop decoy walls.
    pub decoy_wall_density: f64,
    /// Boards the solver may simulate while verifying one candidate.
    pub solver_evaluation_budget: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            max_walk_steps: MAX_WALK_STEPS,
            fixed_piece_probability: 0.25,
            fixed_rotation_probability: 0.5,
            decoy_wall_density: 0.1,
            solver_evaluation_budget: 250_000,
        }
    }
}

/// Request for a generated level. Unset overrides fall back to the rolled
/// tier parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    /// Seed for every random choice.
    pub seed: u64,
    /// Tier to generate. Rolled from the seed when unset.
    pub difficulty: Option<Difficulty>,
    /// Board width override.
    pub width: Option<u32>,
    /// Board height override.
    pub height: Option<u32>,
    /// Emitter count override.
    pub emitter_count: Option<usize>,
    /// Minimum planted mirror count override.
    pub min_path_length: Option<usize>,
    /// Mirror kind override.
    pub allowed_mirrors: Option<Vec<MirrorKind>>,
    /// Construction and verification knobs.
    pub tuning: Tuning,
}

impl GeneratorConfig {
    /// Creates a request with no overrides.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            difficulty: None,
            width: None,
            height: None,
            emitter_count: None,
            min_path_length: None,
            allowed_mirrors: None,
            tuning: Tuning::default(),
        }
    }

    /// Fixes the tier instead of rolling it.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }
}

/// Errors reported by the generator.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// No candidate passed verification within the attempt limit.
    #[error("generation failed: no solvable level after {attempts} attempts")]
    Exhausted {
        /// Candidates built before giving up.
        attempts: u32,
    },
    /// The request cannot describe a playable level.
    #[error("invalid generator configuration: {reason}")]
    InvalidConfig {
        /// Description of the offending setting.
        reason: String,
    },
}

/// Level produced by the generator together with how it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedLevel {
    /// The verified level.
    pub level: LevelDescriptor,
    /// Tier the level was generated for.
    pub difficulty: Difficulty,
    /// Candidates built, including the accepted one.
    pub attempts: u32,
}

/// Seeded generator. Successive calls to [`Generator::generate`] continue the
/// same random stream.
#[derive(Debug)]
pub struct Generator {
    rng: ChaCha8Rng,
    config: GeneratorConfig,
    solver: Solver,
}

impl Generator {
    /// Creates a generator seeded from the request.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let solver = Solver::new(Config::new(
            1,
            Some(config.tuning.solver_evaluation_budget),
        ));
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            solver,
        }
    }

    /// Request the generator was built from.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds candidates until one is verified solvable.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] when the request cannot
    /// describe a playable level and [`GenerationError::Exhausted`] when no
    /// candidate passed verification within the attempt limit.
    pub fn generate(&mut self) -> Result<GeneratedLevel, GenerationError> {
        validate_tuning(&self.config.tuning)?;
        let difficulty = match self.config.difficulty {
            Some(difficulty) => difficulty,
            None => Difficulty::roll(&mut self.rng),
        };
        let max_attempts = self.config.tuning.max_attempts;

        for attempt in 1..=max_attempts {
            let params = parameters(&self.config, difficulty, &mut self.rng)?;
            log::debug!(
                "generator: attempt {attempt}: {} {}x{} with {} emitters, {} mirrors minimum",
                difficulty.label(),
                params.width,
                params.height,
                params.emitter_count,
                params.min_path_length
            );
            let built = candidate::build(&params, &self.config.tuning, &mut self.rng);
            let mut level = match built {
                Ok(level) => level,
                Err(rejection) => {
                    log::debug!("generator: attempt {attempt} rejected: {rejection}");
                    continue;
                }
            };
            level.name = Some(format!("Generated {} Level", difficulty.label()));

            let report = self.solver.solve(&level);
            if report.solvable() {
                log::info!(
                    "generator: accepted {} level after {attempt} attempts ({} solver evaluations)",
                    difficulty.label(),
                    report.evaluations()
                );
                return Ok(GeneratedLevel {
                    level,
                    difficulty,
                    attempts: attempt,
                });
            }
            log::debug!(
                "generator: attempt {attempt} unsolved after {} evaluations{}",
                report.evaluations(),
                if report.budget_exhausted() {
                    " (budget hit)"
                } else {
                    ""
                }
            );
        }

        log::warn!(
            "generator: no solvable {} level after {} attempts",
            difficulty.label(),
            max_attempts
        );
        Err(GenerationError::Exhausted {
            attempts: max_attempts,
        })
    }
}

/// Rolls the tier parameters and applies the request's overrides.
fn parameters(
    config: &GeneratorConfig,
    difficulty: Difficulty,
    rng: &mut ChaCha8Rng,
) -> Result<TierParameters, GenerationError> {
    let mut params = TierParameters::roll(difficulty, rng);
    if let Some(width) = config.width {
        params.width = width;
    }
    if let Some(height) = config.height {
        params.height = height;
    }
    if let Some(count) = config.emitter_count {
        params.emitter_count = count;
    }
    if let Some(length) = config.min_path_length {
        params.min_path_length = length;
    }
    if let Some(mirrors) = &config.allowed_mirrors {
        params.allowed_mirrors = mirrors.clone();
    }

    if params.width < 2 || params.height < 2 {
        return Err(invalid(format!(
            "board {}x{} is smaller than 2x2",
            params.width, params.height
        )));
    }
    if params.width > MAX_BOARD_SIDE || params.height > MAX_BOARD_SIDE {
        return Err(invalid(format!(
            "board {}x{} exceeds the {MAX_BOARD_SIDE} cell limit per side",
            params.width, params.height
        )));
    }
    if params.emitter_count == 0 {
        return Err(invalid("at least one emitter is required"));
    }
    if params.allowed_mirrors.is_empty() {
        return Err(invalid("no mirror kinds allowed"));
    }
    Ok(params)
}

/// Generates a single level for the request.
///
/// # Errors
///
/// See [`Generator::generate`].
pub fn generate(config: &GeneratorConfig) -> Result<GeneratedLevel, GenerationError> {
    Generator::new(config.clone()).generate()
}

fn validate_tuning(tuning: &Tuning) -> Result<(), GenerationError> {
    if tuning.max_attempts == 0 {
        return Err(invalid("max_attempts must be positive"));
    }
    let probabilities = [
        ("fixed_piece_probability", tuning.fixed_piece_probability),
        ("fixed_rotation_probability", tuning.fixed_rotation_probability),
        ("decoy_wall_density", tuning.decoy_wall_density),
    ];
    for (name, value) in probabilities {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!("{name} must lie in [0, 1], got {value}")));
        }
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> GenerationError {
    GenerationError::InvalidConfig {
        reason: reason.into(),
    }
}
