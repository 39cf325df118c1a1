use laser_maze_core::{ItemKind, MirrorKind};
use laser_maze_core::LevelDescriptor;
use laser_maze_system_generator::{
    generate, Difficulty, GeneratedLevel, GenerationError, GeneratorConfig, Generator, Tuning,
    MAX_BOARD_SIDE,
};
use laser_maze_system_optics::headless::simulate_headless;
use laser_maze_system_solver::{plant_solution, Config, Solver};
use laser_maze_world::{query, Grid, World};

fn easy(seed: u64) -> GeneratorConfig {
    GeneratorConfig::new(seed).with_difficulty(Difficulty::Easy)
}

/// Checks that the level is valid and that the solver's first answer lights
/// every receiver when planted.
fn assert_playable(level: &LevelDescriptor) {
    assert_eq!(level.validate(), Ok(()));
    assert!(level.receiver_count() >= 1);

    let report = Solver::new(Config::new(1, None)).solve(level);
    assert!(report.solvable(), "unsolvable level {level:?}");

    let planted = plant_solution(level, &report.solutions()[0]);
    let grid = Grid::from_level(&planted);
    let active = simulate_headless(&grid, &planted.external_emitters());
    assert_eq!(active.len(), level.receiver_count());
}

fn placed_mirror_kinds(generated: &GeneratedLevel) -> Vec<MirrorKind> {
    let level = &generated.level;
    let mut kinds: Vec<MirrorKind> = level
        .items
        .iter()
        .filter_map(|item| item.kind.mirror_kind())
        .collect();
    for kind in MirrorKind::ALL {
        for _ in 0..level.inventory.count(kind) {
            kinds.push(kind);
        }
    }
    kinds
}

#[test]
fn same_seed_replays_the_same_level() {
    let first = generate(&easy(42)).expect("easy level generated");
    let second = generate(&easy(42)).expect("easy level generated");

    assert_eq!(first, second, "generation diverged for a fixed seed");
}

#[test]
fn generated_levels_are_solvable() {
    for seed in 0..4 {
        let generated = generate(&easy(seed)).expect("easy level generated");
        let level = &generated.level;

        assert_eq!(generated.difficulty, Difficulty::Easy);
        assert!(generated.attempts >= 1 && generated.attempts <= 50);
        assert_eq!(level.name.as_deref(), Some("Generated EASY Level"));
        assert_eq!((level.grid.width, level.grid.height), (6, 6));
        assert_playable(level);
    }
}

#[test]
fn medium_levels_replay_and_solve() {
    for seed in 0..4 {
        let config = GeneratorConfig::new(seed).with_difficulty(Difficulty::Medium);
        let generated = generate(&config).expect("medium level generated");

        assert_eq!(generate(&config).as_ref(), Ok(&generated));
        assert_eq!(generated.difficulty, Difficulty::Medium);
        assert_eq!(
            generated.level.name.as_deref(),
            Some("Generated MEDIUM Level")
        );
        assert_eq!((generated.level.grid.width, generated.level.grid.height), (7, 7));
        assert!(placed_mirror_kinds(&generated).len() >= 5);
        assert_playable(&generated.level);
    }
}

#[test]
fn hard_levels_generate_for_most_seeds() {
    let mut generated_count = 0;
    for seed in 0..8 {
        let config = GeneratorConfig::new(seed).with_difficulty(Difficulty::Hard);
        let Ok(generated) = generate(&config) else {
            continue;
        };
        generated_count += 1;

        assert_eq!(generate(&config).as_ref(), Ok(&generated));
        let level = &generated.level;
        assert_eq!(level.name.as_deref(), Some("Generated HARD Level"));
        assert_eq!(level.grid.width, level.grid.height);
        assert!((8..=10).contains(&level.grid.width));
        assert!(placed_mirror_kinds(&generated).len() >= 7);
        assert_playable(level);
    }
    assert!(
        generated_count >= 4,
        "only {generated_count} of 8 hard seeds produced a level"
    );
}

#[test]
fn octagon_only_paths_generate() {
    let mut config = GeneratorConfig::new(21).with_difficulty(Difficulty::Medium);
    config.emitter_count = Some(1);
    config.min_path_length = Some(3);
    config.allowed_mirrors = Some(vec![MirrorKind::Octagon]);

    let generated = generate(&config).expect("octagon level generated");
    let kinds = placed_mirror_kinds(&generated);

    assert!(kinds.len() >= 3);
    assert!(kinds.iter().all(|&kind| kind == MirrorKind::Octagon));
    assert_playable(&generated.level);
}

#[test]
fn generated_levels_load_into_a_fresh_world() {
    let generated = generate(&easy(7)).expect("easy level generated");
    let world = World::from_level(&generated.level).expect("generated level is valid");

    assert_eq!(*query::inventory(&world), generated.level.inventory);
    assert_eq!(
        query::receivers(&world).len(),
        generated.level.receiver_count()
    );
}

#[test]
fn successive_generations_continue_the_stream() {
    let mut generator = Generator::new(easy(3));
    let first = generator.generate().expect("first level");
    let second = generator.generate().expect("second level");

    assert_eq!(first, generate(&easy(3)).expect("replayed first level"));
    assert_eq!(second.difficulty, Difficulty::Easy);
}

#[test]
fn overrides_replace_the_tier_parameters() {
    let mut config = easy(11);
    config.width = Some(8);
    config.height = Some(5);
    config.min_path_length = Some(2);
    config.allowed_mirrors = Some(vec![MirrorKind::Line]);

    let generated = generate(&config).expect("overridden level generated");
    let level = &generated.level;

    assert_eq!((level.grid.width, level.grid.height), (8, 5));
    let fixed_lines = level
        .items
        .iter()
        .filter(|item| item.kind == ItemKind::MirrorLine)
        .count() as u32;
    assert!(fixed_lines + level.inventory.count(MirrorKind::Line) >= 2);
    assert_eq!(level.inventory.count(MirrorKind::Triangle), 0);
}

#[test]
fn locking_every_piece_leaves_no_inventory() {
    let mut config = easy(5);
    config.tuning = Tuning {
        fixed_piece_probability: 1.0,
        decoy_wall_density: 0.0,
        ..Tuning::default()
    };

    let generated = generate(&config).expect("locked level generated");
    let level = &generated.level;

    assert!(level.inventory.is_empty());
    assert!(level
        .items
        .iter()
        .filter(|item| item.kind.mirror_kind().is_some())
        .all(|item| item.locked));
    assert!(!level.items.iter().any(|item| item.kind == ItemKind::Wall));
}

#[test]
fn impossible_requests_give_up_after_the_attempt_limit() {
    let mut config = easy(1);
    config.width = Some(3);
    config.height = Some(3);
    config.min_path_length = Some(40);

    assert_eq!(
        generate(&config),
        Err(GenerationError::Exhausted { attempts: 50 })
    );

    config.tuning.max_attempts = 4;
    assert_eq!(
        generate(&config),
        Err(GenerationError::Exhausted { attempts: 4 })
    );
}

#[test]
fn unplayable_requests_are_rejected_up_front() {
    let mut tiny = easy(0);
    tiny.width = Some(1);
    assert!(matches!(
        generate(&tiny),
        Err(GenerationError::InvalidConfig { .. })
    ));

    let mut no_mirrors = easy(0);
    no_mirrors.allowed_mirrors = Some(Vec::new());
    assert!(matches!(
        generate(&no_mirrors),
        Err(GenerationError::InvalidConfig { .. })
    ));

    let mut no_emitters = easy(0);
    no_emitters.emitter_count = Some(0);
    assert!(matches!(
        generate(&no_emitters),
        Err(GenerationError::InvalidConfig { .. })
    ));
}

#[test]
fn oversized_boards_are_rejected_up_front() {
    for (width, height) in [(3_000_000_000, 6), (6, u32::MAX), (MAX_BOARD_SIDE + 1, 6)] {
        let mut config = easy(0);
        config.width = Some(width);
        config.height = Some(height);
        assert!(
            matches!(generate(&config), Err(GenerationError::InvalidConfig { .. })),
            "{width}x{height} was accepted"
        );
    }

    let mut widest = easy(0);
    widest.width = Some(MAX_BOARD_SIDE);
    widest.min_path_length = Some(1);
    let generated = generate(&widest).expect("a board at the size limit generates");
    assert_eq!(generated.level.grid.width, MAX_BOARD_SIDE);
}
