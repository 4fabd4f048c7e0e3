//! GameSession - the scene loop that ties the engine together.
//!
//! A session owns the game state and is handed every collaborator it
//! needs: the scene generator, the persistence service, the console and the
//! random source. Each step routes to a scene, runs its handler and writes
//! a save.

use crate::character::Character;
use crate::character_builder::{create_character, BuilderError};
use crate::combat::{CombatConfig, VICTORY_EXPERIENCE};
use crate::console::Console;
use crate::dice::{GameRng, RandomSource};
use crate::directive::{GeneratorError, SceneGenerator};
use crate::persist::{PersistError, Persistence, SaveHandle, SaveManager, DEFAULT_SAVE_DIR, DEFAULT_SAVE_PREFIX};
use crate::progression::{ExperienceCurve, Level, LevelGain, LevelUpListener, LevelUpListeners, LogLevelUp};
use crate::router::{route_state, Route, RouterError, UnknownScenePolicy};
use crate::scenes::{run_scene, SceneContext, SceneOutcome, SceneRules, CAMP_HEAL, GENERATOR_ATTEMPTS, PUZZLE_EXPERIENCE};
use crate::world::{initial_state, GameState, DEFAULT_HISTORY_CAPACITY};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Routing error: {0}")]
    Router(#[from] RouterError),

    #[error("Character creation failed: {0}")]
    Builder(#[from] BuilderError),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory save files are written to.
    pub save_dir: PathBuf,

    /// File name prefix for save files.
    pub save_prefix: String,

    /// Number of history entries kept.
    pub history_capacity: usize,

    /// What the router does with an unrecognized scene tag.
    pub unknown_scenes: UnknownScenePolicy,

    pub victory_experience: i64,
    pub puzzle_experience: i64,
    pub camp_heal: i32,

    /// Whether drinking a potion in combat ends the player's turn.
    pub potion_consumes_round: bool,

    /// Times invalid generator output is requested before giving up.
    pub generator_attempts: u32,

    /// Seed for deterministic replays.
    pub seed: Option<u64>,

    /// Experience curve for new characters.
    pub experience_curve: ExperienceCurve,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl SessionConfig {
    /// Create a config that saves into `save_dir`.
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            save_prefix: DEFAULT_SAVE_PREFIX.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            unknown_scenes: UnknownScenePolicy::default(),
            victory_experience: VICTORY_EXPERIENCE,
            puzzle_experience: PUZZLE_EXPERIENCE,
            camp_heal: CAMP_HEAL,
            potion_consumes_round: true,
            generator_attempts: GENERATOR_ATTEMPTS,
            seed: None,
            experience_curve: ExperienceCurve::default(),
        }
    }

    /// Defaults overlaid with `NEURONS_*` environment variables, after
    /// loading an optional `.env` file.
    pub fn from_env() -> Result<Self, SessionError> {
        dotenvy::dotenv().ok();
        Self::default().apply_env(|var| std::env::var(var).ok())
    }

    /// Overlay settings from a variable lookup.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        if let Some(dir) = lookup("NEURONS_SAVE_DIR") {
            self.save_dir = dir.into();
        }
        if let Some(value) = lookup("NEURONS_HISTORY") {
            self.history_capacity = match value.trim().parse() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("NEURONS_HISTORY", value)),
            };
        }
        if let Some(value) = lookup("NEURONS_SEED") {
            let seed = value.trim().parse().map_err(|_| invalid("NEURONS_SEED", value.clone()))?;
            self.seed = Some(seed);
        }
        if let Some(value) = lookup("NEURONS_STRICT_SCENES") {
            let strict = parse_flag(&value).ok_or_else(|| invalid("NEURONS_STRICT_SCENES", value.clone()))?;
            self.unknown_scenes = if strict {
                UnknownScenePolicy::Reject
            } else {
                UnknownScenePolicy::FallbackToNarration
            };
        }
        Ok(self)
    }

    pub fn with_save_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.save_prefix = prefix.into();
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_unknown_scenes(mut self, policy: UnknownScenePolicy) -> Self {
        self.unknown_scenes = policy;
        self
    }

    pub fn with_victory_experience(mut self, experience: i64) -> Self {
        self.victory_experience = experience;
        self
    }

    pub fn with_puzzle_experience(mut self, experience: i64) -> Self {
        self.puzzle_experience = experience;
        self
    }

    pub fn with_camp_heal(mut self, heal: i32) -> Self {
        self.camp_heal = heal;
        self
    }

    pub fn with_potion_consumes_round(mut self, consumes: bool) -> Self {
        self.potion_consumes_round = consumes;
        self
    }

    pub fn with_generator_attempts(mut self, attempts: u32) -> Self {
        self.generator_attempts = attempts;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_experience_curve(mut self, curve: ExperienceCurve) -> Self {
        self.experience_curve = curve;
        self
    }

    /// A JSON save manager for the configured directory and prefix.
    pub fn save_manager(&self) -> SaveManager {
        SaveManager::new(&self.save_dir).with_prefix(&self.save_prefix)
    }

    pub fn scene_rules(&self) -> SceneRules {
        SceneRules {
            combat: CombatConfig {
                victory_experience: self.victory_experience,
                potion_consumes_round: self.potion_consumes_round,
            },
            puzzle_experience: self.puzzle_experience,
            camp_heal: self.camp_heal,
            generator_attempts: self.generator_attempts,
        }
    }

    fn rng(&self) -> GameRng {
        match self.seed {
            Some(seed) => GameRng::seeded(seed),
            None => GameRng::from_entropy(),
        }
    }
}

fn invalid(var: &'static str, value: String) -> SessionError {
    SessionError::InvalidEnv { var, value }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Session
// ============================================================================

/// A running adventure.
pub struct GameSession<G, P, C> {
    state: GameState,
    generator: G,
    persistence: P,
    console: C,
    rng: Box<dyn RandomSource>,
    listeners: LevelUpListeners,
    rules: SceneRules,
    config: SessionConfig,
    last_save: Option<SaveHandle>,
}

impl<G, P, C> GameSession<G, P, C>
where
    G: SceneGenerator,
    P: Persistence,
    C: Console,
{
    /// Start a new adventure for `player`.
    pub fn new_game(config: SessionConfig, mut player: Character, generator: G, persistence: P, console: C) -> Self {
        if player.level.level() == 1 && player.level.experience() == 0 {
            player.level = Level::new(config.experience_curve);
        }
        let state = initial_state(player);
        tracing::info!(session = %state.session_id, player = %state.player.name, "new adventure");
        Self::with_state(config, state, generator, persistence, console)
    }

    /// Continue from an existing state.
    pub fn with_state(config: SessionConfig, mut state: GameState, generator: G, persistence: P, console: C) -> Self {
        state.history.set_capacity(config.history_capacity);
        let mut listeners = LevelUpListeners::new();
        listeners.register(LogLevelUp);
        Self {
            state,
            generator,
            persistence,
            console,
            rng: Box::new(config.rng()),
            listeners,
            rules: config.scene_rules(),
            config,
            last_save: None,
        }
    }

    /// Load the newest save, or create a character and start fresh when
    /// there is no usable save.
    pub async fn resume_or_new(
        config: SessionConfig,
        generator: G,
        persistence: P,
        mut console: C,
    ) -> Result<Self, SessionError> {
        match persistence.load(None).await? {
            Some(mut state) => {
                tracing::info!(session = %state.session_id, player = %state.player.name, "resuming adventure");
                state.exit = false;
                console.show(&format!(
                    "Welcome back, {}. {}",
                    state.player.name,
                    state.player.describe()
                ));
                Ok(Self::with_state(config, state, generator, persistence, console))
            }
            None => {
                let player = create_character(&mut console)?;
                Ok(Self::new_game(config, player, generator, persistence, console))
            }
        }
    }

    /// Replace the random source, e.g. with a scripted one.
    pub fn with_rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn register_listener(&mut self, listener: impl LevelUpListener + 'static) {
        self.listeners.register(listener);
    }

    /// Run one scene and save. Returns `None` once the adventure is over.
    pub async fn step(&mut self) -> Result<Option<SceneOutcome>, SessionError> {
        let scene = match route_state(&self.state, self.config.unknown_scenes)? {
            Route::Terminal => return Ok(None),
            Route::Scene(scene) => scene,
        };

        let outcome = {
            let mut ctx = SceneContext {
                state: &mut self.state,
                generator: &mut self.generator,
                console: &mut self.console,
                rng: &mut *self.rng,
                rules: &self.rules,
            };
            run_scene(scene, &mut ctx).await?
        };

        self.announce(&outcome.level_gain);
        self.last_save = Some(self.persistence.save(&self.state).await?);
        Ok(Some(outcome))
    }

    /// Play until the player ends the adventure.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let mut scenes = 0usize;
        while self.step().await?.is_some() {
            scenes += 1;
        }
        tracing::info!(scenes, "adventure finished");
        self.console.show("Farewell, adventurer.");
        Ok(())
    }

    fn announce(&mut self, gain: &LevelGain) {
        for level in &gain.levels {
            self.console.show(&format!("Level up! You reached level {level}!"));
        }
        gain.notify(&mut self.listeners);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct changes bypass the scene handlers.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn listeners(&self) -> &LevelUpListeners {
        &self.listeners
    }

    /// Handle of the save written by the last completed step.
    pub fn last_save(&self) -> Option<&SaveHandle> {
        self.last_save.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.exit
    }
}
