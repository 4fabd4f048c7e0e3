//! Scene handlers.
//!
//! Every handler follows the same shape: ask the generator for a directive,
//! validate it (re-requesting invalid output), show the narrative, log the
//! summary, let the player pick an option, log the pick and store the next
//! scene tag on the game state.

use crate::combat::{CombatConfig, CombatResult, CombatStatus, Encounter};
use crate::console::Console;
use crate::dice::RandomSource;
use crate::directive::{
    CombatSetup, DirectiveError, GeneratorError, PuzzleDirective, SceneDirective, SceneGenerator,
};
use crate::progression::LevelGain;
use crate::world::{GameState, SceneType};

/// HP restored by resting at camp.
pub const CAMP_HEAL: i32 = 50;

/// Experience for solving a puzzle.
pub const PUZZLE_EXPERIENCE: i64 = 100;

/// Times a generator is asked before its output is given up on.
pub const GENERATOR_ATTEMPTS: u32 = 3;

/// Label of the extra narration option that ends the game.
pub const END_ADVENTURE: &str = "End the adventure";

/// Numbers the scene handlers work with.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRules {
    pub combat: CombatConfig,
    pub puzzle_experience: i64,
    pub camp_heal: i32,
    pub generator_attempts: u32,
}

impl Default for SceneRules {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            puzzle_experience: PUZZLE_EXPERIENCE,
            camp_heal: CAMP_HEAL,
            generator_attempts: GENERATOR_ATTEMPTS,
        }
    }
}

/// Everything a handler touches while a scene runs.
pub struct SceneContext<'a> {
    pub state: &'a mut GameState,
    pub generator: &'a mut dyn SceneGenerator,
    pub console: &'a mut dyn Console,
    pub rng: &'a mut dyn RandomSource,
    pub rules: &'a SceneRules,
}

/// What a finished scene reports back to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOutcome {
    /// The scene that ran.
    pub scene: SceneType,
    pub level_gain: LevelGain,
    pub combat: Option<CombatResult>,
}

impl SceneOutcome {
    fn new(scene: SceneType) -> Self {
        Self {
            scene,
            level_gain: LevelGain::default(),
            combat: None,
        }
    }
}

/// Run the handler for `scene`.
pub async fn run_scene(scene: SceneType, ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    tracing::info!(scene = %scene, location = %ctx.state.world.location, "running scene");
    match scene {
        SceneType::Narration => narration(ctx).await,
        SceneType::Exploration => exploration(ctx).await,
        SceneType::Dialogue => dialogue(ctx).await,
        SceneType::Camp => camp(ctx).await,
        SceneType::Puzzle => puzzle(ctx).await,
        SceneType::Combat => combat(ctx).await,
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn narration(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    if let Some(lore) = ctx.generator.lore(ctx.state).await? {
        ctx.state.lore = Some(lore);
    }

    let directive = fetch_scene(ctx, SceneType::Narration).await?;
    ctx.console.show(&directive.narrative);
    apply_world_changes(ctx.state, &directive);
    ctx.state.record(format!("dungeon master: {}", directive.summary));

    let mut options = directive.options.clone();
    options.push(END_ADVENTURE.to_string());
    let choice = ctx.console.choose("Your action", &options);

    if choice == options.len() {
        tracing::info!("player ended the adventure");
        ctx.state.record("player action: end the adventure");
        ctx.state.exit = true;
    } else {
        take_choice(ctx, SceneType::Narration, &directive, choice, "player action");
    }
    Ok(SceneOutcome::new(SceneType::Narration))
}

pub async fn exploration(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    let directive = fetch_scene(ctx, SceneType::Exploration).await?;
    ctx.console.show(&directive.narrative);
    if !directive.discoveries.is_empty() {
        let mut text = String::from("You notice the following discoveries:");
        for discovery in &directive.discoveries {
            text.push_str(&format!("\n- {discovery}"));
        }
        ctx.console.show(&text);
    }
    apply_world_changes(ctx.state, &directive);

    ctx.state.record(format!("exploration: {}", directive.summary));
    if !directive.discoveries.is_empty() {
        ctx.state
            .record(format!("discoveries: {}", directive.discoveries.join(", ")));
    }

    let choice = ctx.console.choose("Your action", &directive.options);
    take_choice(ctx, SceneType::Exploration, &directive, choice, "player action");
    Ok(SceneOutcome::new(SceneType::Exploration))
}

pub async fn dialogue(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    let directive = fetch_scene(ctx, SceneType::Dialogue).await?;
    let speaker = directive.speaker.clone().unwrap_or_else(|| "Stranger".to_string());
    ctx.console.show(&format!("{speaker}: {}", directive.narrative));
    apply_world_changes(ctx.state, &directive);
    ctx.state.record(format!("npc {speaker}: {}", directive.summary));

    let choice = ctx.console.choose("Your reply", &directive.options);
    take_choice(ctx, SceneType::Dialogue, &directive, choice, "player reply");
    Ok(SceneOutcome::new(SceneType::Dialogue))
}

pub async fn camp(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    let directive = fetch_scene(ctx, SceneType::Camp).await?;
    ctx.console.show(&directive.narrative);

    let restored = ctx.state.player.apply_heal(ctx.rules.camp_heal);
    ctx.console.show(&format!("You recover {restored} HP."));
    tracing::debug!(restored, hp = ctx.state.player.hp(), "rested at camp");

    apply_world_changes(ctx.state, &directive);
    ctx.state.record(format!("dungeon master: {}", directive.summary));

    let choice = ctx.console.choose("Your action", &directive.options);
    take_choice(ctx, SceneType::Camp, &directive, choice, "player action");
    Ok(SceneOutcome::new(SceneType::Camp))
}

pub async fn puzzle(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    let directive = fetch_puzzle(ctx).await?;
    ctx.console.show(&directive.narrative);
    ctx.console.show(&directive.prompt);
    ctx.state.record(format!("dungeon master: {}", directive.summary));
    ctx.state.record(format!("puzzle: {}", directive.prompt));

    let labels: Vec<String> = directive.options.iter().map(|o| o.text.clone()).collect();
    let choice = ctx.console.choose("Your answer", &labels);
    let mut outcome = SceneOutcome::new(SceneType::Puzzle);
    let Some(answer) = choice.checked_sub(1).and_then(|i| directive.options.get(i)) else {
        tracing::warn!(choice, "console returned an out-of-range puzzle answer");
        ctx.state.set_scene(SceneType::Narration);
        return Ok(outcome);
    };
    ctx.state.record(format!("player action: {}", answer.text));

    if answer.correct {
        ctx.console.show("You solved the puzzle!");
        ctx.state.record("player solved the puzzle");
        match ctx.state.player.gain_experience(ctx.rules.puzzle_experience) {
            Ok(gain) => outcome.level_gain = gain,
            Err(e) => tracing::warn!(error = %e, "puzzle experience rejected"),
        }
    } else {
        ctx.console.show("Your attempt fails.");
        ctx.state.record("player failed to solve the puzzle");
    }

    set_next_scene(ctx.state, SceneType::Puzzle, &answer.next_scene_type);
    Ok(outcome)
}

pub async fn combat(ctx: &mut SceneContext<'_>) -> Result<SceneOutcome, GeneratorError> {
    let setup = fetch_combat_setup(ctx).await?;
    ctx.console.show(&format!("{} appears!", setup.enemy.name));
    ctx.console.show(&setup.narrative);
    if !setup.enemy.description.is_empty() {
        ctx.console.show(&setup.enemy.description);
    }

    let mut encounter = Encounter::new(setup.enemy, setup.loot, ctx.rules.combat.clone());
    let result = encounter.run(&mut ctx.state.player, &mut *ctx.console, &mut *ctx.rng);

    match result.status {
        CombatStatus::PlayerVictory => {
            ctx.state.record(format!("Player defeated {}", result.enemy));
            if !result.loot.is_empty() {
                let names: Vec<&str> = result.loot.iter().map(|item| item.name()).collect();
                ctx.state
                    .record(format!("Loot obtained: [{}]", names.join(", ")));
            }
        }
        CombatStatus::PlayerDefeat => {
            ctx.state
                .record(format!("Player was defeated by {}", result.enemy));
        }
        CombatStatus::PlayerFled => ctx.state.record("Player fled from combat"),
        CombatStatus::Ongoing => {}
    }

    ctx.state.set_scene(SceneType::Narration);
    let mut outcome = SceneOutcome::new(SceneType::Combat);
    outcome.level_gain = result.level_gain.clone();
    outcome.combat = Some(result);
    Ok(outcome)
}

// ============================================================================
// Helpers
// ============================================================================

/// Log the player's pick and move to the scene it leads to.
fn take_choice(
    ctx: &mut SceneContext<'_>,
    origin: SceneType,
    directive: &SceneDirective,
    choice: usize,
    label: &str,
) {
    match directive.choice(choice) {
        Some((option, next)) => {
            ctx.state.record(format!("{label}: {option}"));
            set_next_scene(ctx.state, origin, next);
        }
        None => {
            tracing::warn!(choice, options = directive.options.len(), "console returned an out-of-range choice");
            ctx.state.set_scene(SceneType::Narration);
        }
    }
}

/// Store the raw tag. Unknown tags are left for the router; known tags
/// outside the origin's allowed set are accepted with a warning.
fn set_next_scene(state: &mut GameState, origin: SceneType, tag: &str) {
    if let Some(next) = SceneType::from_tag(tag) {
        if !origin.allows(next) {
            tracing::warn!(from = %origin, to = %next, "generator picked a scene outside the allowed set");
        }
    }
    state.scene_type = tag.trim().to_string();
}

fn apply_world_changes(state: &mut GameState, directive: &SceneDirective) {
    if let Some(location) = &directive.location {
        tracing::info!(from = %state.world.location, to = %location, "location changed");
        state.world.location = location.clone();
    }
    if let Some(weather) = &directive.weather {
        state.world.weather = weather.clone();
    }
    if let Some(quest) = &directive.quest {
        state.world.quest = quest.clone();
    }
}

/// Decide whether to ask again after invalid output.
fn retry_or_reject(what: &str, attempt: u32, attempts: u32, error: DirectiveError) -> Result<(), GeneratorError> {
    if attempt < attempts {
        tracing::warn!(what, attempt, error = %error, "invalid generator output, asking again");
        Ok(())
    } else {
        Err(GeneratorError::Rejected {
            attempts,
            source: error,
        })
    }
}

async fn fetch_scene(ctx: &mut SceneContext<'_>, kind: SceneType) -> Result<SceneDirective, GeneratorError> {
    let attempts = ctx.rules.generator_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let directive = ctx.generator.scene(kind, ctx.state).await?;
        match directive.validate() {
            Ok(()) => return Ok(directive),
            Err(e) => retry_or_reject(kind.as_str(), attempt, attempts, e)?,
        }
    }
}

async fn fetch_puzzle(ctx: &mut SceneContext<'_>) -> Result<PuzzleDirective, GeneratorError> {
    let attempts = ctx.rules.generator_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let directive = ctx.generator.puzzle(ctx.state).await?;
        match directive.validate() {
            Ok(()) => return Ok(directive),
            Err(e) => retry_or_reject("puzzle", attempt, attempts, e)?,
        }
    }
}

async fn fetch_combat_setup(ctx: &mut SceneContext<'_>) -> Result<CombatSetup, GeneratorError> {
    let attempts = ctx.rules.generator_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let setup = ctx.generator.combat_setup(ctx.state).await?;
        match setup.validate() {
            Ok(()) => return Ok(setup),
            Err(e) => retry_or_reject("combat setup", attempt, attempts, e)?,
        }
    }
}
