//! Test doubles for the game engine.
//!
//! - [`ScriptedRandom`] replays forced dice values
//! - [`ScriptedConsole`] answers prompts from a queue and records output
//! - [`ScriptedGenerator`] returns queued directives instead of calling a
//!   text service
//! - [`MemoryStore`] keeps saves in memory
//!
//! The generator also backs the front-end's `--script` mode, so this module
//! is not gated behind `cfg(test)`.

use crate::character::{Character, CharacterClass, Origin, Race};
use crate::console::Console;
use crate::dice::RandomSource;
use crate::directive::{
    CombatSetup, GeneratorError, PuzzleDirective, SceneDirective, SceneGenerator,
};
use crate::persist::{PersistError, Persistence, SaveHandle};
use crate::world::{GameState, SceneType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A ready-made level 1 fighter.
pub fn sample_hero() -> Character {
    Character::new("Aria", CharacterClass::Fighter, Race::Human, Origin::Soldier)
}

// ============================================================================
// Random source
// ============================================================================

/// Replays queued values.
///
/// Each draw takes the next value, clamped into the requested range. Once
/// the queue is empty every draw returns the low end of the range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<i32>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn push(&mut self, value: i32) {
        self.values.push_back(value);
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        match self.values.pop_front() {
            Some(value) => value.clamp(low, high),
            None => low,
        }
    }
}

// ============================================================================
// Console
// ============================================================================

/// Answers choices and questions from queues and records everything shown.
///
/// Out-of-range choices are skipped the way a terminal re-prompts. When the
/// choice queue runs dry the last option is picked; when the answer queue
/// runs dry the answer is "Player".
#[derive(Debug, Clone, Default)]
pub struct ScriptedConsole {
    choices: VecDeque<usize>,
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(choices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_answers<S: Into<String>>(mut self, answers: impl IntoIterator<Item = S>) -> Self {
        self.answers.extend(answers.into_iter().map(Into::into));
        self
    }

    /// Everything shown so far, one entry per `show` call.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn remaining_choices(&self) -> usize {
        self.choices.len()
    }
}

impl Console for ScriptedConsole {
    fn show(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn choose(&mut self, _prompt: &str, options: &[String]) -> usize {
        while let Some(choice) = self.choices.pop_front() {
            if (1..=options.len()).contains(&choice) {
                return choice;
            }
            self.transcript.push("Invalid choice. Try again.".to_string());
        }
        options.len().max(1)
    }

    fn ask(&mut self, _prompt: &str) -> String {
        self.answers.pop_front().unwrap_or_else(|| "Player".to_string())
    }
}

// ============================================================================
// Generator
// ============================================================================

/// A fixed adventure: queued directives served in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdventureScript {
    #[serde(default)]
    pub scenes: Vec<SceneDirective>,
    #[serde(default)]
    pub puzzles: Vec<PuzzleDirective>,
    #[serde(default)]
    pub combats: Vec<CombatSetup>,
    #[serde(default)]
    pub lore: Vec<String>,
}

/// Serves directives from an [`AdventureScript`].
///
/// Narration, exploration, dialogue and camp share one scene queue.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    scenes: VecDeque<SceneDirective>,
    puzzles: VecDeque<PuzzleDirective>,
    combats: VecDeque<CombatSetup>,
    lore: VecDeque<String>,
    requests: Vec<SceneType>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: AdventureScript) -> Self {
        Self {
            scenes: script.scenes.into(),
            puzzles: script.puzzles.into(),
            combats: script.combats.into(),
            lore: script.lore.into(),
            requests: Vec::new(),
        }
    }

    pub fn with_scene(mut self, scene: SceneDirective) -> Self {
        self.scenes.push_back(scene);
        self
    }

    pub fn with_puzzle(mut self, puzzle: PuzzleDirective) -> Self {
        self.puzzles.push_back(puzzle);
        self
    }

    pub fn with_combat(mut self, setup: CombatSetup) -> Self {
        self.combats.push_back(setup);
        self
    }

    pub fn with_lore(mut self, lore: impl Into<String>) -> Self {
        self.lore.push_back(lore.into());
        self
    }

    /// Scene kinds requested so far, in order.
    pub fn requests(&self) -> &[SceneType] {
        &self.requests
    }

    pub fn is_exhausted(&self) -> bool {
        self.scenes.is_empty() && self.puzzles.is_empty() && self.combats.is_empty()
    }
}

#[async_trait]
impl SceneGenerator for ScriptedGenerator {
    async fn scene(&mut self, kind: SceneType, _state: &GameState) -> Result<SceneDirective, GeneratorError> {
        self.requests.push(kind);
        self.scenes
            .pop_front()
            .ok_or_else(|| GeneratorError::Exhausted(format!("{kind} scenes")))
    }

    async fn puzzle(&mut self, _state: &GameState) -> Result<PuzzleDirective, GeneratorError> {
        self.requests.push(SceneType::Puzzle);
        self.puzzles
            .pop_front()
            .ok_or_else(|| GeneratorError::Exhausted("puzzles".to_string()))
    }

    async fn combat_setup(&mut self, _state: &GameState) -> Result<CombatSetup, GeneratorError> {
        self.requests.push(SceneType::Combat);
        self.combats
            .pop_front()
            .ok_or_else(|| GeneratorError::Exhausted("combat setups".to_string()))
    }

    async fn lore(&mut self, _state: &GameState) -> Result<Option<String>, GeneratorError> {
        Ok(self.lore.pop_front())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Keeps serialized saves in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: Mutex<Vec<(SaveHandle, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.saves.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Store raw JSON as the newest save, e.g. to simulate corruption.
    pub async fn insert_raw(&self, json: impl Into<String>) -> SaveHandle {
        let mut saves = self.saves.lock().await;
        let handle = SaveHandle(format!("memory-{}", saves.len()));
        saves.push((handle.clone(), json.into()));
        handle
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn save(&self, state: &GameState) -> Result<SaveHandle, PersistError> {
        let json = serde_json::to_string(state)?;
        Ok(self.insert_raw(json).await)
    }

    async fn load(&self, handle: Option<&SaveHandle>) -> Result<Option<GameState>, PersistError> {
        let saves = self.saves.lock().await;
        let entry = match handle {
            Some(handle) => saves.iter().find(|(h, _)| h == handle),
            None => saves.last(),
        };
        Ok(entry.and_then(|(_, json)| serde_json::from_str(json).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::initial_state;

    #[test]
    fn test_scripted_random_clamps_and_falls_back() {
        let mut rng = ScriptedRandom::new([50, -3]);
        assert_eq!(rng.range(1, 20), 20);
        assert_eq!(rng.range(1, 20), 1);
        assert_eq!(rng.range(4, 9), 4);
        assert_eq!(rng.percent(), 1);
    }

    #[test]
    fn test_scripted_console_skips_invalid_choices() {
        let options = vec!["a".to_string(), "b".to_string()];
        let mut console = ScriptedConsole::new([0, 7, 2]);
        assert_eq!(console.choose("Pick", &options), 2);
        assert_eq!(console.transcript().len(), 2);
        // Exhausted: last option
        assert_eq!(console.choose("Pick", &options), 2);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load(None).await.unwrap().is_none());

        let state = initial_state(sample_hero());
        let handle = store.save(&state).await.unwrap();
        assert_eq!(store.load(Some(&handle)).await.unwrap(), Some(state.clone()));

        store.insert_raw("{ corrupted").await;
        assert!(store.load(None).await.unwrap().is_none());
        assert_eq!(store.len().await, 2);
    }
}
