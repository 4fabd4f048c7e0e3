//! World state, the bounded history log and the full game state.

use crate::character::Character;
use crate::items::find_item;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Default number of history entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

pub const STARTING_LOCATION: &str = "Emerald Forest";
pub const STARTING_QUEST: &str = "Find the lost relic";
pub const STARTING_WEATHER: &str = "clear";
pub const OPENING_ENTRY: &str = "The adventure begins!";

// ============================================================================
// World
// ============================================================================

/// Where the player is and what they are after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub location: String,
    pub quest: String,
    #[serde(default = "default_weather")]
    pub weather: String,
}

fn default_weather() -> String {
    STARTING_WEATHER.to_string()
}

impl Default for World {
    fn default() -> Self {
        Self {
            location: STARTING_LOCATION.to_string(),
            quest: STARTING_QUEST.to_string(),
            weather: default_weather(),
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// Fixed-capacity FIFO of narration and event lines.
///
/// Pushing past capacity evicts the oldest entry. Serialized as a plain
/// ordered sequence, oldest first; the capacity is a runtime setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    /// A zero capacity is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        self.evict();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&str> {
        self.entries.iter().rev().take(limit).map(String::as_str).collect()
    }

    /// Drop up to `count` of the oldest entries; returns how many went.
    pub fn remove_oldest(&mut self, count: usize) -> usize {
        let count = count.min(self.entries.len());
        self.entries.drain(..count);
        count
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<String>::deserialize(deserializer)?;
        let mut history = History::with_capacity(DEFAULT_HISTORY_CAPACITY.max(entries.len()));
        for entry in entries {
            history.push(entry);
        }
        Ok(history)
    }
}

// ============================================================================
// Scene types
// ============================================================================

/// The scene kinds the router can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneType {
    #[default]
    Narration,
    Exploration,
    Combat,
    Dialogue,
    Camp,
    Puzzle,
}

impl SceneType {
    pub fn all() -> [SceneType; 6] {
        use SceneType::*;
        [Narration, Exploration, Combat, Dialogue, Camp, Puzzle]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneType::Narration => "narration",
            SceneType::Exploration => "exploration",
            SceneType::Combat => "combat",
            SceneType::Dialogue => "dialogue",
            SceneType::Camp => "camp",
            SceneType::Puzzle => "puzzle",
        }
    }

    /// Parse a lowercase scene tag; surrounding whitespace and case are ignored.
    pub fn from_tag(tag: &str) -> Option<SceneType> {
        let tag = tag.trim().to_ascii_lowercase();
        SceneType::all().into_iter().find(|s| s.as_str() == tag)
    }

    /// Scenes a handler for this scene may hand over to.
    pub fn allowed_next(&self) -> &'static [SceneType] {
        use SceneType::*;
        match self {
            Narration => &[Narration, Exploration, Combat, Dialogue, Camp],
            Exploration => &[Narration, Exploration, Combat, Dialogue],
            Dialogue => &[Narration, Combat, Dialogue, Puzzle],
            Camp => &[Narration, Dialogue],
            Puzzle => &[Narration, Combat, Dialogue],
            Combat => &[Narration],
        }
    }

    pub fn allows(&self, next: SceneType) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Game state
// ============================================================================

/// Everything a session needs to resume play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,
    pub player: Character,
    #[serde(default)]
    pub world: World,
    #[serde(default)]
    pub history: History,
    /// Raw scene tag; the router decides what an unknown value means.
    #[serde(default = "default_scene_tag")]
    pub scene_type: String,
    #[serde(default)]
    pub lore: Option<String>,
    #[serde(default)]
    pub exit: bool,
}

fn default_scene_tag() -> String {
    SceneType::Narration.as_str().to_string()
}

impl GameState {
    /// A brand new adventure for `player`.
    pub fn new(player: Character) -> Self {
        let mut history = History::default();
        history.push(OPENING_ENTRY);
        Self {
            session_id: Uuid::new_v4(),
            player,
            world: World::default(),
            history,
            scene_type: default_scene_tag(),
            lore: None,
            exit: false,
        }
    }

    pub fn set_scene(&mut self, scene: SceneType) {
        self.scene_type = scene.as_str().to_string();
    }

    /// The current scene, if the stored tag is recognized.
    pub fn scene(&self) -> Option<SceneType> {
        SceneType::from_tag(&self.scene_type)
    }

    pub fn record(&mut self, entry: impl Into<String>) {
        self.history.push(entry);
    }
}

/// The default opening state: a fresh hero carrying a knife.
pub fn initial_state(mut player: Character) -> GameState {
    if let Some(knife) = find_item("Knife") {
        player.add_item(knife);
    }
    GameState::new(player)
}
