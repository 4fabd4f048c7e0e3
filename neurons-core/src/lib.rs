//! Game engine for Neurons & Dragons, a narrated text adventure.
//!
//! This crate provides:
//! - Dice, character progression, items and inventory
//! - Turn-based combat with enemy special attacks and cooldowns
//! - A scene graph (narration, exploration, dialogue, camp, puzzle, combat)
//!   driven by structured directives from an external text generator
//! - Save/load of the full game state
//!
//! # Quick Start
//!
//! ```ignore
//! use neurons_core::{GameSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env()?;
//!     let saves = config.save_manager();
//!
//!     let mut session = GameSession::resume_or_new(config, my_generator, saves, my_console).await?;
//!     session.run().await?;
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod character_builder;
pub mod combat;
pub mod console;
pub mod dice;
pub mod directive;
pub mod enemy;
pub mod inventory;
pub mod items;
pub mod persist;
pub mod progression;
pub mod router;
pub mod scenes;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use character::{Character, CharacterClass, Origin, Race};
pub use character_builder::{create_character, BuilderError, CharacterBuilder};
pub use combat::{CombatAction, CombatConfig, CombatResult, CombatStatus, Encounter};
pub use console::Console;
pub use dice::{DiceError, DiceExpression, GameRng, RandomSource};
pub use directive::{CombatSetup, GeneratorError, PuzzleDirective, SceneDirective, SceneGenerator};
pub use enemy::{Enemy, SpecialAttack};
pub use items::Item;
pub use persist::{PersistError, Persistence, SaveHandle, SaveManager};
pub use progression::{ExperienceCurve, LevelUpListener};
pub use router::{Route, UnknownScenePolicy};
pub use session::{GameSession, SessionConfig, SessionError};
pub use testing::{AdventureScript, MemoryStore, ScriptedConsole, ScriptedGenerator, ScriptedRandom};
pub use world::{GameState, SceneType};
