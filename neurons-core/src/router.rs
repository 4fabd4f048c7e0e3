//! Scene routing.
//!
//! The router only decides which handler runs next. It does not check that
//! a handler picked a scene from its allowed set; handlers do that.

use crate::world::{GameState, SceneType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with a scene tag the router does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownScenePolicy {
    /// Log a warning and run narration instead.
    #[default]
    FallbackToNarration,
    /// Stop with [`RouterError::UnknownScene`].
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("Unknown scene type '{0}'")]
    UnknownScene(String),
}

/// The next node of the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Terminal,
    Scene(SceneType),
}

/// Pick the next node from a raw scene tag and the exit flag.
pub fn route(tag: &str, exit: bool, policy: UnknownScenePolicy) -> Result<Route, RouterError> {
    if exit {
        return Ok(Route::Terminal);
    }
    match SceneType::from_tag(tag) {
        Some(scene) => Ok(Route::Scene(scene)),
        None => match policy {
            UnknownScenePolicy::FallbackToNarration => {
                tracing::warn!(tag, "unknown scene type, falling back to narration");
                Ok(Route::Scene(SceneType::Narration))
            }
            UnknownScenePolicy::Reject => Err(RouterError::UnknownScene(tag.to_string())),
        },
    }
}

/// [`route`] applied to a game state.
pub fn route_state(state: &GameState, policy: UnknownScenePolicy) -> Result<Route, RouterError> {
    route(&state.scene_type, state.exit, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_is_terminal() {
        assert_eq!(
            route("combat", true, UnknownScenePolicy::Reject),
            Ok(Route::Terminal)
        );
        // Even an unknown tag does not matter once exiting
        assert_eq!(
            route("???", true, UnknownScenePolicy::Reject),
            Ok(Route::Terminal)
        );
    }

    #[test]
    fn test_known_scene_passes_through() {
        for scene in SceneType::all() {
            assert_eq!(
                route(scene.as_str(), false, UnknownScenePolicy::default()),
                Ok(Route::Scene(scene))
            );
        }
    }

    #[test]
    fn test_unknown_scene_falls_back() {
        assert_eq!(
            route("tavern", false, UnknownScenePolicy::FallbackToNarration),
            Ok(Route::Scene(SceneType::Narration))
        );
        assert_eq!(
            route("", false, UnknownScenePolicy::FallbackToNarration),
            Ok(Route::Scene(SceneType::Narration))
        );
    }

    #[test]
    fn test_unknown_scene_rejected_when_strict() {
        assert_eq!(
            route("tavern", false, UnknownScenePolicy::Reject),
            Err(RouterError::UnknownScene("tavern".to_string()))
        );
    }
}
