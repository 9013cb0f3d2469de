// Presentation setup derived from the announced phase.
// The render collaborator builds real scenes/cameras from these descriptions.

use sync_protocol::GamePhase;

const NEAR_PLANE: f32 = -1000.0;
const FAR_PLANE: f32 = 1000.0;
const GAME_BACKGROUND: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Orthographic frustum bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayer {
    pub camera: OrthoCamera,
    // None keeps the renderer's clear color.
    pub background: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationContext {
    pub game: Option<SceneLayer>,
    pub ui: Option<SceneLayer>,
}

impl PresentationContext {
    pub fn for_phase(phase: GamePhase, screen: ScreenSize) -> Self {
        let width = screen.width as f32;
        let height = screen.height as f32;

        match phase {
            GamePhase::Gameplay => Self {
                // World space: origin bottom-left, y up.
                game: Some(SceneLayer {
                    camera: OrthoCamera {
                        left: 0.0,
                        right: width,
                        top: height,
                        bottom: 0.0,
                        near: NEAR_PLANE,
                        far: FAR_PLANE,
                    },
                    background: Some(GAME_BACKGROUND),
                }),
                // UI space: origin top-left, y down.
                ui: Some(SceneLayer {
                    camera: OrthoCamera {
                        left: 0.0,
                        right: width,
                        top: 0.0,
                        bottom: -height,
                        near: NEAR_PLANE,
                        far: FAR_PLANE,
                    },
                    background: None,
                }),
            },
            GamePhase::Lobby | GamePhase::Ended => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.game.is_none() && self.ui.is_none()
    }
}
