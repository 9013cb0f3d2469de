// Headless render collaborator: reports presentation changes through tracing.

use crate::domain::{
    AssetCatalog, EntityChange, EntityRegistry, PresentationContext, RenderSink, ResourceNotFound,
};

use std::collections::HashSet;
use sync_protocol::GamePhase;
use tracing::{debug, info, warn};

pub struct LogRender {
    catalog: AssetCatalog,
    ui_font: Option<String>,
    // Sprite urls already reported missing, so a moving entity warns once.
    missing_textures: HashSet<String>,
    lost: bool,
}

impl LogRender {
    /// The UI font is configured locally, so a missing one fails construction.
    pub fn new(catalog: AssetCatalog, ui_font: Option<&str>) -> Result<Self, ResourceNotFound> {
        if let Some(url) = ui_font {
            catalog.font(url)?;
        }

        Ok(Self {
            catalog,
            ui_font: ui_font.map(str::to_string),
            missing_textures: HashSet::new(),
            lost: false,
        })
    }

    pub fn is_connectivity_lost(&self) -> bool {
        self.lost
    }

    pub fn missing_textures(&self) -> impl Iterator<Item = &str> {
        self.missing_textures.iter().map(String::as_str)
    }
}

impl RenderSink for LogRender {
    fn initialize_phase(&mut self, phase: GamePhase, context: &PresentationContext) {
        if context.is_empty() {
            info!(?phase, "phase started; nothing to draw");
            return;
        }

        if let Some(game) = &context.game {
            info!(
                ?phase,
                camera = ?game.camera,
                background = game.background.unwrap_or("none"),
                "game scene ready"
            );
        }
        if let Some(ui) = &context.ui {
            info!(
                ?phase,
                camera = ?ui.camera,
                font = self.ui_font.as_deref().unwrap_or("default"),
                "ui scene ready"
            );
        }
    }

    fn entity_changed(&mut self, change: &EntityChange, registry: &EntityRegistry) {
        let entity = match change {
            EntityChange::Destroyed(id) => {
                info!(entity_id = %id, remaining = registry.len(), "entity removed");
                return;
            }
            EntityChange::Created(id) | EntityChange::Updated(id) => match registry.get(id) {
                Some(entity) => entity,
                None => {
                    debug!(entity_id = %id, "changed entity no longer present");
                    return;
                }
            },
        };

        // Sprite urls come from the server, so a miss is reported, never fatal.
        if let Some(sprite) = &entity.components.sprite
            && self.catalog.texture(&sprite.url).is_err()
            && self.missing_textures.insert(sprite.url.clone())
        {
            warn!(entity_id = %entity.id, url = %sprite.url, "sprite texture not loaded");
        }

        let position = entity.components.position.map(|p| (p.x, p.y));
        let animation = entity
            .components
            .animation
            .as_ref()
            .map(|a| (a.sequence.as_str(), a.current_frame));
        match change {
            EntityChange::Created(_) => {
                info!(entity_id = %entity.id, ?position, ?animation, "entity appeared");
            }
            _ => debug!(entity_id = %entity.id, ?position, ?animation, "entity moved"),
        }
    }

    fn connectivity_lost(&mut self) {
        self.lost = true;
        warn!("connection to server lost");
    }
}
