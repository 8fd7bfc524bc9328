use bevy_ecs::prelude::Resource;

use crate::resources::assets::{AssetRef, CharacterPrototype};
use crate::resources::input::PlayerRef;

/// Character each player picked when joining.
#[derive(Resource, Clone, Debug, Default)]
pub struct PlayerRoster {
    avatars: Vec<Option<AssetRef<CharacterPrototype>>>,
}

impl PlayerRoster {
    pub fn new(max_players: usize) -> Self {
        PlayerRoster {
            avatars: vec![None; max_players],
        }
    }

    /// Out of range players are ignored.
    pub fn set_avatar(&mut self, player: PlayerRef, avatar: AssetRef<CharacterPrototype>) {
        if let Some(slot) = self.avatars.get_mut(player.0 as usize) {
            *slot = Some(avatar);
        }
    }

    pub fn avatar(&self, player: PlayerRef) -> Option<AssetRef<CharacterPrototype>> {
        self.avatars.get(player.0 as usize).copied().flatten()
    }
}
