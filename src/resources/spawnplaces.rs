use bevy_ecs::prelude::*;

/// Registered respawn points, in registration order.
#[derive(Resource, Clone, Debug, Default)]
pub struct SpawnPlaces {
    pub places: Vec<Entity>,
}

impl SpawnPlaces {
    pub fn register(&mut self, entity: Entity) {
        if !self.places.contains(&entity) {
            self.places.push(entity);
        }
    }
}
