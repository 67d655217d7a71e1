//! Spatial index — black-box overlap query для senses
//!
//! Senses не знают, откуда берутся hits: им нужен только `SpatialQuery`.
//! Headless реализация — `SpatialGrid` (XZ sparse hash grid), пересобирается каждый тик.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::SimulationSet;

pub mod grid;

pub use grid::SpatialGrid;

/// Битовая маска слоёв (аналог physics layer mask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenseLayers(pub u32);

impl SenseLayers {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub fn layer(index: u32) -> Self {
        Self(1u32.checked_shl(index).unwrap_or(0))
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for SenseLayers {
    fn default() -> Self {
        Self::ALL
    }
}

/// Коллайдер, видимый для overlap запросов
///
/// Может висеть на корне актора или на дочерней entity (hitbox) —
/// sense сам поднимается до корня через ChildOf.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SenseCollider {
    pub radius: f32,
    pub layers: SenseLayers,
}

impl Default for SenseCollider {
    fn default() -> Self {
        Self {
            radius: 0.0,
            layers: SenseLayers::ALL,
        }
    }
}

/// Overlap query (физический движок хоста или SpatialGrid)
pub trait SpatialQuery {
    /// Все коллайдеры на `layers`, пересекающие сферу, не более `max_hits`
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        layers: SenseLayers,
        max_hits: usize,
    ) -> Vec<Entity>;
}

/// Spatial Plugin
///
/// rebuild_spatial_grid в SimulationSet::Spatial (до senses).
pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialGrid>().add_systems(
            FixedUpdate,
            grid::rebuild_spatial_grid.in_set(SimulationSet::Spatial),
        );
    }
}

/// Корень иерархии (поднимаемся по ChildOf до верха)
pub fn root_entity(entity: Entity, parents: &Query<&ChildOf>) -> Entity {
    let mut current = entity;
    while let Ok(child_of) = parents.get(current) {
        current = child_of.parent();
    }
    current
}

/// World-space позиция entity без GlobalTransform propagation
///
/// Headless app не гоняет TransformPlugin, поэтому компонуем локальные
/// Transform вверх по ChildOf.
pub fn world_translation(
    entity: Entity,
    transforms: &Query<&Transform>,
    parents: &Query<&ChildOf>,
) -> Option<Vec3> {
    let mut accumulated = *transforms.get(entity).ok()?;
    let mut current = entity;

    while let Ok(child_of) = parents.get(current) {
        current = child_of.parent();
        if let Ok(parent_transform) = transforms.get(current) {
            accumulated = parent_transform.mul_transform(accumulated);
        }
    }

    Some(accumulated.translation)
}
