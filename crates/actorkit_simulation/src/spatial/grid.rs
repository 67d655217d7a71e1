//! Sparse hash grid по плоскости XZ
//!
//! Порядок hits детерминирован: клетки обходятся по возрастанию (x, z),
//! внутри клетки — в порядке вставки.

use ahash::AHashMap;
use bevy::prelude::*;

use crate::spatial::{world_translation, SenseCollider, SenseLayers, SpatialQuery};

#[derive(Debug, Clone, Copy)]
struct GridEntry {
    entity: Entity,
    position: Vec3,
    radius: f32,
    layers: SenseLayers,
}

/// Spatial index всех SenseCollider
#[derive(Resource, Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<GridEntry>>,
    /// Максимальный радиус коллайдера (расширяет область поиска)
    max_collider_radius: f32,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 4.0 },
            cells: AHashMap::new(),
            max_collider_radius: 0.0,
        }
    }

    #[inline]
    fn cell_coord(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.max_collider_radius = 0.0;
    }

    pub fn insert(&mut self, entity: Entity, position: Vec3, collider: SenseCollider) {
        let coord = self.cell_coord(position.x, position.z);
        self.max_collider_radius = self.max_collider_radius.max(collider.radius);
        self.cells.entry(coord).or_default().push(GridEntry {
            entity,
            position,
            radius: collider.radius,
            layers: collider.layers,
        });
    }
}

impl SpatialQuery for SpatialGrid {
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        layers: SenseLayers,
        max_hits: usize,
    ) -> Vec<Entity> {
        let mut hits = Vec::new();
        if max_hits == 0 || radius < 0.0 {
            return hits;
        }

        let reach = radius + self.max_collider_radius;
        let (min_x, min_z) = self.cell_coord(center.x - reach, center.z - reach);
        let (max_x, max_z) = self.cell_coord(center.x + reach, center.z + reach);

        let mut coords: Vec<(i32, i32)> = self
            .cells
            .keys()
            .copied()
            .filter(|(x, z)| (min_x..=max_x).contains(x) && (min_z..=max_z).contains(z))
            .collect();
        coords.sort_unstable();

        for coord in coords {
            let Some(cell) = self.cells.get(&coord) else {
                continue;
            };

            for entry in cell {
                if !entry.layers.intersects(layers) {
                    continue;
                }

                let touch = radius + entry.radius;
                if center.distance_squared(entry.position) <= touch * touch {
                    hits.push(entry.entity);
                    if hits.len() >= max_hits {
                        return hits;
                    }
                }
            }
        }

        hits
    }
}

/// Система: пересобрать grid из всех SenseCollider
pub fn rebuild_spatial_grid(
    mut grid: ResMut<SpatialGrid>,
    colliders: Query<(Entity, &SenseCollider)>,
    transforms: Query<&Transform>,
    parents: Query<&ChildOf>,
) {
    grid.clear();

    for (entity, collider) in colliders.iter() {
        if let Some(position) = world_translation(entity, &transforms, &parents) {
            grid.insert(entity, position, *collider);
        }
    }
}
