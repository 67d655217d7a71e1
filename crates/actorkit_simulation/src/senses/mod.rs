//! Senses: периодическое восприятие окружения актора
//!
//! Архитектура:
//! - SenseAuthoring (data) → init_senses → Sense | SenseDisabled
//! - scan_senses: overlap query → фильтры → список SensedEntity → refinement
//! - Sense живёт на акторе или его дочерней entity (ChildOf)
//!
//! Decide-системы (behaviour) читают результаты в том же тике, после скана.

use bevy::prelude::*;

use crate::SimulationSet;

pub mod selector;
pub mod sense;
pub mod systems;

#[cfg(test)]
mod sense_tests;

pub use selector::{nearest_index, CandidateSelector, NearestSelector};
pub use sense::{
    scan, Capability, Sense, SenseAuthoring, SenseConfig, SenseDisabled, SenseKind, SenseWorld,
    SensedEntity,
};
pub use systems::{init_senses, scan_senses, SenseWorldParam};

/// Sense Plugin
///
/// Порядок выполнения (внутри SimulationSet::Sense):
/// 1. init_senses — резолв authoring данных
/// 2. scan_senses — скан (новые senses сканируют в том же тике)
pub struct SensePlugin;

impl Plugin for SensePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (init_senses, scan_senses)
                .chain()
                .in_set(SimulationSet::Sense),
        );
    }
}
