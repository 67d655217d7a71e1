//! Target Selection: случайный участник, кроме самого инициатора

use bevy::prelude::*;
use rand::Rng;

use crate::error::TargetSelectionError;

/// Выбрать цель среди участников
///
/// Сначала отфильтровываем `initiator`, потом один равномерный draw.
/// Никаких повторных бросков.
pub fn select_target<R: Rng>(
    participants: &[Entity],
    initiator: Entity,
    rng: &mut R,
) -> Result<Entity, TargetSelectionError> {
    let eligible: Vec<Entity> = participants
        .iter()
        .copied()
        .filter(|participant| *participant != initiator)
        .collect();

    if eligible.is_empty() {
        return Err(TargetSelectionError::NoEligibleTarget);
    }

    Ok(eligible[rng.gen_range(0..eligible.len())])
}
