//! Refinement кандидатов после скана

use crate::senses::SensedEntity;

/// Выбор одного кандидата из списка скана
pub trait CandidateSelector: Send + Sync {
    fn select(&self, candidates: &[SensedEntity]) -> Option<SensedEntity>;
}

/// Ближайший по distance²; при равенстве — первый в списке
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestSelector;

impl CandidateSelector for NearestSelector {
    fn select(&self, candidates: &[SensedEntity]) -> Option<SensedEntity> {
        nearest_index(candidates).map(|index| candidates[index])
    }
}

/// Индекс ближайшего кандидата (strict `<` → tie уходит первому)
pub fn nearest_index(candidates: &[SensedEntity]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        match best {
            Some((_, distance)) if candidate.distance_squared >= distance => {}
            _ => best = Some((index, candidate.distance_squared)),
        }
    }

    best.map(|(index, _)| index)
}
