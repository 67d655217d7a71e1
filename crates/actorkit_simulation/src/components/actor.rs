//! Базовые компоненты акторов: Actor, Deactivated

use bevy::prelude::*;

use crate::components::{MovementCommand, MovementSpeed};

/// Актор (NPC, игрок, враг) — корень иерархии для senses и behaviours
///
/// Автоматически добавляет Transform, MovementCommand, MovementSpeed через Required Components.
/// Senses живут на дочерних entity (ChildOf → actor).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Transform, MovementCommand, MovementSpeed)]
pub struct Actor;

/// Маркер: актор деактивирован
///
/// Senses перестают сканировать, активный behaviour отменяется на ближайшем тике
/// (никакие эффекты после этого не применяются).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Deactivated;
