//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: корень актора (Actor, Deactivated)
//! - movement: команды перемещения (MovementCommand, MovementSpeed)
//!
//! Stats, senses и behaviours держат свои компоненты в своих модулях.

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
