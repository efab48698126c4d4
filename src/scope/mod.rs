//! Scope resolution: which definitions apply to which actor, and the
//! per-scene override layers on top of the global catalog.

pub mod overrides;
pub mod resolver;

pub use overrides::{clear_scene_overrides, set_class_toggle, set_scene_disabled, SceneOverrides};
pub use resolver::{
    actor_assignments, item_assignments, resolve_in_scope, set_actor_assignment,
    set_item_assignment,
};
