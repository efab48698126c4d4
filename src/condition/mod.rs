//! Condition evaluation against live host state.

pub mod context;
pub mod eval;
pub mod range;

pub use context::EvalContext;
pub use eval::evaluate;
pub use range::check_range;
