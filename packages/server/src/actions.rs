//! Action dispatch: target validation, the handler table and effect application.

pub mod context;
pub mod effects;
pub mod handlers;
pub mod registry;
pub mod targets;

pub use context::ActionContext;
pub use registry::{ActionHandler, ActionRegistry};
