//! Standard handlers, one function per action type.

pub mod counting;
pub mod meta;
pub mod status;
pub mod targeting;
pub mod voting;
