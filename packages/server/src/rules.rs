pub mod assignment;
pub mod distribution;
pub mod lineup;
