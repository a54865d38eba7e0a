//! Command implementations

pub mod doctor;
pub mod launch;
pub mod provision;
pub mod render;
pub mod version;
