pub mod doctor;
pub mod stats;

pub use doctor::doctor;
pub use stats::stats;
