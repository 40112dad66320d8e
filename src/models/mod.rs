// Data models for runners, plans, workouts and templates

pub mod runner;
pub mod schedule;
pub mod structure;
pub mod templates;
pub mod training_plan;
pub mod workout;

pub use runner::*;
pub use schedule::*;
pub use structure::*;
pub use templates::*;
pub use training_plan::*;
pub use workout::*;
