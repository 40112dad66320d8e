// HTTP surface over the planning engine

pub mod health;
pub mod paces;
pub mod plans;
pub mod routes;
pub mod runners;
pub mod workouts;

pub use routes::{create_routes, AppState};
