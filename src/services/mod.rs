// Planning engine services

pub mod pace_model;
pub mod phase_duration_service;
pub mod plan_generation_service;
pub mod plan_lifecycle_service;
pub mod runner_profile_service;
pub mod schedule_service;
pub mod template_catalog_service;
pub mod workout_description_service;

pub use phase_duration_service::PhaseDurationService;
pub use plan_generation_service::{GenerationPolicy, PlanGenerationService};
pub use plan_lifecycle_service::PlanLifecycleService;
pub use runner_profile_service::RunnerProfileService;
pub use schedule_service::ScheduleService;
pub use template_catalog_service::{select_authoritative, TemplateCatalogService};
pub use workout_description_service::UnitConverter;
