use std::sync::Arc;
use tracing::debug;

use crate::models::{ExperienceLevel, PhaseDurations, RaceDistance};
use crate::repository::{StoreError, TemplateRepository};

/// Resolves how many weeks each training phase lasts
#[derive(Clone)]
pub struct PhaseDurationService {
    templates: Arc<dyn TemplateRepository>,
}

impl PhaseDurationService {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    /// Phase weeks for a race and level, or [`PhaseDurations::FALLBACK`] when
    /// no row matches. Store failures propagate.
    pub async fn resolve(
        &self,
        race: RaceDistance,
        level: ExperienceLevel,
    ) -> Result<PhaseDurations, StoreError> {
        match self.templates.phase_durations(race, level).await? {
            Some(durations) => Ok(durations),
            None => {
                debug!("No phase durations for {} / {}, using the 16 week fallback", race, level);
                Ok(PhaseDurations::FALLBACK)
            }
        }
    }
}
