use anyhow::{Context, Result};
use std::sync::Arc;

use crate::models::*;
use crate::repository::TemplateRepository;

const PHASE_DURATIONS: &str = include_str!("../../seeds/phase_durations.json");
const WEEKLY_SCHEDULES: &str = include_str!("../../seeds/weekly_schedules.json");
const WORKOUT_STRUCTURES: &str = include_str!("../../seeds/workout_structures.json");

/// Loads the built-in template library into an empty template store
pub struct TemplateSeeder {
    templates: Arc<dyn TemplateRepository>,
}

impl TemplateSeeder {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    /// Seed every template table, unless the store already holds templates.
    /// Returns whether anything was written.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        let counts = self.templates.template_counts().await?;
        if !counts.is_empty() {
            tracing::info!(
                "Template store already populated ({} phase durations, {} structures, {} weekly slots), skipping seeding",
                counts.phase_durations,
                counts.structure_templates,
                counts.weekly_slots
            );
            return Ok(false);
        }

        self.seed_all().await?;
        Ok(true)
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Starting template seeding...");

        self.seed_phase_durations().await?;
        self.seed_weekly_schedules().await?;
        self.seed_workout_structures().await?;

        tracing::info!("Template seeding completed!");
        Ok(())
    }

    async fn seed_phase_durations(&self) -> Result<()> {
        let records: Vec<PhaseDurationRecord> =
            serde_json::from_str(PHASE_DURATIONS).context("parsing seeds/phase_durations.json")?;

        for record in &records {
            self.templates.upsert_phase_durations(record).await?;
        }

        tracing::info!("Seeded {} phase duration rows", records.len());
        Ok(())
    }

    async fn seed_weekly_schedules(&self) -> Result<()> {
        let rows: Vec<WeeklyScheduleRow> =
            serde_json::from_str(WEEKLY_SCHEDULES).context("parsing seeds/weekly_schedules.json")?;

        for row in &rows {
            self.templates.insert_weekly_slot(row).await?;
        }

        tracing::info!("Seeded {} weekly schedule slots", rows.len());
        Ok(())
    }

    async fn seed_workout_structures(&self) -> Result<()> {
        let templates: Vec<NewStructureTemplate> = serde_json::from_str(WORKOUT_STRUCTURES)
            .context("parsing seeds/workout_structures.json")?;

        for template in &templates {
            self.templates.insert_structure_template(template).await?;
        }

        tracing::info!("Seeded {} workout structure templates", templates.len());
        Ok(())
    }
}
