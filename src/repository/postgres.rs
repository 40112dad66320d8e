use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{PlanRepository, StoreError, TemplateRepository};
use crate::models::{
    weekday_from_sunday_index, DistanceUnit, ExperienceLevel, Intensity, NewStructureTemplate,
    PhaseDurationRecord, PhaseDurations, PlanMetadata, PlanStatus, RaceDistance, RunnerProfile,
    StructureTemplate, TemplateCounts, TrainingPhase, TrainingPlan, WeeklyScheduleRow, WeeklySlot,
    Workout, WorkoutStatus, WorkoutStructure, WorkoutType,
};

// Postgres caps a statement at 65535 bind parameters; a workout row binds 16.
const WORKOUT_INSERT_CHUNK: usize = 1000;

const PLAN_COLUMNS: &str = "id, runner_id, name, description, race_type, experience_level, training_days, \
     start_date, race_date, status, plan_metadata, created_at, updated_at";

const WORKOUT_COLUMNS: &str = "id, plan_id, date, week_number, phase, workout_type, intensity, \
     distance_target_km, duration_minutes, pace_target, status, structure_ref, structure_json, \
     description, notes, created_at";

/// sqlx/Postgres implementation of both repositories
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct RunnerRow {
    id: Uuid,
    display_name: Option<String>,
    experience_level: ExperienceLevel,
    race_goal: Option<RaceDistance>,
    fitness_score: f64,
    training_days_per_week: i32,
    race_date: Option<NaiveDate>,
    training_start_date: Option<NaiveDate>,
    preferred_unit: DistanceUnit,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RunnerRow> for RunnerProfile {
    fn from(row: RunnerRow) -> Self {
        RunnerProfile {
            id: row.id,
            display_name: row.display_name,
            experience_level: row.experience_level,
            race_goal: row.race_goal,
            fitness_score: row.fitness_score,
            training_days_per_week: row.training_days_per_week,
            race_date: row.race_date,
            training_start_date: row.training_start_date,
            preferred_unit: row.preferred_unit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PlanRow {
    id: Uuid,
    runner_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    race_type: RaceDistance,
    experience_level: ExperienceLevel,
    training_days: i32,
    start_date: NaiveDate,
    race_date: NaiveDate,
    status: PlanStatus,
    plan_metadata: Json<PlanMetadata>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for TrainingPlan {
    fn from(row: PlanRow) -> Self {
        TrainingPlan {
            id: row.id,
            runner_id: row.runner_id,
            name: row.name,
            description: row.description,
            race_type: row.race_type,
            experience_level: row.experience_level,
            training_days: row.training_days,
            start_date: row.start_date,
            race_date: row.race_date,
            status: row.status,
            plan_metadata: row.plan_metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct WorkoutRow {
    id: Uuid,
    plan_id: Uuid,
    date: NaiveDate,
    week_number: i32,
    phase: TrainingPhase,
    workout_type: WorkoutType,
    intensity: Intensity,
    distance_target_km: Option<f64>,
    duration_minutes: Option<i32>,
    pace_target: Option<String>,
    status: WorkoutStatus,
    structure_ref: Option<i64>,
    structure_json: Option<serde_json::Value>,
    description: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WorkoutRow> for Workout {
    type Error = StoreError;

    fn try_from(row: WorkoutRow) -> Result<Self, Self::Error> {
        let structure_json = row
            .structure_json
            .map(|value| {
                WorkoutStructure::from_value(value).map_err(|reason| StoreError::MalformedTemplate {
                    key: format!("workout {} snapshot", row.id),
                    reason,
                })
            })
            .transpose()?;

        Ok(Workout {
            id: row.id,
            plan_id: row.plan_id,
            date: row.date,
            week_number: row.week_number,
            phase: row.phase,
            workout_type: row.workout_type,
            intensity: row.intensity,
            distance_target_km: row.distance_target_km,
            duration_minutes: row.duration_minutes,
            pace_target: row.pace_target,
            status: row.status,
            structure_ref: row.structure_ref,
            structure_json,
            description: row.description,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct PhaseDurationRow {
    base_weeks: i32,
    build_weeks: i32,
    peak_weeks: i32,
    taper_weeks: i32,
}

#[derive(FromRow)]
struct TemplateRow {
    id: i64,
    workout_type: WorkoutType,
    experience_level: ExperienceLevel,
    phase: TrainingPhase,
    race_distance: Option<RaceDistance>,
    structure: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for StructureTemplate {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let structure = WorkoutStructure::from_value(row.structure).map_err(|reason| {
            StoreError::MalformedTemplate {
                key: format!("structure template {}", row.id),
                reason,
            }
        })?;
        Ok(StructureTemplate {
            id: row.id,
            workout_type: row.workout_type,
            experience_level: row.experience_level,
            phase: row.phase,
            race_distance: row.race_distance,
            structure,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct SlotRow {
    day_of_week: i32,
    workout_type: WorkoutType,
    priority: i32,
}

#[derive(FromRow)]
struct CountsRow {
    phase_durations: i64,
    structure_templates: i64,
    weekly_slots: i64,
}

fn weeks_from_column(key: &str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::MalformedTemplate {
        key: key.to_string(),
        reason: format!("negative week count {}", value),
    })
}

fn weeks_to_column(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::MalformedTemplate {
        key: "phase_durations".to_string(),
        reason: format!("week count {} out of range", value),
    })
}

/// Row locks on every plan of the runner, held until the transaction ends.
/// Generation, regeneration and activation for one runner serialize on them.
async fn lock_runner_plans(conn: &mut PgConnection, runner_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM training_plans WHERE runner_id = $1 FOR UPDATE")
        .bind(runner_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_workouts(conn: &mut PgConnection, workouts: &[Workout]) -> Result<(), StoreError> {
    for chunk in workouts.chunks(WORKOUT_INSERT_CHUNK) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO workouts ({}) ", WORKOUT_COLUMNS));
        builder.push_values(chunk, |mut row, w| {
            row.push_bind(w.id)
                .push_bind(w.plan_id)
                .push_bind(w.date)
                .push_bind(w.week_number)
                .push_bind(w.phase)
                .push_bind(w.workout_type)
                .push_bind(w.intensity)
                .push_bind(w.distance_target_km)
                .push_bind(w.duration_minutes)
                .push_bind(w.pace_target.clone())
                .push_bind(w.status)
                .push_bind(w.structure_ref)
                .push_bind(w.structure_json.as_ref().map(WorkoutStructure::to_value))
                .push_bind(w.description.clone())
                .push_bind(w.notes.clone())
                .push_bind(w.created_at);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

#[async_trait]
impl TemplateRepository for PgStore {
    async fn phase_durations(
        &self,
        race: RaceDistance,
        level: ExperienceLevel,
    ) -> Result<Option<PhaseDurations>, StoreError> {
        let row = sqlx::query_as::<_, PhaseDurationRow>(
            "SELECT base_weeks, build_weeks, peak_weeks, taper_weeks FROM phase_durations \
             WHERE race_distance = $1 AND experience_level = $2",
        )
        .bind(race)
        .bind(level)
        .fetch_optional(&self.db)
        .await?;

        let key = format!("phase_durations {} {}", race, level);
        row.map(|r| {
            Ok(PhaseDurations {
                base_weeks: weeks_from_column(&key, r.base_weeks)?,
                build_weeks: weeks_from_column(&key, r.build_weeks)?,
                peak_weeks: weeks_from_column(&key, r.peak_weeks)?,
                taper_weeks: weeks_from_column(&key, r.taper_weeks)?,
            })
        })
        .transpose()
    }

    async fn structure_templates(
        &self,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
        race: Option<RaceDistance>,
    ) -> Result<Vec<StructureTemplate>, StoreError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, workout_type, experience_level, phase, race_distance, structure, created_at
            FROM workout_structure_templates
            WHERE workout_type = $1 AND experience_level = $2 AND phase = $3
              AND ($4::race_distance IS NULL OR race_distance = $4)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(workout_type)
        .bind(level)
        .bind(phase)
        .bind(race)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StructureTemplate::try_from).collect()
    }

    async fn weekly_schedule(
        &self,
        training_days: i32,
        phase: TrainingPhase,
    ) -> Result<Vec<WeeklySlot>, StoreError> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT day_of_week, workout_type, priority FROM weekly_schedule_templates \
             WHERE training_days = $1 AND phase = $2 ORDER BY priority ASC, day_of_week ASC",
        )
        .bind(training_days)
        .bind(phase)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let day_of_week = weekday_from_sunday_index(row.day_of_week).ok_or_else(|| {
                    StoreError::MalformedTemplate {
                        key: format!("weekly schedule {} days {}", training_days, phase),
                        reason: format!("day_of_week {} outside 0..=6", row.day_of_week),
                    }
                })?;
                Ok(WeeklySlot {
                    day_of_week,
                    workout_type: row.workout_type,
                    priority: row.priority,
                })
            })
            .collect()
    }

    async fn upsert_phase_durations(&self, record: &PhaseDurationRecord) -> Result<(), StoreError> {
        let d = record.durations;
        sqlx::query(
            r#"
            INSERT INTO phase_durations (race_distance, experience_level, base_weeks, build_weeks, peak_weeks, taper_weeks)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (race_distance, experience_level) DO UPDATE SET
                base_weeks = EXCLUDED.base_weeks,
                build_weeks = EXCLUDED.build_weeks,
                peak_weeks = EXCLUDED.peak_weeks,
                taper_weeks = EXCLUDED.taper_weeks
            "#,
        )
        .bind(record.race_distance)
        .bind(record.experience_level)
        .bind(weeks_to_column(d.base_weeks)?)
        .bind(weeks_to_column(d.build_weeks)?)
        .bind(weeks_to_column(d.peak_weeks)?)
        .bind(weeks_to_column(d.taper_weeks)?)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn insert_structure_template(
        &self,
        template: &NewStructureTemplate,
    ) -> Result<StructureTemplate, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            INSERT INTO workout_structure_templates (workout_type, experience_level, phase, race_distance, structure, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, workout_type, experience_level, phase, race_distance, structure, created_at
            "#,
        )
        .bind(template.workout_type)
        .bind(template.experience_level)
        .bind(template.phase)
        .bind(template.race_distance)
        .bind(template.structure.to_value())
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        StructureTemplate::try_from(row)
    }

    async fn insert_weekly_slot(&self, row: &WeeklyScheduleRow) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO weekly_schedule_templates (training_days, phase, day_of_week, workout_type, priority) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.training_days)
        .bind(row.phase)
        .bind(row.slot.day_of_week.num_days_from_sunday() as i32)
        .bind(row.slot.workout_type)
        .bind(row.slot.priority)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn template_counts(&self) -> Result<TemplateCounts, StoreError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM phase_durations) AS phase_durations,
                (SELECT COUNT(*) FROM workout_structure_templates) AS structure_templates,
                (SELECT COUNT(*) FROM weekly_schedule_templates) AS weekly_slots
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(TemplateCounts {
            phase_durations: row.phase_durations,
            structure_templates: row.structure_templates,
            weekly_slots: row.weekly_slots,
        })
    }
}

#[async_trait]
impl PlanRepository for PgStore {
    async fn get_runner(&self, runner_id: Uuid) -> Result<Option<RunnerProfile>, StoreError> {
        let row = sqlx::query_as::<_, RunnerRow>(
            r#"
            SELECT id, display_name, experience_level, race_goal, fitness_score, training_days_per_week,
                   race_date, training_start_date, preferred_unit, created_at, updated_at
            FROM runner_profiles
            WHERE id = $1
            "#,
        )
        .bind(runner_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(RunnerProfile::from))
    }

    async fn upsert_runner(&self, runner: &RunnerProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO runner_profiles (
                id, display_name, experience_level, race_goal, fitness_score, training_days_per_week,
                race_date, training_start_date, preferred_unit, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                experience_level = EXCLUDED.experience_level,
                race_goal = EXCLUDED.race_goal,
                fitness_score = EXCLUDED.fitness_score,
                training_days_per_week = EXCLUDED.training_days_per_week,
                race_date = EXCLUDED.race_date,
                training_start_date = EXCLUDED.training_start_date,
                preferred_unit = EXCLUDED.preferred_unit,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(runner.id)
        .bind(&runner.display_name)
        .bind(runner.experience_level)
        .bind(runner.race_goal)
        .bind(runner.fitness_score)
        .bind(runner.training_days_per_week)
        .bind(runner.race_date)
        .bind(runner.training_start_date)
        .bind(runner.preferred_unit)
        .bind(runner.created_at)
        .bind(runner.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<TrainingPlan>, StoreError> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM training_plans WHERE id = $1",
            PLAN_COLUMNS
        ))
        .bind(plan_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(TrainingPlan::from))
    }

    async fn list_plans(&self, runner_id: Uuid) -> Result<Vec<TrainingPlan>, StoreError> {
        let rows = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM training_plans WHERE runner_id = $1 ORDER BY created_at DESC",
            PLAN_COLUMNS
        ))
        .bind(runner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(TrainingPlan::from).collect())
    }

    async fn active_plan(&self, runner_id: Uuid) -> Result<Option<TrainingPlan>, StoreError> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM training_plans WHERE runner_id = $1 AND status = $2",
            PLAN_COLUMNS
        ))
        .bind(runner_id)
        .bind(PlanStatus::Active)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(TrainingPlan::from))
    }

    async fn save_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        lock_runner_plans(&mut tx, plan.runner_id).await?;

        if plan.status == PlanStatus::Active {
            sqlx::query(
                "UPDATE training_plans SET status = $3, updated_at = $4 \
                 WHERE runner_id = $1 AND id <> $2 AND status = $5",
            )
            .bind(plan.runner_id)
            .bind(plan.id)
            .bind(PlanStatus::Archived)
            .bind(Utc::now())
            .bind(PlanStatus::Active)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(&format!(
            "INSERT INTO training_plans ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            PLAN_COLUMNS
        ))
        .bind(plan.id)
        .bind(plan.runner_id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.race_type)
        .bind(plan.experience_level)
        .bind(plan.training_days)
        .bind(plan.start_date)
        .bind(plan.race_date)
        .bind(plan.status)
        .bind(Json(plan.plan_metadata))
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_workouts(&mut tx, workouts).await?;

        tx.commit().await?;
        debug!("Saved plan {} with {} workouts", plan.id, workouts.len());
        Ok(())
    }

    async fn replace_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;
        lock_runner_plans(&mut tx, plan.runner_id).await?;

        // Status and created_at stay as the locked row has them.
        let updated = sqlx::query(
            r#"
            UPDATE training_plans SET
                name = $3,
                description = $4,
                race_type = $5,
                experience_level = $6,
                training_days = $7,
                start_date = $8,
                race_date = $9,
                plan_metadata = $10,
                updated_at = $11
            WHERE id = $1 AND runner_id = $2
            "#,
        )
        .bind(plan.id)
        .bind(plan.runner_id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.race_type)
        .bind(plan.experience_level)
        .bind(plan.training_days)
        .bind(plan.start_date)
        .bind(plan.race_date)
        .bind(Json(plan.plan_metadata))
        .bind(plan.updated_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let deleted = sqlx::query("DELETE FROM workouts WHERE plan_id = $1")
            .bind(plan.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        insert_workouts(&mut tx, workouts).await?;

        tx.commit().await?;
        debug!(
            "Replaced {} workouts of plan {} with {}",
            deleted,
            plan.id,
            workouts.len()
        );
        Ok(true)
    }

    async fn list_workouts(&self, plan_id: Uuid) -> Result<Vec<Workout>, StoreError> {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {} FROM workouts WHERE plan_id = $1 ORDER BY date ASC, created_at ASC",
            WORKOUT_COLUMNS
        ))
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Workout::try_from).collect()
    }

    async fn update_workout_status(
        &self,
        workout_id: Uuid,
        status: WorkoutStatus,
    ) -> Result<Option<Workout>, StoreError> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "UPDATE workouts SET status = $2 WHERE id = $1 RETURNING {}",
            WORKOUT_COLUMNS
        ))
        .bind(workout_id)
        .bind(status)
        .fetch_optional(&self.db)
        .await?;

        row.map(Workout::try_from).transpose()
    }

    async fn activate_plan(&self, runner_id: Uuid, plan_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let plan_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM training_plans WHERE runner_id = $1 FOR UPDATE")
                .bind(runner_id)
                .fetch_all(&mut *tx)
                .await?;

        if !plan_ids.contains(&plan_id) {
            tx.rollback().await?;
            return Ok(false);
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE training_plans SET status = $3, updated_at = $4 \
             WHERE runner_id = $1 AND id <> $2 AND status = $5",
        )
        .bind(runner_id)
        .bind(plan_id)
        .bind(PlanStatus::Archived)
        .bind(now)
        .bind(PlanStatus::Active)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE training_plans SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(plan_id)
            .bind(PlanStatus::Active)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE training_plans SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(plan_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM workouts WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM training_plans WHERE id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
