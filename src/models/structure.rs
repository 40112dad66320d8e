//! Workout structure descriptors.
//!
//! Templates are curated as loose JSON (optional reps, rest, segments,
//! distance and duration in any combination). They are validated once, when
//! they enter the system, into [`WorkoutStructure`]. Serializing a
//! structure writes the canonical JSON form back out, with every segment
//! under `main`.
//!
//! Units: distances are kilometres. A repeated segment's `duration` is
//! seconds per rep, a plain segment's `duration` and warmup/cooldown
//! durations are minutes. `rest` is seconds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStructure", into = "RawStructure")]
pub struct WorkoutStructure {
    pub warmup: Option<EasyBlock>,
    pub cooldown: Option<EasyBlock>,
    pub main: Vec<Segment>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub min_duration: Option<f64>,
    pub description: Option<String>,
}

/// Warmup or cooldown block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EasyBlock {
    pub duration: f64, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Simple(SimpleSegment),
    Repeated(RepeatedSegment),
    Composite(CompositeSegment),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleSegment {
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub pace: Option<String>,
    pub effort: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedSegment {
    pub reps: u32,
    pub work: RepWork,
    pub rest_seconds: Option<f64>,
    pub pace: Option<String>,
    pub effort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepWork {
    DistanceKm(f64),
    DurationSeconds(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSegment {
    pub segments: Vec<Segment>,
    pub description: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("repeated segment must have at least one rep")]
    ZeroReps,
    #[error("repeated segment needs a distance or a duration")]
    MissingRepWork,
    #[error("composite segment has no segments")]
    EmptyComposite,
    #[error("segment defines neither distance, duration, pace nor effort")]
    EmptySegment,
    #[error("composite segment cannot also repeat")]
    RepeatedComposite,
    #[error("structure mixes top-level segment fields with a main sequence")]
    AmbiguousMain,
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("minDistance {min} exceeds maxDistance {max}")]
    InvertedBounds { min: f64, max: f64 },
}

impl WorkoutStructure {
    /// Validate a loose JSON payload into a structure.
    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Validated structures hold only numbers and strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// The leading repeated-distance set, e.g. 6x400m.
    pub fn interval_set(&self) -> Option<(&RepeatedSegment, f64)> {
        match self.main.first()? {
            Segment::Repeated(rep) => match rep.work {
                RepWork::DistanceKm(km) => Some((rep, km)),
                RepWork::DurationSeconds(_) => None,
            },
            _ => None,
        }
    }

    /// The leading repeated-duration set, e.g. 8x60s hills.
    pub fn timed_set(&self) -> Option<(&RepeatedSegment, f64)> {
        match self.main.first()? {
            Segment::Repeated(rep) => match rep.work {
                RepWork::DurationSeconds(secs) => Some((rep, secs)),
                RepWork::DistanceKm(_) => None,
            },
            _ => None,
        }
    }

    /// First plain segment, if the main set starts with one.
    pub fn lead_segment(&self) -> Option<&SimpleSegment> {
        match self.main.first()? {
            Segment::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    pub fn is_multi_segment(&self) -> bool {
        self.main.len() > 1 || matches!(self.main.first(), Some(Segment::Composite(_)))
    }

    /// Minutes spent in warmup and cooldown.
    pub fn easy_minutes(&self) -> f64 {
        self.warmup.as_ref().map_or(0.0, |b| b.duration)
            + self.cooldown.as_ref().map_or(0.0, |b| b.duration)
    }
}

impl Segment {
    /// Total kilometres covered by the segment where it is distance based.
    pub fn distance_km(&self) -> f64 {
        match self {
            Segment::Simple(simple) => simple.distance_km.unwrap_or(0.0),
            Segment::Repeated(rep) => match rep.work {
                RepWork::DistanceKm(km) => rep.reps as f64 * km,
                RepWork::DurationSeconds(_) => 0.0,
            },
            Segment::Composite(composite) => composite.segments.iter().map(Segment::distance_km).sum(),
        }
    }

    /// Working minutes of the segment, rest between reps included.
    pub fn work_minutes(&self) -> f64 {
        match self {
            Segment::Simple(simple) => simple.duration_minutes.unwrap_or(0.0),
            Segment::Repeated(rep) => match rep.work {
                RepWork::DurationSeconds(secs) => {
                    let reps = rep.reps as f64;
                    reps * secs / 60.0 + (reps - 1.0) * rep.rest_seconds.unwrap_or(0.0) / 60.0
                }
                RepWork::DistanceKm(_) => 0.0,
            },
            Segment::Composite(composite) => composite.segments.iter().map(Segment::work_minutes).sum(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStructure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warmup: Option<EasyBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cooldown: Option<EasyBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    main: Vec<RawSegment>,
    #[serde(flatten)]
    inline: RawSegment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<RawSegment>>,
    // Only meaningful on composite segments; a top-level description belongs to the structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl RawSegment {
    fn is_empty(&self) -> bool {
        self.distance.is_none()
            && self.duration.is_none()
            && self.pace.is_none()
            && self.effort.is_none()
            && self.reps.is_none()
            && self.rest.is_none()
            && self.segments.is_none()
    }
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<Option<f64>, StructureError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(StructureError::InvalidNumber { field, value: v }),
        other => Ok(other),
    }
}

impl TryFrom<RawSegment> for Segment {
    type Error = StructureError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        let distance = non_negative("distance", raw.distance)?;
        let duration = non_negative("duration", raw.duration)?;
        let rest = non_negative("rest", raw.rest)?;

        if let Some(children) = raw.segments {
            if raw.reps.is_some() {
                return Err(StructureError::RepeatedComposite);
            }
            if children.is_empty() {
                return Err(StructureError::EmptyComposite);
            }
            let segments = children
                .into_iter()
                .map(Segment::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Segment::Composite(CompositeSegment {
                segments,
                description: raw.label,
            }));
        }

        if let Some(reps) = raw.reps {
            if reps == 0 {
                return Err(StructureError::ZeroReps);
            }
            let work = match (distance, duration) {
                (Some(km), _) => RepWork::DistanceKm(km),
                (None, Some(secs)) => RepWork::DurationSeconds(secs),
                (None, None) => return Err(StructureError::MissingRepWork),
            };
            return Ok(Segment::Repeated(RepeatedSegment {
                reps,
                work,
                rest_seconds: rest,
                pace: raw.pace,
                effort: raw.effort,
            }));
        }

        if distance.is_none() && duration.is_none() && raw.pace.is_none() && raw.effort.is_none() {
            return Err(StructureError::EmptySegment);
        }

        Ok(Segment::Simple(SimpleSegment {
            distance_km: distance,
            duration_minutes: duration,
            pace: raw.pace,
            effort: raw.effort,
        }))
    }
}

impl From<Segment> for RawSegment {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Simple(simple) => RawSegment {
                distance: simple.distance_km,
                duration: simple.duration_minutes,
                pace: simple.pace,
                effort: simple.effort,
                ..Default::default()
            },
            Segment::Repeated(rep) => {
                let (distance, duration) = match rep.work {
                    RepWork::DistanceKm(km) => (Some(km), None),
                    RepWork::DurationSeconds(secs) => (None, Some(secs)),
                };
                RawSegment {
                    distance,
                    duration,
                    pace: rep.pace,
                    effort: rep.effort,
                    reps: Some(rep.reps),
                    rest: rep.rest_seconds,
                    ..Default::default()
                }
            }
            Segment::Composite(composite) => RawSegment {
                segments: Some(composite.segments.into_iter().map(RawSegment::from).collect()),
                label: composite.description,
                ..Default::default()
            },
        }
    }
}

impl TryFrom<RawStructure> for WorkoutStructure {
    type Error = StructureError;

    fn try_from(raw: RawStructure) -> Result<Self, Self::Error> {
        let min_distance = non_negative("minDistance", raw.min_distance)?;
        let max_distance = non_negative("maxDistance", raw.max_distance)?;
        let min_duration = non_negative("minDuration", raw.min_duration)?;
        if let (Some(min), Some(max)) = (min_distance, max_distance) {
            if min > max {
                return Err(StructureError::InvertedBounds { min, max });
            }
        }
        for block in [&raw.warmup, &raw.cooldown].into_iter().flatten() {
            non_negative("warmup/cooldown duration", Some(block.duration))?;
        }

        let raw_main = match (raw.main.is_empty(), raw.inline.is_empty()) {
            (false, false) => return Err(StructureError::AmbiguousMain),
            (true, false) => vec![raw.inline],
            (_, true) => raw.main,
        };
        let main = raw_main
            .into_iter()
            .map(Segment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WorkoutStructure {
            warmup: raw.warmup,
            cooldown: raw.cooldown,
            main,
            min_distance,
            max_distance,
            min_duration,
            description: raw.description,
        })
    }
}

impl From<WorkoutStructure> for RawStructure {
    fn from(structure: WorkoutStructure) -> Self {
        RawStructure {
            warmup: structure.warmup,
            cooldown: structure.cooldown,
            main: structure.main.into_iter().map(RawSegment::from).collect(),
            inline: RawSegment::default(),
            min_distance: structure.min_distance,
            max_distance: structure.max_distance,
            min_duration: structure.min_duration,
            description: structure.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn top_level_reps_normalize_into_main() {
        let structure = WorkoutStructure::from_value(json!({"reps": 6, "distance": 0.25, "rest": 90})).unwrap();
        assert_eq!(structure.main.len(), 1);
        let (rep, km) = structure.interval_set().unwrap();
        assert_eq!(rep.reps, 6);
        assert_eq!(km, 0.25);
        assert_eq!(rep.rest_seconds, Some(90.0));
    }

    #[test]
    fn nested_segments_become_composite() {
        let structure = WorkoutStructure::from_value(json!({
            "main": [
                {"segments": [{"distance": 8.0, "pace": "easy"}, {"distance": 3.0, "pace": "marathon"}]}
            ]
        }))
        .unwrap();
        assert!(structure.is_multi_segment());
        assert_eq!(structure.main[0].distance_km(), 11.0);
    }

    #[test]
    fn timed_reps_keep_seconds() {
        let structure = WorkoutStructure::from_value(json!({
            "warmup": {"duration": 15},
            "main": [{"reps": 8, "duration": 60, "rest": 90, "effort": "hard"}],
            "cooldown": {"duration": 10}
        }))
        .unwrap();
        let (rep, secs) = structure.timed_set().unwrap();
        assert_eq!(secs, 60.0);
        assert_eq!(rep.effort.as_deref(), Some("hard"));
        assert_eq!(structure.easy_minutes(), 25.0);
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert!(WorkoutStructure::from_value(json!({"reps": 0, "distance": 0.4})).is_err());
        assert!(WorkoutStructure::from_value(json!({"reps": 5, "rest": 60})).is_err());
        assert!(WorkoutStructure::from_value(json!({"main": [{"segments": []}]})).is_err());
        assert!(WorkoutStructure::from_value(json!({"main": [{}]})).is_err());
        assert!(WorkoutStructure::from_value(json!({"distance": -2.0})).is_err());
        assert!(WorkoutStructure::from_value(json!({"minDistance": 10.0, "maxDistance": 8.0})).is_err());
        assert!(WorkoutStructure::from_value(json!({"reps": 4, "distance": 1.0, "main": [{"distance": 5.0}]})).is_err());
    }

    #[test]
    fn description_only_structure_is_valid() {
        let structure = WorkoutStructure::from_value(json!({"description": "Steady aerobic running", "minDistance": 6.0})).unwrap();
        assert!(structure.main.is_empty());
        assert_eq!(structure.min_distance, Some(6.0));
    }

    #[test]
    fn serializes_into_canonical_main_form() {
        let structure = WorkoutStructure::from_value(json!({"reps": 6, "distance": 0.4, "rest": 60, "pace": "5K"})).unwrap();
        let value = structure.to_value();
        assert_eq!(value["main"][0]["reps"], json!(6));
        assert!(value.get("reps").is_none());
        assert_eq!(WorkoutStructure::from_value(value).unwrap(), structure);
    }

    #[test]
    fn segment_errors_are_typed() {
        let raw = RawSegment { reps: Some(3), ..Default::default() };
        assert_matches!(Segment::try_from(raw), Err(StructureError::MissingRepWork));
    }
}
