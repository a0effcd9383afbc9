use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MetronomeError, Result, TempoSpec};

/// One metronome tick in a precomputed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBeat {
    pub time_seconds: f64,
    /// Beat within the measure, 1-based.
    pub beat: u32,
    /// Subdivision within the beat, 0-based.
    pub subdivision: u32,
    /// Whether this tick is the downbeat of a measure.
    pub accent: bool,
}

/// Ahead-of-time enumeration of every subdivision tick for a fixed tempo
/// over a bounded time window, suitable for offline consumers that do not
/// want to poll a live clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatSchedule {
    pub bpm: f64,
    pub beats_per_measure: u32,
    pub subdivisions_per_beat: u32,
    pub duration_seconds: f64,
    pub events: Vec<ScheduledBeat>,
}

impl BeatSchedule {
    /// Generates all ticks in `[0, duration_seconds]`, downbeat first.
    pub fn generate(spec: &TempoSpec, duration_seconds: f64) -> Result<Self> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(MetronomeError::InvalidConfiguration(
                "schedule duration must be finite and non-negative",
            ));
        }

        let beats_per_measure = u64::from(spec.beats_per_measure());
        let subdivisions = u64::from(spec.subdivisions_per_beat());
        let interval = spec.beat_duration_seconds() / subdivisions as f64;
        let ticks = (duration_seconds / interval).floor() as u64;

        let mut events = Vec::with_capacity(ticks as usize + 1);
        for index in 0..=ticks {
            let beat = ((index / subdivisions) % beats_per_measure) as u32 + 1;
            let subdivision = (index % subdivisions) as u32;
            events.push(ScheduledBeat {
                time_seconds: index as f64 * interval,
                beat,
                subdivision,
                accent: beat == 1 && subdivision == 0,
            });
        }

        Ok(Self {
            bpm: spec.bpm(),
            beats_per_measure: spec.beats_per_measure(),
            subdivisions_per_beat: spec.subdivisions_per_beat(),
            duration_seconds,
            events,
        })
    }

    /// Writes the schedule to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
