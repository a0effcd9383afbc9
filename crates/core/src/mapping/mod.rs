use serde::{Deserialize, Serialize};

use crate::BeatSample;

/// Rotation applied per frame for each beat-per-second of tempo.
const ROTATION_GAIN: f64 = 0.01;

/// Runtime mapping matrix populated with [`ParameterUpdate`] values after
/// each beat sample is read.
#[derive(Debug, Default, Clone)]
pub struct MappingMatrix {
    updates: Vec<ParameterUpdate>,
}

impl MappingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn updates(&self) -> &[ParameterUpdate] {
        &self.updates
    }

    pub fn push(&mut self, update: ParameterUpdate) {
        self.updates.push(update);
    }

    /// Rebuilds the update set from the latest clock sample.
    ///
    /// The rotation value is a per-frame increment proportional to the tempo
    /// (`bpm / 60 * 0.01`), and it drops to zero while the clock is paused so
    /// a driven shape stands still between run segments.
    pub fn apply_from_sample(&mut self, sample: &BeatSample) {
        self.clear();

        let rotation = if sample.running {
            (sample.bpm / 60.0 * ROTATION_GAIN) as f32
        } else {
            0.0
        };

        self.push(ParameterUpdate {
            target: "rotation".to_string(),
            value: rotation,
        });
        self.push(ParameterUpdate {
            target: "beat".to_string(),
            value: sample.beat as f32,
        });
        self.push(ParameterUpdate {
            target: "subdivision".to_string(),
            value: sample.subdivision as f32,
        });
        self.push(ParameterUpdate {
            target: "accent".to_string(),
            value: if sample.beat == 1 && sample.subdivision == 0 {
                1.0
            } else {
                0.0
            },
        });
    }
}

/// Concrete value routed to a scene parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub target: String,
    pub value: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(beat: u32, subdivision: u32, running: bool, bpm: f64) -> BeatSample {
        BeatSample {
            beat,
            subdivision,
            running,
            bpm,
        }
    }

    fn value_of(matrix: &MappingMatrix, target: &str) -> f32 {
        matrix
            .updates()
            .iter()
            .find(|update| update.target == target)
            .map(|update| update.value)
            .expect("target should be present")
    }

    #[test]
    fn rotation_follows_the_tempo_while_running() {
        let mut matrix = MappingMatrix::new();
        matrix.apply_from_sample(&sample(2, 0, true, 120.0));

        assert!((value_of(&matrix, "rotation") - 0.02).abs() < 1e-6);
        assert_eq!(value_of(&matrix, "beat"), 2.0);
    }

    #[test]
    fn rotation_stops_while_paused() {
        let mut matrix = MappingMatrix::new();
        matrix.apply_from_sample(&sample(3, 1, false, 180.0));

        assert_eq!(value_of(&matrix, "rotation"), 0.0);
    }

    #[test]
    fn accent_fires_only_on_the_downbeat() {
        let mut matrix = MappingMatrix::new();

        matrix.apply_from_sample(&sample(1, 0, true, 120.0));
        assert_eq!(value_of(&matrix, "accent"), 1.0);

        matrix.apply_from_sample(&sample(1, 2, true, 120.0));
        assert_eq!(value_of(&matrix, "accent"), 0.0);

        matrix.apply_from_sample(&sample(3, 0, true, 120.0));
        assert_eq!(value_of(&matrix, "accent"), 0.0);
    }

    #[test]
    fn updates_are_rebuilt_on_every_sample() {
        let mut matrix = MappingMatrix::new();
        matrix.apply_from_sample(&sample(1, 0, true, 120.0));
        matrix.apply_from_sample(&sample(2, 0, true, 120.0));

        assert_eq!(matrix.updates().len(), 4);
        assert_eq!(value_of(&matrix, "beat"), 2.0);
    }
}
