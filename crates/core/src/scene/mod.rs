use crate::ParameterUpdate;

/// Per-frame multiplier applied to the beat flash after each frame.
const FLASH_DECAY: f32 = 0.85;

/// Abstract visual state driven by the beat clock.
///
/// This is the state a renderer would draw: a shape rotating at a
/// tempo-proportional rate and a beat row with the current beat lit. No
/// drawing happens here; the struct only integrates the routed parameters
/// once per frame.
#[derive(Debug, Clone)]
pub struct SceneInstance {
    pub beats_per_measure: u32,
    pub active_beat: u32,
    pub active_subdivision: u32,
    /// Pulse intensity in `[0, 1]`, set to full on a beat change and
    /// decaying every frame.
    pub beat_flash: f32,
    pub rotation: f32,
    rotation_speed: f32,
}

impl SceneInstance {
    pub fn new(beats_per_measure: u32) -> Self {
        Self {
            beats_per_measure,
            active_beat: 1,
            active_subdivision: 0,
            beat_flash: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
        }
    }

    /// Consumes a batch of routed parameter values.
    pub fn apply_updates(&mut self, updates: &[ParameterUpdate]) {
        for update in updates {
            match update.target.as_str() {
                "rotation" => self.rotation_speed = update.value,
                "beat" => {
                    let beat = update.value as u32;
                    if beat != self.active_beat {
                        self.active_beat = beat;
                        self.beat_flash = 1.0;
                    }
                }
                "subdivision" => self.active_subdivision = update.value as u32,
                "accent" => self.beat_flash = self.beat_flash.max(update.value),
                _ => {}
            }
        }
    }

    /// Advances the animated state by one frame: the rotation moves by the
    /// current per-frame speed and the beat flash fades.
    pub fn advance_frame(&mut self) {
        self.rotation += self.rotation_speed;
        self.beat_flash *= FLASH_DECAY;
        if self.beat_flash < 1e-3 {
            self.beat_flash = 0.0;
        }
    }
}
