use std::fmt::Write as _;

use crate::{mapping::ParameterUpdate, scene::SceneInstance};

/// Presentation backend for the terminal demo. It owns the scene, feeds it
/// parameter updates, and draws each frame as a single line of text: the
/// beat row with the active beat marked, the subdivision index, and the
/// rotation readout.
#[derive(Debug)]
pub struct RenderGraph {
    scene: SceneInstance,
    last_updates: Vec<ParameterUpdate>,
}

impl RenderGraph {
    pub fn new(scene: SceneInstance) -> Self {
        Self {
            scene,
            last_updates: Vec::new(),
        }
    }

    pub fn scene(&self) -> &SceneInstance {
        &self.scene
    }

    pub fn apply_updates(&mut self, updates: Vec<ParameterUpdate>) {
        self.last_updates = updates;
        self.scene.apply_updates(&self.last_updates);
    }

    pub fn advance_frame(&mut self) {
        self.scene.advance_frame();
    }

    /// Formats the current frame.
    pub fn draw_line(&self) -> String {
        let mut line = String::new();

        for beat in 1..=self.scene.beats_per_measure {
            if beat == self.scene.active_beat {
                let _ = write!(line, "[{beat}]");
            } else {
                let _ = write!(line, " {beat} ");
            }
        }

        let _ = write!(
            line,
            " | sub {} | rot {:.3}",
            self.scene.active_subdivision, self.scene.rotation
        );
        line
    }
}
