//! Core library for the Metronome Visualiser application.
//!
//! The heart of the crate is [`clock::BeatClock`], a phase-accurate beat
//! clock that converts caller-supplied wall-clock timestamps into
//! beat/subdivision positions. The remaining modules are the thin layers
//! around it: configuration, parameter mapping, abstract scene state, the
//! terminal frame renderer, and ahead-of-time schedule export.

pub mod clock;
pub mod config;
pub mod error;
pub mod mapping;
pub mod render;
pub mod scene;
pub mod timeline;

pub use clock::{BeatClock, BeatSample, ClockHandle, TempoSpec};
pub use config::{AppConfig, ClockConfig, DisplayConfig};
pub use error::{MetronomeError, Result};
pub use mapping::{MappingMatrix, ParameterUpdate};
pub use render::RenderGraph;
pub use scene::SceneInstance;
pub use timeline::{BeatSchedule, ScheduledBeat};
