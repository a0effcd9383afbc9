use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{MetronomeError, Result};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Tempo and time-signature configuration for the beat clock.
///
/// Instances are validated on construction, so a held value is always
/// usable: the BPM is finite and positive and both counts are at least one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSpec {
    bpm: f64,
    beats_per_measure: u32,
    subdivisions_per_beat: u32,
}

impl TempoSpec {
    /// Creates a new tempo specification.
    ///
    /// The BPM must be finite and greater than zero; `beats_per_measure`
    /// and `subdivisions_per_beat` must be at least one. There is no upper
    /// BPM limit.
    pub fn new(bpm: f64, beats_per_measure: u32, subdivisions_per_beat: u32) -> Result<Self> {
        if !bpm.is_finite() {
            return Err(MetronomeError::InvalidConfiguration("bpm must be finite"));
        }
        if bpm <= 0.0 {
            return Err(MetronomeError::InvalidConfiguration(
                "bpm must be greater than zero",
            ));
        }
        if beats_per_measure == 0 {
            return Err(MetronomeError::InvalidConfiguration(
                "beats per measure must be at least one",
            ));
        }
        if subdivisions_per_beat == 0 {
            return Err(MetronomeError::InvalidConfiguration(
                "subdivisions per beat must be at least one",
            ));
        }

        Ok(Self {
            bpm,
            beats_per_measure,
            subdivisions_per_beat,
        })
    }

    /// Returns a copy with a different BPM and the same counts.
    pub fn with_bpm(&self, bpm: f64) -> Result<Self> {
        Self::new(bpm, self.beats_per_measure, self.subdivisions_per_beat)
    }

    /// Beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Number of beats in one measure.
    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    /// Number of equal subdivisions of a single beat.
    pub fn subdivisions_per_beat(&self) -> u32 {
        self.subdivisions_per_beat
    }

    /// Duration of one beat in seconds.
    pub fn beat_duration_seconds(&self) -> f64 {
        SECONDS_PER_MINUTE / self.bpm
    }

    /// Beat-phase advanced per second of wall-clock time.
    pub fn beats_per_second(&self) -> f64 {
        self.bpm / SECONDS_PER_MINUTE
    }
}

impl Default for TempoSpec {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_measure: 4,
            subdivisions_per_beat: 1,
        }
    }
}

impl fmt::Display for TempoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} BPM, {} beats/measure, {} subdivisions/beat",
            self.bpm, self.beats_per_measure, self.subdivisions_per_beat
        )
    }
}

/// Beat position reported to the presentation layer once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatSample {
    /// Beat within the measure, in `1..=beats_per_measure`.
    pub beat: u32,
    /// Subdivision within the beat, in `0..subdivisions_per_beat`.
    pub subdivision: u32,
    /// Whether the clock was running at the sampled instant.
    pub running: bool,
    /// BPM in effect at the sampled instant.
    pub bpm: f64,
}

/// Phase-continuous beat clock.
///
/// The clock performs no timekeeping of its own: every operation takes a
/// `now` timestamp in seconds from a caller-owned monotonic source, and the
/// position is computed lazily from the stored epoch. Sampling more or less
/// often never changes the reported positions, only how smoothly a caller
/// can animate them.
///
/// Elapsed position is accumulated as a real-valued phase in beat units
/// rather than seconds, which keeps pause/resume and tempo changes purely
/// additive: a tempo change converts the already-elapsed segment under the
/// old tempo and only alters the rate of future advancement.
#[derive(Debug, Clone)]
pub struct BeatClock {
    spec: TempoSpec,
    running: bool,
    epoch: f64,
    accumulated_phase: f64,
}

impl BeatClock {
    /// Creates a paused clock at beat one with the given configuration.
    pub fn new(spec: TempoSpec) -> Self {
        Self {
            spec,
            running: false,
            epoch: 0.0,
            accumulated_phase: 0.0,
        }
    }

    /// Currently active configuration.
    pub fn spec(&self) -> TempoSpec {
        self.spec
    }

    /// Whether the clock is advancing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the clock at `now`. A second call while already running is a
    /// no-op; accumulated phase from earlier run segments is kept.
    pub fn play(&mut self, now: f64) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.validate_timestamp(now)?;

        self.running = true;
        self.epoch = now;
        Ok(())
    }

    /// Stops the clock at `now`, folding the elapsed phase of the current
    /// run segment into the accumulator. A second call while already paused
    /// is a no-op.
    pub fn pause(&mut self, now: f64) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.validate_timestamp(now)?;

        self.accumulated_phase += (now - self.epoch) * self.spec.beats_per_second();
        self.running = false;
        Ok(())
    }

    /// Replaces the tempo configuration without moving the beat position.
    ///
    /// Phase elapsed so far is captured under the old tempo before the new
    /// one takes effect, so the position reported at `now` is identical on
    /// both sides of the change.
    pub fn set_tempo(&mut self, spec: TempoSpec, now: f64) -> Result<()> {
        self.validate_timestamp(now)?;

        if self.running {
            self.accumulated_phase += (now - self.epoch) * self.spec.beats_per_second();
            self.epoch = now;
        }
        self.spec = spec;
        Ok(())
    }

    /// Replaces only the BPM, keeping the measure and subdivision counts.
    ///
    /// Fails with `InvalidConfiguration` for a non-positive or non-finite
    /// BPM; the previous configuration then stays in effect unchanged.
    pub fn set_tempo_bpm(&mut self, bpm: f64, now: f64) -> Result<()> {
        let spec = self.spec.with_bpm(bpm)?;
        self.set_tempo(spec, now)
    }

    /// Returns the clock to beat one, subdivision zero. The running flag is
    /// left alone; a running clock restarts its segment at `now`.
    pub fn reset(&mut self, now: f64) -> Result<()> {
        self.validate_timestamp(now)?;

        self.accumulated_phase = 0.0;
        if self.running {
            self.epoch = now;
        }
        Ok(())
    }

    /// Total elapsed beat-phase at `now`, as a real number of beats.
    pub fn elapsed_beats(&self, now: f64) -> Result<f64> {
        self.validate_timestamp(now)?;

        let mut total = self.accumulated_phase;
        if self.running {
            total += (now - self.epoch) * self.spec.beats_per_second();
        }
        Ok(total)
    }

    /// Reads the beat position at `now`. Pure: the clock is not advanced,
    /// and calling at any rate (including not at all for a while) yields the
    /// same positions at the same timestamps.
    pub fn sample(&self, now: f64) -> Result<BeatSample> {
        let total = self.elapsed_beats(now)?;
        let beats_per_measure = u64::from(self.spec.beats_per_measure());
        let subdivisions = u64::from(self.spec.subdivisions_per_beat());

        let beat = (total.floor() as u64 % beats_per_measure) as u32 + 1;
        let subdivision = ((total * subdivisions as f64).floor() as u64 % subdivisions) as u32;

        Ok(BeatSample {
            beat,
            subdivision,
            running: self.running,
            bpm: self.spec.bpm(),
        })
    }

    fn validate_timestamp(&self, now: f64) -> Result<()> {
        if !now.is_finite() {
            return Err(MetronomeError::InvalidTimestamp("timestamp must be finite"));
        }
        if self.running && now < self.epoch {
            return Err(MetronomeError::InvalidTimestamp(
                "timestamp precedes the current epoch",
            ));
        }
        Ok(())
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::new(TempoSpec::default())
    }
}

/// Shared, thread-safe handle over a [`BeatClock`].
///
/// The clock itself is single-owner; this wrapper serialises the mutators
/// and the read under one lock for callers that need to reach the clock
/// from more than one place.
#[derive(Clone)]
pub struct ClockHandle {
    shared: Arc<Mutex<BeatClock>>,
}

impl ClockHandle {
    pub fn new(clock: BeatClock) -> Self {
        Self {
            shared: Arc::new(Mutex::new(clock)),
        }
    }

    pub fn play(&self, now: f64) -> Result<()> {
        self.lock()?.play(now)
    }

    pub fn pause(&self, now: f64) -> Result<()> {
        self.lock()?.pause(now)
    }

    pub fn reset(&self, now: f64) -> Result<()> {
        self.lock()?.reset(now)
    }

    pub fn set_tempo(&self, spec: TempoSpec, now: f64) -> Result<()> {
        self.lock()?.set_tempo(spec, now)
    }

    pub fn set_tempo_bpm(&self, bpm: f64, now: f64) -> Result<()> {
        self.lock()?.set_tempo_bpm(bpm, now)
    }

    pub fn sample(&self, now: f64) -> Result<BeatSample> {
        self.lock()?.sample(now)
    }

    pub fn is_running(&self) -> Result<bool> {
        Ok(self.lock()?.is_running())
    }

    pub fn spec(&self) -> Result<TempoSpec> {
        Ok(self.lock()?.spec())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BeatClock>> {
        self.shared
            .lock()
            .map_err(|_| MetronomeError::msg("beat clock lock has been poisoned"))
    }
}

impl fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockHandle").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(bpm: f64, beats: u32, subdivisions: u32) -> TempoSpec {
        TempoSpec::new(bpm, beats, subdivisions).unwrap()
    }

    #[test]
    fn rejects_invalid_tempo_configurations() {
        for bpm in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let err = TempoSpec::new(bpm, 4, 1).unwrap_err();
            assert!(matches!(err, MetronomeError::InvalidConfiguration(_)));
        }

        assert!(matches!(
            TempoSpec::new(120.0, 0, 1).unwrap_err(),
            MetronomeError::InvalidConfiguration(_)
        ));
        assert!(matches!(
            TempoSpec::new(120.0, 4, 0).unwrap_err(),
            MetronomeError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn accepts_tempos_outside_the_ui_range() {
        assert!(TempoSpec::new(12.5, 4, 1).is_ok());
        assert!(TempoSpec::new(960.0, 4, 1).is_ok());
    }

    #[test]
    fn default_spec_is_common_time_at_120() {
        let spec = TempoSpec::default();
        assert_eq!(spec.bpm(), 120.0);
        assert_eq!(spec.beats_per_measure(), 4);
        assert_eq!(spec.subdivisions_per_beat(), 1);
        assert_eq!(spec.beat_duration_seconds(), 0.5);
    }

    #[test]
    fn starts_paused_on_beat_one() {
        let clock = BeatClock::default();
        let sample = clock.sample(0.0).unwrap();

        assert_eq!(sample.beat, 1);
        assert_eq!(sample.subdivision, 0);
        assert!(!sample.running);
    }

    #[test]
    fn advances_beats_while_running() {
        let mut clock = BeatClock::new(spec(120.0, 4, 1));
        clock.play(0.0).unwrap();

        assert_eq!(clock.sample(0.25).unwrap().beat, 1);
        assert_eq!(clock.sample(0.75).unwrap().beat, 2);
        assert_eq!(clock.sample(1.25).unwrap().beat, 3);
        assert_eq!(clock.sample(1.75).unwrap().beat, 4);
        // 2.0 seconds = 4.0 beats: back around to the downbeat.
        assert_eq!(clock.sample(2.0).unwrap().beat, 1);
    }

    #[test]
    fn subdivisions_track_the_same_phase_as_beats() {
        let mut clock = BeatClock::new(spec(60.0, 4, 4));
        clock.play(0.0).unwrap();

        let s = clock.sample(0.25).unwrap();
        assert_eq!((s.beat, s.subdivision), (1, 1));
        let s = clock.sample(0.75).unwrap();
        assert_eq!((s.beat, s.subdivision), (1, 3));
        let s = clock.sample(1.0).unwrap();
        assert_eq!((s.beat, s.subdivision), (2, 0));
        let s = clock.sample(2.5).unwrap();
        assert_eq!((s.beat, s.subdivision), (3, 2));
    }

    #[test]
    fn pause_does_not_move_the_position() {
        let mut clock = BeatClock::new(spec(97.3, 5, 3));
        clock.play(0.0).unwrap();

        let before = clock.sample(1.37).unwrap();
        clock.pause(1.37).unwrap();
        let after = clock.sample(1.37).unwrap();

        assert_eq!(before.beat, after.beat);
        assert_eq!(before.subdivision, after.subdivision);

        // Paused position is independent of the sampling timestamp.
        let much_later = clock.sample(500.0).unwrap();
        assert_eq!(after.beat, much_later.beat);
        assert_eq!(after.subdivision, much_later.subdivision);
    }

    #[test]
    fn play_and_pause_are_idempotent() {
        let mut clock = BeatClock::new(spec(120.0, 4, 1));
        clock.play(0.0).unwrap();
        clock.play(0.5).unwrap();

        // The second play must not re-anchor the epoch.
        assert_eq!(clock.elapsed_beats(1.0).unwrap(), 2.0);

        clock.pause(1.0).unwrap();
        clock.pause(2.0).unwrap();
        assert_eq!(clock.elapsed_beats(10.0).unwrap(), 2.0);
    }

    #[test]
    fn resume_continues_from_the_paused_phase() {
        let mut clock = BeatClock::new(spec(120.0, 4, 1));
        clock.play(0.0).unwrap();
        clock.pause(0.75).unwrap();
        clock.play(10.0).unwrap();

        // 1.5 beats from the first segment plus 1.0 beat after resuming.
        assert_eq!(clock.elapsed_beats(10.5).unwrap(), 2.5);
    }

    #[test]
    fn repeated_play_pause_cycles_do_not_drift() {
        let mut clock = BeatClock::new(spec(120.0, 4, 4));
        let mut now = 0.0;

        for _ in 0..1000 {
            clock.play(now).unwrap();
            now += 0.25;
            clock.pause(now).unwrap();
            now += 0.125;
        }

        // 1000 segments of 0.25 s at 2 beats/s.
        let total = clock.elapsed_beats(now).unwrap();
        assert!((total - 500.0).abs() < 1e-9);
    }

    #[test]
    fn tempo_change_preserves_the_position() {
        let mut clock = BeatClock::new(spec(60.0, 4, 1));
        clock.play(0.0).unwrap();

        let before = clock.sample(1.5).unwrap();
        assert_eq!(before.beat, 2);

        clock.set_tempo(spec(120.0, 4, 1), 1.5).unwrap();
        let after = clock.sample(1.5).unwrap();
        assert_eq!(after.beat, 2);
        assert_eq!(clock.elapsed_beats(1.5).unwrap(), 1.5);

        // Only the rate of future advancement changes.
        assert_eq!(clock.elapsed_beats(2.25).unwrap(), 3.0);
        assert_eq!(clock.sample(2.25).unwrap().beat, 4);
    }

    #[test]
    fn tempo_change_while_paused_keeps_accumulated_phase() {
        let mut clock = BeatClock::new(spec(60.0, 4, 1));
        clock.play(0.0).unwrap();
        clock.pause(1.0).unwrap();

        clock.set_tempo(spec(120.0, 4, 1), 1.0).unwrap();
        assert_eq!(clock.elapsed_beats(1.0).unwrap(), 1.0);

        clock.play(2.0).unwrap();
        assert_eq!(clock.elapsed_beats(2.5).unwrap(), 2.0);
    }

    #[test]
    fn rejected_bpm_keeps_the_previous_tempo() {
        let mut clock = BeatClock::new(spec(60.0, 4, 1));
        clock.play(0.0).unwrap();

        let err = clock.set_tempo_bpm(0.0, 1.0).unwrap_err();
        assert!(matches!(err, MetronomeError::InvalidConfiguration(_)));

        assert_eq!(clock.spec().bpm(), 60.0);
        assert_eq!(clock.elapsed_beats(2.0).unwrap(), 2.0);
    }

    #[test]
    fn long_run_accumulates_exact_beats() {
        let mut clock = BeatClock::new(spec(120.0, 4, 4));
        clock.play(0.0).unwrap();

        assert_eq!(clock.elapsed_beats(3600.0).unwrap(), 7200.0);
        let sample = clock.sample(3600.0).unwrap();
        assert_eq!(sample.beat, 1);
        assert_eq!(sample.subdivision, 0);
    }

    #[test]
    fn reset_returns_to_beat_one() {
        let mut clock = BeatClock::new(spec(97.0, 7, 3));
        clock.play(0.0).unwrap();
        clock.pause(12.34).unwrap();
        clock.reset(12.34).unwrap();

        let sample = clock.sample(99.0).unwrap();
        assert_eq!(sample.beat, 1);
        assert_eq!(sample.subdivision, 0);
        assert!(!sample.running);
    }

    #[test]
    fn reset_while_running_restarts_the_segment() {
        let mut clock = BeatClock::new(spec(120.0, 4, 1));
        clock.play(0.0).unwrap();
        clock.reset(10.0).unwrap();

        assert!(clock.is_running());
        assert_eq!(clock.sample(10.0).unwrap().beat, 1);
        assert_eq!(clock.sample(10.5).unwrap().beat, 2);
    }

    #[test]
    fn sampling_rate_does_not_affect_positions() {
        let mut clock = BeatClock::new(spec(137.0, 4, 2));
        clock.play(0.0).unwrap();

        // 10 Hz and 1000 Hz grids must agree at coincident timestamps.
        let coarse: Vec<BeatSample> = (0..=30)
            .map(|i| clock.sample(f64::from(i) * 0.1).unwrap())
            .collect();
        let fine: Vec<BeatSample> = (0..=3000)
            .map(|i| clock.sample(f64::from(i) * 0.001).unwrap())
            .collect();

        for (i, sample) in coarse.iter().enumerate() {
            assert_eq!(*sample, fine[i * 100]);
        }
    }

    #[test]
    fn rejects_non_finite_timestamps() {
        let mut clock = BeatClock::default();

        for now in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                clock.sample(now).unwrap_err(),
                MetronomeError::InvalidTimestamp(_)
            ));
            assert!(matches!(
                clock.play(now).unwrap_err(),
                MetronomeError::InvalidTimestamp(_)
            ));
        }
        assert!(!clock.is_running());
    }

    #[test]
    fn rejects_timestamps_behind_the_epoch_while_running() {
        let mut clock = BeatClock::default();
        clock.play(5.0).unwrap();

        assert!(matches!(
            clock.sample(4.0).unwrap_err(),
            MetronomeError::InvalidTimestamp(_)
        ));
        assert!(matches!(
            clock.pause(4.0).unwrap_err(),
            MetronomeError::InvalidTimestamp(_)
        ));

        // The rejected pause must leave the clock untouched.
        assert!(clock.is_running());
        assert_eq!(clock.elapsed_beats(6.0).unwrap(), 2.0);
    }

    #[test]
    fn handle_serialises_shared_access() {
        let handle = ClockHandle::new(BeatClock::new(spec(120.0, 4, 1)));
        let reader = handle.clone();

        handle.play(0.0).unwrap();
        let sample = reader.sample(0.75).unwrap();

        assert_eq!(sample.beat, 2);
        assert!(reader.is_running().unwrap());

        handle.pause(1.0).unwrap();
        assert!(!reader.is_running().unwrap());
    }

    #[test]
    fn handle_works_across_threads() {
        let handle = ClockHandle::new(BeatClock::new(spec(120.0, 4, 1)));
        handle.play(0.0).unwrap();

        let worker = handle.clone();
        let sample = std::thread::spawn(move || worker.sample(1.25).unwrap())
            .join()
            .unwrap();

        assert_eq!(sample.beat, 3);
    }
}
