//! Sound cues and volume mixing
//!
//! The match only names cues; the mixer decides how loud they are and hands
//! them to whatever `AudioSink` the application installed. On wasm32 the
//! built-in sink synthesises each cue with Web Audio oscillators, no asset
//! files needed.

use serde::{Deserialize, Serialize};

/// Sound cues, indexed to match the audio asset table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Win = 0,
    Click = 1,
    Lose = 2,
    Explosion = 3,
    PlayerTurn = 4,
}

impl SoundCue {
    pub const ALL: [SoundCue; 5] = [
        SoundCue::Win,
        SoundCue::Click,
        SoundCue::Lose,
        SoundCue::Explosion,
        SoundCue::PlayerTurn,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Volume state shared by every cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMixer {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioMixer {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Gain a cue should be played at, or None when silent
    pub fn volume(&self) -> Option<f32> {
        let vol = if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        };
        (vol > 0.0).then_some(vol)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundCue;
    use crate::services::AudioSink;

    /// Procedural Web Audio playback
    pub struct WebAudioSink {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioSink {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// One enveloped tone starting `delay` seconds from now
        fn tone(
            ctx: &AudioContext,
            vol: f32,
            freq: f32,
            osc_type: OscillatorType,
            delay: f64,
            length: f64,
        ) {
            let Some((osc, gain)) = Self::create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(0.0, ctx.current_time()).ok();
            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + length + 0.02).ok();
        }

        /// Rising arpeggio
        fn play_win(ctx: &AudioContext, vol: f32) {
            for (i, freq) in [523.0, 659.0, 784.0, 1047.0].into_iter().enumerate() {
                Self::tone(ctx, vol * 0.3, freq, OscillatorType::Triangle, i as f64 * 0.1, 0.25);
            }
        }

        /// Falling minor phrase
        fn play_lose(ctx: &AudioContext, vol: f32) {
            for (i, freq) in [392.0, 311.0, 262.0].into_iter().enumerate() {
                Self::tone(ctx, vol * 0.3, freq, OscillatorType::Sawtooth, i as f64 * 0.18, 0.3);
            }
        }

        fn play_click(ctx: &AudioContext, vol: f32) {
            Self::tone(ctx, vol * 0.25, 900.0, OscillatorType::Square, 0.0, 0.04);
        }

        /// Deep boom with a crackle on top
        fn play_explosion(ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            if let Some((osc, gain)) = Self::create_osc(ctx, 120.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.7, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                    .ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(30.0, t + 0.5)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.55).ok();
            }
            if let Some((osc, gain)) = Self::create_osc(ctx, 80.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.frequency().set_value_at_time(2200.0, t + 0.02).ok();
                osc.frequency().set_value_at_time(140.0, t + 0.05).ok();
                osc.frequency().set_value_at_time(1600.0, t + 0.08).ok();
                osc.frequency().set_value_at_time(60.0, t + 0.12).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }

        /// Two-note chime
        fn play_player_turn(ctx: &AudioContext, vol: f32) {
            Self::tone(ctx, vol * 0.3, 660.0, OscillatorType::Sine, 0.0, 0.15);
            Self::tone(ctx, vol * 0.3, 880.0, OscillatorType::Sine, 0.12, 0.2);
        }
    }

    impl AudioSink for WebAudioSink {
        fn play(&mut self, cue: SoundCue, volume: f32) {
            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend the context until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Win => Self::play_win(ctx, volume),
                SoundCue::Click => Self::play_click(ctx, volume),
                SoundCue::Lose => Self::play_lose(ctx, volume),
                SoundCue::Explosion => Self::play_explosion(ctx, volume),
                SoundCue::PlayerTurn => Self::play_player_turn(ctx, volume),
            }
        }
    }
}
