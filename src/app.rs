//! Application context and fixed-step driver
//!
//! `Game` owns the match and every service it talks to. Each frame it runs
//! whole simulation ticks out of an accumulator, then routes the events the
//! match queued to the HUD, camera, audio, rank and level services.

use log::warn;

use crate::audio::AudioMixer;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::rank::RankPoints;
use crate::services::Services;
use crate::sim::{Command, GameEvent, MatchState, TickInput, tick};

pub struct Game {
    pub state: MatchState,
    pub services: Services,
    pub mixer: AudioMixer,
    pub rank: RankPoints,
    accumulator: f32,
    input: TickInput,
}

impl Game {
    pub fn new(state: MatchState, services: Services) -> Self {
        let rank = RankPoints::load(services.scores.as_ref());
        Self {
            state,
            services,
            mixer: AudioMixer::new(),
            rank,
            accumulator: 0.0,
            input: TickInput::default(),
        }
    }

    /// Queue a player command for the next tick
    pub fn push(&mut self, command: Command) {
        self.input.push(command);
    }

    pub fn start_match(&mut self) {
        self.state.start_match();
        self.dispatch();
    }

    pub fn stop_match(&mut self) {
        self.state.stop_match();
        self.dispatch();
    }

    pub fn reset_match(&mut self) {
        self.state.reset_match();
        self.accumulator = 0.0;
        self.input.clear();
        self.dispatch();
    }

    /// Run simulation ticks for a frame of `dt` seconds. Returns how many ran.
    pub fn update(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop time we could not catch up on
        self.accumulator = self.accumulator.min(MAX_SUBSTEPS as f32 * SIM_DT);
        substeps
    }

    /// Exactly one tick, camera included
    pub fn step(&mut self) {
        tick(&mut self.state, &self.input, SIM_DT);
        // Commands are one-shot
        self.input.clear();

        let camera_done = self
            .services
            .camera
            .as_mut()
            .is_some_and(|camera| camera.advance(SIM_DT));
        if camera_done {
            self.state.camera_ready();
        }
        self.dispatch();
    }

    /// Route queued events until the match stops producing them
    fn dispatch(&mut self) {
        loop {
            let events = self.state.drain_events();
            if events.is_empty() {
                break;
            }
            for event in &events {
                self.handle(event);
            }
        }
    }

    fn handle(&mut self, event: &GameEvent) {
        match event {
            GameEvent::CameraRequested(shot) => match self.services.camera.as_mut() {
                Some(camera) => camera.begin(*shot),
                None => self.state.camera_ready(),
            },
            GameEvent::PlaySound(cue) => {
                if let (Some(audio), Some(volume)) = (self.services.audio.as_mut(), self.mixer.volume()) {
                    audio.play(*cue, volume);
                }
            }
            GameEvent::MatchResult { points_delta, .. } => {
                self.rank.apply(*points_delta);
                self.rank.save(self.services.scores.as_mut());
            }
            GameEvent::LevelCompleted { stars } => {
                if let Some(levels) = self.services.levels.as_mut() {
                    levels.complete_level(*stars);
                }
            }
            GameEvent::MatchAborted(e) => warn!("Match aborted: {e}"),
            _ => {}
        }
        if let Some(hud) = self.services.hud.as_mut() {
            hud.on_event(event);
        }
    }
}
