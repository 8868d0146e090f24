use faro_ids::SoundId;
use serde::{Deserialize, Serialize};

/// Idle -> (begin) -> Playing -> (end / clock past the last end time) -> Idle
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Playing,
}

/// One scheduled sound trigger. Fires at most once per playback: the flag
/// flips the first time the virtual clock reaches `t0`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SoundMotion {
    pub t0: f32,
    pub sound: SoundId,
    pub played: bool,
}

/// Virtual-clock state for the motion system. The engine walks the parts and
/// applies channel values; this holds what is global to a playback: the
/// clock, the state, and the sound schedule.
#[derive(Debug, Default)]
pub struct MotionPlayer {
    pub state: MotionState,
    pub clock: f32,
    pub sounds: Vec<SoundMotion>,
}

impl MotionPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.state == MotionState::Playing
    }

    /// Insert keeping the schedule ordered by begin time (stable for ties)
    pub fn add_sound(&mut self, t0: f32, sound: SoundId) {
        let pos = self.sounds.partition_point(|s| s.t0 <= t0);
        self.sounds.insert(
            pos,
            SoundMotion {
                t0,
                sound,
                played: false,
            },
        );
    }

    /// Sounds whose begin time has been reached and that have not fired yet
    pub fn due_sounds(&mut self, t: f32) -> Vec<SoundId> {
        let mut due = Vec::new();
        for s in &mut self.sounds {
            if !s.played && s.t0 <= t {
                s.played = true;
                due.push(s.sound);
            }
        }
        due
    }

    pub fn start(&mut self) {
        self.clock = 0.0;
        self.state = MotionState::Playing;
        for s in &mut self.sounds {
            s.played = false;
        }
    }

    pub fn finish(&mut self) {
        self.clock = 0.0;
        self.state = MotionState::Idle;
        self.sounds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sounds_fire_at_most_once() {
        let mut player = MotionPlayer::new();
        player.add_sound(100.0, SoundId::new(3));
        player.start();
        assert!(player.due_sounds(50.0).is_empty());
        assert_eq!(player.due_sounds(100.0), vec![SoundId::new(3)]);
        assert!(player.due_sounds(150.0).is_empty());
    }

    #[test]
    fn schedule_stays_time_ordered() {
        let mut player = MotionPlayer::new();
        player.add_sound(200.0, SoundId::new(2));
        player.add_sound(100.0, SoundId::new(1));
        player.add_sound(150.0, SoundId::new(3));
        let order: Vec<f32> = player.sounds.iter().map(|s| s.t0).collect();
        assert_eq!(order, vec![100.0, 150.0, 200.0]);
    }

    #[test]
    fn finish_clears_schedule() {
        let mut player = MotionPlayer::new();
        player.add_sound(10.0, SoundId::new(1));
        player.start();
        player.finish();
        assert!(player.sounds.is_empty());
        assert_eq!(player.state, MotionState::Idle);
        assert_eq!(player.clock, 0.0);
    }
}
