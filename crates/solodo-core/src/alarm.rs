//! Interval-expiry notification sound.
//!
//! Playback is strictly best-effort: a missing output device, a missing
//! sound file, or a decode failure leaves the timer silent and logs a
//! warning. Nothing here may propagate into the state machine.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, Sink};

use crate::storage::NotificationsConfig;

/// Plays the single local audio cue at interval expiry.
pub struct AlarmPlayer {
    enabled: bool,
    volume: f32,
    custom_sound: Option<PathBuf>,
}

impl AlarmPlayer {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            enabled: config.enabled,
            volume: config.volume.min(100) as f32 / 100.0,
            custom_sound: config.custom_sound.as_ref().map(PathBuf::from),
        }
    }

    /// A player that never makes a sound (tests, headless runs).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            volume: 0.0,
            custom_sound: None,
        }
    }

    /// Play the notification cue. Failures degrade to silence.
    pub fn play(&self) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.try_play() {
            tracing::warn!("alarm playback failed, continuing silently: {}", e);
        }
    }

    fn try_play(&self) -> Result<(), Box<dyn std::error::Error>> {
        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.set_volume(self.volume);

        match &self.custom_sound {
            Some(path) => {
                let file = BufReader::new(File::open(path)?);
                sink.append(Decoder::new(file)?);
            }
            None => {
                sink.append(
                    SineWave::new(880.0)
                        .take_duration(Duration::from_millis(600))
                        .amplify(0.8),
                );
            }
        }

        sink.sleep_until_end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_player_is_a_noop() {
        // Must not touch the audio device at all.
        AlarmPlayer::disabled().play();
    }

    #[test]
    fn missing_sound_file_does_not_panic() {
        let player = AlarmPlayer::from_config(&NotificationsConfig {
            enabled: true,
            volume: 50,
            custom_sound: Some("/nonexistent/alarm.mp3".into()),
        });
        // Either the device open or the file open fails; both degrade to silence.
        player.play();
    }
}
