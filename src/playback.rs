use tracing::info;

use crate::error::FxError;

/// The host's audio element.
pub trait Player {
    /// Length of the loaded audio, once known.
    fn duration(&self) -> Option<f64>;
    fn seek(&mut self, seconds: f64);
    /// Starts playback. Hosts may refuse, e.g. when autoplay is blocked.
    fn play(&mut self) -> Result<(), FxError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum SeekOutcome {
    Playing(f64),
    /// Position moved but the host refused to start playback.
    Blocked { position: f64, notice: String },
}

/// Moves `player` to `seconds` and tries to resume.
pub fn seek_and_resume(player: &mut dyn Player, seconds: f64) -> SeekOutcome {
    player.seek(seconds);
    match player.play() {
        Ok(()) => SeekOutcome::Playing(seconds),
        Err(e) => {
            info!(position = seconds, error = %e, "playback did not resume after seek");
            SeekOutcome::Blocked {
                position: seconds,
                notice: format!("Press play to continue ({e})"),
            }
        }
    }
}
