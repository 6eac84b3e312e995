use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::error::{FxError, Result};

pub const SUPPORTED_FORMATS: [OutputFormat; 3] =
    [OutputFormat::Wav, OutputFormat::Mp3, OutputFormat::Flac];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
    Flac,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Flac => "flac",
        }
    }

    pub fn mime(self) -> String {
        format!("audio/{}", self.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        SUPPORTED_FORMATS
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| {
                FxError::Validation(format!(
                    "Unsupported output format: {lower}. Supported formats are: wav, mp3, flac"
                ))
            })
    }
}

/// The user's chosen source file: its display name and raw contents.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name);
        Self { name, bytes, mime }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            FxError::Validation(format!("Cannot read {}: {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        Ok(Self::new(name, bytes))
    }

    /// File name without its final extension, as the service names outputs.
    pub fn stem(&self) -> &str {
        stem_of(&self.name)
    }
}

pub(crate) fn stem_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ if name.is_empty() => "audio",
        _ => name,
    }
}

fn guess_mime(name: &str) -> String {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav".into(),
        "mp3" => "audio/mpeg".into(),
        "flac" => "audio/flac".into(),
        _ => "application/octet-stream".into(),
    }
}

/// Playable audio bytes tagged with their MIME type, before registration.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// What the service reports it applied, echoed in structured replies.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AppliedSettings {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "denoise_strength_applied")]
    pub denoise_strength: Option<f64>,
    #[serde(default, rename = "eq_bands_applied")]
    pub eq_bands: Option<serde_json::Value>,
    #[serde(default, rename = "normalization_applied")]
    pub normalization: Option<bool>,
    #[serde(default, rename = "trim_silence_applied")]
    pub trim_silence: Option<bool>,
    #[serde(default, rename = "compressor_settings_applied")]
    pub compressor: Option<serde_json::Value>,
    #[serde(default, rename = "reverb_settings_applied")]
    pub reverb: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("FLAC".parse::<OutputFormat>().unwrap(), OutputFormat::Flac);
        assert_eq!(" mp3 ".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
    }

    #[test]
    fn output_format_rejects_unknown() {
        let err = "ogg".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("Unsupported output format: ogg"));
    }

    #[test]
    fn stem_strips_last_extension_only() {
        assert_eq!(stem_of("take.final.wav"), "take.final");
        assert_eq!(stem_of("noext"), "noext");
        assert_eq!(stem_of(".hidden"), ".hidden");
        assert_eq!(stem_of(""), "audio");
    }

    #[test]
    fn selected_file_guesses_mime_from_extension() {
        let f = SelectedFile::new("voice.MP3", vec![1, 2, 3]);
        assert_eq!(f.mime, "audio/mpeg");
        assert_eq!(f.stem(), "voice");
    }
}
