use crate::{
    eq::EqBandStore,
    types::{OutputFormat, SelectedFile},
};

/// Optional effect groups that can be shown, and therefore sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Eq,
    Compressor,
    Reverb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompressorPatch {
    pub threshold_db: Option<f64>,
    pub ratio: Option<f64>,
    pub attack_ms: Option<f64>,
    pub release_ms: Option<f64>,
}

impl CompressorParams {
    pub fn apply(&mut self, patch: CompressorPatch) {
        set_clamped(&mut self.threshold_db, patch.threshold_db, -60.0, 0.0);
        set_clamped(&mut self.ratio, patch.ratio, 1.0, 20.0);
        set_clamped(&mut self.attack_ms, patch.attack_ms, 0.1, 100.0);
        set_clamped(&mut self.release_ms, patch.release_ms, 10.0, 1000.0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParams {
    pub room_size: f64,
    pub wet_dry_mix: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            wet_dry_mix: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReverbPatch {
    pub room_size: Option<f64>,
    pub wet_dry_mix: Option<f64>,
}

impl ReverbParams {
    pub fn apply(&mut self, patch: ReverbPatch) {
        set_clamped(&mut self.room_size, patch.room_size, 0.0, 1.0);
        set_clamped(&mut self.wet_dry_mix, patch.wet_dry_mix, 0.0, 1.0);
    }
}

/// Everything the user has asked the service to do to one file.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectConfiguration {
    pub selected_file: Option<SelectedFile>,
    denoise_strength: f64,
    pub output_format: OutputFormat,
    pub eq: EqBandStore,
    pub apply_normalization: bool,
    pub request_waveform: bool,
    pub trim_silence: bool,
    pub show_eq: bool,
    pub show_compressor: bool,
    pub show_reverb: bool,
    pub compressor: CompressorParams,
    pub reverb: ReverbParams,
}

impl Default for EffectConfiguration {
    fn default() -> Self {
        Self {
            selected_file: None,
            denoise_strength: 0.5,
            output_format: OutputFormat::Wav,
            eq: EqBandStore::new(),
            apply_normalization: false,
            request_waveform: false,
            trim_silence: false,
            show_eq: false,
            show_compressor: false,
            show_reverb: false,
            compressor: CompressorParams::default(),
            reverb: ReverbParams::default(),
        }
    }
}

impl EffectConfiguration {
    pub fn denoise_strength(&self) -> f64 {
        self.denoise_strength
    }

    pub fn set_denoise_strength(&mut self, strength: f64) {
        set_clamped(&mut self.denoise_strength, Some(strength), 0.0, 1.0);
    }

    pub fn is_shown(&self, section: Section) -> bool {
        match section {
            Section::Eq => self.show_eq,
            Section::Compressor => self.show_compressor,
            Section::Reverb => self.show_reverb,
        }
    }

    pub fn set_shown(&mut self, section: Section, shown: bool) {
        match section {
            Section::Eq => self.show_eq = shown,
            Section::Compressor => self.show_compressor = shown,
            Section::Reverb => self.show_reverb = shown,
        }
    }
}

fn set_clamped(slot: &mut f64, value: Option<f64>, lo: f64, hi: f64) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        *slot = v.clamp(lo, hi);
    }
}
