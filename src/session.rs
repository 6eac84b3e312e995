//! The single owned application state and its update actions.

use crate::{
    controller::{JobController, JobState, Notice, PendingJob},
    effects::{CompressorPatch, EffectConfiguration, ReverbPatch, Section},
    eq::BandPatch,
    error::Result,
    io::net::ProcessingService,
    response::RawResponse,
    types::{OutputFormat, SelectedFile},
    waveform::WaveformView,
};

pub const ORIGINAL_COLOR: &str = "#6b7280";
pub const PROCESSED_COLOR: &str = "#2563eb";

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SelectFile(Option<SelectedFile>),
    SetDenoise(f64),
    SetFormat(OutputFormat),
    ShowSection(Section, bool),
    AddBand,
    RemoveBand(String),
    UpdateBand(String, BandPatch),
    PatchCompressor(CompressorPatch),
    PatchReverb(ReverbPatch),
    SetNormalization(bool),
    SetRequestWaveform(bool),
    SetTrimSilence(bool),
}

pub struct Session {
    pub config: EffectConfiguration,
    jobs: JobController,
    pub original_view: WaveformView,
    pub processed_view: WaveformView,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(EffectConfiguration::default())
    }

    pub fn with_config(config: EffectConfiguration) -> Self {
        let mut session = Self {
            config: EffectConfiguration::default(),
            jobs: JobController::new(),
            original_view: WaveformView::new(ORIGINAL_COLOR),
            processed_view: WaveformView::new(PROCESSED_COLOR),
        };
        let file = config.selected_file.clone();
        session.config = config;
        session.jobs.set_preview(file.as_ref());
        session
    }

    pub fn jobs(&self) -> &JobController {
        &self.jobs
    }

    pub fn state(&self) -> &JobState {
        self.jobs.state()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.jobs.take_notices()
    }

    /// Applies one edit. Inputs are locked while a job is in flight, so
    /// edits then are dropped and `false` is returned.
    pub fn dispatch(&mut self, action: Action) -> bool {
        if self.jobs.is_busy() {
            return false;
        }
        let cfg = &mut self.config;
        match action {
            Action::SelectFile(file) => {
                self.jobs.set_preview(file.as_ref());
                cfg.selected_file = file;
            }
            Action::SetDenoise(v) => cfg.set_denoise_strength(v),
            Action::SetFormat(f) => cfg.output_format = f,
            Action::ShowSection(s, shown) => cfg.set_shown(s, shown),
            Action::AddBand => {
                cfg.eq.add_band();
            }
            Action::RemoveBand(id) => {
                cfg.eq.remove_band(&id);
            }
            Action::UpdateBand(id, patch) => {
                cfg.eq.update_band(&id, patch);
            }
            Action::PatchCompressor(p) => cfg.compressor.apply(p),
            Action::PatchReverb(p) => cfg.reverb.apply(p),
            Action::SetNormalization(on) => cfg.apply_normalization = on,
            Action::SetRequestWaveform(on) => cfg.request_waveform = on,
            Action::SetTrimSilence(on) => cfg.trim_silence = on,
        }
        true
    }

    /// First half of a submission, for hosts that send the request themselves.
    pub fn begin_submit(&mut self) -> Option<PendingJob> {
        let job = self.jobs.begin(&self.config);
        if job.is_some() {
            self.original_view.set_data(None);
            self.processed_view.set_data(None);
        }
        job
    }

    pub fn complete_submit(&mut self, job: PendingJob, reply: Result<RawResponse>) -> &JobState {
        self.jobs.complete(job, reply);
        let (original, processed) = match self.jobs.result() {
            Some(r) => (r.original_waveform.clone(), r.processed_waveform.clone()),
            None => (None, None),
        };
        self.original_view.set_data(original);
        self.processed_view.set_data(processed);
        self.jobs.state()
    }

    pub fn submit(&mut self, service: &dyn ProcessingService) -> &JobState {
        let Some(mut job) = self.begin_submit() else {
            return self.jobs.state();
        };
        let reply = job.send(service);
        self.complete_submit(job, reply)
    }
}
