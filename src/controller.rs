//! One-at-a-time job lifecycle.
//!
//! `Idle -> Submitting -> Succeeded | Failed`, and a new submission may start
//! from either terminal state. While `Submitting`, further submissions are
//! ignored. The controller owns the resource pool, so every playable handle it
//! hands out is released when its result is replaced.

use tracing::{debug, error, info, warn};

use crate::{
    effects::EffectConfiguration,
    error::Result,
    io::net::ProcessingService,
    request::{self, MultipartPayload},
    resource::{AudioHandle, ResourcePool},
    response::{interpret, ProcessingResult, RawResponse, RequestContext},
    types::{AudioBlob, OutputFormat, SelectedFile},
};

pub const NO_FILE_NOTICE: &str = "Please select an audio file first.";
pub const NO_WAVEFORM_NOTICE: &str =
    "Waveform data was requested but the service returned plain audio; waveforms are unavailable.";

#[derive(Clone, Debug, Default, PartialEq)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Succeeded(ProcessingResult),
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A request that has left `Idle` and is waiting for the service.
#[derive(Debug)]
pub struct PendingJob {
    payload: MultipartPayload,
    format: OutputFormat,
    original_name: String,
    waveform_requested: bool,
}

impl PendingJob {
    pub fn payload(&self) -> &MultipartPayload {
        &self.payload
    }

    /// Hands the payload to the transport, keeping what `complete` needs.
    pub fn send(&mut self, service: &dyn ProcessingService) -> Result<RawResponse> {
        service.process(std::mem::take(&mut self.payload))
    }
}

#[derive(Debug, Default)]
pub struct JobController {
    state: JobState,
    pool: ResourcePool,
    preview: Option<AudioHandle>,
    notices: Vec<Notice>,
}

impl JobController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, JobState::Submitting)
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        match &self.state {
            JobState::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Bytes of the current result's audio.
    pub fn result_audio(&self) -> Option<&[u8]> {
        self.result().and_then(|r| self.pool.bytes(&r.audio))
    }

    pub fn preview(&self) -> Option<&AudioHandle> {
        self.preview.as_ref()
    }

    /// Swaps the playable preview of the source file, freeing the old one.
    pub fn set_preview(&mut self, file: Option<&SelectedFile>) {
        if let Some(old) = self.preview.take() {
            self.pool.release(&old);
        }
        self.preview = file.map(|f| {
            self.pool.register(AudioBlob {
                bytes: f.bytes.clone(),
                mime: f.mime.clone(),
            })
        });
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Leaves `Idle` for `Submitting`, or explains why it cannot.
    pub fn begin(&mut self, config: &EffectConfiguration) -> Option<PendingJob> {
        if self.is_busy() {
            debug!("submit ignored, a job is already in flight");
            return None;
        }
        let Some(file) = config.selected_file.as_ref() else {
            self.notify(NoticeLevel::Warning, NO_FILE_NOTICE);
            return None;
        };

        self.release_result();
        let payload = match request::build(file, config) {
            Ok(p) => p,
            Err(e) => {
                self.fail(e.to_string());
                return None;
            }
        };
        self.state = JobState::Submitting;
        info!(file = %file.name, format = %config.output_format, "job submitting");

        Some(PendingJob {
            payload,
            format: config.output_format,
            original_name: file.name.clone(),
            waveform_requested: config.request_waveform,
        })
    }

    /// Settles the in-flight job with the transport's outcome.
    pub fn complete(&mut self, job: PendingJob, reply: Result<RawResponse>) -> &JobState {
        if !self.is_busy() {
            warn!("reply arrived with no job in flight, dropping it");
            return &self.state;
        }

        let ctx = RequestContext {
            requested_format: job.format,
            original_name: &job.original_name,
        };
        match reply.and_then(|raw| interpret(raw, ctx)) {
            Ok(reply) => {
                if let Some(issue) = reply.waveform_issue() {
                    self.notify(
                        NoticeLevel::Warning,
                        format!("Waveforms unavailable: {issue}"),
                    );
                }
                let structured = reply.is_structured();
                let mut result = reply.into_result(&mut self.pool);
                if job.waveform_requested && !structured {
                    result.original_waveform = None;
                    result.processed_waveform = None;
                    self.notify(NoticeLevel::Warning, NO_WAVEFORM_NOTICE);
                }
                info!(download = %result.download_name, structured, "job succeeded");
                self.notify(NoticeLevel::Info, "Audio processed successfully.");
                self.state = JobState::Succeeded(result);
            }
            Err(e) => self.fail(e.to_string()),
        }
        &self.state
    }

    /// Runs a whole job against `service`.
    pub fn submit(
        &mut self,
        config: &EffectConfiguration,
        service: &dyn ProcessingService,
    ) -> &JobState {
        let Some(mut job) = self.begin(config) else {
            return &self.state;
        };
        let reply = job.send(service);
        self.complete(job, reply)
    }

    fn fail(&mut self, message: String) {
        error!(%message, "job failed");
        self.notify(NoticeLevel::Error, message.clone());
        self.state = JobState::Failed(message);
    }

    fn release_result(&mut self) {
        if let JobState::Succeeded(prev) = std::mem::take(&mut self.state) {
            self.pool.release(&prev.audio);
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }
}
