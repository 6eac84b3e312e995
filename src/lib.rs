//! # audio-fx-client
//!
//! Client core for a remote audio effects service: effect configuration,
//! request building, reply interpretation, job lifecycle and waveform
//! rendering with click-to-seek.

pub mod controller;
pub mod effects;
pub mod eq;
pub mod error;
pub mod playback;
pub mod request;
pub mod resource;
pub mod response;
pub mod session;
pub mod settings;
pub mod types;
pub mod waveform;

pub mod io {
    pub mod net;
}

pub use crate::{
    controller::{JobController, JobState, Notice, NoticeLevel, PendingJob},
    effects::{CompressorParams, CompressorPatch, EffectConfiguration, ReverbParams, ReverbPatch, Section},
    eq::{BandPatch, EqBand, EqBandStore, FilterType, WireBand},
    error::{FxError, Result},
    io::net::{HttpService, ProcessingService},
    playback::{seek_and_resume, Player, SeekOutcome},
    request::{build as build_request, MultipartPayload},
    resource::{AudioHandle, ResourcePool},
    response::{interpret, Interpreted, ProcessingResult, RawResponse, RequestContext},
    session::{Action, Session},
    settings::ClientSettings,
    types::{AppliedSettings, AudioBlob, OutputFormat, SelectedFile},
    waveform::{Canvas, SvgCanvas, WaveformView},
};
