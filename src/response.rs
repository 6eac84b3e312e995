//! Interprets replies from `/process/`.
//!
//! The service answers either with raw audio (metadata in headers) or with a
//! JSON document carrying base64 audio and waveform envelopes. Both shapes are
//! resolved here into one [`ProcessingResult`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{FxError, Result},
    resource::{AudioHandle, ResourcePool},
    types::{stem_of, AppliedSettings, AudioBlob, OutputFormat},
};

/// The parts of an HTTP reply the interpreter looks at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// What was asked for, used to fill in anything the reply leaves out.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext<'a> {
    pub requested_format: OutputFormat,
    pub original_name: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructuredResult {
    pub audio: AudioBlob,
    pub download_name: String,
    pub original_waveform: Option<Vec<f64>>,
    pub processed_waveform: Option<Vec<f64>>,
    pub applied: AppliedSettings,
    /// Set when waveform arrays were present but unusable.
    pub waveform_issue: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamResult {
    pub audio: AudioBlob,
    pub download_name: String,
    /// Set when the body claimed to be JSON but was kept as raw audio.
    pub waveform_issue: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Interpreted {
    Structured(StructuredResult),
    Stream(StreamResult),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessingResult {
    pub audio: AudioHandle,
    pub download_name: String,
    pub original_waveform: Option<Vec<f64>>,
    pub processed_waveform: Option<Vec<f64>>,
    pub is_structured: bool,
    pub applied: Option<AppliedSettings>,
}

impl Interpreted {
    pub fn is_structured(&self) -> bool {
        matches!(self, Interpreted::Structured(_))
    }

    pub fn waveform_issue(&self) -> Option<&str> {
        match self {
            Interpreted::Structured(s) => s.waveform_issue.as_deref(),
            Interpreted::Stream(s) => s.waveform_issue.as_deref(),
        }
    }

    /// Registers the audio with `pool` and flattens both shapes.
    pub fn into_result(self, pool: &mut ResourcePool) -> ProcessingResult {
        match self {
            Interpreted::Structured(s) => ProcessingResult {
                audio: pool.register(s.audio),
                download_name: s.download_name,
                original_waveform: s.original_waveform,
                processed_waveform: s.processed_waveform,
                is_structured: true,
                applied: Some(s.applied),
            },
            Interpreted::Stream(s) => ProcessingResult {
                audio: pool.register(s.audio),
                download_name: s.download_name,
                original_waveform: None,
                processed_waveform: None,
                is_structured: false,
                applied: None,
            },
        }
    }
}

pub fn interpret(raw: RawResponse, ctx: RequestContext<'_>) -> Result<Interpreted> {
    if !raw.is_success() {
        return Err(service_error(&raw));
    }

    let media = raw.media_type();
    debug!(status = raw.status, media = ?media, bytes = raw.body.len(), "interpreting reply");

    if media.as_deref().is_some_and(is_json) {
        match serde_json::from_slice::<Value>(&raw.body) {
            Ok(doc) => interpret_structured(doc, ctx).map(Interpreted::Structured),
            Err(e) => {
                warn!(error = %e, "reply declared JSON but does not parse, keeping body as audio");
                let mut stream = interpret_stream(raw, None, ctx);
                stream.waveform_issue = Some(format!("reply body is not valid JSON: {e}"));
                Ok(Interpreted::Stream(stream))
            }
        }
    } else {
        Ok(Interpreted::Stream(interpret_stream(raw, media, ctx)))
    }
}

fn is_json(media: &str) -> bool {
    media == "application/json" || media.ends_with("+json")
}

fn service_error(raw: &RawResponse) -> FxError {
    let detail = serde_json::from_slice::<Value>(&raw.body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .and_then(|d| match d {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| format!("Request failed with status {}", raw.status));
    FxError::Service {
        status: raw.status,
        detail,
    }
}

fn interpret_structured(doc: Value, ctx: RequestContext<'_>) -> Result<StructuredResult> {
    let b64 = doc
        .get("audio_b64")
        .and_then(Value::as_str)
        .ok_or_else(|| FxError::MalformedResponse("missing `audio_b64`".into()))?;
    let bytes = STANDARD
        .decode(b64.trim())
        .map_err(|e| FxError::MalformedResponse(format!("`audio_b64` is not base64: {e}")))?;

    let format = doc
        .get("audio_format")
        .and_then(Value::as_str)
        .map(|f| f.trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| ctx.requested_format.as_str().to_string());

    let download_name = doc
        .get("audio_filename")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_download_name(ctx.original_name, &format));

    let mut issues = Vec::new();
    let mut envelope_field = |key: &str| match envelope(doc.get(key)) {
        Ok(env) => env,
        Err(why) => {
            warn!(field = key, %why, "dropping unusable waveform");
            issues.push(format!("`{key}` {why}"));
            None
        }
    };
    let original_waveform = envelope_field("original_waveform");
    let processed_waveform = envelope_field("processed_waveform");

    let applied = serde_json::from_value::<AppliedSettings>(doc).unwrap_or_default();

    Ok(StructuredResult {
        audio: AudioBlob {
            bytes,
            mime: format!("audio/{format}"),
        },
        download_name,
        original_waveform,
        processed_waveform,
        applied,
        waveform_issue: (!issues.is_empty()).then(|| issues.join("; ")),
    })
}

fn envelope(value: Option<&Value>) -> std::result::Result<Option<Vec<f64>>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| format!("has non-numeric entry {v}")))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(format!("is not an array (got {other})")),
    }
}

fn interpret_stream(raw: RawResponse, media: Option<String>, ctx: RequestContext<'_>) -> StreamResult {
    let mime = media
        .filter(|m| m.starts_with("audio/"))
        .unwrap_or_else(|| ctx.requested_format.mime());
    let download_name = raw
        .content_disposition
        .as_deref()
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| default_download_name(ctx.original_name, ctx.requested_format.as_str()));

    StreamResult {
        audio: AudioBlob {
            bytes: raw.body,
            mime,
        },
        download_name,
        waveform_issue: None,
    }
}

/// Pulls the `filename=` token out of a Content-Disposition value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    const TOKEN: &str = "filename=";
    let start = header.to_ascii_lowercase().find(TOKEN)? + TOKEN.len();
    let rest = header[start..].trim_start();
    let name = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next()?,
        None => rest.split(';').next()?.trim(),
    };
    (!name.is_empty()).then(|| name.to_string())
}

pub fn default_download_name(original_name: &str, format: &str) -> String {
    format!("processed_{}.{format}", stem_of(original_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext<'static> {
        RequestContext {
            requested_format: OutputFormat::Mp3,
            original_name: "interview.wav",
        }
    }

    fn json_reply(status: u16, body: Value) -> RawResponse {
        RawResponse {
            status,
            content_type: Some("application/json".into()),
            content_disposition: None,
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[test]
    fn error_detail_comes_from_body() {
        let err = interpret(json_reply(400, serde_json::json!({"detail": "Unsupported audio format: txt"})), ctx())
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Unsupported audio format: txt");
    }

    #[test]
    fn error_without_json_names_the_status() {
        let raw = RawResponse {
            status: 502,
            content_type: Some("text/html".into()),
            content_disposition: None,
            body: b"<html>bad gateway</html>".to_vec(),
        };
        let err = interpret(raw, ctx()).unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn validation_list_detail_is_rendered_as_json() {
        let body = serde_json::json!({"detail": [{"type": "missing", "loc": ["body", "file"]}]});
        let err = interpret(json_reply(422, body), ctx()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn stream_reply_takes_unquoted_filename() {
        let raw = RawResponse {
            status: 200,
            content_type: Some("audio/flac".into()),
            content_disposition: Some("attachment; filename=processed_test.flac".into()),
            body: vec![1, 2, 3],
        };
        let Interpreted::Stream(s) = interpret(raw, ctx()).unwrap() else {
            panic!("expected stream");
        };
        assert_eq!(s.download_name, "processed_test.flac");
        assert_eq!(s.audio.mime, "audio/flac");
        assert_eq!(s.audio.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn stream_reply_without_headers_synthesizes_name() {
        let raw = RawResponse {
            status: 200,
            content_type: None,
            content_disposition: None,
            body: vec![9],
        };
        let Interpreted::Stream(s) = interpret(raw, ctx()).unwrap() else {
            panic!("expected stream");
        };
        assert_eq!(s.download_name, "processed_interview.mp3");
        assert_eq!(s.audio.mime, "audio/mp3");
    }

    #[test]
    fn quoted_and_trailing_params_in_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="a b.wav"; size=3"#).as_deref(),
            Some("a b.wav")
        );
        assert_eq!(
            filename_from_disposition("attachment; FILENAME=x.mp3; x=1").as_deref(),
            Some("x.mp3")
        );
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn structured_reply_decodes_audio_and_waveforms() {
        let body = serde_json::json!({
            "message": "Audio processed successfully.",
            "audio_filename": "processed_interview.flac",
            "audio_format": "flac",
            "audio_b64": STANDARD.encode([7u8, 8, 9]),
            "original_waveform": [0.1, 0.5, 1.0],
            "processed_waveform": [0.05, 0.25, 0.5],
            "normalization_applied": true,
        });
        let Interpreted::Structured(s) = interpret(json_reply(200, body), ctx()).unwrap() else {
            panic!("expected structured");
        };
        assert_eq!(s.audio.bytes, vec![7, 8, 9]);
        assert_eq!(s.audio.mime, "audio/flac");
        assert_eq!(s.download_name, "processed_interview.flac");
        assert_eq!(s.original_waveform, Some(vec![0.1, 0.5, 1.0]));
        assert_eq!(s.processed_waveform, Some(vec![0.05, 0.25, 0.5]));
        assert_eq!(s.applied.normalization, Some(true));
        assert!(s.waveform_issue.is_none());
    }

    #[test]
    fn structured_reply_fills_missing_format_and_name() {
        let body = serde_json::json!({ "audio_b64": STANDARD.encode([1u8]) });
        let Interpreted::Structured(s) = interpret(json_reply(200, body), ctx()).unwrap() else {
            panic!("expected structured");
        };
        assert_eq!(s.audio.mime, "audio/mp3");
        assert_eq!(s.download_name, "processed_interview.mp3");
        assert_eq!(s.original_waveform, None);
    }

    #[test]
    fn out_of_range_envelope_values_are_kept() {
        let body = serde_json::json!({
            "audio_b64": STANDARD.encode([1u8]),
            "processed_waveform": [1.5, -0.2],
        });
        let Interpreted::Structured(s) = interpret(json_reply(200, body), ctx()).unwrap() else {
            panic!("expected structured");
        };
        assert_eq!(s.processed_waveform, Some(vec![1.5, -0.2]));
    }

    #[test]
    fn non_numeric_waveform_degrades_but_keeps_audio() {
        let body = serde_json::json!({
            "audio_b64": STANDARD.encode([4u8, 4]),
            "original_waveform": "oops",
            "processed_waveform": [0.2, "x"],
        });
        let reply = interpret(json_reply(200, body), ctx()).unwrap();
        assert!(reply.waveform_issue().is_some());
        let Interpreted::Structured(s) = reply else {
            panic!("expected structured");
        };
        assert_eq!(s.audio.bytes, vec![4, 4]);
        assert!(s.original_waveform.is_none() && s.processed_waveform.is_none());
    }

    #[test]
    fn bad_base64_is_malformed() {
        let body = serde_json::json!({ "audio_b64": "***" });
        let err = interpret(json_reply(200, body), ctx()).unwrap_err();
        assert!(matches!(err, FxError::MalformedResponse(_)));
    }

    #[test]
    fn unparseable_json_keeps_body_as_audio() {
        let raw = RawResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".into()),
            content_disposition: None,
            body: b"{not json".to_vec(),
        };
        let reply = interpret(raw, ctx()).unwrap();
        assert!(!reply.is_structured());
        assert!(reply.waveform_issue().is_some());
        match reply {
            Interpreted::Stream(s) => {
                assert_eq!(s.audio.bytes, b"{not json".to_vec());
                assert_eq!(s.audio.mime, "audio/mp3");
                assert_eq!(s.download_name, "processed_interview.mp3");
            }
            other => panic!("expected stream, got {other:?}"),
        }
    }

    #[test]
    fn missing_audio_field_is_malformed() {
        let body = serde_json::json!({ "processed_waveform": [0.1] });
        let err = interpret(json_reply(200, body), ctx()).unwrap_err();
        assert!(matches!(err, FxError::MalformedResponse(_)));
    }

    #[test]
    fn both_shapes_flatten_to_one_result() {
        let mut pool = ResourcePool::new();
        let body = serde_json::json!({ "audio_b64": STANDARD.encode([1u8]), "processed_waveform": [0.3] });
        let structured = interpret(json_reply(200, body), ctx()).unwrap().into_result(&mut pool);
        assert!(structured.is_structured);
        assert_eq!(structured.processed_waveform, Some(vec![0.3]));

        let raw = RawResponse {
            status: 200,
            content_type: Some("audio/mp3".into()),
            content_disposition: None,
            body: vec![1],
        };
        let stream = interpret(raw, ctx()).unwrap().into_result(&mut pool);
        assert!(!stream.is_structured);
        assert!(stream.original_waveform.is_none() && stream.processed_waveform.is_none());
        assert_eq!(pool.live_count(), 2);
    }
}
