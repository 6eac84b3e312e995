//! Builds the multipart form posted to `/process/`.

use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;

use crate::{
    effects::EffectConfiguration,
    error::Result,
    types::SelectedFile,
};

pub const FIELD_FILE: &str = "file";
pub const FIELD_EQ_BANDS: &str = "eq_bands_json";

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Ordered multipart fields, independent of any HTTP client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartPayload {
    fields: Vec<(String, FieldValue)>,
}

impl MultipartPayload {
    fn text(&mut self, name: &str, value: impl ToString) {
        self.fields
            .push((name.to_string(), FieldValue::Text(value.to_string())));
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FieldValue::Text(s) if n == name => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.fields.iter().find_map(|(_, v)| match v {
            FieldValue::File { file_name, .. } => Some(file_name.as_str()),
            _ => None,
        })
    }

    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FieldValue::Text(s) => form.text(name, s),
                FieldValue::File {
                    file_name,
                    mime,
                    bytes,
                } => form.part(name, Part::bytes(bytes).file_name(file_name).mime_str(&mime)?),
            };
        }
        Ok(form)
    }
}

/// Turns a configuration and its file into the form the service expects.
///
/// Optional groups are sent only when their section is shown. EQ bands are
/// sent only when enabled and audible; an empty band list omits the field.
pub fn build(file: &SelectedFile, config: &EffectConfiguration) -> Result<MultipartPayload> {
    let mut payload = MultipartPayload::default();

    payload.fields.push((
        FIELD_FILE.into(),
        FieldValue::File {
            file_name: file.name.clone(),
            mime: file.mime.clone(),
            bytes: file.bytes.clone(),
        },
    ));
    payload.text("denoise_strength", config.denoise_strength());
    payload.text("output_format", config.output_format);
    payload.text("apply_normalization", config.apply_normalization);
    payload.text("request_waveform", config.request_waveform);
    payload.text("trim_silence", config.trim_silence);

    if config.show_eq {
        let bands = config.eq.active_wire_bands();
        if !bands.is_empty() {
            payload.text(FIELD_EQ_BANDS, serde_json::to_string(&bands)?);
        }
    }

    if config.show_compressor {
        let c = &config.compressor;
        payload.text("compressor_threshold", c.threshold_db);
        payload.text("compressor_ratio", c.ratio);
        payload.text("compressor_attack", c.attack_ms);
        payload.text("compressor_release", c.release_ms);
    }

    if config.show_reverb {
        payload.text("reverb_room_size", config.reverb.room_size);
        payload.text("reverb_wet_dry_mix", config.reverb.wet_dry_mix);
    }

    debug!(
        file = %file.name,
        fields = payload.fields.len(),
        eq = payload.contains(FIELD_EQ_BANDS),
        "built process request"
    );
    Ok(payload)
}
