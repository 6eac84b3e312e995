use crate::{
    error::Result,
    request::MultipartPayload,
    response::RawResponse,
    settings::ClientSettings,
};
use reqwest::{
    blocking::{Client, Response},
    header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE},
};
use tracing::{debug, info};

pub const PROCESS_PATH: &str = "/process/";

/// Anything that can run one processing request.
pub trait ProcessingService {
    fn process(&self, payload: MultipartPayload) -> Result<RawResponse>;
}

pub fn http_client(settings: &ClientSettings) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(settings.connect_timeout())
        .timeout(settings.request_timeout())
        .build()?)
}

/// The real service, reached over HTTP.
pub struct HttpService {
    client: Client,
    settings: ClientSettings,
}

impl HttpService {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = http_client(&settings)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Hits `GET /` and returns the service's greeting.
    pub fn ping(&self) -> Result<String> {
        let url = self.settings.endpoint("/");
        let body: serde_json::Value = self.client.get(&url).send()?.error_for_status()?.json()?;
        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()))
    }
}

impl ProcessingService for HttpService {
    fn process(&self, payload: MultipartPayload) -> Result<RawResponse> {
        let url = self.settings.endpoint(PROCESS_PATH);
        info!(%url, file = payload.file_name().unwrap_or_default(), "submitting job");

        let resp = self.client.post(&url).multipart(payload.into_form()?).send()?;
        into_raw(resp)
    }
}

fn into_raw(resp: Response) -> Result<RawResponse> {
    let header = |name: HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let status = resp.status().as_u16();
    let content_type = header(CONTENT_TYPE);
    let content_disposition = header(CONTENT_DISPOSITION);
    let body = resp.bytes()?.to_vec();

    debug!(status, content_type = ?content_type, bytes = body.len(), "reply received");

    Ok(RawResponse {
        status,
        content_type,
        content_disposition,
        body,
    })
}
