//! Backend trait and its HTTP implementation.

use std::time::Duration;

use reqwest::blocking::{Client, Response, multipart};
use serde::Serialize;
use web_time::Instant;

use super::ApiError;
use crate::model::{LabelAssignments, SavedLabel, ShelfImage};

const USER_AGENT: &str = concat!("shelf-labeler/", env!("CARGO_PKG_VERSION"));

/// Calls the labeling client makes against the backend.
///
/// Calls block; the effect runtime runs each one on its own thread.
pub trait Backend: Send + Sync {
    /// `POST /upload-image?clusters=n` with the image as multipart field `file`.
    fn upload_image(
        &self,
        file_name: &str,
        data: Vec<u8>,
        clusters: u32,
    ) -> Result<ShelfImage, ApiError>;

    /// `POST /save-labels` with the assignment map as JSON.
    fn save_labels(&self, labels: &LabelAssignments) -> Result<(), ApiError>;

    /// `POST /log` with `{message}`.
    fn send_log(&self, message: &str) -> Result<(), ApiError>;

    /// `GET /clusters`, the labels the backend has stored so far.
    fn saved_labels(&self) -> Result<Vec<SavedLabel>, ApiError>;
}

#[derive(Serialize)]
struct LogBody<'a> {
    message: &'a str,
}

/// Backend reached over HTTP with a blocking `reqwest` client.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Return the body of a successful response, or a status error.
    fn read_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response.text()?)
    }
}

impl Backend for HttpBackend {
    fn upload_image(
        &self,
        file_name: &str,
        data: Vec<u8>,
        clusters: u32,
    ) -> Result<ShelfImage, ApiError> {
        let size = data.len();
        let part = multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = multipart::Form::new().part("file", part);

        log::debug!("Uploading {} ({} bytes), clusters={}", file_name, size, clusters);
        let started = Instant::now();
        let response = self
            .client
            .post(self.url("upload-image"))
            .query(&[("clusters", clusters)])
            .multipart(form)
            .send()?;
        let body = Self::read_body(response)?;
        let shelf = parse_shelf(&body)?;

        log::info!(
            "Upload returned {} detections in {} clusters ({}x{}) after {:?}",
            shelf.detections.len(),
            shelf.clusters.len(),
            shelf.width,
            shelf.height,
            started.elapsed()
        );
        Ok(shelf)
    }

    fn save_labels(&self, labels: &LabelAssignments) -> Result<(), ApiError> {
        let response = self.client.post(self.url("save-labels")).json(labels).send()?;
        Self::read_body(response)?;
        log::info!("Saved {} labels", labels.len());
        Ok(())
    }

    fn send_log(&self, message: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("log"))
            .json(&LogBody { message })
            .send()?;
        Self::read_body(response)?;
        Ok(())
    }

    fn saved_labels(&self) -> Result<Vec<SavedLabel>, ApiError> {
        let response = self.client.get(self.url("clusters")).send()?;
        let body = Self::read_body(response)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Parse and validate an upload response body.
pub(crate) fn parse_shelf(body: &str) -> Result<ShelfImage, ApiError> {
    let shelf: ShelfImage = serde_json::from_str(body)?;
    shelf.validate()?;
    Ok(shelf)
}

/// MIME type for the multipart file part, guessed from the extension.
fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
