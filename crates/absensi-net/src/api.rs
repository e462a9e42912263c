//! Typed client for the attendance server's public HTTP API.
//!
//! All validation and business logic (geofence distance, token signing,
//! daily device reset) happens server-side; this client only shapes
//! requests and surfaces responses.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use absensi_shared::constants::{API_TIMEOUT_SECS, UPLOAD_TIMEOUT_SECS};
use absensi_shared::{Location, SessionKind};

use crate::error::{ApiError, Result};

/// Fields the server binds into a short-lived submission token.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub device_id: String,
    pub nim: String,
    pub semester: u8,
    pub jenis: SessionKind,
    pub lat: f64,
    pub lon: f64,
    pub loc_id: i64,
}

/// Everything that goes into the final multipart upload.
#[derive(Debug, Clone)]
pub struct AttendanceUpload {
    pub token: String,
    pub nama: String,
    pub nim: String,
    pub semester: u8,
    pub jenis: SessionKind,
    pub lat: f64,
    pub lon: f64,
    pub nama_kelompok: String,
    pub nama_fasilitator: String,
    /// Sore-only report fields; `None` for the morning session.
    pub sore: Option<SoreFields>,
    /// The preprocessed JPEG that passed the face gate.
    pub photo: Bytes,
}

#[derive(Debug, Clone)]
pub struct SoreFields {
    pub hasil_diskusi: String,
    pub link_gdrive: String,
    pub link_kegiatan: String,
}

/// Success payload of the final upload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReceipt {
    pub message: String,
    pub distance_m: f64,
    pub lokasi: LocationName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationName {
    pub name: String,
}

#[derive(Deserialize)]
struct LocationsResponse {
    locations: Vec<Location>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the attendance API.
///
/// The base URL is read once at construction; an optional bearer token is
/// attached for admin sessions (never set in the public student flow).
pub struct ApiClient {
    base_url: String,
    bearer: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: None,
            http,
        })
    }

    /// Attach a bearer token to every request (admin console sessions).
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn apply_bearer(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Non-2xx responses become [`ApiError::Server`] with the optional
    /// `message` field pulled from the JSON body.
    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);

        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET /api/public/locations`
    pub async fn public_locations(&self) -> Result<Vec<Location>> {
        let req = self
            .http
            .get(self.url("/api/public/locations"))
            .timeout(Duration::from_secs(API_TIMEOUT_SECS));

        let resp = Self::check(self.apply_bearer(req).send().await?).await?;
        let body: LocationsResponse = resp.json().await?;

        debug!(count = body.locations.len(), "locations loaded");
        Ok(body.locations)
    }

    /// `POST /api/register-device`
    pub async fn register_device(&self, device_id: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url("/api/register-device"))
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .json(&serde_json::json!({ "device_id": device_id }));

        Self::check(self.apply_bearer(req).send().await?).await?;

        info!(device_id, "device registered for today");
        Ok(())
    }

    /// `POST /api/issue-token`
    pub async fn issue_token(&self, request: &TokenRequest) -> Result<String> {
        let req = self
            .http
            .post(self.url("/api/issue-token"))
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .json(request);

        let resp = Self::check(self.apply_bearer(req).send().await?).await?;
        let body: TokenResponse = resp.json().await?;

        debug!("submission token issued");
        Ok(body.token)
    }

    /// `POST /api/submit-attendance` (multipart)
    pub async fn submit_attendance(&self, upload: AttendanceUpload) -> Result<SubmitReceipt> {
        let photo = Part::bytes(upload.photo.to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")?;

        let mut form = Form::new()
            .text("token", upload.token)
            .text("nama", upload.nama)
            .text("nim", upload.nim)
            .text("semester", upload.semester.to_string())
            .text("jenis", upload.jenis.as_str())
            .text("lat", upload.lat.to_string())
            .text("lon", upload.lon.to_string())
            .text("nama_kelompok", upload.nama_kelompok)
            .text("nama_fasilitator", upload.nama_fasilitator);

        if let Some(sore) = upload.sore {
            form = form
                .text("hasil_diskusi", sore.hasil_diskusi)
                .text("link_gdrive", sore.link_gdrive)
                .text("link_kegiatan", sore.link_kegiatan);
        }

        form = form.part("photo", photo);

        let req = self
            .http
            .post(self.url("/api/submit-attendance"))
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .multipart(form);

        let resp = Self::check(self.apply_bearer(req).send().await?).await?;
        let receipt: SubmitReceipt = resp.json().await?;

        info!(
            distance_m = receipt.distance_m,
            lokasi = %receipt.lokasi.name,
            "attendance accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.url("/api/public/locations"),
            "http://localhost:3000/api/public/locations"
        );
    }

    #[test]
    fn token_request_wire_shape() {
        let req = TokenRequest {
            device_id: "dev-abc".into(),
            nim: "23123456".into(),
            semester: 3,
            jenis: SessionKind::Sore,
            lat: 3.6,
            lon: 98.7,
            loc_id: 2,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["device_id"], "dev-abc");
        assert_eq!(json["jenis"], "sore");
        assert_eq!(json["loc_id"], 2);
    }

    #[test]
    fn receipt_parses_server_payload() {
        let receipt: SubmitReceipt = serde_json::from_str(
            r#"{"message":"OK","distance_m":12.0,"lokasi":{"name":"Gedung A"}}"#,
        )
        .unwrap();
        assert_eq!(receipt.message, "OK");
        assert_eq!(receipt.distance_m, 12.0);
        assert_eq!(receipt.lokasi.name, "Gedung A");
    }
}
