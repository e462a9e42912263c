//! Submission orchestration.
//!
//! Validation runs client-side first so the student gets immediate,
//! specific feedback; the server re-checks everything.  The checks run in
//! a fixed order and the first failure wins.  A successful validation
//! snapshots every value it checked, so the token request and the upload
//! are built from the same data even if the form changes mid-flight.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use absensi_net::{ApiClient, ApiError, AttendanceUpload, SoreFields, SubmitReceipt, TokenRequest};
use absensi_shared::constants::{BUSY_TIMEOUT_SECS, FACILITATOR_OTHER, MIN_DISCUSSION_LEN};
use absensi_shared::validate::{is_acceptable_drive_link, is_min_length_text, is_valid_nim};
use absensi_shared::{Facilitator, RegistrationState, SessionKind};

use crate::busy::BusyIndicator;
use crate::state::{lock, AppState, SharedState, StatePoisoned, SubmitPhase};

/// First validation failure, or a transport/server failure.  `Display` is
/// the message shown to the student.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Klik \"Get Device ID\" terlebih dahulu untuk registrasi perangkat.")]
    NotRegistered,

    #[error("Ambil lokasi GPS dulu.")]
    NoGeoFix,

    #[error("Ambil/unggah foto wajah.")]
    NoPhoto,

    #[error("Wajah belum terverifikasi pada foto. Ulangi pengambilan foto.")]
    FaceNotVerified,

    #[error("Pilih lokasi.")]
    NoLocation,

    #[error("NIM harus berupa angka.")]
    InvalidNim,

    #[error("Isi nama fasilitator pada kolom \"Lainnya\".")]
    MissingFacilitator,

    #[error("Hasil diskusi minimal {MIN_DISCUSSION_LEN} karakter.")]
    DiscussionTooShort,

    #[error("Link GDrive foto diskusi tidak valid.")]
    InvalidDiscussionLink,

    #[error("Link foto kegiatan tidak valid.")]
    InvalidActivityLink,

    /// A submission is already running.
    #[error("Pengiriman sedang berlangsung.")]
    InFlight,

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    State(#[from] StatePoisoned),
}

/// Snapshot of everything validation approved.
#[derive(Debug)]
struct Prepared {
    token_request: TokenRequest,
    upload: AttendanceUpload,
}

/// Run the fixed-order client checks against the current state and
/// snapshot the values for the wire.
fn validate(s: &AppState) -> Result<Prepared, SubmitError> {
    let device_id = match (&s.device_id, s.registration) {
        (Some(id), RegistrationState::Ok) => id.clone(),
        _ => return Err(SubmitError::NotRegistered),
    };

    let (lat, lon) = s.geo.coords().ok_or(SubmitError::NoGeoFix)?;

    let photo = s.photo.as_ref().ok_or(SubmitError::NoPhoto)?;
    if !photo.face_detected {
        return Err(SubmitError::FaceNotVerified);
    }

    let loc_id = s.selected_location.ok_or(SubmitError::NoLocation)?;

    let draft = &s.draft;
    if !is_valid_nim(&draft.nim) {
        return Err(SubmitError::InvalidNim);
    }

    let nama_fasilitator = match &draft.fasilitator {
        Facilitator::Listed(name) if name != FACILITATOR_OTHER => name.clone(),
        // The "Lainnya" sentinel itself is never a facilitator name.
        Facilitator::Listed(_) => return Err(SubmitError::MissingFacilitator),
        Facilitator::Other { .. } => draft
            .fasilitator
            .resolved_name()
            .ok_or(SubmitError::MissingFacilitator)?,
    };

    let sore = match draft.jenis {
        SessionKind::Pagi => None,
        SessionKind::Sore => {
            if !is_min_length_text(&draft.sore.hasil_diskusi, MIN_DISCUSSION_LEN) {
                return Err(SubmitError::DiscussionTooShort);
            }
            if !is_acceptable_drive_link(&draft.sore.link_gdrive) {
                return Err(SubmitError::InvalidDiscussionLink);
            }
            if !is_acceptable_drive_link(&draft.sore.link_kegiatan) {
                return Err(SubmitError::InvalidActivityLink);
            }
            Some(SoreFields {
                hasil_diskusi: draft.sore.hasil_diskusi.trim().to_string(),
                link_gdrive: draft.sore.link_gdrive.trim().to_string(),
                link_kegiatan: draft.sore.link_kegiatan.trim().to_string(),
            })
        }
    };

    let token_request = TokenRequest {
        device_id,
        nim: draft.nim.clone(),
        semester: draft.semester,
        jenis: draft.jenis,
        lat,
        lon,
        loc_id,
    };

    let upload = AttendanceUpload {
        token: String::new(),
        nama: draft.nama.trim().to_string(),
        nim: draft.nim.clone(),
        semester: draft.semester,
        jenis: draft.jenis,
        lat,
        lon,
        nama_kelompok: draft.nama_kelompok.trim().to_string(),
        nama_fasilitator,
        sore,
        photo: photo.jpeg.clone(),
    };

    Ok(Prepared {
        token_request,
        upload,
    })
}

/// Validate, obtain a submission token, and upload.
///
/// Exactly one token request and one upload happen per successful call.
/// Any failure resets the phase to `Idle` so the student can retry.
pub async fn submit(
    state: &SharedState,
    api: &ApiClient,
    busy: &BusyIndicator,
) -> Result<SubmitReceipt, SubmitError> {
    let prepared = {
        let mut s = lock(state)?;
        if s.phase != SubmitPhase::Idle {
            return Err(SubmitError::InFlight);
        }
        s.phase = SubmitPhase::Validating;

        match validate(&s) {
            Ok(p) => p,
            Err(e) => {
                s.phase = SubmitPhase::Idle;
                warn!(error = %e, "submission rejected by client checks");
                return Err(e);
            }
        }
    };

    busy.start("Mengirim absensi...", Duration::from_secs(BUSY_TIMEOUT_SECS));

    lock(state)?.phase = SubmitPhase::RequestingToken;
    let token = match api.issue_token(&prepared.token_request).await {
        Ok(token) => token,
        Err(e) => {
            busy.stop();
            lock(state)?.phase = SubmitPhase::Idle;
            warn!(error = %e, "token request failed");
            return Err(e.into());
        }
    };

    lock(state)?.phase = SubmitPhase::Uploading;
    let mut upload = prepared.upload;
    upload.token = token;

    let receipt = match api.submit_attendance(upload).await {
        Ok(receipt) => receipt,
        Err(e) => {
            busy.stop();
            lock(state)?.phase = SubmitPhase::Idle;
            warn!(error = %e, "attendance upload failed");
            return Err(e.into());
        }
    };

    lock(state)?.phase = SubmitPhase::Done;
    busy.stop();
    // Settle back to Idle so the form is immediately reusable.
    lock(state)?.phase = SubmitPhase::Idle;

    info!(distance_m = receipt.distance_m, "attendance submitted");
    Ok(receipt)
}

/// One-line confirmation shown to the student after a successful upload.
pub fn receipt_summary(receipt: &SubmitReceipt) -> String {
    format!(
        "{} • jarak {} m • lokasi {}",
        receipt.message, receipt.distance_m, receipt.lokasi.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PhotoCandidate;
    use absensi_net::LocationName;
    use absensi_shared::{AttendanceDraft, GeoFix, SoreReport};
    use bytes::Bytes;

    fn ready_state() -> AppState {
        AppState {
            device_id: Some("dev-abc123".into()),
            registration: RegistrationState::Ok,
            geo: GeoFix::Ok { lat: 3.6, lon: 98.7 },
            selected_location: Some(2),
            draft: AttendanceDraft {
                jenis: SessionKind::Pagi,
                nama: "Siti".into(),
                nim: "23123456".into(),
                semester: 3,
                nama_kelompok: "Kelompok 4".into(),
                fasilitator: Facilitator::Listed("Jessica".into()),
                sore: SoreReport::default(),
            },
            photo: Some(PhotoCandidate {
                jpeg: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
                width: 640,
                height: 480,
                face_detected: true,
            }),
            ..AppState::default()
        }
    }

    fn sore_state() -> AppState {
        let mut s = ready_state();
        s.draft.jenis = SessionKind::Sore;
        s.draft.sore = SoreReport {
            hasil_diskusi: "x".repeat(120),
            link_gdrive: "https://drive.google.com/file/d/abc123/view".into(),
            link_kegiatan: "https://drive.google.com/open?id=xyz789".into(),
        };
        s
    }

    #[test]
    fn ready_state_validates() {
        let p = validate(&ready_state()).unwrap();
        assert_eq!(p.token_request.device_id, "dev-abc123");
        assert_eq!(p.token_request.loc_id, 2);
        assert_eq!(p.upload.nama_fasilitator, "Jessica");
        assert!(p.upload.sore.is_none());
    }

    #[test]
    fn first_failure_wins_in_fixed_order() {
        let mut s = ready_state();
        s.registration = RegistrationState::Idle;
        s.geo = GeoFix::Idle;
        s.photo = None;
        // Everything is wrong; registration is reported first.
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::NotRegistered
        ));

        s.registration = RegistrationState::Ok;
        assert!(matches!(validate(&s).unwrap_err(), SubmitError::NoGeoFix));

        s.geo = GeoFix::Ok { lat: 1.0, lon: 2.0 };
        assert!(matches!(validate(&s).unwrap_err(), SubmitError::NoPhoto));
    }

    #[test]
    fn requesting_geo_is_not_a_fix() {
        let mut s = ready_state();
        s.geo = GeoFix::Requesting;
        assert!(matches!(validate(&s).unwrap_err(), SubmitError::NoGeoFix));
    }

    #[test]
    fn photo_without_face_is_rejected() {
        let mut s = ready_state();
        if let Some(photo) = &mut s.photo {
            photo.face_detected = false;
        }
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::FaceNotVerified
        ));
    }

    #[test]
    fn nim_must_be_digits() {
        let mut s = ready_state();
        s.draft.nim = "23A456".into();
        assert!(matches!(validate(&s).unwrap_err(), SubmitError::InvalidNim));

        s.draft.nim = String::new();
        assert!(matches!(validate(&s).unwrap_err(), SubmitError::InvalidNim));
    }

    #[test]
    fn lainnya_requires_a_custom_name() {
        let mut s = ready_state();
        s.draft.fasilitator = Facilitator::Listed("Lainnya".into());
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::MissingFacilitator
        ));

        s.draft.fasilitator = Facilitator::Other { custom: "  ".into() };
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::MissingFacilitator
        ));

        s.draft.fasilitator = Facilitator::Other {
            custom: " Pak Budi ".into(),
        };
        let p = validate(&s).unwrap();
        assert_eq!(p.upload.nama_fasilitator, "Pak Budi");
    }

    #[test]
    fn sore_checks_run_in_order() {
        let mut s = sore_state();
        s.draft.sore.hasil_diskusi = "terlalu pendek".into();
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::DiscussionTooShort
        ));

        let mut s = sore_state();
        s.draft.sore.link_gdrive = "https://example.com/d/abc".into();
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::InvalidDiscussionLink
        ));

        let mut s = sore_state();
        s.draft.sore.link_kegiatan = "not a url".into();
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::InvalidActivityLink
        ));
    }

    #[test]
    fn pagi_skips_sore_checks() {
        let mut s = ready_state();
        s.draft.sore.hasil_diskusi = "short".into();
        s.draft.sore.link_gdrive = "garbage".into();
        assert!(validate(&s).is_ok());
    }

    #[test]
    fn discussion_length_counts_trimmed_chars() {
        let mut s = sore_state();
        // 119 chars padded with whitespace must still fail.
        s.draft.sore.hasil_diskusi = format!("   {}   ", "y".repeat(119));
        assert!(matches!(
            validate(&s).unwrap_err(),
            SubmitError::DiscussionTooShort
        ));

        s.draft.sore.hasil_diskusi = format!("   {}   ", "y".repeat(120));
        assert!(validate(&s).is_ok());
    }

    #[test]
    fn summary_renders_receipt() {
        let receipt = SubmitReceipt {
            message: "OK".into(),
            distance_m: 12.0,
            lokasi: LocationName {
                name: "Gedung A".into(),
            },
        };
        assert_eq!(receipt_summary(&receipt), "OK • jarak 12 m • lokasi Gedung A");
    }
}
