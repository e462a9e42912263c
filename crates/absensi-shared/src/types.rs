use serde::{Deserialize, Serialize};

use crate::constants::FACILITATOR_OTHER;

/// Daily attendance window. The wire value is the lowercase Indonesian name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Morning session (10-12).
    Pagi,
    /// Afternoon session (16-18). Requires the extra report fields.
    Sore,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pagi => "pagi",
            Self::Sore => "sore",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a geolocation acquisition attempt.
///
/// Coordinates only exist in the `Ok` variant, so a fix without a position
/// is unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GeoFix {
    /// No acquisition attempted yet.
    Idle,
    /// A platform request is in flight.
    Requesting,
    /// A fresh position was obtained.
    Ok { lat: f64, lon: f64 },
    /// The platform reported an error, or geolocation is unsupported.
    Error(String),
}

impl GeoFix {
    /// Coordinates of the fix, if it succeeded.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match self {
            Self::Ok { lat, lon } => Some((*lat, *lon)),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

impl Default for GeoFix {
    fn default() -> Self {
        Self::Idle
    }
}

/// Device registration progress. Must reach `Ok` before submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Idle,
    Registering,
    Ok,
    Error,
}

/// A geofenced attendance location, as returned by the public locations
/// endpoint. Proximity against `radius_m` is checked server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

/// Facilitator choice: a name picked from the list, or the "Lainnya"
/// sentinel with a free-text name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Facilitator {
    Listed(String),
    Other { custom: String },
}

impl Facilitator {
    /// The name that goes on the wire. `None` when "Lainnya" was picked but
    /// no custom name was filled in.
    pub fn resolved_name(&self) -> Option<String> {
        match self {
            Self::Listed(name) => Some(name.clone()),
            Self::Other { custom } => {
                let custom = custom.trim();
                if custom.is_empty() {
                    None
                } else {
                    Some(custom.to_string())
                }
            }
        }
    }
}

impl Default for Facilitator {
    fn default() -> Self {
        Self::Other {
            custom: String::new(),
        }
    }
}

/// Extra report fields required for the afternoon ("sore") session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SoreReport {
    /// Free-text discussion summary, minimum 120 trimmed characters.
    pub hasil_diskusi: String,
    /// Drive link to the discussion photo.
    pub link_gdrive: String,
    /// Drive/Docs link to the activity evidence.
    pub link_kegiatan: String,
}

/// Everything the student fills in before submitting, minus the photo and
/// location selection which live in the workflow state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceDraft {
    pub jenis: SessionKind,
    pub nama: String,
    /// Student id, digits only.
    pub nim: String,
    pub semester: u8,
    pub nama_kelompok: String,
    pub fasilitator: Facilitator,
    pub sore: SoreReport,
}

impl Default for AttendanceDraft {
    fn default() -> Self {
        Self {
            jenis: SessionKind::Pagi,
            nama: String::new(),
            nim: String::new(),
            semester: 1,
            nama_kelompok: String::new(),
            fasilitator: Facilitator::Other {
                custom: String::new(),
            },
            sore: SoreReport::default(),
        }
    }
}

impl AttendanceDraft {
    /// Whether the facilitator selection is the "Lainnya" sentinel.
    pub fn facilitator_is_other(&self) -> bool {
        match &self.fasilitator {
            Facilitator::Listed(name) => name == FACILITATOR_OTHER,
            Facilitator::Other { .. } => true,
        }
    }
}
