/// Prefix for locally generated device identifiers
pub const DEVICE_ID_PREFIX: &str = "dev-";

/// Longest edge of a preprocessed photo in pixels (never upscaled)
pub const MAX_PHOTO_DIMENSION: u32 = 1600;

/// JPEG re-encode quality for the upload payload (0-100)
pub const PHOTO_JPEG_QUALITY: u8 = 82;

/// Minimum face bounding-box area, measured in resized pixels
pub const MIN_FACE_AREA: u64 = 1200;

/// Minimum trimmed length of the "hasil diskusi" field (characters)
pub const MIN_DISCUSSION_LEN: usize = 120;

/// Platform geolocation timeout in seconds
pub const GEO_TIMEOUT_SECS: u64 = 10;

/// Watchdog for a hung device-registration request, in seconds
pub const REGISTRATION_WATCHDOG_SECS: u64 = 12;

/// Default per-request API timeout in seconds
pub const API_TIMEOUT_SECS: u64 = 12;

/// API timeout for the multipart attendance upload, in seconds
pub const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Safety auto-clear for the blocking busy indicator, in seconds
pub const BUSY_TIMEOUT_SECS: u64 = 75;

/// Hosts accepted by the Drive/Docs link validator
pub const DRIVE_ALLOWED_HOSTS: [&str; 2] = ["drive.google.com", "docs.google.com"];

/// Sentinel option meaning "facilitator not in the list"
pub const FACILITATOR_OTHER: &str = "Lainnya";
