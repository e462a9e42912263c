// HTTP client for the remote attendance API.

pub mod api;

mod error;

pub use api::{ApiClient, AttendanceUpload, LocationName, SoreFields, SubmitReceipt, TokenRequest};
pub use error::ApiError;
