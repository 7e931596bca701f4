mod error;
mod handler;
mod router;

pub use error::recover_error;
pub use error::{ApiError, ApiErrorCode, ErrorBody};
pub use handler::Authenticated;
pub use router::routes;
