pub mod error;

pub use error::{ApiResult, AppError, ErrorResponse, not_blank, validation_failed};
