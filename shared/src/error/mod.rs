//! Unified error vocabulary for staff-desk
//!
//! - [`ErrorCode`]: standardized numeric codes
//! - [`ErrorCategory`]: classification of codes by range
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Validation errors
//! - 3xxx: Storage errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{ErrorCategory, ErrorCode};
//!
//! let code = ErrorCode::EmailExists;
//! assert_eq!(code.code(), 3002);
//! assert_eq!(code.category(), ErrorCategory::Storage);
//! ```

mod category;
mod codes;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
