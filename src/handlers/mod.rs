pub mod providers;

use validator::Validate;

use crate::errors::ServiceError;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {e}")))
}
