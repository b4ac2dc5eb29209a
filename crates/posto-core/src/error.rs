//! # Error Types
//!
//! Domain-specific error types for posto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  posto-core errors (this file)                                         │
//! │  ├── CoreError        - Save workflow domain errors                    │
//! │  └── ValidationError  - Save validation failures                       │
//! │                                                                         │
//! │  posto-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Back-office API errors (in app)                                       │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numeric input and derivations never produce errors: malformed text
//! parses to zero and every ratio is zero-guarded. Only the save workflow
//! can fail.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while building a save.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field edit targeted a product that is not in the period view.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The selected supplier is not in the loaded supplier list.
    ///
    /// ## When This Occurs
    /// - Supplier was deactivated after the period view loaded
    /// - Stale id restored from configuration
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rule violations found before anything is handed to storage.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase typed (GC: 5.000 L)
    ///      │
    ///      ▼
    /// Save pressed, no supplier selected
    ///      │
    ///      ▼
    /// Required { field: "supplier" }
    ///      │
    ///      ▼
    /// UI shows: "supplier is required"
    /// ```
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// The same product appears twice in one period.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SupplierNotFound("sup-9".to_string());
        assert_eq!(err.to_string(), "Supplier not found: sup-9");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "supplier".to_string(),
        };
        assert_eq!(err.to_string(), "supplier is required");

        let err = ValidationError::MustNotBeNegative {
            field: "purchased_value".to_string(),
        };
        assert_eq!(err.to_string(), "purchased_value must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "supplier".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: supplier is required");
    }
}
