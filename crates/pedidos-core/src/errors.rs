use thiserror::Error;

/// Result type alias using the canonical structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error that crosses a crate boundary is classified with one of these
/// kinds. Each kind maps to a stable code usable by callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    /// A primary-key, foreign-key or CHECK constraint rejected a write
    ConstraintViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus optional context
/// (operation, entity) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (order or line item identity)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain errors raised while mapping orders to and from storage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PedidoError {
    /// No order header row exists for the identity
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// A stored date could not be parsed as RFC 3339
    #[error("Invalid date '{value}' on order {order_id}: {reason}")]
    InvalidDate {
        order_id: String,
        value: String,
        reason: String,
    },

    /// A caller-supplied value was rejected before reaching the store
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// JSON (de)serialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<PedidoError> for ExError {
    fn from(err: PedidoError) -> Self {
        match err {
            PedidoError::OrderNotFound { order_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(order_id)
                .with_message("Order not found"),

            PedidoError::InvalidDate {
                order_id,
                value,
                reason,
            } => ExError::new(ExErrorKind::Serialization)
                .with_entity_id(order_id)
                .with_message(format!("Invalid stored date '{}': {}", value, reason)),

            PedidoError::InvalidInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            PedidoError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for PedidoError {
    fn from(err: serde_json::Error) -> Self {
        PedidoError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::ConstraintViolation, "ERR_CONSTRAINT_VIOLATION"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::Internal, "ERR_INTERNAL"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::ConstraintViolation)
            .with_op("update_order")
            .with_entity_id("order-1")
            .with_message("FOREIGN KEY constraint failed");

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_CONSTRAINT_VIOLATION]"));
        assert!(rendered.contains("update_order"));
        assert!(rendered.contains("order-1"));
        assert!(rendered.contains("FOREIGN KEY"));
    }

    #[test]
    fn test_pedido_error_conversion() {
        let err: ExError = PedidoError::InvalidDate {
            order_id: "o1".to_string(),
            value: "yesterday".to_string(),
            reason: "input contains invalid characters".to_string(),
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::Serialization);
        assert_eq!(err.entity_id(), Some("o1"));
        assert!(err.message().contains("yesterday"));

        let err: ExError = PedidoError::OrderNotFound {
            order_id: "o2".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
