use thiserror::Error;

use crate::domain::product::ProductLookup;

/// The only failure the product store produces.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProductNotFound {
    #[error("There are no products in the database.")]
    Empty,
    #[error("Product with {} {} was not found.", .0.field(), .0.value())]
    NoMatch(ProductLookup),
}

impl ProductNotFound {
    pub fn empty() -> Self {
        Self::Empty
    }

    pub fn no_match(lookup: ProductLookup) -> Self {
        Self::NoMatch(lookup)
    }

    /// The field/value that had no match; `None` when the collection is empty.
    pub fn lookup(&self) -> Option<&ProductLookup> {
        match self {
            Self::Empty => None,
            Self::NoMatch(lookup) => Some(lookup),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    NotFound(#[from] ProductNotFound),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ProductNotFound> for ApplicationError {
    fn from(value: ProductNotFound) -> Self {
        Self::Domain(DomainError::NotFound(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text safe to hand back to a client. Not-found and bad-request messages
    /// describe the caller's own input and are passed through verbatim.
    pub fn user_message(&self) -> &str {
        match self {
            Self::NotFound { message, .. } | Self::BadRequest { message, .. } => message.as_str(),
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::NotFound { correlation_id, .. }
            | Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::NotFound(not_found)) => Self::NotFound {
                message: not_found.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{ProductId, ProductLookup};
    use crate::errors::{ApplicationError, DomainError, InterfaceError, ProductNotFound};

    #[test]
    fn not_found_messages_name_field_and_value() {
        let by_revision = ProductNotFound::no_match(ProductLookup::Revision("R1".to_owned()));
        let by_id = ProductNotFound::no_match(ProductLookup::Id(ProductId(7)));

        assert_eq!(by_revision.to_string(), "Product with revision R1 was not found.");
        assert_eq!(by_id.to_string(), "Product with id 7 was not found.");
        assert_eq!(ProductNotFound::empty().to_string(), "There are no products in the database.");
        assert_eq!(by_id.lookup(), Some(&ProductLookup::Id(ProductId(7))));
        assert_eq!(ProductNotFound::Empty.lookup(), None);
    }

    #[test]
    fn not_found_maps_to_not_found_interface_error_with_message() {
        let interface = ApplicationError::from(ProductNotFound::empty()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::NotFound {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), "There are no products in the database.");
    }

    #[test]
    fn domain_not_found_keeps_lookup_in_message() {
        let interface = ApplicationError::from(DomainError::from(ProductNotFound::no_match(
            ProductLookup::Revision("B".to_owned()),
        )))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.user_message(), "Product with revision B was not found.");
    }

    #[test]
    fn bad_request_passes_caller_message_through() {
        let interface = InterfaceError::BadRequest {
            message: "id must be an integer".to_owned(),
            correlation_id: "req-5".to_owned(),
        };

        assert_eq!(interface.user_message(), "id must be an integer");
        assert_eq!(interface.correlation_id(), "req-5");
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("database lock timeout".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("unknown backend".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
