//! Type model errors

use thiserror::Error;

/// Errors raised while registering or resolving type descriptors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A type with this name is already registered
    #[error("Duplicate type: {name}")]
    DuplicateType {
        /// Name that was registered twice
        name: String,
    },

    /// Reference to a type id that does not belong to the context
    #[error("Undefined type: {id}")]
    UndefinedType {
        /// Rendered id
        id: String,
    },

    /// A class was expected (e.g. in an `extends` clause of a class)
    #[error("{name} is not a class")]
    NotAClass {
        /// Offending type name
        name: String,
    },

    /// An interface was expected (e.g. in an `implements` clause)
    #[error("{name} is not an interface")]
    NotAnInterface {
        /// Offending type name
        name: String,
    },

    /// Attempt to extend a final class
    #[error("Cannot extend final class {name}")]
    FinalSuperclass {
        /// Final class name
        name: String,
    },
}
