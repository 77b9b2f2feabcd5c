//! Beanpool Type Model
//!
//! Nominal class and interface descriptors, the arena that owns them, and
//! the assignability relation used to pick a proxy's superclass.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod subtyping;
pub mod ty;

pub use context::{ContextId, TypeContext};
pub use error::TypeError;
pub use subtyping::SubtypingContext;
pub use ty::{ClassType, InterfaceType, MethodSignature, Type, TypeId};

/// Result alias for type registration
pub type TypeResult<T> = Result<T, TypeError>;
