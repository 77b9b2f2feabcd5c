//! Bean descriptors
//!
//! A bean is identified by its [`BeanId`], never by name or declared types:
//! two beans may share both and still be distinct.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use beanpool_types::{TypeContext, TypeId};
use rustc_hash::FxHashSet;

/// Unique identifier for a bean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanId(u64);

impl BeanId {
    /// Create a new unique bean ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        BeanId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for BeanId {
    fn default() -> Self {
        Self::new()
    }
}

/// A container-managed component descriptor
#[derive(Debug)]
pub struct Bean {
    id: BeanId,
    name: String,
    types: Vec<TypeId>,
}

impl Bean {
    /// Start building a bean with the given diagnostic name
    pub fn builder(name: impl Into<String>) -> BeanBuilder {
        BeanBuilder {
            name: name.into(),
            types: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Bean whose declared types are `implementation` and all its supertypes
    pub fn with_closure(ctx: &TypeContext, name: impl Into<String>, implementation: TypeId) -> Self {
        Self::builder(name)
            .with_types(ctx.closure(implementation))
            .build()
    }

    /// Identity of this bean
    pub fn id(&self) -> BeanId {
        self.id
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared types, duplicate-free, in declaration order
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bean[{}#{}]", self.name, self.id.as_u64())
    }
}

/// Builder for [`Bean`]; repeated types are ignored
#[derive(Debug)]
pub struct BeanBuilder {
    name: String,
    types: Vec<TypeId>,
    seen: FxHashSet<TypeId>,
}

impl BeanBuilder {
    /// Declare a type
    pub fn with_type(mut self, ty: TypeId) -> Self {
        if self.seen.insert(ty) {
            self.types.push(ty);
        }
        self
    }

    /// Declare several types
    pub fn with_types(self, types: impl IntoIterator<Item = TypeId>) -> Self {
        types.into_iter().fold(self, BeanBuilder::with_type)
    }

    /// Finish the bean, assigning it a fresh identity
    pub fn build(self) -> Bean {
        Bean {
            id: BeanId::new(),
            name: self.name,
            types: self.types,
        }
    }
}
