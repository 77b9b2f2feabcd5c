//! Proxy synthesis
//!
//! [`ProxySynthesizer`] is the capability that creates new types at runtime:
//! synthesize a class for a [`TypeSurface`], instantiate it, and install a
//! handler on the instance. [`ClassSynthesizer`] is the in-process facility;
//! it builds a [`ProxyClass`] whose vtable routes every method reachable from
//! the surface to the handler slot.
//!
//! [`ProxyFactory`] drives the three steps and folds any failure into a
//! single [`ProxySynthesisError`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use beanpool_types::{ContextId, MethodSignature, SubtypingContext, Type, TypeContext, TypeId};
use dashmap::DashMap;
use thiserror::Error;

use crate::handler::InterceptionHandler;
use crate::object::{ClientProxy, MethodSlot, ProxyClass, VTable};
use crate::options::PoolOptions;
use crate::surface::TypeSurface;

/// Failure to build or instantiate a proxy for a surface
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxySynthesisError {
    /// The superclass is sealed
    #[error("Cannot subclass final class {name}")]
    FinalSuperclass {
        /// Superclass name
        name: String,
    },

    /// The synthesized class has no no-argument construction path
    #[error("{name} has no accessible default constructor")]
    NoDefaultConstructor {
        /// Superclass name
        name: String,
    },

    /// An interface descriptor was supplied as superclass
    #[error("{name} is not a class and cannot be extended")]
    NotAClass {
        /// Offending type name
        name: String,
    },

    /// A class descriptor was supplied as interface
    #[error("{name} is not an interface and cannot be implemented")]
    NotAnInterface {
        /// Offending type name
        name: String,
    },

    /// Two members share name and parameters but disagree on return type
    #[error("Conflicting signatures for {method} in {first} and {second}")]
    ConflictingMember {
        /// Method name
        method: String,
        /// First declaring type
        first: String,
        /// Second declaring type
        second: String,
    },

    /// A type id that does not belong to the type context
    #[error("Undefined type: {id}")]
    UndefinedType {
        /// Rendered id
        id: String,
    },

    /// The instance already carries a handler
    #[error("Handler already attached to {class}")]
    HandlerAlreadyAttached {
        /// Proxy class name
        class: String,
    },

    /// Any other refusal by the synthesis facility
    #[error("Proxy synthesis rejected: {0}")]
    Rejected(String),
}

/// Capability for creating proxy types at runtime
pub trait ProxySynthesizer: Send + Sync {
    /// Create (or reuse) a class implementing the surface
    fn synthesize(
        &self,
        ctx: &TypeContext,
        surface: &TypeSurface,
    ) -> Result<Arc<ProxyClass>, ProxySynthesisError>;

    /// Create an instance through the class's default construction path
    fn instantiate(&self, class: &Arc<ProxyClass>) -> Result<ClientProxy, ProxySynthesisError>;

    /// Install `handler` as the instance's dispatch target
    fn attach_handler(
        &self,
        proxy: &ClientProxy,
        handler: Arc<dyn InterceptionHandler>,
    ) -> Result<(), ProxySynthesisError>;
}

/// In-process proxy class synthesizer
///
/// Classes are memoized per type context and deduplicated surface, so one
/// synthesizer can serve pools over different contexts.
pub struct ClassSynthesizer {
    suffix: String,
    reuse_classes: bool,
    next_class_id: AtomicUsize,
    classes: DashMap<(ContextId, TypeSurface), Arc<ProxyClass>>,
}

impl ClassSynthesizer {
    /// Create a synthesizer with default options
    pub fn new() -> Self {
        Self::with_options(&PoolOptions::default())
    }

    /// Create a synthesizer configured from pool options
    pub fn with_options(options: &PoolOptions) -> Self {
        Self {
            suffix: options.proxy_class_suffix.clone(),
            reuse_classes: options.reuse_proxy_classes,
            next_class_id: AtomicUsize::new(0),
            classes: DashMap::new(),
        }
    }

    /// Number of classes synthesized so far
    pub fn class_count(&self) -> usize {
        self.next_class_id.load(Ordering::Relaxed)
    }

    fn build_class(
        &self,
        ctx: &TypeContext,
        surface: &TypeSurface,
    ) -> Result<ProxyClass, ProxySynthesisError> {
        let ty = lookup(ctx, surface.superclass)?;
        let superclass = ty.as_class().ok_or_else(|| ProxySynthesisError::NotAClass {
            name: ty.name().to_string(),
        })?;
        if superclass.is_final {
            return Err(ProxySynthesisError::FinalSuperclass {
                name: superclass.name.clone(),
            });
        }
        for &iface in &surface.interfaces {
            let ty = lookup(ctx, iface)?;
            if ty.as_interface().is_none() {
                return Err(ProxySynthesisError::NotAnInterface {
                    name: ty.name().to_string(),
                });
            }
        }

        let mut members = MemberCollector::new(ctx);
        members.collect(surface.superclass)?;
        for &iface in &surface.interfaces {
            members.collect(iface)?;
        }

        let id = self.next_class_id.fetch_add(1, Ordering::Relaxed);
        Ok(ProxyClass {
            id,
            name: format!("{}$${}${}", superclass.name, self.suffix, id),
            superclass: surface.superclass,
            interfaces: surface.interfaces.clone(),
            vtable: members.vtable,
            has_default_constructor: superclass.has_default_constructor,
        })
    }
}

impl Default for ClassSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySynthesizer for ClassSynthesizer {
    fn synthesize(
        &self,
        ctx: &TypeContext,
        surface: &TypeSurface,
    ) -> Result<Arc<ProxyClass>, ProxySynthesisError> {
        let key = (ctx.id(), surface.deduplicated());
        if self.reuse_classes {
            if let Some(class) = self.classes.get(&key) {
                return Ok(Arc::clone(class.value()));
            }
        }

        let class = Arc::new(self.build_class(ctx, &key.1)?);
        tracing::debug!(
            class = %class.name,
            interfaces = class.interfaces.len(),
            methods = class.vtable.method_count(),
            "synthesized proxy class"
        );

        if !self.reuse_classes {
            return Ok(class);
        }
        Ok(Arc::clone(self.classes.entry(key).or_insert(class).value()))
    }

    fn instantiate(&self, class: &Arc<ProxyClass>) -> Result<ClientProxy, ProxySynthesisError> {
        if !class.has_default_constructor {
            return Err(ProxySynthesisError::NoDefaultConstructor {
                name: class.name.clone(),
            });
        }
        Ok(ClientProxy::new(Arc::clone(class)))
    }

    fn attach_handler(
        &self,
        proxy: &ClientProxy,
        handler: Arc<dyn InterceptionHandler>,
    ) -> Result<(), ProxySynthesisError> {
        proxy
            .set_handler(handler)
            .map_err(|_| ProxySynthesisError::HandlerAlreadyAttached {
                class: proxy.class().name.clone(),
            })
    }
}

fn lookup(ctx: &TypeContext, id: TypeId) -> Result<&Type, ProxySynthesisError> {
    ctx.get(id).ok_or_else(|| ProxySynthesisError::UndefinedType {
        id: id.to_string(),
    })
}

/// Walks a type and its supertypes, merging methods into one vtable
struct MemberCollector<'a> {
    ctx: &'a TypeContext,
    subtyping: SubtypingContext<'a>,
    visited: Vec<TypeId>,
    vtable: VTable,
}

impl<'a> MemberCollector<'a> {
    fn new(ctx: &'a TypeContext) -> Self {
        Self {
            ctx,
            subtyping: SubtypingContext::new(ctx),
            visited: Vec::new(),
            vtable: VTable::new(),
        }
    }

    fn collect(&mut self, root: TypeId) -> Result<(), ProxySynthesisError> {
        for ty in self.ctx.closure(root) {
            if self.visited.contains(&ty) {
                continue;
            }
            self.visited.push(ty);
            for signature in lookup(self.ctx, ty)?.methods() {
                self.merge(signature, ty)?;
            }
        }
        Ok(())
    }

    /// Overrides collapse into one slot carrying the most specific return
    /// type seen so far. Every accepted return is a supertype of that one,
    /// so checking against it covers all earlier declarations.
    fn merge(
        &mut self,
        signature: &MethodSignature,
        declared_by: TypeId,
    ) -> Result<(), ProxySynthesisError> {
        let existing = self
            .vtable
            .iter()
            .position(|slot| signature.overrides(&slot.signature()));
        let Some(index) = existing else {
            self.vtable.add_slot(MethodSlot::from_signature(signature, declared_by));
            return Ok(());
        };

        let slot = self.vtable.slot_mut(index);
        match (slot.return_type, signature.return_type) {
            (None, None) => Ok(()),
            (Some(current), Some(candidate)) if self.subtyping.is_subtype(current, candidate) => {
                Ok(())
            }
            (Some(current), Some(candidate)) if self.subtyping.is_subtype(candidate, current) => {
                slot.return_type = Some(candidate);
                slot.declared_by = declared_by;
                Ok(())
            }
            _ => Err(ProxySynthesisError::ConflictingMember {
                method: signature.name.clone(),
                first: self.ctx.name(slot.declared_by).to_string(),
                second: self.ctx.name(declared_by).to_string(),
            }),
        }
    }
}

/// Builds client proxies through a [`ProxySynthesizer`]
#[derive(Clone)]
pub struct ProxyFactory {
    synthesizer: Arc<dyn ProxySynthesizer>,
}

impl ProxyFactory {
    /// Create a factory over a synthesis facility
    pub fn new(synthesizer: Arc<dyn ProxySynthesizer>) -> Self {
        Self { synthesizer }
    }

    /// Synthesize, instantiate, and wire `handler` into a new proxy
    pub fn create(
        &self,
        ctx: &TypeContext,
        surface: &TypeSurface,
        handler: Arc<dyn InterceptionHandler>,
    ) -> Result<Arc<ClientProxy>, ProxySynthesisError> {
        let class = self.synthesizer.synthesize(ctx, surface)?;
        let proxy = self.synthesizer.instantiate(&class)?;
        self.synthesizer.attach_handler(&proxy, handler)?;
        Ok(Arc::new(proxy))
    }
}
