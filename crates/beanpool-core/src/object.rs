//! Synthesized proxy classes and their instances

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use beanpool_types::{MethodSignature, SubtypingContext, TypeContext, TypeId};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use crate::handler::{InterceptionHandler, InvocationError, Value};

/// A method routed through a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSlot {
    /// Method name
    pub name: String,
    /// Parameter types
    pub params: Vec<TypeId>,
    /// Return type (`None` for void)
    pub return_type: Option<TypeId>,
    /// Type that declared the method
    pub declared_by: TypeId,
}

impl MethodSlot {
    /// Slot for a signature declared by `declared_by`
    pub fn from_signature(signature: &MethodSignature, declared_by: TypeId) -> Self {
        Self {
            name: signature.name.clone(),
            params: signature.params.clone(),
            return_type: signature.return_type,
            declared_by,
        }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Signature this slot answers to
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            name: self.name.clone(),
            params: self.params.clone(),
            return_type: self.return_type,
        }
    }
}

/// Method table of a proxy class
#[derive(Debug, Clone, Default)]
pub struct VTable {
    slots: Vec<MethodSlot>,
    by_name: FxHashMap<String, Vec<usize>>,
}

impl VTable {
    /// Create a new empty vtable
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot, returning its index
    pub fn add_slot(&mut self, slot: MethodSlot) -> usize {
        let index = self.slots.len();
        self.by_name.entry(slot.name.clone()).or_default().push(index);
        self.slots.push(slot);
        index
    }

    /// Get a slot by index
    pub fn get(&self, index: usize) -> Option<&MethodSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut MethodSlot {
        &mut self.slots[index]
    }

    /// Indexes of every slot named `name` taking `arity` arguments
    pub fn candidates(&self, name: &str, arity: usize) -> Vec<usize> {
        self.by_name
            .get(name)
            .map(|indexes| {
                indexes
                    .iter()
                    .copied()
                    .filter(|&index| self.slots[index].arity() == arity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find the slot for `name` taking `arity` arguments
    ///
    /// `None` when no slot matches, or when overloads make the pair ambiguous.
    pub fn find(&self, name: &str, arity: usize) -> Option<&MethodSlot> {
        match self.candidates(name, arity).as_slice() {
            [index] => self.get(*index),
            _ => None,
        }
    }

    /// Index of the slot with exactly this name and parameter list
    pub fn find_signature(&self, name: &str, params: &[TypeId]) -> Option<usize> {
        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|&index| self.slots[index].params == params)
    }

    /// Number of slots
    pub fn method_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over slots in table order
    pub fn iter(&self) -> impl Iterator<Item = &MethodSlot> {
        self.slots.iter()
    }
}

/// A type produced by a proxy synthesizer
#[derive(Debug, Clone)]
pub struct ProxyClass {
    /// Synthesizer-assigned class id
    pub id: usize,
    /// Generated class name
    pub name: String,
    /// Extended class
    pub superclass: TypeId,
    /// Implemented interfaces, duplicate-free
    pub interfaces: Vec<TypeId>,
    /// Routed methods
    pub vtable: VTable,
    /// Whether the class can be instantiated without arguments
    pub has_default_constructor: bool,
}

impl ProxyClass {
    /// Whether instances of this class conform to `ty`
    pub fn is_subtype_of(&self, ctx: &TypeContext, ty: TypeId) -> bool {
        let subtyping = SubtypingContext::new(ctx);
        subtyping.is_subtype(self.superclass, ty)
            || self
                .interfaces
                .iter()
                .any(|&iface| subtyping.is_subtype(iface, ty))
    }
}

/// Unique identifier for a proxy instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyId(u64);

impl ProxyId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ProxyId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A client proxy: an instance of a synthesized class whose every surface
/// method is routed to an interception handler
pub struct ClientProxy {
    id: ProxyId,
    class: Arc<ProxyClass>,
    handler: OnceCell<Arc<dyn InterceptionHandler>>,
}

impl ClientProxy {
    pub(crate) fn new(class: Arc<ProxyClass>) -> Self {
        Self {
            id: ProxyId::next(),
            class,
            handler: OnceCell::new(),
        }
    }

    /// Instance id
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Synthesized class of this instance
    pub fn class(&self) -> &Arc<ProxyClass> {
        &self.class
    }

    /// Installed handler, if any
    pub fn handler(&self) -> Option<&Arc<dyn InterceptionHandler>> {
        self.handler.get()
    }

    /// Whether a handler is installed
    pub fn has_handler(&self) -> bool {
        self.handler.get().is_some()
    }

    /// Install the dispatch target; fails if one is already installed
    pub(crate) fn set_handler(
        &self,
        handler: Arc<dyn InterceptionHandler>,
    ) -> Result<(), Arc<dyn InterceptionHandler>> {
        self.handler.set(handler)
    }

    /// Whether this proxy can stand in for a value of type `ty`
    pub fn is_instance_of(&self, ctx: &TypeContext, ty: TypeId) -> bool {
        self.class.is_subtype_of(ctx, ty)
    }

    /// Invoke a surface method by name; the call goes to the handler
    ///
    /// Only for names that resolve to one slot at this argument count.
    /// Same-arity overloads are reached through [`ClientProxy::invoke_slot`].
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
        let candidates = self.class.vtable.candidates(method, args.len());
        match candidates.as_slice() {
            [index] => self.invoke_slot(*index, args),
            [] => Err(InvocationError::NoSuchMethod {
                class: self.class.name.clone(),
                method: method.to_string(),
                arity: args.len(),
            }),
            _ => Err(InvocationError::AmbiguousMethod {
                class: self.class.name.clone(),
                method: method.to_string(),
                arity: args.len(),
                candidates: candidates.len(),
            }),
        }
    }

    /// Invoke the method in vtable slot `index`; the call goes to the handler
    pub fn invoke_slot(&self, index: usize, args: &[Value]) -> Result<Value, InvocationError> {
        let slot = self
            .class
            .vtable
            .get(index)
            .ok_or_else(|| InvocationError::NoSuchSlot {
                class: self.class.name.clone(),
                index,
            })?;
        if slot.arity() != args.len() {
            return Err(InvocationError::ArityMismatch {
                class: self.class.name.clone(),
                method: slot.name.clone(),
                expected: slot.arity(),
                actual: args.len(),
            });
        }
        let handler = self
            .handler
            .get()
            .ok_or_else(|| InvocationError::HandlerNotAttached {
                class: self.class.name.clone(),
            })?;
        handler.invoke(slot, args)
    }
}

impl fmt::Debug for ClientProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("id", &self.id.as_u64())
            .field("class", &self.class.name)
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

impl fmt::Display for ClientProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.class.name, self.id.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(ctx: &TypeContext, name: &str, arity: usize) -> MethodSlot {
        MethodSlot {
            name: name.to_string(),
            params: vec![ctx.object_type(); arity],
            return_type: None,
            declared_by: ctx.object_type(),
        }
    }

    #[test]
    fn test_vtable_find_by_name_and_arity() {
        let ctx = TypeContext::new();
        let mut vtable = VTable::new();
        vtable.add_slot(slot(&ctx, "put", 1));
        vtable.add_slot(slot(&ctx, "put", 2));

        assert_eq!(vtable.method_count(), 2);
        assert_eq!(vtable.find("put", 2).unwrap().arity(), 2);
        assert!(vtable.find("put", 3).is_none());
        assert!(vtable.find("get", 0).is_none());
    }

    #[test]
    fn test_same_arity_overloads_are_not_found_by_name() {
        let ctx = TypeContext::new();
        let mut vtable = VTable::new();
        let by_object = vtable.add_slot(slot(&ctx, "put", 1));
        let by_marker = vtable.add_slot(MethodSlot {
            params: vec![ctx.serializable_type()],
            ..slot(&ctx, "put", 1)
        });

        assert_eq!(vtable.candidates("put", 1), vec![by_object, by_marker]);
        assert!(vtable.find("put", 1).is_none());
        assert_eq!(vtable.find_signature("put", &[ctx.serializable_type()]), Some(by_marker));
        assert_eq!(vtable.find_signature("put", &[ctx.object_type()]), Some(by_object));
        assert_eq!(vtable.find_signature("put", &[]), None);
    }

    #[test]
    fn test_invoke_without_handler() {
        let ctx = TypeContext::new();
        let mut vtable = VTable::new();
        vtable.add_slot(slot(&ctx, "ping", 0));
        let class = Arc::new(ProxyClass {
            id: 0,
            name: "Object$$Test$0".to_string(),
            superclass: ctx.object_type(),
            interfaces: vec![ctx.serializable_type()],
            vtable,
            has_default_constructor: true,
        });
        let proxy = ClientProxy::new(class);

        assert!(matches!(
            proxy.invoke("ping", &[]),
            Err(InvocationError::HandlerNotAttached { .. })
        ));
        assert!(matches!(
            proxy.invoke("pong", &[]),
            Err(InvocationError::NoSuchMethod { .. })
        ));
        assert!(proxy.is_instance_of(&ctx, ctx.serializable_type()));
        assert!(proxy.to_string().starts_with("Object$$Test$0@"));
    }
}
