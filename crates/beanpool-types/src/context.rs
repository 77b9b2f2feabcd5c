//! Type context: the arena that owns every type descriptor

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::TypeError;
use crate::ty::{ClassType, InterfaceType, Type, TypeId};
use crate::TypeResult;

/// Name of the universal base class
pub const OBJECT_TYPE_NAME: &str = "Object";

/// Name of the serialization-capability marker interface
pub const SERIALIZABLE_TYPE_NAME: &str = "Serializable";

const OBJECT_TYPE: TypeId = TypeId(0);
const SERIALIZABLE_TYPE: TypeId = TypeId(1);

/// Unique identifier for a type context
///
/// A [`TypeId`] only means something inside the context that issued it;
/// anything that caches by type id across calls keys on this as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ContextId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Arena of class and interface descriptors
///
/// Every context starts with two built-in types: the universal base class
/// `Object`, and the marker interface `Serializable`. Types are never removed,
/// so a [`TypeId`] stays valid for the lifetime of its context.
///
/// A clone starts out with the same types but gets its own [`ContextId`],
/// since the two may register different types under the same ids afterwards.
#[derive(Debug)]
pub struct TypeContext {
    id: ContextId,
    types: Vec<Type>,
    name_to_id: FxHashMap<String, TypeId>,
}

impl TypeContext {
    /// Create a context holding only the built-in types
    pub fn new() -> Self {
        let mut ctx = Self {
            id: ContextId::next(),
            types: Vec::new(),
            name_to_id: FxHashMap::default(),
        };
        ctx.push(Type::Class(ClassType::new(OBJECT_TYPE_NAME)));
        ctx.push(Type::Interface(InterfaceType::new(SERIALIZABLE_TYPE_NAME)));
        ctx
    }

    /// Identity of this context
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The universal base class
    pub fn object_type(&self) -> TypeId {
        OBJECT_TYPE
    }

    /// The serialization-capability marker interface
    pub fn serializable_type(&self) -> TypeId {
        SERIALIZABLE_TYPE
    }

    /// Register a new class
    pub fn register_class(&mut self, class: ClassType) -> TypeResult<TypeId> {
        self.check_name(&class.name)?;
        if let Some(parent) = class.extends {
            match self.try_get(parent)? {
                Type::Class(c) if c.is_final => {
                    return Err(TypeError::FinalSuperclass {
                        name: c.name.clone(),
                    })
                }
                Type::Class(_) => {}
                other => {
                    return Err(TypeError::NotAClass {
                        name: other.name().to_string(),
                    })
                }
            }
        }
        for &iface in &class.implements {
            self.expect_interface(iface)?;
        }
        Ok(self.push(Type::Class(class)))
    }

    /// Register a new interface
    pub fn register_interface(&mut self, iface: InterfaceType) -> TypeResult<TypeId> {
        self.check_name(&iface.name)?;
        for &parent in &iface.extends {
            self.expect_interface(parent)?;
        }
        Ok(self.push(Type::Interface(iface)))
    }

    /// Get a type by id
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    /// Look up a type by name
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Name of a type, or `"<unknown>"` for a foreign id
    pub fn name(&self, id: TypeId) -> &str {
        self.get(id).map(Type::name).unwrap_or("<unknown>")
    }

    /// Interface-ness flag of a type (`false` for a foreign id)
    pub fn is_interface(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(Type::is_interface)
    }

    /// Number of registered types, built-ins included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the built-ins are present from construction
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Direct supertypes of a type
    ///
    /// Classes without an explicit parent report `Object`; `Object` itself
    /// and interfaces without parents report nothing beyond their interfaces.
    pub fn direct_supertypes(&self, id: TypeId) -> Vec<TypeId> {
        match self.get(id) {
            Some(Type::Class(c)) => {
                let mut supers = Vec::with_capacity(c.implements.len() + 1);
                match c.extends {
                    Some(parent) => supers.push(parent),
                    None if id != OBJECT_TYPE => supers.push(OBJECT_TYPE),
                    None => {}
                }
                supers.extend(c.implements.iter().copied());
                supers
            }
            Some(Type::Interface(i)) => i.extends.clone(),
            None => Vec::new(),
        }
    }

    /// Transitive supertypes of `id`, including `id` itself and `Object`
    ///
    /// Breadth-first from `id`, each type listed once. This is the declared
    /// type set of a bean whose implementation class is `id`.
    pub fn closure(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            queue.extend(self.direct_supertypes(next));
        }

        if seen.insert(OBJECT_TYPE) {
            order.push(OBJECT_TYPE);
        }
        order
    }

    fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.name_to_id.insert(ty.name().to_string(), id);
        self.types.push(ty);
        id
    }

    fn check_name(&self, name: &str) -> TypeResult<()> {
        if self.name_to_id.contains_key(name) {
            return Err(TypeError::DuplicateType {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn try_get(&self, id: TypeId) -> TypeResult<&Type> {
        self.get(id).ok_or_else(|| TypeError::UndefinedType {
            id: id.to_string(),
        })
    }

    fn expect_interface(&self, id: TypeId) -> TypeResult<()> {
        match self.try_get(id)? {
            Type::Interface(_) => Ok(()),
            other => Err(TypeError::NotAnInterface {
                name: other.name().to_string(),
            }),
        }
    }
}

impl Clone for TypeContext {
    fn clone(&self) -> Self {
        Self {
            id: ContextId::next(),
            types: self.types.clone(),
            name_to_id: self.name_to_id.clone(),
        }
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}
