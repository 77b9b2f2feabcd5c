//! Type surface resolution
//!
//! Splits a bean's declared types into the interfaces a proxy must implement
//! and the single class it must extend.

use beanpool_types::{SubtypingContext, TypeContext, TypeId};
use rustc_hash::FxHashSet;

/// Interfaces plus one superclass a synthesized proxy type must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSurface {
    /// Interfaces in resolution order; the serialization marker comes last
    pub interfaces: Vec<TypeId>,
    /// Class to extend
    pub superclass: TypeId,
}

impl TypeSurface {
    /// Copy with repeated interfaces removed, keeping first occurrences
    pub fn deduplicated(&self) -> TypeSurface {
        let mut seen = FxHashSet::default();
        TypeSurface {
            interfaces: self
                .interfaces
                .iter()
                .copied()
                .filter(|iface| seen.insert(*iface))
                .collect(),
            superclass: self.superclass,
        }
    }
}

/// Computes a [`TypeSurface`] from a set of declared types
#[derive(Debug, Clone, Copy)]
pub struct TypeSurfaceResolver<'a> {
    ctx: &'a TypeContext,
}

impl<'a> TypeSurfaceResolver<'a> {
    /// Create a resolver over a type context
    pub fn new(ctx: &'a TypeContext) -> Self {
        Self { ctx }
    }

    /// Resolve the proxy surface for `types`
    ///
    /// A single left-to-right scan: a class descriptor replaces the current
    /// candidate when there is none yet, or when it is not `Object` and is
    /// assignable to the candidate. The marker interface is always appended,
    /// even when `types` already declares it.
    pub fn resolve(&self, types: &[TypeId]) -> TypeSurface {
        let subtyping = SubtypingContext::new(self.ctx);
        let object = self.ctx.object_type();

        let mut interfaces = Vec::with_capacity(types.len() + 1);
        let mut superclass: Option<TypeId> = None;

        for &ty in types {
            if self.ctx.is_interface(ty) {
                interfaces.push(ty);
                continue;
            }
            superclass = match superclass {
                None => Some(ty),
                Some(current) if ty != object && subtyping.is_assignable_from(current, ty) => {
                    Some(ty)
                }
                keep => keep,
            };
        }

        interfaces.push(self.ctx.serializable_type());
        TypeSurface {
            interfaces,
            superclass: superclass.unwrap_or(object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanpool_types::{ClassType, InterfaceType};

    #[test]
    fn test_class_and_interface() {
        let mut ctx = TypeContext::new();
        let iface = ctx.register_interface(InterfaceType::new("FooInterface")).unwrap();
        let foo = ctx
            .register_class(ClassType::new("Foo").implements(iface))
            .unwrap();

        let surface = TypeSurfaceResolver::new(&ctx).resolve(&[iface, foo]);
        assert_eq!(surface.interfaces, vec![iface, ctx.serializable_type()]);
        assert_eq!(surface.superclass, foo);
    }

    #[test]
    fn test_interfaces_only_defaults_to_object() {
        let mut ctx = TypeContext::new();
        let a = ctx.register_interface(InterfaceType::new("BarA")).unwrap();
        let b = ctx.register_interface(InterfaceType::new("BarB")).unwrap();

        let surface = TypeSurfaceResolver::new(&ctx).resolve(&[a, b]);
        assert_eq!(surface.interfaces, vec![a, b, ctx.serializable_type()]);
        assert_eq!(surface.superclass, ctx.object_type());
    }

    #[test]
    fn test_object_never_displaces_more_specific_class() {
        let mut ctx = TypeContext::new();
        let foo = ctx.register_class(ClassType::new("Foo")).unwrap();
        let object = ctx.object_type();
        let resolver = TypeSurfaceResolver::new(&ctx);

        assert_eq!(resolver.resolve(&[object, foo]).superclass, foo);
        assert_eq!(resolver.resolve(&[foo, object]).superclass, foo);
    }

    #[test]
    fn test_most_derived_in_chain_wins_in_any_order() {
        let mut ctx = TypeContext::new();
        let a = ctx.register_class(ClassType::new("A")).unwrap();
        let b = ctx.register_class(ClassType::new("B").extends(a)).unwrap();
        let c = ctx.register_class(ClassType::new("C").extends(b)).unwrap();
        let object = ctx.object_type();
        let resolver = TypeSurfaceResolver::new(&ctx);

        assert_eq!(resolver.resolve(&[object, a, b, c]).superclass, c);
        assert_eq!(resolver.resolve(&[c, b, a, object]).superclass, c);
        assert_eq!(resolver.resolve(&[b, object, c, a]).superclass, c);
    }

    #[test]
    fn test_unrelated_classes_keep_first_seen() {
        let mut ctx = TypeContext::new();
        let left = ctx.register_class(ClassType::new("Left")).unwrap();
        let right = ctx.register_class(ClassType::new("Right")).unwrap();

        let surface = TypeSurfaceResolver::new(&ctx).resolve(&[left, right]);
        assert_eq!(surface.superclass, left);
    }

    #[test]
    fn test_marker_appended_even_if_declared() {
        let ctx = TypeContext::new();
        let marker = ctx.serializable_type();

        let surface = TypeSurfaceResolver::new(&ctx).resolve(&[marker]);
        assert_eq!(surface.interfaces, vec![marker, marker]);
        assert_eq!(surface.deduplicated().interfaces, vec![marker]);
    }

    #[test]
    fn test_empty_types() {
        let ctx = TypeContext::new();
        let surface = TypeSurfaceResolver::new(&ctx).resolve(&[]);
        assert_eq!(surface.interfaces, vec![ctx.serializable_type()]);
        assert_eq!(surface.superclass, ctx.object_type());
    }
}
