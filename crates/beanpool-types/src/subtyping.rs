//! Nominal assignability
//!
//! Implements `sub <: sup` over classes and interfaces: reflexive, through
//! `extends`/`implements` edges, and with `Object` above everything.

use crate::context::TypeContext;
use crate::ty::TypeId;
use rustc_hash::FxHashSet;

/// Context for checking subtyping relationships
#[derive(Debug, Clone, Copy)]
pub struct SubtypingContext<'a> {
    type_ctx: &'a TypeContext,
}

impl<'a> SubtypingContext<'a> {
    /// Create a new subtyping context
    pub fn new(type_ctx: &'a TypeContext) -> Self {
        SubtypingContext { type_ctx }
    }

    /// Check if `sub` is a subtype of `sup` (sub <: sup)
    ///
    /// Returns true if a value of type `sub` can be used where `sup` is expected.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        // Reflexivity: T <: T
        if sub == sup {
            return self.type_ctx.get(sub).is_some();
        }
        if self.type_ctx.get(sub).is_none() || self.type_ctx.get(sup).is_none() {
            return false;
        }
        if sup == self.type_ctx.object_type() {
            return true;
        }

        let mut visited = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for parent in self.type_ctx.direct_supertypes(current) {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }
        false
    }

    /// Check whether `sup` is assignable from `sub`
    pub fn is_assignable_from(&self, sup: TypeId, sub: TypeId) -> bool {
        self.is_subtype(sub, sup)
    }
}
