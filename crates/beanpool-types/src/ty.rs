//! Core type descriptors

use std::fmt;

/// Unique identifier for a type in a [`TypeContext`](crate::TypeContext)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Position of the type in its context's arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Method signature declared by a class or interface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Parameter types
    pub params: Vec<TypeId>,
    /// Return type (`None` for void)
    pub return_type: Option<TypeId>,
}

impl MethodSignature {
    /// Create a void method without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self
    }

    /// Set return type
    pub fn returns(mut self, ty: TypeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Same name and parameter list (return type ignored)
    pub fn overrides(&self, other: &MethodSignature) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Class type (nominal, single inheritance)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    /// Class name
    pub name: String,
    /// Parent class (`None` means the universal base type)
    pub extends: Option<TypeId>,
    /// Implemented interfaces
    pub implements: Vec<TypeId>,
    /// Declared methods
    pub methods: Vec<MethodSignature>,
    /// Sealed: no subclass may be synthesized
    pub is_final: bool,
    /// Whether instances can be created without arguments
    pub has_default_constructor: bool,
}

impl ClassType {
    /// Create an open class with a default constructor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            implements: Vec::new(),
            methods: Vec::new(),
            is_final: false,
            has_default_constructor: true,
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.extends = Some(parent);
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, iface: TypeId) -> Self {
        self.implements.push(iface);
        self
    }

    /// Add a method
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Drop the no-argument construction path
    pub fn without_default_constructor(mut self) -> Self {
        self.has_default_constructor = false;
        self
    }
}

/// Interface type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    /// Interface name
    pub name: String,
    /// Extended interfaces
    pub extends: Vec<TypeId>,
    /// Declared methods
    pub methods: Vec<MethodSignature>,
}

impl InterfaceType {
    /// Create an empty interface
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add an extended interface
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.extends.push(parent);
        self
    }

    /// Add a method
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Class type
    Class(ClassType),
    /// Interface type
    Interface(InterfaceType),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Class(c) => {
                if c.is_final {
                    write!(f, "final ")?;
                }
                write!(f, "class {}", c.name)
            }
            Type::Interface(i) => write!(f, "interface {}", i.name),
        }
    }
}

impl Type {
    /// Type name
    pub fn name(&self) -> &str {
        match self {
            Type::Class(c) => &c.name,
            Type::Interface(i) => &i.name,
        }
    }

    /// Interface-ness flag
    pub fn is_interface(&self) -> bool {
        matches!(self, Type::Interface(_))
    }

    /// Methods declared directly on this type
    pub fn methods(&self) -> &[MethodSignature] {
        match self {
            Type::Class(c) => &c.methods,
            Type::Interface(i) => &i.methods,
        }
    }

    /// Get the class type if this is a class
    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Get the interface type if this is an interface
    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            Type::Interface(i) => Some(i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(format!("{}", Type::Class(ClassType::new("Foo"))), "class Foo");
        assert_eq!(
            format!("{}", Type::Class(ClassType::new("Foo").as_final())),
            "final class Foo"
        );
        assert_eq!(
            format!("{}", Type::Interface(InterfaceType::new("Bar"))),
            "interface Bar"
        );
    }

    #[test]
    fn test_type_as_methods() {
        let class = Type::Class(ClassType::new("Foo"));
        assert!(!class.is_interface());
        assert!(class.as_class().is_some());
        assert!(class.as_interface().is_none());

        let iface = Type::Interface(InterfaceType::new("Bar"));
        assert!(iface.is_interface());
        assert_eq!(iface.name(), "Bar");
    }

    #[test]
    fn test_method_overrides_ignores_return_type() {
        let a = MethodSignature::new("get").with_param(TypeId(3)).returns(TypeId(1));
        let b = MethodSignature::new("get").with_param(TypeId(3));
        let c = MethodSignature::new("get");

        assert!(a.overrides(&b));
        assert!(!a.overrides(&c));
    }
}
