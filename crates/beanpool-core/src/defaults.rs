//! Default constants for pool configuration.

/// Default infix of synthesized proxy class names (`Foo$$ClientProxy$0`).
pub const DEFAULT_PROXY_CLASS_SUFFIX: &str = "ClientProxy";

/// Synthesized classes are shared between surfaces of the same shape by default.
pub const DEFAULT_REUSE_PROXY_CLASSES: bool = true;

/// Default initial capacity of the bean -> proxy cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
