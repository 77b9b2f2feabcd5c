//! Beanpool Core
//!
//! Client proxy synthesis and caching for a dependency-injection container:
//! - Bean descriptors and the registry seam that indexes them
//! - Type surface resolution (interfaces + most specific superclass)
//! - Proxy class synthesis with handler-routed vtables
//! - An identity-keyed, insert-only proxy cache
//! - The proxy pool that ties them together
//!
//! ```rust,ignore
//! let pool = ProxyPool::new(registry, Arc::new(types));
//! let proxy = pool.get_client_proxy(&bean)?;
//! proxy.invoke("greet", &[json!("world")])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bean;
pub mod cache;
pub mod defaults;
pub mod handler;
pub mod object;
pub mod options;
pub mod pool;
pub mod registry;
pub mod surface;
pub mod synth;

pub use bean::{Bean, BeanBuilder, BeanId};
pub use cache::ProxyCache;
pub use handler::{
    ContextualDispatch, HandlerFactory, InterceptionHandler, InvocationError, ProxyMethodHandler,
    ProxyMethodHandlerFactory, UnboundDispatch, Value,
};
pub use object::{ClientProxy, MethodSlot, ProxyClass, ProxyId, VTable};
pub use options::{ConfigError, PoolOptions};
pub use pool::{ProxyPool, ProxyPoolBuilder};
pub use registry::{BeanManager, BeanRegistry};
pub use surface::{TypeSurface, TypeSurfaceResolver};
pub use synth::{ClassSynthesizer, ProxyFactory, ProxySynthesisError, ProxySynthesizer};

/// Errors surfaced by [`ProxyPool::get_client_proxy`]
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The bean is not in the owning registry
    #[error("{bean} is not known to the manager")]
    UnknownBean {
        /// Rendered bean
        bean: String,
    },

    /// No proxy type could be built for the bean
    #[error("Could not create client proxy for {bean}")]
    Unproxyable {
        /// Bean name
        bean: String,
        /// Underlying synthesis failure
        source: ProxySynthesisError,
    },
}

/// Proxy pool result
pub type ProxyResult<T> = Result<T, ProxyError>;
