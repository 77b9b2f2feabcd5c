//! Client proxy pool
//!
//! Entry point of the crate. On a cache miss the pool resolves the bean's
//! registry index, computes its type surface, and synthesizes a proxy bound
//! to a fresh handler. Synthesis is not serialized per bean: racing callers
//! may each build a proxy, and the cache's insert-if-absent picks the one
//! every caller gets back.

use std::fmt;
use std::sync::Arc;

use beanpool_types::TypeContext;

use crate::bean::Bean;
use crate::cache::ProxyCache;
use crate::handler::{HandlerFactory, ProxyMethodHandlerFactory};
use crate::object::ClientProxy;
use crate::options::PoolOptions;
use crate::registry::BeanRegistry;
use crate::surface::TypeSurfaceResolver;
use crate::synth::{ClassSynthesizer, ProxyFactory, ProxySynthesizer};
use crate::{ProxyError, ProxyResult};

/// A pool of client proxies, one per bean
pub struct ProxyPool {
    registry: Arc<dyn BeanRegistry>,
    types: Arc<TypeContext>,
    factory: ProxyFactory,
    handlers: Arc<dyn HandlerFactory>,
    cache: ProxyCache,
    options: PoolOptions,
}

impl ProxyPool {
    /// Create a pool with the default synthesizer, handler factory and options
    pub fn new(registry: Arc<dyn BeanRegistry>, types: Arc<TypeContext>) -> Self {
        Self::builder(registry, types).build()
    }

    /// Start configuring a pool
    pub fn builder(registry: Arc<dyn BeanRegistry>, types: Arc<TypeContext>) -> ProxyPoolBuilder {
        ProxyPoolBuilder {
            registry,
            types,
            synthesizer: None,
            handlers: None,
            options: PoolOptions::default(),
        }
    }

    /// Get the client proxy for `bean`, creating it on first use
    ///
    /// Fails with [`ProxyError::UnknownBean`] when the registry does not hold
    /// `bean`, and with [`ProxyError::Unproxyable`] when no proxy type can be
    /// built for its declared types. Failures leave the cache untouched, so a
    /// later call tries again.
    pub fn get_client_proxy(&self, bean: &Arc<Bean>) -> ProxyResult<Arc<ClientProxy>> {
        if let Some(proxy) = self.cache.get(bean) {
            tracing::trace!(bean = bean.name(), "client proxy cache hit");
            return Ok(proxy);
        }

        let bean_index = self
            .registry
            .index_of(bean)
            .ok_or_else(|| ProxyError::UnknownBean {
                bean: bean.to_string(),
            })?;

        let surface = TypeSurfaceResolver::new(&self.types).resolve(bean.types());
        let handler = self.handlers.make_handler(bean, bean_index, &self.registry);
        let proxy = self
            .factory
            .create(&self.types, &surface, handler)
            .map_err(|source| {
                tracing::warn!(bean = bean.name(), error = %source, "could not create client proxy");
                ProxyError::Unproxyable {
                    bean: bean.name().to_string(),
                    source,
                }
            })?;

        let stored = self.cache.put_if_absent(bean, Arc::clone(&proxy));
        if Arc::ptr_eq(&stored, &proxy) {
            tracing::debug!(bean = bean.name(), bean_index, proxy = %stored, "client proxy created");
        } else {
            tracing::debug!(bean = bean.name(), "discarding client proxy that lost a creation race");
        }
        Ok(stored)
    }

    /// Proxy cache
    pub fn cache(&self) -> &ProxyCache {
        &self.cache
    }

    /// Type context the pool resolves surfaces against
    pub fn types(&self) -> &Arc<TypeContext> {
        &self.types
    }

    /// Options the pool was built with
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Diagnostic dump of the cache
    pub fn describe(&self) -> String {
        self.cache.describe()
    }
}

impl fmt::Display for ProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Proxy pool")?;
        writeln!(f, "{}", self.cache.describe())
    }
}

impl fmt::Debug for ProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyPool")
            .field("cached", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Builder for [`ProxyPool`]
pub struct ProxyPoolBuilder {
    registry: Arc<dyn BeanRegistry>,
    types: Arc<TypeContext>,
    synthesizer: Option<Arc<dyn ProxySynthesizer>>,
    handlers: Option<Arc<dyn HandlerFactory>>,
    options: PoolOptions,
}

impl ProxyPoolBuilder {
    /// Use a custom synthesis facility instead of [`ClassSynthesizer`]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn ProxySynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Use a custom handler factory instead of [`ProxyMethodHandlerFactory`]
    pub fn handler_factory(mut self, handlers: Arc<dyn HandlerFactory>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Set pool options
    pub fn options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the pool
    pub fn build(self) -> ProxyPool {
        let options = self.options;
        let synthesizer = self
            .synthesizer
            .unwrap_or_else(|| Arc::new(ClassSynthesizer::with_options(&options)));
        let handlers = self
            .handlers
            .unwrap_or_else(|| Arc::new(ProxyMethodHandlerFactory::default()));

        ProxyPool {
            registry: self.registry,
            types: self.types,
            factory: ProxyFactory::new(synthesizer),
            handlers,
            cache: ProxyCache::with_capacity(options.initial_capacity),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BeanManager;
    use beanpool_types::ClassType;

    fn pool_with(manager: &Arc<BeanManager>, ctx: TypeContext) -> ProxyPool {
        let registry: Arc<dyn BeanRegistry> = Arc::clone(manager) as Arc<dyn BeanRegistry>;
        ProxyPool::new(registry, Arc::new(ctx))
    }

    #[test]
    fn test_cache_hit_returns_same_instance() {
        let mut ctx = TypeContext::new();
        let foo = ctx.register_class(ClassType::new("Foo")).unwrap();
        let manager = Arc::new(BeanManager::new());
        let bean = manager.add_bean(Bean::with_closure(&ctx, "foo", foo));
        let pool = pool_with(&manager, ctx);

        let first = pool.get_client_proxy(&bean).unwrap();
        let second = pool.get_client_proxy(&bean).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.cache().len(), 1);
    }

    #[test]
    fn test_unknown_bean() {
        let manager = Arc::new(BeanManager::new());
        let pool = pool_with(&manager, TypeContext::new());
        let stranger = Arc::new(Bean::builder("stranger").build());

        let err = pool.get_client_proxy(&stranger).unwrap_err();
        assert!(matches!(err, ProxyError::UnknownBean { .. }));
        assert!(err.to_string().ends_with("is not known to the manager"));
        assert!(pool.cache().is_empty());
    }

    #[test]
    fn test_unproxyable_bean_names_bean() {
        let mut ctx = TypeContext::new();
        let sealed = ctx.register_class(ClassType::new("Sealed").as_final()).unwrap();
        let manager = Arc::new(BeanManager::new());
        let bean = manager.add_bean(Bean::with_closure(&ctx, "sealedBean", sealed));
        let pool = pool_with(&manager, ctx);

        let err = pool.get_client_proxy(&bean).unwrap_err();
        assert_eq!(err.to_string(), "Could not create client proxy for sealedBean");
        assert!(pool.cache().is_empty());
    }

    #[test]
    fn test_display() {
        let manager = Arc::new(BeanManager::new());
        let pool = pool_with(&manager, TypeContext::new());
        assert_eq!(pool.to_string(), "Proxy pool\nProxyPool (bean -> proxy): {}\n");
    }

    #[test]
    fn test_builder_options_reach_synthesizer() {
        let mut ctx = TypeContext::new();
        let foo = ctx.register_class(ClassType::new("Foo")).unwrap();
        let manager = Arc::new(BeanManager::new());
        let bean = manager.add_bean(Bean::with_closure(&ctx, "foo", foo));
        let registry: Arc<dyn BeanRegistry> = manager;

        let pool = ProxyPool::builder(registry, Arc::new(ctx))
            .options(PoolOptions::default().with_proxy_class_suffix("ScopeAdaptor"))
            .build();
        let proxy = pool.get_client_proxy(&bean).unwrap();
        assert!(proxy.class().name.starts_with("Foo$$ScopeAdaptor$"));
        assert_eq!(pool.options().proxy_class_suffix, "ScopeAdaptor");
    }
}
