//! Bean -> client proxy cache

use std::fmt::Write as _;
use std::sync::Arc;

use dashmap::DashMap;

use crate::bean::{Bean, BeanId};
use crate::object::ClientProxy;

#[derive(Debug)]
struct CacheEntry {
    bean: Arc<Bean>,
    proxy: Arc<ClientProxy>,
}

/// Concurrent, identity-keyed store of previously created proxies
///
/// Entries are only ever inserted; once a bean has a proxy, it keeps that
/// proxy for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct ProxyCache {
    entries: DashMap<BeanId, CacheEntry>,
}

impl ProxyCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with room for `capacity` beans
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Cached proxy for `bean`
    pub fn get(&self, bean: &Bean) -> Option<Arc<ClientProxy>> {
        self.entries
            .get(&bean.id())
            .map(|entry| Arc::clone(&entry.proxy))
    }

    /// Insert `proxy` unless `bean` already has one; returns the stored proxy
    pub fn put_if_absent(&self, bean: &Arc<Bean>, proxy: Arc<ClientProxy>) -> Arc<ClientProxy> {
        let entry = self.entries.entry(bean.id()).or_insert_with(|| CacheEntry {
            bean: Arc::clone(bean),
            proxy,
        });
        Arc::clone(&entry.proxy)
    }

    /// Whether `bean` has a proxy
    pub fn contains(&self, bean: &Bean) -> bool {
        self.entries.contains_key(&bean.id())
    }

    /// Number of cached proxies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic dump of all `(bean, proxy)` pairs, sorted by bean name
    pub fn describe(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.bean.to_string(), entry.proxy.to_string()))
            .collect();
        pairs.sort();

        let mut out = String::from("ProxyPool (bean -> proxy): ");
        out.push('{');
        for (i, (bean, proxy)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} -> {}", bean, proxy);
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{ClassSynthesizer, ProxySynthesizer};
    use crate::surface::TypeSurfaceResolver;
    use beanpool_types::TypeContext;

    fn fresh_proxy(ctx: &TypeContext, synthesizer: &ClassSynthesizer) -> Arc<ClientProxy> {
        let surface = TypeSurfaceResolver::new(ctx).resolve(&[]);
        let class = synthesizer.synthesize(ctx, &surface).unwrap();
        Arc::new(synthesizer.instantiate(&class).unwrap())
    }

    #[test]
    fn test_cache_creation() {
        let cache = ProxyCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.describe(), "ProxyPool (bean -> proxy): {}");
    }

    #[test]
    fn test_put_if_absent_keeps_first() {
        let ctx = TypeContext::new();
        let synthesizer = ClassSynthesizer::new();
        let cache = ProxyCache::with_capacity(4);
        let bean = Arc::new(Bean::builder("svc").build());

        let first = fresh_proxy(&ctx, &synthesizer);
        let second = fresh_proxy(&ctx, &synthesizer);

        let stored = cache.put_if_absent(&bean, Arc::clone(&first));
        assert!(Arc::ptr_eq(&stored, &first));

        let stored = cache.put_if_absent(&bean, second);
        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&cache.get(&bean).unwrap(), &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_name_different_identity() {
        let ctx = TypeContext::new();
        let synthesizer = ClassSynthesizer::new();
        let cache = ProxyCache::new();
        let a = Arc::new(Bean::builder("twin").build());
        let b = Arc::new(Bean::builder("twin").build());

        cache.put_if_absent(&a, fresh_proxy(&ctx, &synthesizer));
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.get(&b).is_none());
    }

    #[test]
    fn test_describe_lists_pairs() {
        let ctx = TypeContext::new();
        let synthesizer = ClassSynthesizer::new();
        let cache = ProxyCache::new();
        let bean = Arc::new(Bean::builder("svc").build());
        let proxy = cache.put_if_absent(&bean, fresh_proxy(&ctx, &synthesizer));

        let expected = format!("ProxyPool (bean -> proxy): {{{} -> {}}}", bean, proxy);
        assert_eq!(cache.describe(), expected);
    }
}
