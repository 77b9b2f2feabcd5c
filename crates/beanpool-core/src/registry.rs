//! Bean registry for managing the container's ordered bean list

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::Bean;

/// The authoritative, ordered list of beans owned by a container
///
/// A bean's position in [`beans`](BeanRegistry::beans) is its stable index.
/// Lookups compare identity, never names.
pub trait BeanRegistry: Send + Sync {
    /// Snapshot of all beans, in registration order
    fn beans(&self) -> Vec<Arc<Bean>>;

    /// Position of `bean` in the bean list
    fn index_of(&self, bean: &Bean) -> Option<usize> {
        self.beans().iter().position(|b| b.id() == bean.id())
    }

    /// Bean at a given index
    fn bean_at(&self, index: usize) -> Option<Arc<Bean>> {
        self.beans().get(index).cloned()
    }
}

/// In-process bean registry
#[derive(Debug, Default)]
pub struct BeanManager {
    beans: RwLock<Vec<Arc<Bean>>>,
}

impl BeanManager {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bean and return the shared handle
    pub fn add_bean(&self, bean: Bean) -> Arc<Bean> {
        let bean = Arc::new(bean);
        self.register(Arc::clone(&bean));
        bean
    }

    /// Register an existing bean handle, returning its index
    ///
    /// Registering the same bean twice keeps the first index.
    pub fn register(&self, bean: Arc<Bean>) -> usize {
        let mut beans = self.beans.write();
        if let Some(index) = beans.iter().position(|b| b.id() == bean.id()) {
            return index;
        }
        beans.push(bean);
        beans.len() - 1
    }

    /// Number of registered beans
    pub fn len(&self) -> usize {
        self.beans.read().len()
    }

    /// Whether no bean is registered
    pub fn is_empty(&self) -> bool {
        self.beans.read().is_empty()
    }
}

impl BeanRegistry for BeanManager {
    fn beans(&self) -> Vec<Arc<Bean>> {
        self.beans.read().clone()
    }

    fn index_of(&self, bean: &Bean) -> Option<usize> {
        self.beans.read().iter().position(|b| b.id() == bean.id())
    }

    fn bean_at(&self, index: usize) -> Option<Arc<Bean>> {
        self.beans.read().get(index).cloned()
    }
}
