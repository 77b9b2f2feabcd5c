//! Interception handlers
//!
//! A proxy owns exactly one handler and routes every surface method to it.
//! How a handler finds the live scoped instance is left to a
//! [`ContextualDispatch`] implementation supplied by the container.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::bean::Bean;
use crate::object::MethodSlot;
use crate::registry::BeanRegistry;

/// Argument and return value of a routed call
pub type Value = serde_json::Value;

/// Errors from invoking a method on a client proxy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// The proxy's surface has no such method
    #[error("{class} has no method {method}/{arity}")]
    NoSuchMethod {
        /// Proxy class name
        class: String,
        /// Requested method
        method: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// Several overloads share the name and argument count
    #[error("{class}.{method}/{arity} matches {candidates} overloads; invoke a slot")]
    AmbiguousMethod {
        /// Proxy class name
        class: String,
        /// Requested method
        method: String,
        /// Number of arguments supplied
        arity: usize,
        /// Number of matching slots
        candidates: usize,
    },

    /// No vtable slot at the given index
    #[error("{class} has no method slot {index}")]
    NoSuchSlot {
        /// Proxy class name
        class: String,
        /// Requested slot index
        index: usize,
    },

    /// The slot takes a different number of arguments
    #[error("{class}.{method} takes {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Proxy class name
        class: String,
        /// Slot method name
        method: String,
        /// Parameters declared by the slot
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// The proxy was invoked before a handler was installed
    #[error("No interception handler attached to {class}")]
    HandlerNotAttached {
        /// Proxy class name
        class: String,
    },

    /// The registry no longer holds the handler's bean at its index
    #[error("Bean index {index} no longer refers to {bean}")]
    StaleBeanIndex {
        /// Bean name
        bean: String,
        /// Index the handler was bound to
        index: usize,
    },

    /// The dispatch subsystem failed
    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

/// Dispatch target installed on a client proxy
pub trait InterceptionHandler: Send + Sync {
    /// Handle a call to `method` on the proxy
    fn invoke(&self, method: &MethodSlot, args: &[Value]) -> Result<Value, InvocationError>;
}

/// Builds the handler for a bean at a given registry index
pub trait HandlerFactory: Send + Sync {
    /// Create a handler bound to `(bean, bean_index, container)`
    fn make_handler(
        &self,
        bean: &Arc<Bean>,
        bean_index: usize,
        container: &Arc<dyn BeanRegistry>,
    ) -> Arc<dyn InterceptionHandler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&Arc<Bean>, usize, &Arc<dyn BeanRegistry>) -> Arc<dyn InterceptionHandler> + Send + Sync,
{
    fn make_handler(
        &self,
        bean: &Arc<Bean>,
        bean_index: usize,
        container: &Arc<dyn BeanRegistry>,
    ) -> Arc<dyn InterceptionHandler> {
        self(bean, bean_index, container)
    }
}

/// Resolves a routed call against the live instance of a bean
pub trait ContextualDispatch: Send + Sync {
    /// Perform `method` on the current instance of `bean`
    fn dispatch(
        &self,
        bean: &Arc<Bean>,
        method: &MethodSlot,
        args: &[Value],
    ) -> Result<Value, InvocationError>;
}

/// Dispatch used when the container installs none
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundDispatch;

impl ContextualDispatch for UnboundDispatch {
    fn dispatch(
        &self,
        bean: &Arc<Bean>,
        method: &MethodSlot,
        _args: &[Value],
    ) -> Result<Value, InvocationError> {
        Err(InvocationError::Dispatch(format!(
            "no contextual dispatch installed for {}.{}",
            bean.name(),
            method.name
        )))
    }
}

/// Default handler: bound to a bean, its index, and the owning container
pub struct ProxyMethodHandler {
    bean: Arc<Bean>,
    bean_index: usize,
    container: Arc<dyn BeanRegistry>,
    dispatch: Arc<dyn ContextualDispatch>,
}

impl ProxyMethodHandler {
    /// Create a handler
    pub fn new(
        bean: Arc<Bean>,
        bean_index: usize,
        container: Arc<dyn BeanRegistry>,
        dispatch: Arc<dyn ContextualDispatch>,
    ) -> Self {
        Self {
            bean,
            bean_index,
            container,
            dispatch,
        }
    }
}

impl InterceptionHandler for ProxyMethodHandler {
    fn invoke(&self, method: &MethodSlot, args: &[Value]) -> Result<Value, InvocationError> {
        let bean = match self.container.bean_at(self.bean_index) {
            Some(bean) if bean.id() == self.bean.id() => bean,
            _ => {
                return Err(InvocationError::StaleBeanIndex {
                    bean: self.bean.name().to_string(),
                    index: self.bean_index,
                })
            }
        };
        self.dispatch.dispatch(&bean, method, args)
    }
}

impl fmt::Debug for ProxyMethodHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyMethodHandler")
            .field("bean", &self.bean.name())
            .field("bean_index", &self.bean_index)
            .finish()
    }
}

/// Factory for [`ProxyMethodHandler`]s sharing one dispatch
#[derive(Clone)]
pub struct ProxyMethodHandlerFactory {
    dispatch: Arc<dyn ContextualDispatch>,
}

impl ProxyMethodHandlerFactory {
    /// Create a factory that routes through `dispatch`
    pub fn new(dispatch: Arc<dyn ContextualDispatch>) -> Self {
        Self { dispatch }
    }
}

impl Default for ProxyMethodHandlerFactory {
    fn default() -> Self {
        Self::new(Arc::new(UnboundDispatch))
    }
}

impl HandlerFactory for ProxyMethodHandlerFactory {
    fn make_handler(
        &self,
        bean: &Arc<Bean>,
        bean_index: usize,
        container: &Arc<dyn BeanRegistry>,
    ) -> Arc<dyn InterceptionHandler> {
        Arc::new(ProxyMethodHandler::new(
            Arc::clone(bean),
            bean_index,
            Arc::clone(container),
            Arc::clone(&self.dispatch),
        ))
    }
}
