//! Property reconciliation.
//!
//! A property ties together three functions over a context:
//!
//! - `get`: read the current value (usually from chain)
//! - `desired`: compute the value the declared configuration asks for
//! - `set`: produce the result (usually a transaction) that moves the
//!   current value to a given desired value
//!
//! [`Property::evaluate`] runs `get` and `desired` concurrently and compares
//! the two with `PartialEq`. Value types are expected to be normalized (see
//! the configurators) so that structural equality means "already satisfied".

use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Deferred call to a property's setter.
pub struct Configure<R>(Box<dyn FnOnce() -> R + Send>);

impl<R> Configure<R> {
    /// Run the setter.
    pub fn call(self) -> R {
        (self.0)()
    }
}

impl<R> fmt::Debug for Configure<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Configure(..)")
    }
}

/// Outcome of evaluating a property.
#[derive(Debug)]
pub enum PropertyState<V, R> {
    /// The current value equals the desired one.
    Configured { value: V },

    /// The current value differs from the desired one.
    ///
    /// `configure` is never invoked automatically.
    Misconfigured {
        value: V,
        desired_value: V,
        configure: Configure<R>,
    },
}

impl<V, R> PropertyState<V, R> {
    pub fn is_configured(&self) -> bool {
        matches!(self, PropertyState::Configured { .. })
    }

    /// The current value.
    pub fn value(&self) -> &V {
        match self {
            PropertyState::Configured { value } | PropertyState::Misconfigured { value, .. } => {
                value
            }
        }
    }

    /// The desired value, if it differs from the current one.
    pub fn desired_value(&self) -> Option<&V> {
        match self {
            PropertyState::Configured { .. } => None,
            PropertyState::Misconfigured { desired_value, .. } => Some(desired_value),
        }
    }

    /// Run the setter if misconfigured.
    pub fn configure(self) -> Option<R> {
        match self {
            PropertyState::Configured { .. } => None,
            PropertyState::Misconfigured { configure, .. } => Some(configure.call()),
        }
    }
}

/// A reconcilable property. See the module documentation.
pub struct Property<G, D, S> {
    get: G,
    desired: D,
    set: Arc<S>,
}

/// Create a property from its getter, desired-value function and setter.
pub fn create_property<G, D, S>(get: G, desired: D, set: S) -> Property<G, D, S> {
    Property::new(get, desired, set)
}

impl<G, D, S> Property<G, D, S> {
    pub fn new(get: G, desired: D, set: S) -> Self {
        Self {
            get,
            desired,
            set: Arc::new(set),
        }
    }

    /// Evaluate the property for `context`.
    ///
    /// Fails with the first error of `get` or `desired`.
    pub async fn evaluate<C, V, E, R, GFut, DFut>(
        &self,
        context: C,
    ) -> Result<PropertyState<V, R>, E>
    where
        C: Clone + Send + 'static,
        V: PartialEq + Clone + Send + 'static,
        G: Fn(C) -> GFut,
        D: Fn(C) -> DFut,
        GFut: Future<Output = Result<V, E>>,
        DFut: Future<Output = Result<V, E>>,
        S: Fn(C, V) -> R + Send + Sync + 'static,
        R: 'static,
    {
        let (value, desired_value) =
            futures::try_join!((self.get)(context.clone()), (self.desired)(context.clone()))?;

        if value == desired_value {
            return Ok(PropertyState::Configured { value });
        }

        let set = Arc::clone(&self.set);
        let target = desired_value.clone();
        Ok(PropertyState::Misconfigured {
            value,
            desired_value,
            configure: Configure(Box::new(move || set(context, target))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Config {
        dvns: Vec<String>,
        thresholds: BTreeMap<String, u64>,
    }

    fn config(dvns: &[&str]) -> Config {
        Config {
            dvns: dvns.iter().map(|s| s.to_string()).collect(),
            thresholds: BTreeMap::from([("confirmations".to_string(), 15)]),
        }
    }

    #[tokio::test]
    async fn test_deep_equal_values_are_configured() {
        let sets = Arc::new(AtomicUsize::new(0));
        let counter = sets.clone();
        let property = create_property(
            |_: ()| async { Ok::<_, String>(config(&["0xa", "0xb"])) },
            |_: ()| async { Ok::<_, String>(config(&["0xa", "0xb"])) },
            move |_: (), _: Config| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let state = property.evaluate(()).await.unwrap();

        assert!(state.is_configured());
        assert!(state.desired_value().is_none());
        assert!(state.configure().is_none());
        assert_eq!(sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_misconfigured_carries_setter() {
        let property = create_property(
            |eid: u32| async move { Ok::<_, String>(format!("peer-of-{}", eid)) },
            |_: u32| async { Ok::<_, String>("0xbeef".to_string()) },
            |eid: u32, desired: String| format!("set {} to {}", eid, desired),
        );

        let state = property.evaluate(2).await.unwrap();

        assert_eq!(state.value(), "peer-of-2");
        assert_eq!(state.desired_value().map(String::as_str), Some("0xbeef"));
        assert_eq!(state.configure(), Some("set 2 to 0xbeef".to_string()));
    }

    #[tokio::test]
    async fn test_configure_is_deferred() {
        let sets = Arc::new(AtomicUsize::new(0));
        let counter = sets.clone();
        let property = create_property(
            |_: ()| async { Ok::<_, String>(1u64) },
            |_: ()| async { Ok::<_, String>(2u64) },
            move |_: (), value: u64| {
                counter.fetch_add(1, Ordering::SeqCst);
                value
            },
        );

        let state = property.evaluate(()).await.unwrap();
        assert_eq!(sets.load(Ordering::SeqCst), 0);

        assert_eq!(state.configure(), Some(2));
        assert_eq!(sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let property = create_property(
            |_: ()| async { Err::<u64, _>("rpc down".to_string()) },
            |_: ()| async { Ok::<_, String>(2u64) },
            |_: (), value: u64| value,
        );

        let err = property.evaluate(()).await.unwrap_err();
        assert_eq!(err, "rpc down");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_and_desired_run_concurrently() {
        let property = create_property(
            |_: ()| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, String>(1u64)
            },
            |_: ()| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, String>(1u64)
            },
            |_: (), value: u64| value,
        );

        let started = tokio::time::Instant::now();
        property.evaluate(()).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(1500));
    }
}
