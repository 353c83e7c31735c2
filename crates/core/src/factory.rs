//! Point-to-handle factories.
//!
//! Chain adapters expose their SDKs and signers through [`OmniFactory`]. The
//! core never constructs handles itself; it only memoizes them with
//! [`MemoizedFactory`] so that every request for an equal point within one run
//! is served by the same handle.

use crate::FactoryError;
use async_trait::async_trait;
use dashmap::DashMap;
use omnigraph_types::{serialize_point, OmniPoint};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Produces a handle of type `T` for a point.
#[async_trait]
pub trait OmniFactory<T: ?Sized + Send + Sync>: Send + Sync {
    /// Create (or look up) the handle for `point`.
    async fn create(&self, point: &OmniPoint) -> Result<Arc<T>, FactoryError>;
}

#[async_trait]
impl<T, F> OmniFactory<T> for Arc<F>
where
    T: ?Sized + Send + Sync,
    F: OmniFactory<T> + ?Sized,
{
    async fn create(&self, point: &OmniPoint) -> Result<Arc<T>, FactoryError> {
        (**self).create(point).await
    }
}

#[async_trait]
impl<T, F> OmniFactory<T> for &F
where
    T: ?Sized + Send + Sync,
    F: OmniFactory<T> + ?Sized,
{
    async fn create(&self, point: &OmniPoint) -> Result<Arc<T>, FactoryError> {
        (**self).create(point).await
    }
}

/// Memoizing wrapper around another factory.
///
/// Concurrent requests for equal points share a single construction. A failed
/// construction is not cached, so the next request tries again.
///
/// Wrapping a borrowed factory scopes the cache to the borrow; configurator
/// runs use this to get one handle per point.
pub struct MemoizedFactory<F, T: ?Sized> {
    inner: F,
    cache: DashMap<String, Arc<OnceCell<Arc<T>>>>,
}

impl<F, T: ?Sized> MemoizedFactory<F, T> {
    /// Wrap `inner` with a per-point cache.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of points with a cache slot.
    pub fn cached_points(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<F, T> OmniFactory<T> for MemoizedFactory<F, T>
where
    F: OmniFactory<T>,
    T: ?Sized + Send + Sync,
{
    async fn create(&self, point: &OmniPoint) -> Result<Arc<T>, FactoryError> {
        let key = serialize_point(point);
        let cell = self.cache.entry(key).or_default().clone();

        let handle = cell
            .get_or_try_init(|| async {
                debug!(%point, "Creating handle");
                self.inner.create(point).await
            })
            .await?;

        Ok(Arc::clone(handle))
    }
}

/// Factory backed by an async closure.
pub struct FnFactory<F, T: ?Sized> {
    create: F,
    _handle: PhantomData<fn() -> Arc<T>>,
}

/// Build a factory from an async closure taking the point by value.
pub fn factory_fn<F, Fut, T>(create: F) -> FnFactory<F, T>
where
    F: Fn(OmniPoint) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<T>, FactoryError>> + Send,
    T: ?Sized + Send + Sync,
{
    FnFactory {
        create,
        _handle: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T> OmniFactory<T> for FnFactory<F, T>
where
    F: Fn(OmniPoint) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<T>, FactoryError>> + Send,
    T: ?Sized + Send + Sync,
{
    async fn create(&self, point: &OmniPoint) -> Result<Arc<T>, FactoryError> {
        (self.create)(point.clone()).await
    }
}
