//! Core abstractions for omnigraph.
//!
//! # Architecture
//!
//! The reconciliation pipeline is built from a few small pieces:
//!
//! - [`OmniFactory`]: the capability boundary to chain adapters. Given a
//!   point, produce an SDK or signer handle. [`MemoizedFactory`] guarantees
//!   one handle per point per run.
//! - [`Property`]: compare a current value to a desired one and, if they
//!   differ, hand back a deferred setter.
//! - [`Configurator`]: walk a graph, evaluate properties through the factory
//!   and collect [`OmniTransaction`](omnigraph_types::OmniTransaction)s.
//!   [`CompositeConfigurator`] chains configurators in a fixed order.
//! - [`with_retry`]: retry a fallible async call with capped exponential
//!   backoff.
//!
//! Fan-out over independent nodes and edges is controlled by
//! [`ExecutionMode`] and [`run_all`].

mod applicative;
mod configurator;
mod error;
mod factory;
mod property;
mod retry;
mod signer;

pub use applicative::{run_all, ExecutionMode};
pub use configurator::{CompositeConfigurator, Configurator};
pub use error::{ConfigureError, FactoryError, SdkError, SdkResultExt, SignerError};
pub use factory::{factory_fn, FnFactory, MemoizedFactory, OmniFactory};
pub use property::{create_property, Configure, Property, PropertyState};
pub use retry::{retry, with_retry, Attempts, OnRetry, RetryAttempt, RetryConfig, Retrying};
pub use signer::{OmniSigner, OmniSignerFactory};
