//! Error types shared by chain adapters, configurators and signers.

use omnigraph_types::OmniPoint;
use thiserror::Error;

/// Failure while reading or encoding on-chain state through a chain SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// The protocol reports the value as never configured.
    ///
    /// Configurators treat this as the facet's default value rather than a
    /// failure.
    #[error("Value is not set: {0}")]
    Unset(String),

    /// The node could not be reached or rejected the query.
    #[error("RPC request failed: {0}")]
    Rpc(String),

    /// A value could not be encoded into, or decoded from, its wire form.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// A dependent handle could not be created.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl SdkError {
    /// Whether this is the protocol's "default/unset" sentinel.
    pub fn is_unset(&self) -> bool {
        matches!(self, SdkError::Unset(_))
    }
}

/// Helpers for applying the unset-sentinel rule to SDK reads.
pub trait SdkResultExt<T> {
    /// Replace an [`SdkError::Unset`] with `T::default()`.
    fn or_default_on_unset(self) -> Result<T, SdkError>
    where
        T: Default;

    /// Replace an [`SdkError::Unset`] with the value produced by `fallback`.
    fn or_else_on_unset(self, fallback: impl FnOnce() -> T) -> Result<T, SdkError>;

    /// Attach the point the call was made at.
    fn at_point(self, point: &OmniPoint) -> Result<T, ConfigureError>;
}

impl<T> SdkResultExt<T> for Result<T, SdkError> {
    fn or_default_on_unset(self) -> Result<T, SdkError>
    where
        T: Default,
    {
        self.or_else_on_unset(T::default)
    }

    fn or_else_on_unset(self, fallback: impl FnOnce() -> T) -> Result<T, SdkError> {
        match self {
            Err(error) if error.is_unset() => Ok(fallback()),
            other => other,
        }
    }

    fn at_point(self, point: &OmniPoint) -> Result<T, ConfigureError> {
        self.map_err(|source| ConfigureError::sdk(point, source))
    }
}

/// Failure to create a handle (SDK or signer) for a point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// No adapter is registered for the point's endpoint.
    #[error("No handle available for {0}")]
    Unsupported(OmniPoint),

    /// The adapter failed to construct the handle.
    #[error("Failed to create handle for {point}: {reason}")]
    Creation { point: OmniPoint, reason: String },
}

/// Failure while signing, submitting or confirming a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The signer refused or failed to sign.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The signed transaction was rejected on submission.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The transaction was submitted but never confirmed, or reverted.
    #[error("Confirmation failed for {transaction_hash}: {reason}")]
    Confirmation {
        transaction_hash: String,
        reason: String,
    },

    /// No signer could be created for the transaction's point.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Failure of a configurator run.
///
/// Any read failure aborts the configurator: a partial transaction list is
/// never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigureError {
    /// Reading current state or building a transaction failed.
    #[error("Chain SDK call at {point} failed: {source}")]
    Sdk {
        point: OmniPoint,
        #[source]
        source: SdkError,
    },

    /// The declared configuration cannot be turned into a transaction.
    #[error("Invalid configuration at {point}: {reason}")]
    Invalid { point: OmniPoint, reason: String },

    /// An SDK handle could not be created.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl ConfigureError {
    /// Attach the point an SDK error occurred at.
    pub fn sdk(point: &OmniPoint, source: SdkError) -> Self {
        ConfigureError::Sdk {
            point: point.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_becomes_default() {
        let read: Result<Vec<u8>, SdkError> = Err(SdkError::Unset("no config".into()));
        assert_eq!(read.or_default_on_unset(), Ok(Vec::new()));
    }

    #[test]
    fn test_other_errors_propagate() {
        let read: Result<u64, SdkError> = Err(SdkError::Rpc("timeout".into()));
        assert_eq!(
            read.or_default_on_unset(),
            Err(SdkError::Rpc("timeout".into()))
        );
    }

    #[test]
    fn test_at_point_names_the_point() {
        let at = OmniPoint::new(omnigraph_types::EndpointId(30_101), "0xAB");
        let read: Result<u64, SdkError> = Err(SdkError::Rpc("timeout".into()));

        let err = read.at_point(&at).unwrap_err();

        assert_eq!(err, ConfigureError::sdk(&at, SdkError::Rpc("timeout".into())));
        assert!(err.to_string().contains("0xab"));
    }

    #[test]
    fn test_values_pass_through() {
        let read: Result<u64, SdkError> = Ok(7);
        assert_eq!(read.or_else_on_unset(|| 1), Ok(7));
    }
}
