//! Sign-and-send configuration.

use omnigraph_core::ExecutionMode;

/// Configuration for [`crate::SignAndSend`].
#[derive(Debug, Clone, Default)]
pub struct SignAndSendConfig {
    /// How groups of transactions targeting different points are scheduled.
    ///
    /// Transactions targeting the same point are always sent one after
    /// another, in input order.
    pub mode: ExecutionMode,

    /// Confirmations to wait for per transaction. `None` uses the signer's
    /// default.
    pub confirmations: Option<u32>,
}

impl SignAndSendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduling mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the number of confirmations to wait for.
    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = Some(confirmations);
        self
    }
}
