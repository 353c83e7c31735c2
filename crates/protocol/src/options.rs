//! Executor option encoding.
//!
//! Enforced options are stored on chain as a type 3 option blob:
//!
//! ```text
//! 0x0003 | (worker_id: u8, size: u16, option_type: u8, payload)*
//! ```
//!
//! `size` counts the option type byte plus the payload. All integers are big
//! endian. Encoding is canonical, so two declarations produce equal bytes
//! exactly when they describe the same options in the same order.

use crate::{EnforcedOption, ExecutorOptionType};
use omnigraph_types::Address;
use thiserror::Error;

/// Option blob format version.
pub const TYPE_3: u16 = 3;

/// Worker id of the executor.
pub const EXECUTOR_WORKER_ID: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("Native drop option for message type {msg_type} has no receiver")]
    MissingReceiver { msg_type: u16 },

    #[error("Native drop receiver {0} is not a 32-byte hex address")]
    InvalidReceiver(Address),

    #[error("Option blob is malformed at byte {offset}")]
    Malformed { offset: usize },
}

impl ExecutorOptionType {
    /// On-chain identifier.
    pub fn id(&self) -> u8 {
        match self {
            ExecutorOptionType::LzReceive => 1,
            ExecutorOptionType::NativeDrop => 2,
            ExecutorOptionType::Compose => 3,
            ExecutorOptionType::OrderedExecution => 4,
        }
    }
}

/// Encoder for a type 3 option blob.
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    options: Vec<(u8, Vec<u8>)>,
}

impl ExecutorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one declared option.
    pub fn push(&mut self, option: &EnforcedOption) -> Result<&mut Self, OptionsError> {
        let mut payload = Vec::new();
        match option.option_type {
            ExecutorOptionType::LzReceive => {
                payload.extend_from_slice(&u128::from(option.gas).to_be_bytes());
                push_value(&mut payload, option.value);
            }
            ExecutorOptionType::NativeDrop => {
                let receiver = option.receiver.as_ref().ok_or(OptionsError::MissingReceiver {
                    msg_type: option.msg_type,
                })?;
                payload.extend_from_slice(&option.value.to_be_bytes());
                payload.extend_from_slice(&receiver_bytes(receiver)?);
            }
            ExecutorOptionType::Compose => {
                payload.extend_from_slice(&option.index.to_be_bytes());
                payload.extend_from_slice(&u128::from(option.gas).to_be_bytes());
                push_value(&mut payload, option.value);
            }
            ExecutorOptionType::OrderedExecution => {}
        }
        self.options.push((option.option_type.id(), payload));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Encode the blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = TYPE_3.to_be_bytes().to_vec();
        for (option_type, payload) in &self.options {
            bytes.push(EXECUTOR_WORKER_ID);
            bytes.extend_from_slice(&((payload.len() + 1) as u16).to_be_bytes());
            bytes.push(*option_type);
            bytes.extend_from_slice(payload);
        }
        bytes
    }
}

fn push_value(payload: &mut Vec<u8>, value: u128) {
    if value != 0 {
        payload.extend_from_slice(&value.to_be_bytes());
    }
}

fn receiver_bytes(receiver: &Address) -> Result<Vec<u8>, OptionsError> {
    receiver
        .to_bytes32()
        .and_then(|padded| Address::new(padded).to_bytes())
        .filter(|bytes| bytes.len() == Address::BYTES32)
        .ok_or_else(|| OptionsError::InvalidReceiver(receiver.clone()))
}

/// Encode the options declared for one message type, in declaration order.
pub fn encode_enforced_options<'a>(
    options: impl IntoIterator<Item = &'a EnforcedOption>,
) -> Result<Vec<u8>, OptionsError> {
    let mut encoder = ExecutorOptions::new();
    for option in options {
        encoder.push(option)?;
    }
    Ok(encoder.to_bytes())
}

/// Split an option blob into `(worker_id, option_type, payload)` entries.
///
/// An empty blob means the option was never set and decodes to no entries.
pub fn decode_options(bytes: &[u8]) -> Result<Vec<(u8, u8, Vec<u8>)>, OptionsError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    if bytes.len() < 2 || u16::from_be_bytes([bytes[0], bytes[1]]) != TYPE_3 {
        return Err(OptionsError::Malformed { offset: 0 });
    }

    let mut entries = Vec::new();
    let mut offset = 2;
    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + 4)
            .ok_or(OptionsError::Malformed { offset })?;
        let size = u16::from_be_bytes([header[1], header[2]]) as usize;
        if size == 0 {
            return Err(OptionsError::Malformed { offset });
        }
        let payload = bytes
            .get(offset + 4..offset + 3 + size)
            .ok_or(OptionsError::Malformed { offset })?;
        entries.push((header[0], header[3], payload.to_vec()));
        offset += 3 + size;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz_receive_gas_only() {
        let bytes = encode_enforced_options(&[EnforcedOption::lz_receive(1, 200_000, 0)]).unwrap();
        assert_eq!(
            hex::encode(bytes),
            "00030100110100000000000000000000000000030d40"
        );
    }

    #[test]
    fn test_lz_receive_with_value_and_ordered() {
        let bytes = encode_enforced_options(&[
            EnforcedOption::lz_receive(1, 65_000, 1),
            EnforcedOption::ordered_execution(1),
        ])
        .unwrap();

        let entries = decode_options(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, 1);
        assert_eq!(entries[0].2.len(), 32);
        assert_eq!(entries[1], (EXECUTOR_WORKER_ID, 4, vec![]));
    }

    #[test]
    fn test_native_drop_pads_receiver() {
        let bytes =
            encode_enforced_options(&[EnforcedOption::native_drop(2, 5, Address::new("0xBEEF"))])
                .unwrap();

        let entries = decode_options(&bytes).unwrap();
        let payload = &entries[0].2;
        assert_eq!(payload.len(), 16 + 32);
        assert_eq!(&payload[46..], &[0xbe, 0xef]);
    }

    #[test]
    fn test_native_drop_requires_receiver() {
        let mut option = EnforcedOption::native_drop(2, 5, Address::new("0xBEEF"));
        option.receiver = None;
        assert_eq!(
            encode_enforced_options(&[option]),
            Err(OptionsError::MissingReceiver { msg_type: 2 })
        );

        let base58 = EnforcedOption::native_drop(2, 5, Address::new("9xQeWvG816bUx9EP"));
        assert!(matches!(
            encode_enforced_options(&[base58]),
            Err(OptionsError::InvalidReceiver(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_blob() {
        let mut bytes =
            encode_enforced_options(&[EnforcedOption::compose(1, 0, 50_000, 0)]).unwrap();
        bytes.pop();
        assert!(decode_options(&bytes).is_err());
        assert_eq!(decode_options(&[]), Ok(vec![]));
    }
}
