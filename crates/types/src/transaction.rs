//! Chain-agnostic transactions and their receipts.

use crate::{OmniPoint, PointMap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unsigned mutation request targeting one point.
///
/// `data` is opaque to everything but the chain adapter that produced it and
/// the signer that will submit it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniTransaction {
    /// Contract this transaction is sent to.
    pub point: OmniPoint,

    /// Encoded call data.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,

    /// Human readable summary of the change.
    pub description: String,

    /// Gas limit hint for the signer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,

    /// Native value attached to the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u128>,
}

impl OmniTransaction {
    /// Create a transaction without signer hints.
    pub fn new(point: OmniPoint, data: Vec<u8>, description: impl Into<String>) -> Self {
        Self {
            point,
            data,
            description: description.into(),
            gas_limit: None,
            value: None,
        }
    }

    /// Set the gas limit hint.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Set the attached native value.
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = Some(value);
        self
    }
}

impl fmt::Display for OmniTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.point, self.description)
    }
}

/// Acknowledgement that a signed transaction was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransactionResponse {
    pub transaction_hash: String,
}

/// Confirmation that a submitted transaction was included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransactionReceipt {
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// A transaction together with its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmniTransactionWithReceipt {
    pub transaction: OmniTransaction,
    pub receipt: OmniTransactionReceipt,
}

/// A transaction together with the error that prevented it from landing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmniTransactionWithError<E> {
    pub transaction: OmniTransaction,
    pub error: E,
}

/// One entry of a nested transaction listing.
///
/// Configurators produce their results at different granularities (nothing,
/// one transaction, a list); this type lets them be merged uniformly by
/// [`flatten_transactions`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionSet {
    #[default]
    Empty,
    Single(OmniTransaction),
    List(Vec<OmniTransaction>),
}

impl From<OmniTransaction> for TransactionSet {
    fn from(transaction: OmniTransaction) -> Self {
        TransactionSet::Single(transaction)
    }
}

impl From<Vec<OmniTransaction>> for TransactionSet {
    fn from(transactions: Vec<OmniTransaction>) -> Self {
        TransactionSet::List(transactions)
    }
}

impl<T: Into<TransactionSet>> From<Option<T>> for TransactionSet {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl IntoIterator for TransactionSet {
    type Item = OmniTransaction;
    type IntoIter = std::vec::IntoIter<OmniTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            TransactionSet::Empty => Vec::new().into_iter(),
            TransactionSet::Single(transaction) => vec![transaction].into_iter(),
            TransactionSet::List(transactions) => transactions.into_iter(),
        }
    }
}

/// Concatenate nested transaction listings in input order, skipping empty
/// entries.
pub fn flatten_transactions<I, T>(sets: I) -> Vec<OmniTransaction>
where
    I: IntoIterator<Item = T>,
    T: Into<TransactionSet>,
{
    sets.into_iter()
        .flat_map(|set| set.into().into_iter())
        .collect()
}

/// Group transactions by target point.
///
/// Groups appear in order of first occurrence; inside a group transactions
/// keep their input order. Each entry carries the transaction's index in the
/// input slice.
pub fn group_transactions_by_point(
    transactions: &[OmniTransaction],
) -> Vec<Vec<(usize, &OmniTransaction)>> {
    let mut groups: PointMap<Vec<(usize, &OmniTransaction)>> = PointMap::new();
    for (index, transaction) in transactions.iter().enumerate() {
        groups
            .get_or_insert_with(&transaction.point, Vec::new)
            .push((index, transaction));
    }
    groups.into_values().collect()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let body = raw.strip_prefix("0x").unwrap_or(&raw);
        hex::decode(body).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EndpointId;

    fn transaction(eid: u32, tag: u8) -> OmniTransaction {
        OmniTransaction::new(
            OmniPoint::new(EndpointId(eid), "0xa"),
            vec![tag],
            format!("tx {}", tag),
        )
    }

    #[test]
    fn test_flatten_preserves_order_and_drops_empty() {
        let tx1 = transaction(1, 1);
        let tx2 = transaction(2, 2);
        let tx3 = transaction(1, 3);

        let flat = flatten_transactions([
            TransactionSet::from(tx1.clone()),
            TransactionSet::Empty,
            TransactionSet::from(Vec::new()),
            TransactionSet::from(vec![tx2.clone(), tx3.clone()]),
        ]);

        assert_eq!(flat, vec![tx1, tx2, tx3]);
    }

    #[test]
    fn test_flatten_options() {
        let tx1 = transaction(1, 1);
        let flat = flatten_transactions([None, Some(tx1.clone()), None]);
        assert_eq!(flat, vec![tx1]);
    }

    #[test]
    fn test_flatten_nothing() {
        let flat = flatten_transactions(Vec::<TransactionSet>::new());
        assert!(flat.is_empty());
    }

    #[test]
    fn test_group_by_point() {
        let txs = vec![
            transaction(1, 1),
            transaction(2, 2),
            transaction(1, 3),
            transaction(3, 4),
        ];

        let groups = group_transactions_by_point(&txs);
        let indices: Vec<Vec<usize>> = groups
            .iter()
            .map(|group| group.iter().map(|(index, _)| *index).collect())
            .collect();

        assert_eq!(indices, vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn test_transaction_json_hex_data() {
        let tx = transaction(1, 0xab);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "0xab");

        let back: OmniTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
