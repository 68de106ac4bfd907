//! Domain records returned by the query providers.

use serde::{Deserialize, Serialize};

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `nhash`.
    pub denom: String,
    /// Amount in the smallest unit of the denomination.
    pub amount: u128,
}

impl Coin {
    /// Creates a new coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self { denom: denom.into(), amount }
    }

    /// A zero amount of the given denomination.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }
}

/// A named attribute attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Registered attribute name.
    pub name: String,
    /// Account the attribute is attached to.
    pub account: String,
    /// Attribute payload. Attributes written by this client are JSON typed.
    pub value: serde_json::Value,
}

/// A write intent for attaching an attribute to an account.
///
/// Checked for pre-existence before it is converted into a wire message and
/// batched for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInput {
    /// Registered attribute name.
    pub name: String,
    /// Target account address.
    pub account: String,
    /// JSON payload to write. Defaults to an empty object.
    pub value: serde_json::Value,
}

impl AttributeInput {
    /// An attribute intent carrying an empty JSON object.
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            value: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Sets the JSON payload.
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = value;
        self
    }
}

/// A validator as reported by the staking module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Operator address of the validator.
    pub operator_address: String,
    /// Human-readable name.
    pub moniker: String,
    /// Bonded tokens.
    pub tokens: u128,
    /// Whether the validator is jailed.
    pub jailed: bool,
}

/// A delegation from a delegator to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegator account address.
    pub delegator_address: String,
    /// Validator operator address.
    pub validator_address: String,
    /// Delegated balance.
    pub balance: Coin,
}

/// A block header summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height.
    pub height: u64,
    /// Block hash, hex encoded.
    pub hash: String,
    /// Block time, RFC 3339.
    pub time: String,
}

/// On-chain account state needed for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account address.
    pub address: String,
    /// Immutable account number.
    pub account_number: u64,
    /// Next expected transaction sequence.
    pub sequence: u64,
}
