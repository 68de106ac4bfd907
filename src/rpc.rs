//! Query provider traits and the connection registry.
//!
//! One trait per resource kind, each paginated listing shaped as
//! `(filter params, PageRequest) -> Page<Item>`. The registry is built once
//! at construction from caller-supplied handles, so there is no lazy
//! per-client initialization to race on.

use crate::error::TransportError;
use crate::pagination::{Page, PageRequest};
use crate::types::{AccountInfo, Attribute, Block, Coin, Delegation, Validator};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Bank module queries.
#[async_trait]
pub trait BankQuery: fmt::Debug + Send + Sync {
    /// One page of all balances held by `address`.
    async fn all_balances(
        &self,
        address: &str,
        page: PageRequest,
    ) -> Result<Page<Coin>, TransportError>;

    /// The balance of a single denomination, if the account holds any.
    async fn balance(&self, address: &str, denom: &str) -> Result<Option<Coin>, TransportError>;
}

/// Attribute module queries.
#[async_trait]
pub trait AttributeQuery: fmt::Debug + Send + Sync {
    /// One page of the attributes named `name` on `account`.
    async fn attributes(
        &self,
        account: &str,
        name: &str,
        page: PageRequest,
    ) -> Result<Page<Attribute>, TransportError>;

    /// One page of the accounts carrying the attribute `name`.
    async fn attribute_accounts(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<Page<String>, TransportError>;
}

/// Staking module queries.
#[async_trait]
pub trait StakingQuery: fmt::Debug + Send + Sync {
    /// One page of the validator set.
    async fn validators(&self, page: PageRequest) -> Result<Page<Validator>, TransportError>;

    /// One page of the delegations made by `delegator`.
    async fn delegations(
        &self,
        delegator: &str,
        page: PageRequest,
    ) -> Result<Page<Delegation>, TransportError>;
}

/// Block and node queries.
#[async_trait]
pub trait NodeQuery: fmt::Debug + Send + Sync {
    /// The block at the given height.
    async fn block_by_height(&self, height: u64) -> Result<Block, TransportError>;

    /// The most recent block.
    async fn latest_block(&self) -> Result<Block, TransportError>;
}

/// Auth module queries.
#[async_trait]
pub trait AuthQuery: fmt::Debug + Send + Sync {
    /// Account number and current sequence for `address`.
    async fn account(&self, address: &str) -> Result<AccountInfo, TransportError>;
}

/// Typed query handles, one per resource kind.
///
/// Built eagerly at client construction; the underlying connection is assumed
/// to multiplex concurrent calls, so the handles are shared without locking.
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    /// Bank module handle.
    pub bank: Arc<dyn BankQuery>,
    /// Attribute module handle.
    pub attributes: Arc<dyn AttributeQuery>,
    /// Staking module handle.
    pub staking: Arc<dyn StakingQuery>,
    /// Block and node handle.
    pub node: Arc<dyn NodeQuery>,
    /// Auth module handle.
    pub auth: Arc<dyn AuthQuery>,
}

impl QueryRegistry {
    /// Builds a registry from per-module handles.
    pub fn new(
        bank: Arc<dyn BankQuery>,
        attributes: Arc<dyn AttributeQuery>,
        staking: Arc<dyn StakingQuery>,
        node: Arc<dyn NodeQuery>,
        auth: Arc<dyn AuthQuery>,
    ) -> Self {
        Self { bank, attributes, staking, node, auth }
    }
}
