//! Client constants.

/// Messages per signed transaction when writing attributes in bulk.
///
/// Sized so a full batch's simulated gas stays under the chain's 4M block gas
/// ceiling with margin. This is a property of the chain's current parameters,
/// not a universal constant; revisit if the ceiling changes.
pub const ATTRIBUTE_BATCH_SIZE: usize = 75;

/// Flat fee charged by the name module per attribute write, in base denom.
///
/// Added on top of the gas-derived fee, scaled by the number of attribute
/// messages in the transaction.
pub const ATTRIBUTE_FEE_SURCHARGE: u128 = 10_000_000_000;

/// Page size for bank balance queries.
pub const BALANCE_PAGE_SIZE: u64 = 50;

/// Page size for attribute lookups.
pub const ATTRIBUTE_PAGE_SIZE: u64 = 50;

/// Page size for attributed-account listings.
pub const ATTRIBUTE_ACCOUNT_PAGE_SIZE: u64 = 100;

/// Page size for validator listings.
pub const VALIDATOR_PAGE_SIZE: u64 = 100;

/// Page size for delegation listings.
pub const DELEGATION_PAGE_SIZE: u64 = 100;

/// The mainnet gRPC endpoint.
pub const MAINNET_GRPC_URI: &str = "grpc.provenance.io:443";

/// The testnet gRPC endpoint.
pub const TESTNET_GRPC_URI: &str = "grpc.test.provenance.io:443";
