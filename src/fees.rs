//! Gas estimation and fee calculation.

use crate::error::ClientError;
use crate::tx::{AnyMsg, TxGateway};
use crate::types::Coin;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Margin applied to simulated gas, as numerator over denominator.
///
/// 50% headroom absorbs estimation drift between simulate time and execution
/// time.
const GAS_MARGIN: (u64, u64) = (3, 2);

/// Fee carried by a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee amount in the chain's fee denomination.
    pub amount: Coin,
    /// Gas limit the transaction declares.
    pub gas_limit: u64,
}

/// Converts simulated gas into the fee a transaction will carry.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    gas_price: u64,
    denom: String,
}

impl FeeCalculator {
    /// Creates a calculator for the given gas price and fee denomination.
    pub fn new(gas_price: u64, denom: impl Into<String>) -> Self {
        Self { gas_price, denom: denom.into() }
    }

    /// Simulates a batch and prices it.
    ///
    /// The simulate call is non-committing; its failure is fatal for the
    /// batch, since a guessed gas limit risks rejection or overpayment.
    /// `surcharge` is any batch-specific flat fee the caller owes on top of
    /// the gas-derived amount.
    pub async fn estimate(
        &self,
        gateway: &dyn TxGateway,
        msgs: &[AnyMsg],
        sequence: u64,
        surcharge: u128,
    ) -> Result<Fee, ClientError> {
        let gas_used = gateway.simulate(msgs, sequence).await?;
        debug!(gas_used, msgs = msgs.len(), "simulated batch");
        self.fee_for(gas_used, surcharge, msgs.len())
    }

    /// Prices an already-simulated gas amount.
    ///
    /// The gas limit is the simulated gas plus a 50% margin, rounded up; a
    /// zero simulation is an error rather than a free transaction.
    pub fn fee_for(
        &self,
        gas_used: u64,
        surcharge: u128,
        msg_count: usize,
    ) -> Result<Fee, ClientError> {
        if gas_used == 0 {
            return Err(ClientError::ZeroGasEstimate { msg_count });
        }

        let gas_limit = gas_used.saturating_mul(GAS_MARGIN.0).div_ceil(GAS_MARGIN.1);
        let amount = u128::from(gas_limit) * u128::from(self.gas_price) + surcharge;
        Ok(Fee { amount: Coin::new(self.denom.clone(), amount), gas_limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_fifty_percent_margin() {
        let fees = FeeCalculator::new(2, "nhash");
        let fee = fees.fee_for(100, 0, 1).unwrap();
        assert_eq!(fee.gas_limit, 150);
        assert_eq!(fee.amount, Coin::new("nhash", 300));
    }

    #[test]
    fn rounds_the_gas_limit_up() {
        let fees = FeeCalculator::new(1, "nhash");
        // 101 * 1.5 = 151.5, which must round to 152, not truncate to 151.
        assert_eq!(fees.fee_for(101, 0, 1).unwrap().gas_limit, 152);
    }

    #[test]
    fn surcharge_is_added_to_the_amount() {
        let fees = FeeCalculator::new(1, "nhash");
        let fee = fees.fee_for(100, 10_000, 4).unwrap();
        assert_eq!(fee.amount.amount, 150 + 10_000);
    }

    #[test]
    fn zero_gas_is_an_error() {
        let fees = FeeCalculator::new(1, "nhash");
        let err = fees.fee_for(0, 0, 3).unwrap_err();
        assert!(matches!(err, ClientError::ZeroGasEstimate { msg_count: 3 }), "got {err:?}");
    }
}
