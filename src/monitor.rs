//! Read-only balance reporting.
//!
//! Used before and after a transfer to validate its effect on the recipient
//! set; never gates the pipeline.

use alloy_chains::NamedChain;
use alloy_primitives::{Address, U256};
use std::collections::BTreeMap;
use tracing::info;

use crate::chain::contracts;
use crate::chain::ChainRpc;
use crate::error::Result;

/// USDC's fixed decimal count.
pub const USDC_DECIMALS: u8 = 6;

/// Reports token balances for a fixed set of addresses on one chain.
#[derive(Debug, Clone)]
pub struct BalanceMonitor<R> {
    rpc: R,
    chain: NamedChain,
    token: Address,
}

impl<R: ChainRpc> BalanceMonitor<R> {
    pub fn new(rpc: R, chain: NamedChain, token: Address) -> Self {
        Self { rpc, chain, token }
    }

    /// Reads `balanceOf` for each address and returns the mapping.
    ///
    /// No recovery beyond surfacing the first read error.
    pub async fn report_balances(
        &self,
        accounts: &[Address],
    ) -> Result<BTreeMap<Address, U256>> {
        let mut balances = BTreeMap::new();

        for &account in accounts {
            let balance = contracts::balance_of(&self.rpc, self.token, account).await?;
            info!(
                account = %account,
                chain = %self.chain,
                token = %self.token,
                balance = %format_units(balance, USDC_DECIMALS),
                event = "balance_reported"
            );
            balances.insert(account, balance);
        }

        Ok(balances)
    }
}

/// Formats an integer token amount as a decimal string.
///
/// Trailing zeros in the fractional part are trimmed; whole amounts render
/// without a decimal point.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let frac = amount % divisor;

    if frac.is_zero() {
        return whole.to_string();
    }

    let digits = frac.to_string();
    let padded = format!(
        "{}{}",
        "0".repeat(decimals as usize - digits.len()),
        digits
    );
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1_000_000u64, "1")]
    #[case(500_000u64, "0.5")]
    #[case(1_234_567u64, "1.234567")]
    #[case(0u64, "0")]
    #[case(1u64, "0.000001")]
    #[case(10_500_000u64, "10.5")]
    fn test_format_units(#[case] raw: u64, #[case] expected: &str) {
        assert_eq!(format_units(U256::from(raw), USDC_DECIMALS), expected);
    }
}
