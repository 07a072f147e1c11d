use std::fmt::Display;

use alloy::primitives::{Address, B256, U256, keccak256};
use alloy_sol_types::SolValue;

use crate::abi::OLKey;

/// Identity of one order book: the offer list a taker swapping `src` for
/// `dest` consumes.
///
/// Offers of that list give the destination token (outbound) and want the
/// source token (inbound), so the key is always ordered destination first,
/// source second. [`Market::new`] is the only place this ordering is applied,
/// everything else (on-chain key, hash, cache key) derives from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Market {
    outbound: Address,
    inbound: Address,
    tick_spacing: u64,
}

impl Market {
    /// Market consumed by a taker giving `src` and receiving `dest`.
    pub fn new(src: Address, dest: Address, tick_spacing: u64) -> Self {
        Self { outbound: dest, inbound: src, tick_spacing }
    }

    /// Token offered by the makers (taker's destination token).
    pub fn outbound(&self) -> Address { self.outbound }

    /// Token wanted by the makers (taker's source token).
    pub fn inbound(&self) -> Address { self.inbound }

    pub fn tick_spacing(&self) -> u64 { self.tick_spacing }

    /// Market key tuple, destination (outbound) address first.
    pub fn key(&self) -> (Address, Address, u64) {
        (self.outbound, self.inbound, self.tick_spacing)
    }

    /// On-chain offer list key.
    pub fn ol_key(&self) -> OLKey {
        OLKey {
            outbound_tkn: self.outbound,
            inbound_tkn: self.inbound,
            tickSpacing: U256::from(self.tick_spacing),
        }
    }

    /// Hash the order book contract tags every market event with,
    /// `keccak256(abi.encode(outbound, inbound, tickSpacing))`.
    pub fn hash(&self) -> B256 { keccak256(self.ol_key().abi_encode()) }

    /// Cache key correlating quotes of the `dex_key` DEX back to this market.
    pub fn cache_key(&self, dex_key: &str) -> String {
        format!("{}_{}_{}_{}", dex_key, self.outbound, self.inbound, self.tick_spacing)
            .to_lowercase()
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} (tick spacing {})", self.outbound, self.inbound, self.tick_spacing)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    const WETH: Address = address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
    const USDC: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");

    #[test]
    fn test_destination_first() {
        let market = Market::new(USDC, WETH, 1);
        assert_eq!(market.key(), (WETH, USDC, 1));
        assert_eq!(market.ol_key().outbound_tkn, WETH);
        assert_eq!(market.ol_key().inbound_tkn, USDC);
    }

    #[test]
    fn test_hash_matches_abi_encoding() {
        let market = Market::new(USDC, WETH, 1);
        let mut encoded = Vec::with_capacity(96);
        encoded.extend_from_slice(WETH.into_word().as_slice());
        encoded.extend_from_slice(USDC.into_word().as_slice());
        encoded.extend_from_slice(&U256::from(1).to_be_bytes::<32>());
        assert_eq!(market.hash(), keccak256(&encoded));
        assert_ne!(market.hash(), Market::new(WETH, USDC, 1).hash());
    }

    #[test]
    fn test_cache_key() {
        let market = Market::new(USDC, WETH, 1);
        assert_eq!(
            market.cache_key("Mangrove"),
            "mangrove_0x82af49447d8a07e3bd95bd0d56f35241523fbab1_\
             0xaf88d065e77c8cc2239327c5edb3a432268e5831_1"
        );
    }
}
