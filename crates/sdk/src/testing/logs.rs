use std::cell::Cell;

use alloy::{
    primitives::{self, Address, B256, Bytes, I256, LogData, U256, address},
    rpc::types::Log,
    sol_types::SolEvent,
};

use crate::{Chain, abi::Mangrove, types::Market};

/// Builds order book logs of one market, ABI-encoded the way the contract
/// emits them.
///
/// Every log built takes the next log index of the block, starting from 0 or
/// from the index set with [`LogBuilder::with_log_index`].
#[derive(Clone, Debug)]
pub struct LogBuilder {
    address: Address,
    market: Market,
    block_number: u64,
    tx_index: u64,
    log_index: Cell<u64>,
}

impl LogBuilder {
    pub const TAKER: Address = address!("0x00000000000000000000000000000000000000cc");
    pub const GASREQ: u64 = 100_000;
    pub const GASPRICE: u64 = 2;

    /// Logs emitted by the Arbitrum deployment at `block_number`.
    pub fn new(market: Market, block_number: u64) -> Self {
        Self {
            address: Chain::arbitrum().mangrove(),
            market,
            block_number,
            tx_index: 0,
            log_index: Cell::new(0),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn with_log_index(mut self, tx_index: u64, log_index: u64) -> Self {
        self.tx_index = tx_index;
        self.log_index.set(log_index);
        self
    }

    /// Same market, another block, log indices starting over.
    pub fn at_block(&self, block_number: u64) -> Self {
        Self { block_number, log_index: Cell::new(0), ..self.clone() }
    }

    /// Copy of the log flagged as removed by a reorg.
    pub fn removed(mut log: Log) -> Log {
        log.removed = true;
        log
    }

    pub fn offer_write(&self, id: u64, maker: Address, tick: i32, gives: u64) -> Log {
        let tick = I256::try_from(tick).unwrap_or_default();
        self.offer_write_raw(U256::from(id), maker, tick, U256::from(gives))
    }

    /// Write with values the event type allows but the book may not.
    pub fn offer_write_raw(&self, id: U256, maker: Address, tick: I256, gives: U256) -> Log {
        self.log(Mangrove::OfferWrite {
            olKeyHash: self.market.hash(),
            maker,
            tick,
            gives,
            gasprice: U256::from(Self::GASPRICE),
            gasreq: U256::from(Self::GASREQ),
            id,
        })
    }

    pub fn offer_retract(&self, id: u64) -> Log {
        self.log(Mangrove::OfferRetract {
            olKeyHash: self.market.hash(),
            maker: Address::ZERO,
            id: U256::from(id),
            deprovision: false,
        })
    }

    pub fn offer_success(&self, id: u64) -> Log {
        self.log(Mangrove::OfferSuccess {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            id: U256::from(id),
            takerWants: U256::from(1),
            takerGives: U256::from(1),
        })
    }

    pub fn offer_success_with_posthook_data(&self, id: u64) -> Log {
        self.log(Mangrove::OfferSuccessWithPosthookData {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            id: U256::from(id),
            takerWants: U256::from(1),
            takerGives: U256::from(1),
            posthookData: B256::repeat_byte(0x01),
        })
    }

    pub fn offer_fail(&self, id: u64) -> Log {
        self.log(Mangrove::OfferFail {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            id: U256::from(id),
            takerWants: U256::from(1),
            takerGives: U256::from(1),
            penalty: U256::ZERO,
            mgvData: B256::repeat_byte(0x02),
        })
    }

    pub fn offer_fail_with_posthook_data(&self, id: u64) -> Log {
        self.log(Mangrove::OfferFailWithPosthookData {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            id: U256::from(id),
            takerWants: U256::from(1),
            takerGives: U256::from(1),
            penalty: U256::ZERO,
            mgvData: B256::repeat_byte(0x02),
            posthookData: B256::repeat_byte(0x01),
        })
    }

    pub fn order_start(&self) -> Log {
        self.log(Mangrove::OrderStart {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            maxTick: I256::ZERO,
            fillVolume: U256::from(1),
            fillWants: true,
        })
    }

    pub fn order_complete(&self) -> Log {
        self.log(Mangrove::OrderComplete {
            olKeyHash: self.market.hash(),
            taker: Self::TAKER,
            fee: U256::ZERO,
        })
    }

    pub fn set_active(&self, value: bool) -> Log {
        self.log(Mangrove::SetActive {
            olKeyHash: self.market.hash(),
            outbound_tkn: self.market.outbound(),
            inbound_tkn: self.market.inbound(),
            tickSpacing: U256::from(self.market.tick_spacing()),
            value,
        })
    }

    /// Log of an event the bindings do not declare.
    pub fn unknown(&self) -> Log {
        self.raw(LogData::new_unchecked(vec![B256::repeat_byte(0xee)], Bytes::new()))
    }

    /// `OfferWrite` log whose data does not decode.
    pub fn garbage(&self) -> Log {
        self.raw(LogData::new_unchecked(
            vec![Mangrove::OfferWrite::SIGNATURE_HASH, self.market.hash()],
            Bytes::from_static(b"garbage"),
        ))
    }

    fn log<E: SolEvent>(&self, event: E) -> Log { self.raw(event.encode_log_data()) }

    fn raw(&self, data: LogData) -> Log {
        let log_index = self.log_index.replace(self.log_index.get() + 1);
        let tx_hash = U256::from(self.block_number) * U256::from(1000) + U256::from(self.tx_index);
        Log {
            inner: primitives::Log { address: self.address, data },
            block_number: Some(self.block_number),
            transaction_hash: Some(B256::from(tx_hash)),
            transaction_index: Some(self.tx_index),
            log_index: Some(log_index),
            ..Default::default()
        }
    }
}
