//! Solidity bindings of the contracts the SDK talks to.
//!
//! Only the subset required to replicate order books is declared: the market
//! key, the order book events, the reader's `offerList` view and Multicall3's
//! `tryAggregate`.

use alloy::sol;

sol! {
    /// Offer list key: identifies one side of a market.
    ///
    /// Offers of the list give `outbound_tkn` and want `inbound_tkn`.
    #[derive(Debug, PartialEq, Eq, Hash)]
    struct OLKey {
        address outbound_tkn;
        address inbound_tkn;
        uint256 tickSpacing;
    }

    /// Offer as unpacked by the reader contract.
    #[derive(Debug, PartialEq, Eq)]
    struct OfferUnpacked {
        uint256 prev;
        uint256 next;
        int256 tick;
        uint256 gives;
    }

    /// Offer execution details as unpacked by the reader contract.
    #[derive(Debug, PartialEq, Eq)]
    struct OfferDetailUnpacked {
        address maker;
        uint256 gasreq;
        uint256 kilo_offer_gasbase;
        uint256 gasprice;
    }

    /// Events of the order book contract.
    #[derive(Debug, PartialEq, Eq)]
    interface Mangrove {
        event OfferWrite(
            bytes32 indexed olKeyHash,
            address indexed maker,
            int256 tick,
            uint256 gives,
            uint256 gasprice,
            uint256 gasreq,
            uint256 id
        );
        event OfferRetract(
            bytes32 indexed olKeyHash,
            address indexed maker,
            uint256 id,
            bool deprovision
        );
        event OfferSuccess(
            bytes32 indexed olKeyHash,
            address indexed taker,
            uint256 indexed id,
            uint256 takerWants,
            uint256 takerGives
        );
        event OfferSuccessWithPosthookData(
            bytes32 indexed olKeyHash,
            address indexed taker,
            uint256 indexed id,
            uint256 takerWants,
            uint256 takerGives,
            bytes32 posthookData
        );
        event OfferFail(
            bytes32 indexed olKeyHash,
            address indexed taker,
            uint256 indexed id,
            uint256 takerWants,
            uint256 takerGives,
            uint256 penalty,
            bytes32 mgvData
        );
        event OfferFailWithPosthookData(
            bytes32 indexed olKeyHash,
            address indexed taker,
            uint256 indexed id,
            uint256 takerWants,
            uint256 takerGives,
            uint256 penalty,
            bytes32 mgvData,
            bytes32 posthookData
        );
        event OrderStart(
            bytes32 indexed olKeyHash,
            address indexed taker,
            int256 maxTick,
            uint256 fillVolume,
            bool fillWants
        );
        event OrderComplete(bytes32 indexed olKeyHash, address indexed taker, uint256 fee);

        // Market administration and maker balance events, emitted on the same
        // address but not affecting resting offers.
        event SetActive(
            bytes32 indexed olKeyHash,
            address indexed outbound_tkn,
            address indexed inbound_tkn,
            uint256 tickSpacing,
            bool value
        );
        event SetFee(bytes32 indexed olKeyHash, uint256 value);
        event Credit(address indexed maker, uint256 amount);
        event Debit(address indexed maker, uint256 amount);
    }

    /// Order book reader contract.
    #[derive(Debug, PartialEq, Eq)]
    interface MgvReader {
        function offerList(OLKey memory olKey, uint256 fromId, uint256 maxOffers)
            external
            view
            returns (
                uint256 nextOffer,
                uint256[] memory offerIds,
                OfferUnpacked[] memory offers,
                OfferDetailUnpacked[] memory details
            );
    }

    /// Multicall3 aggregator, used for batched reads pinned to a block.
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    interface Multicall3 {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function tryAggregate(bool requireSuccess, Call[] calldata calls)
            external
            payable
            returns (Result[] memory returnData);
    }
}
