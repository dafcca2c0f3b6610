//! ABI of the on-chain collaborators the off-chain process produces calldata for.
use alloy_sol_types::sol;

sol! {
    /// The `ProphetsArrival` minter: holds the whitelist roots and redeems signed great prophet bids.
    interface IProphetsArrival {
        /// Publishes the whitelist commitment of each round.
        function addUsersToWhitelist(bytes32 _settlerRoot, bytes32 _firstRoot, bytes32 _secondRoot) external;

        /// Mints a regular prophet for a whitelisted caller.
        function mintProphet(bytes32[] calldata _proof) external payable;

        /// Mints great prophet `_id` to the signer of `(_bid, _nonce)`, charging `_amount` WETH.
        function mintGreat(
            uint256 _id,
            uint256 _amount,
            uint256 _bid,
            uint256 _nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;

        /// Batched version of `mintGreat` taking parallel arrays.
        function batchMintGreat(
            uint256[] calldata _ids,
            uint256[] calldata _amounts,
            uint256[] calldata _bids,
            uint256[] calldata _nonces,
            uint8[] calldata _v,
            bytes32[] calldata _r,
            bytes32[] calldata _s
        ) external;
    }
}
