use alloy::sol;

// ─── ClickCounter Interface ─────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ClickCounter {
        event Clicked(address indexed user, uint256 total);

        // Write path, used by the browser UI only — this job never calls it.
        function click() external;

        // Full (address, cumulative clicks) snapshot. The only call the
        // updater makes.
        function getLeaderboard() external view returns (address[] memory users, uint256[] memory clickCounts);
    }
}
