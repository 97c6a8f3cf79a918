//! Contract bindings for the trip planner

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ITripPlanner {
        struct TripSummary {
            string title;
            uint8 style;
            uint64 createdAt;
        }

        struct TripRecord {
            bytes routeCiphertext;
            bytes scheduleCiphertext;
            string title;
            uint8 style;
            uint64 createdAt;
            bytes32 nights;
            bytes32 unit;
        }

        function storeTrip(
            bytes routeCiphertext,
            bytes scheduleCiphertext,
            string title,
            uint8 style,
            bytes32 nightsHandle,
            bytes nightsProof,
            bytes32 unitHandle,
            bytes unitProof
        ) external;

        function listMyTrips() external view returns (TripSummary[] memory);

        function getMyTrip(uint256 tripId) external view returns (TripRecord memory);
    }
}
