//! ABI bindings for the contracts the relay reads.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq)]
    interface DepositContract {
        event DepositEvent(
            bytes pubkey,
            bytes withdrawal_credentials,
            bytes amount,
            bytes signature,
            bytes index
        );

        function get_deposit_root() external view returns (bytes32);
    }
}

sol! {
    #[derive(Debug, PartialEq)]
    interface Vault {
        function validatorsRoot() external view returns (bytes32);
    }
}

sol! {
    #[derive(Debug, PartialEq)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}
