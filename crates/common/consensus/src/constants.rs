use alloy_primitives::{aliases::B32, fixed_bytes};

pub const DOMAIN_DEPOSIT: B32 = fixed_bytes!("0x03000000");
pub const DOMAIN_VOLUNTARY_EXIT: B32 = fixed_bytes!("0x04000000");
pub const GENESIS_FORK_VERSION: B32 = fixed_bytes!("0x00000000");
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: &[u8] = &[0x01];
/// Full validator deposit, in gwei.
pub const DEPOSIT_AMOUNT_GWEI: u64 = 32_000_000_000;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;
