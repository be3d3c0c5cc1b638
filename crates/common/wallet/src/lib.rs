pub mod error;
pub mod node_wallet;
pub mod wallet;

pub use error::WalletError;
pub use node_wallet::NodeWallet;
pub use wallet::Wallet;
