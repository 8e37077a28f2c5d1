//! Chain client adapter: wallet access, network identity, contract bindings and the
//! per-connection session every pipeline component borrows.

pub mod contract;
pub mod network;
pub mod session;
pub mod simulated;
pub mod wallet;

pub use network::{NativeCurrency, NetworkDescriptor};
pub use session::ChainSession;
pub use simulated::SimulatedWallet;
pub use wallet::{detect_wallet, CallRequest, RpcWallet, TxReceipt, WalletProvider};
