pub mod backend;
pub mod reward;

pub use backend::BackendClient;
pub use reward::RewardPayer;
