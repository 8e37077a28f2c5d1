pub mod campaign;
pub mod claim;
pub mod preferences;

pub use campaign::*;
pub use claim::*;
pub use preferences::*;
