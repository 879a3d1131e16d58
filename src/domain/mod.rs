pub mod bundle;
pub mod offer;
pub mod sku;
pub mod tariff;
pub mod types;

pub use bundle::*;
pub use offer::*;
pub use sku::*;
pub use tariff::*;
pub use types::*;
