pub mod cache;
pub mod service;

pub use cache::{CacheStats, TokenDecimalsCache};
pub use service::TokenService;
