pub mod analyzers;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod model;
