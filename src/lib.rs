/// ttrpg-search - Hybrid rulebook search for tabletop RPGs
///
/// Core library providing query preprocessing, BM25 keyword search,
/// vector search fusion and result explanation over rulebook content.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
