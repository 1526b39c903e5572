//! Cross-module flows through `CommandEngine`.

pub mod flows;
pub mod ordering;
pub mod transport;

#[cfg(test)]
pub(crate) mod fixture;
