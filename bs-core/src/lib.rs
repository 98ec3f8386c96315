//! Shared building blocks for browsesim: the error taxonomy, logging setup, domain identifiers and
//! the power-of-two time quantizer used by the action tokenizer.
pub mod domain;
pub mod errors;
pub mod logging;
pub mod quantize;

#[cfg(test)]
mod tests;
