//! Trait definitions for extensible components
//!
//! These traits allow users to swap implementations or provide their own
//! for the backing store and the randomness used to mint identifiers.

pub mod entropy;
pub mod store;
