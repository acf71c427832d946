//! Feed-forward neural network engine trained one example at a time.
//!
//! A [`Model`] is built from a list of layer widths, one activation per
//! layer and an output loss, then driven per example with
//! `set_input -> forward -> backward` for training or
//! `set_input -> forward -> confusion_matrix` for evaluation.

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod prelude;
pub mod trainer;
pub mod utils;

// Re-export types
pub use crate::core::{Activation, ActivationFn, ConfusionMatrix, Loss, LossFn};
pub use error::{NNError, Result};
pub use models::Model;
