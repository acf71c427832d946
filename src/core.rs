// src/core.rs
pub mod activations;
pub mod confusion;
pub mod init;
pub mod layers;
pub mod losses;
pub mod normalization;
pub mod output;

// Re-export commonly used items
pub use activations::{Activation, ActivationFn};
pub use confusion::{argmax, ConfusionMatrix};
pub use init::{Constant, Gaussian, Initializer, LeCun, RandomUniform, Sampling, Xavier};
pub use layers::Dense;
pub use losses::{Loss, LossFn};
pub use normalization::Normalization;
pub use output::{render_table, write_confusion_to_csv};
