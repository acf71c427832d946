pub use serde::{Serialize, Deserialize};

pub use ndarray::*;
pub use ndarray_rand::RandomExt;
pub use ndarray_rand::rand_distr::Uniform;

pub use crate::models::{Model, Stage};
pub use crate::error::*;

// Internal re-exports
pub use crate::core::{
    Activation,
    ActivationFn,
    Dense,
    Loss,
    LossFn,
    Initializer,
    Constant,
    RandomUniform,
    Gaussian,
    Xavier,
    LeCun,
    Sampling,
    ConfusionMatrix,
    Normalization,
};
