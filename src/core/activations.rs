use crate::prelude::*;

/// Elementwise activation with the `(value, derivative)` calling convention.
///
/// `apply(z, false)` is the activation itself, `apply(z, true)` its
/// derivative evaluated at `z`. Plain closures with the same signature are
/// activations too, so a model never depends on a concrete type.
pub trait ActivationFn: Send + Sync {
    fn apply(&self, z: &Array2<f64>, derivative: bool) -> Array2<f64>;
}

impl<F> ActivationFn for F
where
    F: Fn(&Array2<f64>, bool) -> Array2<f64> + Send + Sync,
{
    fn apply(&self, z: &Array2<f64>, derivative: bool) -> Array2<f64> {
        self(z, derivative)
    }
}

/// Slope used for the negative side of `LeakyRelu` and `Elu`.
pub const DEFAULT_SLOPE: f64 = 0.01;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Linear,
    Relu,
    LeakyRelu(f64),
    Elu(f64),
    Sigmoid,
    Tanh,
}

impl Activation {
    pub const LEAKY_RELU: Activation = Activation::LeakyRelu(DEFAULT_SLOPE);
    pub const ELU: Activation = Activation::Elu(DEFAULT_SLOPE);

    pub fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Linear => z.clone(),
            Self::Relu => relu_forward(z),
            Self::LeakyRelu(slope) => leaky_relu_forward(z, *slope),
            Self::Elu(slope) => elu_forward(z, *slope),
            Self::Sigmoid => sigmoid_forward(z),
            Self::Tanh => tanh_forward(z),
        }
    }

    pub fn backward(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Linear => Array2::ones(z.raw_dim()),
            Self::Relu => relu_backward(z),
            Self::LeakyRelu(slope) => leaky_relu_backward(z, *slope),
            Self::Elu(slope) => elu_backward(z, *slope),
            Self::Sigmoid => sigmoid_backward(z),
            Self::Tanh => tanh_backward(z),
        }
    }

    pub fn boxed(self) -> Box<dyn ActivationFn> {
        Box::new(self)
    }
}

impl ActivationFn for Activation {
    fn apply(&self, z: &Array2<f64>, derivative: bool) -> Array2<f64> {
        if derivative {
            self.backward(z)
        } else {
            self.forward(z)
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn sigmoid_forward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(sigmoid)
}

fn sigmoid_backward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|z| {
        let s = sigmoid(z);
        s * (1.0 - s)
    })
}

fn relu_forward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|z| if z >= 0.0 { z } else { 0.0 })
}

fn relu_backward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|z| if z >= 0.0 { 1.0 } else { 0.0 })
}

fn leaky_relu_forward(z: &Array2<f64>, slope: f64) -> Array2<f64> {
    z.mapv(|z| if z > 0.0 { z } else { slope * z })
}

fn leaky_relu_backward(z: &Array2<f64>, slope: f64) -> Array2<f64> {
    z.mapv(|z| if z > 0.0 { 1.0 } else { slope })
}

fn elu_forward(z: &Array2<f64>, slope: f64) -> Array2<f64> {
    z.mapv(|z| if z > 0.0 { z } else { slope * z.exp_m1() })
}

fn elu_backward(z: &Array2<f64>, slope: f64) -> Array2<f64> {
    z.mapv(|z| if z > 0.0 { 1.0 } else { slope * z.exp() })
}

fn tanh_forward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|z| z.tanh())
}

fn tanh_backward(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|z| {
        let t = z.tanh();
        1.0 - t * t
    })
}
