use crate::prelude::*;
use crate::core::activations::ActivationFn;
use crate::core::init::Initializer;

/// Column vectors are `(width, 1)`; `w` is `(width, prev)`.
pub struct Dense {
    pub w: Array2<f64>,
    pub b: Array2<f64>,
    pub z: Array2<f64>,
    pub a: Array2<f64>,
    pub dw: Array2<f64>,
    pub db: Array2<f64>,
    pub dz: Array2<f64>,
    pub da: Array2<f64>,
    activation: Box<dyn ActivationFn>,
}

impl Dense {
    pub fn new(
        prev: usize,
        width: usize,
        activation: Box<dyn ActivationFn>,
        init: &mut dyn Initializer,
    ) -> Result<Self> {
        if width == 0 || prev == 0 {
            return Err(NNError::ConfigError(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        let (w, b) = init.initialize_layer(prev, width);
        if w.dim() != (width, prev) || b.dim() != (width, 1) {
            return Err(NNError::ConfigError(format!(
                "initializer returned shapes {:?} and {:?}, expected {:?} and {:?}",
                w.dim(),
                b.dim(),
                (width, prev),
                (width, 1)
            )));
        }
        Ok(Self {
            w,
            b,
            z: Array2::zeros((width, 1)),
            a: Array2::zeros((width, 1)),
            dw: Array2::zeros((width, prev)),
            db: Array2::zeros((width, 1)),
            dz: Array2::zeros((width, 1)),
            da: Array2::zeros((width, 1)),
            activation,
        })
    }

    pub fn width(&self) -> usize {
        self.w.nrows()
    }

    pub fn num_params(&self) -> usize {
        self.w.len() + self.b.len()
    }

    /// `z = W·a_prev + b`, `a = g(z)`.
    pub fn forward(&mut self, a_prev: &Array2<f64>) -> Result<()> {
        let z = self.w.dot(a_prev) + &self.b;
        let a = self.activation.apply(&z, false);
        check_shape("activation output", &a, z.dim())?;
        self.z = z;
        self.a = a;
        Ok(())
    }

    pub fn activation_grad(&self) -> Result<Array2<f64>> {
        let grad = self.activation.apply(&self.z, true);
        check_shape("activation derivative", &grad, self.z.dim())?;
        Ok(grad)
    }

    /// Backpropagates `self.da` through this layer and applies the update.
    ///
    /// Returns `dA` for the previous layer, computed from the weights as they
    /// were before this step's update.
    pub fn backward(&mut self, a_prev: &Array2<f64>, learning_rate: f64) -> Result<Array2<f64>> {
        let grad = self.activation_grad()?;
        Ok(self.apply_gradient(a_prev, &grad, learning_rate))
    }

    pub(crate) fn apply_gradient(
        &mut self,
        a_prev: &Array2<f64>,
        grad: &Array2<f64>,
        learning_rate: f64,
    ) -> Array2<f64> {
        self.dz = &self.da * grad;
        self.dw = self.dz.dot(&a_prev.t());
        self.db = self.dz.clone();
        let da_prev = self.w.t().dot(&self.dz);
        self.w.scaled_add(-learning_rate, &self.dw);
        self.b.scaled_add(-learning_rate, &self.db);
        da_prev
    }
}

/// Rejects a capability result whose shape differs from the column it maps.
pub(crate) fn check_shape(
    what: &'static str,
    value: &Array2<f64>,
    expected: (usize, usize),
) -> Result<()> {
    if value.dim() != expected {
        return Err(NNError::ShapeMismatch {
            what,
            got: value.dim(),
            expected,
        });
    }
    Ok(())
}
