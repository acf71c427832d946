use crate::prelude::*;

/// Output-layer loss with the `(target, prediction, derivative)` convention.
///
/// The plain form returns the elementwise loss, the derivative form returns
/// `d loss / d prediction`. Closures with the same signature are losses too.
pub trait LossFn: Send + Sync {
    fn apply(&self, target: &Array2<f64>, prediction: &Array2<f64>, derivative: bool) -> Array2<f64>;
}

impl<F> LossFn for F
where
    F: Fn(&Array2<f64>, &Array2<f64>, bool) -> Array2<f64> + Send + Sync,
{
    fn apply(&self, target: &Array2<f64>, prediction: &Array2<f64>, derivative: bool) -> Array2<f64> {
        self(target, prediction, derivative)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    MSE,
    NLL,
    /// Cross-entropy on raw scores; the output layer should be `Linear`,
    /// the sigmoid is folded into the loss.
    SigmoidCE,
}

// Keeps ln() finite for saturated predictions.
const EPSILON: f64 = 1e-15;

impl Loss {
    pub fn boxed(self) -> Box<dyn LossFn> {
        Box::new(self)
    }
}

impl LossFn for Loss {
    fn apply(&self, y: &Array2<f64>, y_hat: &Array2<f64>, derivative: bool) -> Array2<f64> {
        match (self, derivative) {
            (Loss::MSE, false) => 0.5 * (y - y_hat).mapv(|a| a.powi(2)),
            (Loss::MSE, true) => y_hat - y,
            (Loss::NLL, false) => {
                let y_hat = y_hat.mapv(|p| p.clamp(EPSILON, 1.0 - EPSILON));
                -(y * &y_hat.mapv(f64::ln) + (1.0 - y) * (1.0 - &y_hat).mapv(f64::ln))
            }
            (Loss::NLL, true) => {
                let y_hat = y_hat.mapv(|p| p.clamp(EPSILON, 1.0 - EPSILON));
                -((y / &y_hat) - (1.0 - y) / (1.0 - &y_hat))
            }
            // max(x, 0) - x*t + ln(1 + e^-|x|)
            (Loss::SigmoidCE, false) => {
                let mut loss = y_hat.mapv(|x| x.max(0.0) + (-x.abs()).exp().ln_1p());
                loss -= &(y_hat * y);
                loss
            }
            (Loss::SigmoidCE, true) => y_hat.mapv(|x| 1.0 / (1.0 + (-x).exp())) - y,
        }
    }
}
