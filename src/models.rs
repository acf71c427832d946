use crate::prelude::*;
use crate::core::confusion::argmax;
use crate::core::layers::check_shape;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unbuilt,
    Idle,
    InputSet,
    Forwarded,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Unbuilt => "unbuilt",
            Stage::Idle => "idle",
            Stage::InputSet => "waiting for forward",
            Stage::Forwarded => "forwarded",
        }
    }
}

struct Network {
    // Layer l (1..L-1) lives at index l-1.
    layers: Vec<Dense>,
    input: Array2<f64>,
    input_grad: Array2<f64>,
    target: Array2<f64>,
    loss: Box<dyn LossFn>,
    learning_rate: f64,
    confusion: ConfusionMatrix,
}

impl Network {
    fn output(&self) -> &Dense {
        // build() guarantees at least one non-input layer
        &self.layers[self.layers.len() - 1]
    }

    fn forward(&mut self) -> Result<()> {
        for l in 0..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(l);
            let a_prev = done.last().map_or(&self.input, |prev| &prev.a);
            rest[0].forward(a_prev)?;
        }
        let out = self.output();
        let da = self.loss.apply(&self.target, &out.a, true);
        check_shape("loss derivative", &da, out.a.dim())?;
        if let Some(out) = self.layers.last_mut() {
            out.da = da;
        }
        Ok(())
    }

    fn backward(&mut self) -> Result<()> {
        // every derivative is checked before the first parameter moves
        let grads = self
            .layers
            .iter()
            .map(Dense::activation_grad)
            .collect::<Result<Vec<_>>>()?;
        for (l, grad) in grads.iter().enumerate().rev() {
            let (done, rest) = self.layers.split_at_mut(l);
            let a_prev = done.last().map_or(&self.input, |prev| &prev.a);
            let da_prev = rest[0].apply_gradient(a_prev, grad, self.learning_rate);
            match done.last_mut() {
                Some(prev) => prev.da = da_prev,
                None => self.input_grad = da_prev,
            }
        }
        Ok(())
    }
}

/// Fully connected feed-forward network trained one example at a time.
///
/// Per example the caller runs `set_input`, then `forward`, then either
/// `backward` (training) or `confusion_matrix` (evaluation). Calls made out of
/// that order fail with `NNError::InvalidState` and leave the model untouched.
/// Layer indices taken by the accessors are 1-based for the non-input
/// layers, with 0 meaning the input.
pub struct Model {
    layer_spec: Vec<usize>,
    net: Option<Network>,
    stage: Stage,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            layer_spec: Vec::new(),
            net: None,
            stage: Stage::Unbuilt,
        }
    }

    /// Builds the network with every weight and bias set to 0.1.
    pub fn build(
        &mut self,
        layer_spec: &[usize],
        activations: Vec<Box<dyn ActivationFn>>,
        loss: Box<dyn LossFn>,
        learning_rate: f64,
    ) -> Result<()> {
        self.build_with(layer_spec, activations, loss, learning_rate, &mut Constant::default())
    }

    /// Builds the network, filling parameters from `init` layer by layer
    /// (weights then biases). `activations[0]` belongs to the input layer and
    /// is ignored. Any previous state, training included, is discarded.
    pub fn build_with(
        &mut self,
        layer_spec: &[usize],
        activations: Vec<Box<dyn ActivationFn>>,
        loss: Box<dyn LossFn>,
        learning_rate: f64,
        init: &mut dyn Initializer,
    ) -> Result<()> {
        if layer_spec.len() < 2 {
            return Err(NNError::ConfigError(format!(
                "need at least an input and an output layer, got {} layer(s)",
                layer_spec.len()
            )));
        }
        if let Some(pos) = layer_spec.iter().position(|&w| w == 0) {
            return Err(NNError::ConfigError(format!("layer {} has width 0", pos)));
        }
        if activations.len() != layer_spec.len() {
            return Err(NNError::ConfigError(format!(
                "got {} activations for {} layers",
                activations.len(),
                layer_spec.len()
            )));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(NNError::ConfigError(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }

        let mut layers = Vec::with_capacity(layer_spec.len() - 1);
        for (dims, activation) in layer_spec.windows(2).zip(activations.into_iter().skip(1)) {
            layers.push(Dense::new(dims[0], dims[1], activation, init)?);
        }

        let input_width = layer_spec[0];
        let output_width = layer_spec[layer_spec.len() - 1];
        let net = Network {
            layers,
            input: Array2::zeros((input_width, 1)),
            input_grad: Array2::zeros((input_width, 1)),
            target: Array2::zeros((output_width, 1)),
            loss,
            learning_rate,
            confusion: ConfusionMatrix::new(output_width),
        };

        if self.net.is_some() {
            debug!("rebuilding model, previous parameters discarded");
        }
        self.layer_spec = layer_spec.to_vec();
        self.net = Some(net);
        self.stage = Stage::Idle;
        debug!(
            "built model {:?} with {} parameters, learning rate {}",
            self.layer_spec,
            self.num_params(),
            learning_rate
        );
        Ok(())
    }

    pub fn set_input(&mut self, data: &[f64], label: &[f64]) -> Result<()> {
        let net = self.net_mut("set_input")?;
        let (input_width, output_width) = (net.input.nrows(), net.target.nrows());
        if data.len() != input_width {
            return Err(NNError::ShapeMismatch {
                what: "input",
                got: (data.len(), 1),
                expected: (input_width, 1),
            });
        }
        if label.len() != output_width {
            return Err(NNError::ShapeMismatch {
                what: "label",
                got: (label.len(), 1),
                expected: (output_width, 1),
            });
        }
        net.input = Array1::from_vec(data.to_vec()).insert_axis(Axis(1));
        net.target = Array1::from_vec(label.to_vec()).insert_axis(Axis(1));
        self.stage = Stage::InputSet;
        Ok(())
    }

    /// Propagates the current input and stages the output error `dA[L-1]`.
    ///
    /// If an activation or the loss returns a wrongly shaped result the
    /// caches are stale, so the model drops back to `InputSet`.
    pub fn forward(&mut self) -> Result<()> {
        self.require("forward", &[Stage::InputSet, Stage::Forwarded])?;
        let res = self.net_mut("forward")?.forward();
        if res.is_err() {
            self.stage = Stage::InputSet;
            return res;
        }
        self.stage = Stage::Forwarded;
        Ok(())
    }

    pub fn backward(&mut self) -> Result<()> {
        self.require("backward", &[Stage::Forwarded])?;
        self.net_mut("backward")?.backward()?;
        self.stage = Stage::Idle;
        Ok(())
    }

    pub fn cost_function(&self) -> Result<f64> {
        self.require("cost_function", &[Stage::Forwarded])?;
        let net = self.net("cost_function")?;
        let out = &net.output().a;
        let loss = net.loss.apply(&net.target, out, false);
        check_shape("loss", &loss, out.dim())?;
        Ok(loss.mean().unwrap_or_default())
    }

    /// Records `argmax(target)` against `argmax(prediction)`.
    pub fn confusion_matrix(&mut self) -> Result<()> {
        self.require("confusion_matrix", &[Stage::Forwarded])?;
        let net = self.net_mut("confusion_matrix")?;
        let pred = argmax(net.output().a.iter());
        let real = argmax(net.target.iter());
        net.confusion.record(real, pred);
        self.stage = Stage::Idle;
        Ok(())
    }

    pub fn reset_confusion(&mut self) -> Result<()> {
        self.net_mut("reset_confusion")?.confusion.reset();
        Ok(())
    }

    pub fn confusion(&self) -> Option<&ConfusionMatrix> {
        self.net.as_ref().map(|net| &net.confusion)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_built(&self) -> bool {
        self.net.is_some()
    }

    pub fn layer_spec(&self) -> &[usize] {
        &self.layer_spec
    }

    pub fn learning_rate(&self) -> Option<f64> {
        self.net.as_ref().map(|net| net.learning_rate)
    }

    /// Parameters, cache and gradients of layer `l` (1-based).
    pub fn layer(&self, l: usize) -> Option<&Dense> {
        let net = self.net.as_ref()?;
        l.checked_sub(1).and_then(|i| net.layers.get(i))
    }

    /// `A[l]`, with `A[0]` the current input.
    pub fn activation(&self, l: usize) -> Option<ArrayView2<f64>> {
        match l {
            0 => self.net.as_ref().map(|net| net.input.view()),
            _ => self.layer(l).map(|layer| layer.a.view()),
        }
    }

    pub fn activation_grad(&self, l: usize) -> Option<ArrayView2<f64>> {
        match l {
            0 => self.net.as_ref().map(|net| net.input_grad.view()),
            _ => self.layer(l).map(|layer| layer.da.view()),
        }
    }

    pub fn prediction(&self) -> Option<ArrayView2<f64>> {
        self.net.as_ref().map(|net| net.output().a.view())
    }

    pub fn target(&self) -> Option<ArrayView2<f64>> {
        self.net.as_ref().map(|net| net.target.view())
    }

    pub fn num_params(&self) -> usize {
        self.net
            .as_ref()
            .map_or(0, |net| net.layers.iter().map(Dense::num_params).sum())
    }

    pub fn summary(&self) -> String {
        let mut res = "\nModel\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer\t\t Output shape\t\t No.of params\n");
        if let Some(width) = self.layer_spec.first() {
            res.push_str(&format!("Input\t\t  (None, {})\t\t  0\n", width));
        }
        if let Some(net) = &self.net {
            for layer in net.layers.iter() {
                res.push_str(&format!(
                    "Dense\t\t  (None, {})\t\t  {}\n",
                    layer.width(),
                    layer.num_params()
                ));
            }
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total params: {}\n", self.num_params()));
        res
    }

    fn require(&self, op: &'static str, allowed: &[Stage]) -> Result<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(NNError::InvalidState {
                op,
                stage: self.stage.name(),
            })
        }
    }

    fn net(&self, op: &'static str) -> Result<&Network> {
        self.net.as_ref().ok_or(NNError::InvalidState {
            op,
            stage: Stage::Unbuilt.name(),
        })
    }

    fn net_mut(&mut self, op: &'static str) -> Result<&mut Network> {
        self.net.as_mut().ok_or(NNError::InvalidState {
            op,
            stage: Stage::Unbuilt.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn sigmoids(n: usize) -> Vec<Box<dyn ActivationFn>> {
        (0..n).map(|_| Activation::Sigmoid.boxed()).collect()
    }

    fn built(spec: &[usize]) -> Model {
        let mut model = Model::new();
        model
            .build(spec, sigmoids(spec.len()), Loss::MSE.boxed(), 0.5)
            .unwrap();
        model
    }

    /// Hands out prepared matrices in build order.
    struct Fixed(VecDeque<Array2<f64>>);

    impl Initializer for Fixed {
        fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
            self.0.pop_front().unwrap_or_else(|| Array2::zeros(shape))
        }
    }

    fn assert_close(actual: ArrayView2<f64>, expected: &Array2<f64>) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-12, "{} != {}\n{}\n{}", a, e, actual, expected);
        }
    }

    #[test]
    fn shapes_match_the_layer_spec() {
        let spec = [4, 7, 3, 2];
        let model = built(&spec);
        for l in 1..spec.len() {
            let layer = model.layer(l).unwrap();
            assert_eq!(layer.w.dim(), (spec[l], spec[l - 1]));
            assert_eq!(layer.b.dim(), (spec[l], 1));
            assert_eq!(layer.a.dim(), (spec[l], 1));
            assert_eq!(layer.z.dim(), (spec[l], 1));
            assert_eq!(layer.dw.dim(), layer.w.dim());
            assert_eq!(layer.db.dim(), layer.b.dim());
        }
        assert!(model.layer(0).is_none());
        assert!(model.layer(spec.len()).is_none());
        assert_eq!(model.activation(0).unwrap().dim(), (4, 1));
        assert_eq!(model.confusion().unwrap().classes(), 2);
        assert_eq!(model.num_params(), 7 * 4 + 7 + 3 * 7 + 3 + 2 * 3 + 2);
    }

    #[test]
    fn build_rejects_bad_configurations() {
        let mut model = Model::new();
        let single = model.build(&[3], sigmoids(1), Loss::MSE.boxed(), 0.1);
        assert!(matches!(single, Err(NNError::ConfigError(_))));
        let zero = model.build(&[3, 0, 2], sigmoids(3), Loss::MSE.boxed(), 0.1);
        assert!(matches!(zero, Err(NNError::ConfigError(_))));
        let count = model.build(&[3, 2], sigmoids(1), Loss::MSE.boxed(), 0.1);
        assert!(matches!(count, Err(NNError::ConfigError(_))));
        let lr = model.build(&[3, 2], sigmoids(2), Loss::MSE.boxed(), 0.0);
        assert!(matches!(lr, Err(NNError::ConfigError(_))));
        assert!(!model.is_built());
        assert_eq!(model.stage(), Stage::Unbuilt);
    }

    #[test]
    fn failed_rebuild_keeps_the_previous_network() {
        let mut model = built(&[2, 3, 2]);
        let res = model.build(&[2, 3, 2], sigmoids(2), Loss::MSE.boxed(), 0.1);
        assert!(res.is_err());
        assert_eq!(model.layer_spec(), &[2, 3, 2]);
        assert_eq!(model.learning_rate(), Some(0.5));
    }

    #[test]
    fn unbuilt_model_refuses_every_operation() {
        let mut model = Model::new();
        assert!(matches!(
            model.set_input(&[1.0], &[1.0]),
            Err(NNError::InvalidState { op: "set_input", stage: "unbuilt" })
        ));
        assert!(model.forward().is_err());
        assert!(model.backward().is_err());
        assert!(model.cost_function().is_err());
        assert!(model.confusion_matrix().is_err());
        assert!(model.reset_confusion().is_err());
        assert!(model.prediction().is_none());
    }

    #[test]
    fn set_input_checks_lengths_without_side_effects() {
        let mut model = built(&[2, 2]);
        model.set_input(&[0.25, 0.75], &[1.0, 0.0]).unwrap();

        let err = model.set_input(&[1.0, 2.0, 3.0], &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, NNError::ShapeMismatch { what: "input", got: (3, 1), expected: (2, 1) }));
        let err = model.set_input(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, NNError::ShapeMismatch { what: "label", got: (1, 1), expected: (2, 1) }));

        assert_eq!(model.activation(0).unwrap(), array![[0.25], [0.75]]);
        assert_eq!(model.target().unwrap(), array![[1.0], [0.0]]);
        assert_eq!(model.stage(), Stage::InputSet);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut model = built(&[2, 2]);
        assert!(matches!(
            model.forward(),
            Err(NNError::InvalidState { op: "forward", stage: "idle" })
        ));

        model.set_input(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(matches!(
            model.backward(),
            Err(NNError::InvalidState { op: "backward", .. })
        ));
        assert!(model.confusion_matrix().is_err());
        assert!(model.cost_function().is_err());

        model.forward().unwrap();
        model.backward().unwrap();
        assert_eq!(model.stage(), Stage::Idle);
        assert!(model.backward().is_err());
        assert!(model.confusion_matrix().is_err());
    }

    #[test]
    fn rejected_backward_leaves_parameters_untouched() {
        let mut model = built(&[2, 3, 2]);
        model.set_input(&[1.0, 0.5], &[0.0, 1.0]).unwrap();
        let before = model.layer(1).unwrap().w.clone();
        assert!(model.backward().is_err());
        assert_eq!(model.layer(1).unwrap().w, before);
        assert_eq!(model.stage(), Stage::InputSet);
    }

    #[test]
    fn forward_is_deterministic() {
        let mut model = Model::new();
        let mut init = RandomUniform::seeded(-1.0, 1.0, 3).unwrap();
        model
            .build_with(&[3, 4, 2], sigmoids(3), Loss::MSE.boxed(), 0.1, &mut init)
            .unwrap();
        model.set_input(&[0.1, -0.4, 0.9], &[1.0, 0.0]).unwrap();
        model.forward().unwrap();
        let first = model.prediction().unwrap().to_owned();
        model.forward().unwrap();
        assert_eq!(model.prediction().unwrap(), first);
    }

    #[test]
    fn forward_stages_the_output_error() {
        let mut model = built(&[2, 2]);
        model.set_input(&[1.0, 1.0], &[1.0, 0.0]).unwrap();
        model.forward().unwrap();
        let p = model.prediction().unwrap().to_owned();
        let expected = &p - &array![[1.0], [0.0]];
        assert_eq!(model.activation_grad(1).unwrap(), expected);
    }

    #[test]
    fn gradients_match_hand_computed_values() {
        let mut init = Fixed(VecDeque::from(vec![
            array![[0.1, 0.2], [0.3, 0.4]],
            array![[0.1], [0.2]],
            array![[0.5, 0.6], [0.7, 0.8]],
            array![[0.3], [0.4]],
        ]));
        let mut model = Model::new();
        model
            .build_with(&[2, 2, 2], sigmoids(3), Loss::MSE.boxed(), 0.5, &mut init)
            .unwrap();
        model.set_input(&[1.0, 0.5], &[1.0, 0.0]).unwrap();
        model.forward().unwrap();

        assert_close(
            model.prediction().unwrap(),
            &array![[0.7287191794171223], [0.7919401396889821]],
        );
        assert!((model.cost_function().unwrap() - 0.17519061711668102).abs() < 1e-12);

        model.backward().unwrap();

        let out = model.layer(2).unwrap();
        assert_close(
            out.dw.view(),
            &array![
                [-0.03080668424205066, -0.035834133284276065],
                [0.07495827619513963, 0.08719097579056473]
            ],
        );
        assert_close(
            out.db.view(),
            &array![[-0.053628837247350146], [0.13048873299139174]],
        );
        assert_close(
            model.activation_grad(1).unwrap(),
            &array![[0.06452769447029914], [0.07221368404470331]],
        );

        let hidden = model.layer(1).unwrap();
        assert_close(
            hidden.dw.view(),
            &array![
                [0.01577433124750561, 0.007887165623752804],
                [0.016010703380631916, 0.008005351690315958]
            ],
        );
        assert_close(
            hidden.db.view(),
            &array![[0.01577433124750561], [0.016010703380631916]],
        );

        assert_close(
            model.layer(2).unwrap().w.view(),
            &array![
                [0.5154033421210253, 0.617917066642138],
                [0.6625208619024301, 0.7564045121047177]
            ],
        );
        assert_close(
            model.layer(1).unwrap().w.view(),
            &array![
                [0.0921128343762472, 0.1960564171881236],
                [0.291994648309684, 0.39599732415484207]
            ],
        );
    }

    #[test]
    fn confusion_matrix_counts_every_call() {
        let mut model = Model::new();
        let mut init = RandomUniform::seeded(-1.0, 1.0, 11).unwrap();
        model
            .build_with(&[2, 3, 3], sigmoids(3), Loss::MSE.boxed(), 0.1, &mut init)
            .unwrap();
        let labels = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        for i in 0..10 {
            let x = [i as f64 * 0.1, 1.0 - i as f64 * 0.1];
            model.set_input(&x, &labels[i % 3]).unwrap();
            model.forward().unwrap();
            model.confusion_matrix().unwrap();
        }
        let cm = model.confusion().unwrap();
        assert_eq!(cm.total(), 10);
        let row_sums: Vec<u64> = cm.counts().rows().into_iter().map(|r| r.sum()).collect();
        assert_eq!(row_sums, vec![4, 3, 3]);

        model.reset_confusion().unwrap();
        assert_eq!(model.confusion().unwrap().total(), 0);
    }

    #[test]
    fn rebuild_discards_training() {
        let mut model = built(&[2, 3, 2]);
        for _ in 0..5 {
            model.set_input(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
            model.forward().unwrap();
            model.backward().unwrap();
        }
        assert!(model.layer(1).unwrap().w.iter().any(|&w| w != 0.1));

        model
            .build(&[2, 3, 2], sigmoids(3), Loss::MSE.boxed(), 0.5)
            .unwrap();
        for l in 1..3 {
            let layer = model.layer(l).unwrap();
            assert!(layer.w.iter().all(|&w| w == 0.1));
            assert!(layer.b.iter().all(|&b| b == 0.1));
            assert!(layer.dw.iter().all(|&g| g == 0.0));
            assert!(layer.db.iter().all(|&g| g == 0.0));
            assert!(layer.dz.iter().all(|&g| g == 0.0));
            assert!(layer.da.iter().all(|&g| g == 0.0));
        }
        assert!(model.activation_grad(0).unwrap().iter().all(|&g| g == 0.0));
        assert_eq!(model.stage(), Stage::Idle);
    }

    #[test]
    fn summary_lists_each_layer() {
        let summary = built(&[2, 3, 2]).summary();
        assert!(summary.contains("Total params: 17"));
        assert_eq!(summary.matches("Dense").count(), 2);
    }

    #[test]
    fn badly_shaped_activation_fails_forward_without_panicking() {
        let squash = |z: &Array2<f64>, _d: bool| Array2::from_elem((1, 1), z.sum());
        let acts: Vec<Box<dyn ActivationFn>> = vec![
            Activation::Linear.boxed(),
            Box::new(squash),
            Activation::Sigmoid.boxed(),
        ];
        let mut model = Model::new();
        model.build(&[2, 3, 2], acts, Loss::MSE.boxed(), 0.1).unwrap();
        model.set_input(&[1.0, 2.0], &[1.0, 0.0]).unwrap();

        let err = model.forward().unwrap_err();
        assert!(matches!(
            err,
            NNError::ShapeMismatch { what: "activation output", got: (1, 1), expected: (3, 1) }
        ));
        assert_eq!(model.stage(), Stage::InputSet);
        assert!(matches!(model.backward(), Err(NNError::InvalidState { .. })));
    }

    #[test]
    fn badly_shaped_loss_is_reported() {
        let scalar_loss = |t: &Array2<f64>, p: &Array2<f64>, _d: bool| Array2::from_elem((1, 1), (p - t).sum());
        let mut model = Model::new();
        model.build(&[2, 2], sigmoids(2), Box::new(scalar_loss), 0.1).unwrap();
        model.set_input(&[1.0, 2.0], &[1.0, 0.0]).unwrap();
        assert!(matches!(
            model.forward(),
            Err(NNError::ShapeMismatch { what: "loss derivative", .. })
        ));
    }

    #[test]
    fn failing_derivative_stops_backward_before_any_update() {
        let bad_grad = |z: &Array2<f64>, d: bool| if d { Array2::ones((1, 1)) } else { z.clone() };
        let acts: Vec<Box<dyn ActivationFn>> = vec![
            Activation::Linear.boxed(),
            Box::new(bad_grad),
            Activation::Sigmoid.boxed(),
        ];
        let mut model = Model::new();
        model.build(&[2, 2, 2], acts, Loss::MSE.boxed(), 0.5).unwrap();
        model.set_input(&[1.0, 0.5], &[1.0, 0.0]).unwrap();
        model.forward().unwrap();

        assert!(matches!(
            model.backward(),
            Err(NNError::ShapeMismatch { what: "activation derivative", .. })
        ));
        for l in 1..3 {
            assert!(model.layer(l).unwrap().w.iter().all(|&w| w == 0.1));
            assert!(model.layer(l).unwrap().b.iter().all(|&b| b == 0.1));
        }
        assert_eq!(model.stage(), Stage::Forwarded);
    }
}
