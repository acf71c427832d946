/// Builds the `(layer_spec, activations)` pair expected by `Model::build`.
///
/// ```
/// use nnb::prelude::*;
/// use nnb::topology;
///
/// let (spec, acts) = topology!(input 2, dense 3 => Activation::Tanh, dense 1 => Activation::Sigmoid);
/// let mut model = Model::new();
/// model.build(&spec, acts, Loss::MSE.boxed(), 0.1).unwrap();
/// assert_eq!(model.layer_spec(), &[2, 3, 1]);
/// ```
#[macro_export]
macro_rules! topology {
    (input $i:expr $(, dense $x:expr => $a:expr)+ $(,)?) => {
        {
            let mut widths: Vec<usize> = vec![$i];
            // The input layer has no activation; its slot is a placeholder.
            let mut activations: Vec<Box<dyn $crate::core::ActivationFn>> =
                vec![$crate::core::Activation::Linear.boxed()];
            $(
                widths.push($x);
                activations.push(Box::new($a));
            )+
            (widths, activations)
        }
    };
}
