use nnb::data::Dataset;
use nnb::prelude::*;
use nnb::{topology, trainer};
use std::env;

const EPOCHS: usize = 10000;
const LEARNING_RATE: f64 = 0.01;

// Usage: logic [epochs]
fn main() -> Result<()> {
    env_logger::init();

    let epochs = match env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .map_err(|_| NNError::ConfigError(format!("epochs must be a number, got {:?}", arg)))?,
        None => EPOCHS,
    };

    let dataset = Dataset::logic();
    let (spec, activations) = topology!(
        input 2,
        dense 2 => Activation::Sigmoid,
        dense 2 => Activation::Sigmoid,
    );

    let mut model = Model::new();
    model.build(&spec, activations, Loss::MSE.boxed(), LEARNING_RATE)?;
    println!("{}", model.summary());

    let history = trainer::fit(&mut model, &dataset, epochs)?;
    if let Some(cost) = history.last() {
        println!("Training error at epoch {} : {}", epochs, cost);
    }

    let cost = trainer::evaluate(&mut model, &dataset)?;
    println!("Testing error : {}", cost);

    for sample in dataset.iter() {
        model.set_input(&sample.input, &sample.label)?;
        model.forward()?;
        if let Some(prediction) = model.prediction() {
            println!("{:?} -> {:.4}", sample.input, prediction.t());
        }
    }

    if let Some(matrix) = model.confusion() {
        println!("{}", matrix);
    }
    Ok(())
}
