use crate::data::Dataset;
use crate::prelude::*;
use log::{debug, info, trace};

/// One pass of online gradient descent; returns the mean per-example cost.
pub fn train_epoch(model: &mut Model, dataset: &Dataset) -> Result<f64> {
    let mut cost = 0.0;
    for (i, sample) in dataset.iter().enumerate() {
        model.set_input(&sample.input, &sample.label)?;
        model.forward()?;
        let c = model.cost_function()?;
        trace!("sample {}: cost {}", i, c);
        cost += c;
        model.backward()?;
    }
    Ok(mean(cost, dataset.len()))
}

pub fn fit(model: &mut Model, dataset: &Dataset, epochs: usize) -> Result<Vec<f64>> {
    let mut history = Vec::with_capacity(epochs);
    for epoch in 0..epochs {
        let cost = train_epoch(model, dataset)?;
        info!("Training error at epoch {}/{}: {}", epoch + 1, epochs, cost);
        history.push(cost);
    }
    Ok(history)
}

/// Runs every sample through the model without updating it, accumulating the
/// confusion matrix. Returns the mean cost.
pub fn evaluate(model: &mut Model, dataset: &Dataset) -> Result<f64> {
    let mut cost = 0.0;
    for sample in dataset {
        model.set_input(&sample.input, &sample.label)?;
        model.forward()?;
        cost += model.cost_function()?;
        model.confusion_matrix()?;
    }
    let cost = mean(cost, dataset.len());
    debug!("evaluated {} samples, mean cost {}", dataset.len(), cost);
    Ok(cost)
}

fn mean(total: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}
