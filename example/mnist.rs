use log::info;
use nnb::config::TrainConfig;
use nnb::core::write_confusion_to_csv;
use nnb::data::Dataset;
use nnb::prelude::*;
use nnb::trainer;
use std::env;

const USAGE: &str = "usage: mnist <data.csv> [config.json] [confusion.csv]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let csv_path = args
        .first()
        .ok_or_else(|| NNError::ConfigError(USAGE.to_string()))?;
    let config = match args.get(1) {
        Some(path) => TrainConfig::from_json_file(path)?,
        None => TrainConfig::default(),
    };
    info!("config: {:?}", config);

    let dataset = Dataset::from_csv_path(csv_path, config.classes(), config.row_limit())?;
    if let Some(sample) = dataset.samples.first() {
        if sample.input.len() != config.input_width() {
            return Err(NNError::ShapeMismatch {
                what: "csv pixels",
                got: (sample.input.len(), 1),
                expected: (config.input_width(), 1),
            });
        }
    }
    let train_len = config.train_limit.unwrap_or(dataset.len());
    let (train, mut test) = dataset.split_at(train_len);
    if let Some(n) = config.test_limit {
        test.samples.truncate(n);
    }
    info!("{} training samples, {} test samples", train.len(), test.len());

    let mut model = config.build_model()?;
    println!("{}", model.summary());

    // per-epoch progress is logged by the trainer
    let history = trainer::fit(&mut model, &train, config.epochs)?;
    if let Some(cost) = history.last() {
        println!("Training error at epoch {} : {}", history.len(), cost);
    }

    let cost = trainer::evaluate(&mut model, &test)?;
    println!("Testing error : {}", cost);

    if let Some(matrix) = model.confusion() {
        println!("{}", matrix);
        if let Some(accuracy) = matrix.accuracy() {
            println!("Accuracy: {:.2}%", accuracy * 100.0);
        }
        if let Some(out) = args.get(2) {
            write_confusion_to_csv(matrix, out)?;
            info!("confusion matrix written to {}", out);
        }
    }
    Ok(())
}
