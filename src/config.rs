use crate::prelude::*;
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum InitConfig {
    Constant(f64),
    Uniform {
        low: f64,
        high: f64,
        seed: Option<u64>,
    },
    Gaussian {
        mean: f64,
        std_dev: f64,
        seed: Option<u64>,
    },
    Xavier {
        sampling: Sampling,
        seed: Option<u64>,
    },
    LeCun {
        sampling: Sampling,
        seed: Option<u64>,
    },
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig::Constant(crate::core::init::DEFAULT_INIT_VALUE)
    }
}

impl InitConfig {
    pub fn initializer(&self) -> Result<Box<dyn Initializer>> {
        let init: Box<dyn Initializer> = match *self {
            InitConfig::Constant(v) => Box::new(Constant(v)),
            InitConfig::Uniform { low, high, seed: Some(seed) } => {
                Box::new(RandomUniform::seeded(low, high, seed)?)
            }
            InitConfig::Uniform { low, high, seed: None } => Box::new(RandomUniform::new(low, high)?),
            InitConfig::Gaussian { mean, std_dev, seed: Some(seed) } => {
                Box::new(Gaussian::seeded(mean, std_dev, seed)?)
            }
            InitConfig::Gaussian { mean, std_dev, seed: None } => Box::new(Gaussian::new(mean, std_dev)?),
            InitConfig::Xavier { sampling, seed: Some(seed) } => Box::new(Xavier::seeded(sampling, seed)),
            InitConfig::Xavier { sampling, seed: None } => Box::new(Xavier::new(sampling)),
            InitConfig::LeCun { sampling, seed: Some(seed) } => Box::new(LeCun::seeded(sampling, seed)),
            InitConfig::LeCun { sampling, seed: None } => Box::new(LeCun::new(sampling)),
        };
        Ok(init)
    }
}

/// Hyperparameters for a training run. Missing JSON keys take the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub layers: Vec<usize>,
    pub activation: Activation,
    pub loss: Loss,
    pub learning_rate: f64,
    pub epochs: usize,
    pub train_limit: Option<usize>,
    pub test_limit: Option<usize>,
    pub init: InitConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            layers: vec![784, 20, 10],
            activation: Activation::Sigmoid,
            loss: Loss::MSE,
            learning_rate: 0.01,
            epochs: 1,
            train_limit: Some(1),
            test_limit: Some(1),
            init: InitConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: TrainConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(NNError::ConfigError(format!(
                "layers needs at least 2 entries, got {:?}",
                self.layers
            )));
        }
        if self.layers.contains(&0) {
            return Err(NNError::ConfigError(format!(
                "layer widths must be positive, got {:?}",
                self.layers
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NNError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Rows to read from a dataset file: the first `train_limit` train, the
    /// next `test_limit` test. `None` reads everything.
    pub fn row_limit(&self) -> Option<usize> {
        match (self.train_limit, self.test_limit) {
            (Some(train), Some(test)) => train.checked_add(test),
            _ => None,
        }
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().copied().unwrap_or(0)
    }

    pub fn classes(&self) -> usize {
        self.layers.last().copied().unwrap_or(0)
    }

    pub fn build_model(&self) -> Result<Model> {
        self.validate()?;
        let activations = self.layers.iter().map(|_| self.activation.boxed()).collect();
        let mut init = self.init.initializer()?;
        let mut model = Model::new();
        model.build_with(
            &self.layers,
            activations,
            self.loss.boxed(),
            self.learning_rate,
            &mut *init,
        )?;
        Ok(model)
    }
}
