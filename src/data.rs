//! Example sources for the training drivers.
//!
//! MNIST-style CSV: a header row, then one row per image with the class index
//! in the first column and raw pixel values (0..=255) in the rest. Pixels are
//! scaled to `[0, 1]` and labels one-hot encoded over the output width.
use crate::prelude::*;
use csv::ReaderBuilder;
use log::{debug, warn};
use std::fs::File;
use std::io;
use std::path::Path;

pub const PIXEL_MAX: f64 = 255.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f64>,
    pub label: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

pub fn one_hot(class: usize, classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; classes];
    if class < classes {
        v[class] = 1.0;
    }
    v
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// The four-example logic set: `[0,0]` is class 0, everything else class 1.
    pub fn logic() -> Self {
        let rows = [
            ([0.0, 0.0], [1.0, 0.0]),
            ([0.0, 1.0], [0.0, 1.0]),
            ([1.0, 0.0], [0.0, 1.0]),
            ([1.0, 1.0], [0.0, 1.0]),
        ];
        Self::new(
            rows.iter()
                .map(|(input, label)| Sample {
                    input: input.to_vec(),
                    label: label.to_vec(),
                })
                .collect(),
        )
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P, classes: usize, limit: Option<usize>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!("loading {}", path.as_ref().display());
        Self::from_csv_reader(file, classes, limit)
    }

    pub fn from_csv_reader<R: io::Read>(reader: R, classes: usize, limit: Option<usize>) -> Result<Self> {
        if classes == 0 {
            return Err(NNError::ConfigError("dataset needs at least one class".to_string()));
        }
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut samples: Vec<Sample> = Vec::new();

        for result in rdr.records() {
            if limit.map_or(false, |n| samples.len() >= n) {
                break;
            }
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let mut fields = record.iter();
            let class = fields
                .next()
                .map(str::trim)
                .ok_or_else(|| NNError::ParseError(format!("line {}: empty row", line)))?;
            let class: usize = class.parse().map_err(|_| {
                NNError::ParseError(format!("line {}: bad class index {:?}", line, class))
            })?;
            if class >= classes {
                return Err(NNError::ParseError(format!(
                    "line {}: class {} out of range for {} classes",
                    line, class, classes
                )));
            }

            let mut input = fields
                .map(|s| {
                    s.trim().parse::<f64>().map_err(|_| {
                        NNError::ParseError(format!("line {}: bad pixel value {:?}", line, s))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            input.to_unity(0.0, PIXEL_MAX);

            samples.push(Sample {
                input,
                label: one_hot(class, classes),
            });
        }

        if let Some(n) = limit {
            if samples.len() < n {
                warn!("requested {} rows but only {} were available", n, samples.len());
            }
        }
        debug!("loaded {} samples", samples.len());
        Ok(Self::new(samples))
    }

    pub fn split_at(mut self, n: usize) -> (Dataset, Dataset) {
        let rest = self.samples.split_off(n.min(self.samples.len()));
        (self, Dataset::new(rest))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "label,p0,p1,p2\n3,0,255,51\n0,255,0,0\n9,10,20,30\n";

    #[test]
    fn parses_rows_into_scaled_one_hot_samples() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes(), 10, None).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.samples[0].input, vec![0.0, 1.0, 0.2]);
        assert_eq!(ds.samples[0].label, one_hot(3, 10));
        assert_eq!(ds.samples[1].label[0], 1.0);
        assert_eq!(ds.samples[2].label.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn limit_stops_reading_early() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes(), 10, Some(2)).unwrap();
        assert_eq!(ds.len(), 2);
        let ds = Dataset::from_csv_reader(CSV.as_bytes(), 10, Some(50)).unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn split_keeps_file_order() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes(), 10, None).unwrap();
        let (train, test) = ds.split_at(1);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 2);
        assert_eq!(test.samples[0].label, one_hot(0, 10));

        let (all, none) = Dataset::logic().split_at(10);
        assert_eq!(all.len(), 4);
        assert!(none.is_empty());
    }

    #[test]
    fn class_out_of_range_is_an_error() {
        let res = Dataset::from_csv_reader(CSV.as_bytes(), 5, None);
        assert!(matches!(res, Err(NNError::ParseError(_))));
    }

    #[test]
    fn bad_pixel_is_an_error() {
        let csv = "label,p0\n1,abc\n";
        let res = Dataset::from_csv_reader(csv.as_bytes(), 2, None);
        assert!(matches!(res, Err(NNError::ParseError(_))));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "label,p0,p1\n1,0,0\n0,5\n";
        let res = Dataset::from_csv_reader(csv.as_bytes(), 2, None);
        assert!(matches!(res, Err(NNError::CsvError(_))));
    }

    #[test]
    fn logic_set_has_one_class_zero_example() {
        let ds = Dataset::logic();
        assert_eq!(ds.len(), 4);
        let zeros = ds.iter().filter(|s| s.label[0] == 1.0).count();
        assert_eq!(zeros, 1);
    }
}
