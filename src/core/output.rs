use crate::core::confusion::ConfusionMatrix;
use crate::error::Result;
use csv::Writer;
use std::fmt;
use std::io;
use std::path::Path;

/// One row per real class, right aligned between dashed rules.
pub fn render_table(matrix: &ConfusionMatrix) -> String {
    let counts = matrix.counts();
    let widths: Vec<usize> = counts
        .columns()
        .into_iter()
        .map(|col| col.iter().map(|v| v.to_string().len()).max().unwrap_or(1))
        .collect();

    let rule = widths
        .iter()
        .map(|&w| "-".repeat(w))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    for row in counts.rows() {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{:>w$}", v, w = w))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&rule);
    out
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", render_table(self))
    }
}

pub fn write_confusion_csv<W: io::Write>(matrix: &ConfusionMatrix, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    for row in matrix.counts().rows() {
        let record: Vec<String> = row.iter().map(|x| x.to_string()).collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_confusion_to_csv<P: AsRef<Path>>(matrix: &ConfusionMatrix, file_path: P) -> Result<()> {
    let file = std::fs::File::create(file_path)?;
    write_confusion_csv(matrix, file)
}
