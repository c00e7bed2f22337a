use std::fs::File;
use std::io::Write;

use crate::domain::network_model::network::Network;
use crate::error::{Error, Result};
use crate::loader::parser::write_json_file;

const HEADERS: [&str; 4] = ["generation", "best", "average", "genome"];

/// Tab separated per-generation report: generation index, best and average score, and the
/// best genome as a compact descriptor.
pub struct GenerationReporter<W: Write> {
    writer: csv::Writer<W>,
}

impl GenerationReporter<File> {
    /// Creates (or truncates) the report file and writes the header line.
    pub fn create(file_path: &str) -> Result<Self> {
        let mut reporter = Self::from_writer(File::create(file_path)?);
        reporter.write_header()?;

        log::info!("Writing generation report to '{}'.", file_path);
        Ok(reporter)
    }
}

impl<W: Write> GenerationReporter<W> {
    /// Wraps `writer` without writing a header.
    pub fn from_writer(writer: W) -> Self {
        // The genome column is JSON, quoting would mangle it.
        let writer = csv::WriterBuilder::new().delimiter(b'\t').quote_style(csv::QuoteStyle::Never).has_headers(false).from_writer(writer);

        Self { writer }
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(HEADERS)?;
        self.writer.flush()?;

        Ok(())
    }

    pub fn report(&mut self, generation: usize, best: f64, average: f64, best_genome: &Network) -> Result<()> {
        let genome = serde_json::to_string(&best_genome.to_dto())?;

        self.writer.write_record([generation.to_string(), best.to_string(), average.to_string(), genome])?;
        self.writer.flush()?;

        log::info!("Generation [{}], Best={}, Average={}", generation, best, average);
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| Error::IoError(e.into_error()))
    }
}

/// Persists the best genome of a run in descriptor form.
pub fn write_checkpoint(file_path: &str, network: &Network) -> Result<()> {
    write_json_file(file_path, &network.to_dto())?;
    log::info!("Checkpoint written to '{}'.", file_path);

    Ok(())
}
