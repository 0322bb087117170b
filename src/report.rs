//! Structured report emission
//!
//! One destination per tuning run, written append-only in a fixed order:
//! known-classifier parameters, unknown-classifier parameters, training-data
//! performance, then (if enabled) test-data performance.

use crate::error::{Result, TagTuneError};
use crate::eval::Scorecard;
use crate::grid::ParameterSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for the tuning report.
pub struct ReportWriter<W: Write> {
    out: W,
}

impl ReportWriter<BufWriter<File>> {
    /// Open a report destination on disk, truncating any previous report.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            TagTuneError::DataAccessError(format!(
                "cannot open report destination {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Emit the complete report. The section order is fixed; the test-data
    /// block appears only when a test scorecard is supplied.
    pub fn write_report(
        &mut self,
        known: (&ParameterSet, usize),
        unknown: (&ParameterSet, usize),
        training: &Scorecard,
        test: Option<&Scorecard>,
    ) -> Result<()> {
        self.line("<report>")?;
        self.params("knownParams", known.0, known.1)?;
        self.params("unknownParams", unknown.0, unknown.1)?;
        self.line("<performance>")?;
        self.scorecard("trainingData", training)?;
        if let Some(card) = test {
            self.scorecard("testData", card)?;
        }
        self.line("</performance>")?;
        self.line("</report>")?;
        self.out.flush().map_err(write_failed)
    }

    fn params(&mut self, tag: &str, params: &ParameterSet, rounds: usize) -> Result<()> {
        self.line(&format!("<{tag}>"))?;
        for (name, value) in params.entries() {
            self.line(&format!("<{name}>{value}</{name}>"))?;
        }
        self.line(&format!("<numRounds>{rounds}</numRounds>"))?;
        self.line(&format!("</{tag}>"))
    }

    fn scorecard(&mut self, tag: &str, card: &Scorecard) -> Result<()> {
        self.line(&format!("<{tag}>"))?;
        write!(self.out, "{card}").map_err(write_failed)?;
        self.line(&format!("</{tag}>"))
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").map_err(write_failed)
    }

    /// Consume the writer and return the underlying destination.
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn write_failed(e: std::io::Error) -> TagTuneError {
    TagTuneError::DataAccessError(format!("report write failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Scorecard;

    fn params() -> ParameterSet {
        ParameterSet::new(vec![
            ("thickness".to_string(), 4.0),
            ("learningRate".to_string(), 0.1),
        ])
    }

    fn card() -> Scorecard {
        let mut card = Scorecard::default();
        card.record("NN", "NN");
        card.record("DT", "NN");
        card
    }

    fn render(test: Option<&Scorecard>) -> String {
        let mut writer = ReportWriter::new(Vec::new());
        writer
            .write_report((&params(), 6), (&params(), 3), &card(), test)
            .unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_section_order_is_fixed() {
        let text = render(None);
        let positions: Vec<usize> = [
            "<report>",
            "<knownParams>",
            "<thickness>4</thickness>",
            "<learningRate>0.1</learningRate>",
            "<numRounds>6</numRounds>",
            "</knownParams>",
            "<unknownParams>",
            "</unknownParams>",
            "<performance>",
            "<trainingData>",
            "</trainingData>",
            "</performance>",
            "</report>",
        ]
        .iter()
        .map(|tag| text.find(tag).unwrap_or_else(|| panic!("missing {tag}")))
        .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_test_data_block_only_when_enabled() {
        assert!(!render(None).contains("<testData>"));
        let with_test = render(Some(&card()));
        assert!(with_test.contains("<testData>"));
        let inner = with_test
            .split("<testData>")
            .nth(1)
            .unwrap()
            .split("</testData>")
            .next()
            .unwrap();
        assert!(inner.contains("overall accuracy"));
    }
}
