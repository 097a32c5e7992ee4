//! Pattern Emission
//!
//! Closed n-sets flow out of the enumerator through a [`PatternSink`]: a
//! formatting sink writing one line per pattern with configurable
//! separators, or a collector feeding the agglomeration post-processing and
//! the tests. Elements print in the user's original dimension order.

use std::io::{self, Write};

use crate::config::OutputConfig;
use crate::miner::MiningContext;

/// One closed n-set, as sorted data ids per internal dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub ids: Vec<Vec<usize>>,
}

impl Pattern {
    pub fn area(&self) -> usize {
        self.ids.iter().map(Vec::len).product()
    }

    /// Element labels in external dimension order, sorted within each
    /// dimension.
    pub fn external_labels(&self, ctx: &MiningContext) -> Vec<Vec<String>> {
        ctx.internal_of_external
            .iter()
            .map(|&internal| {
                let mut labels: Vec<String> = self.ids[internal]
                    .iter()
                    .map(|&id| ctx.labels[internal][id].clone())
                    .collect();
                labels.sort_unstable();
                labels
            })
            .collect()
    }
}

/// Receives every closed n-set the moment it is proven closed.
pub trait PatternSink {
    fn emit(&mut self, pattern: &Pattern, ctx: &MiningContext) -> io::Result<()>;
}

/// Formats patterns onto a writer.
pub struct FormattingSink<W: Write> {
    writer: W,
    options: OutputConfig,
}

impl<W: Write> FormattingSink<W> {
    pub fn new(writer: W, options: OutputConfig) -> Self {
        FormattingSink { writer, options }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PatternSink for FormattingSink<W> {
    fn emit(&mut self, pattern: &Pattern, ctx: &MiningContext) -> io::Result<()> {
        let mut first_dimension = true;
        for &internal in &ctx.internal_of_external {
            if first_dimension {
                first_dimension = false;
            } else {
                write!(self.writer, "{}", self.options.dimension_separator)?;
            }
            let mut first_element = true;
            for &id in &pattern.ids[internal] {
                if first_element {
                    first_element = false;
                } else {
                    write!(self.writer, "{}", self.options.element_separator)?;
                }
                write!(self.writer, "{}", ctx.labels[internal][id])?;
            }
        }
        if self.options.print_sizes {
            write!(self.writer, "{}", self.options.pattern_size_separator)?;
            let mut first_size = true;
            for &internal in &ctx.internal_of_external {
                if first_size {
                    first_size = false;
                } else {
                    write!(self.writer, "{}", self.options.size_separator)?;
                }
                write!(self.writer, "{}", pattern.ids[internal].len())?;
            }
        }
        if self.options.print_area {
            write!(
                self.writer,
                "{}{}",
                self.options.size_area_separator,
                pattern.area()
            )?;
        }
        writeln!(self.writer)
    }
}

/// Collects patterns in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub patterns: Vec<Pattern>,
}

impl PatternSink for CollectingSink {
    fn emit(&mut self, pattern: &Pattern, _ctx: &MiningContext) -> io::Result<()> {
        self.patterns.push(pattern.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AppealMode;

    fn context() -> MiningContext {
        MiningContext {
            n: 2,
            // Internal order swaps the user's dimensions.
            external_of_internal: vec![1, 0],
            internal_of_external: vec![1, 0],
            labels: vec![
                vec!["x".to_string(), "y".to_string()],
                vec!["a".to_string(), "b".to_string()],
            ],
            noise_per_unit: 100,
            min_sizes: vec![0, 0],
            min_area: 0.0,
            symmetric: None,
            appeal_mode: AppealMode::PotentialNoise,
            min_size_element_pruning: true,
            audit_noise_counters: false,
        }
    }

    #[test]
    fn test_formatting_restores_external_order() {
        let ctx = context();
        let pattern = Pattern {
            ids: vec![vec![0, 1], vec![0]],
        };
        let mut sink = FormattingSink::new(Vec::new(), OutputConfig::default());
        sink.emit(&pattern, &ctx).expect("writes");
        let line = String::from_utf8(sink.into_inner()).expect("utf8");
        // External dimension 0 is internal 1 (labels a/b).
        assert_eq!(line, "a x,y\n");
    }

    #[test]
    fn test_sizes_and_area_annex() {
        let ctx = context();
        let pattern = Pattern {
            ids: vec![vec![0, 1], vec![0]],
        };
        let options = OutputConfig {
            print_sizes: true,
            print_area: true,
            ..OutputConfig::default()
        };
        let mut sink = FormattingSink::new(Vec::new(), options);
        sink.emit(&pattern, &ctx).expect("writes");
        let line = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(line, "a x,y : 1 2 : 2\n");
    }

    #[test]
    fn test_external_labels_are_sorted() {
        let ctx = context();
        let pattern = Pattern {
            ids: vec![vec![1, 0], vec![0]],
        };
        let labels = pattern.external_labels(&ctx);
        assert_eq!(labels, vec![vec!["a".to_string()], vec!["x".to_string(), "y".to_string()]]);
    }
}
