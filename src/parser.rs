//! Noisy Tuple Parser
//!
//! Reads a noisy relation from a line-oriented text file. Each line carries
//! one dimension field per dimension, separated by the dimension separator
//! (any whitespace by default). A field holds one or more element labels
//! joined by the element separator, and a line may end with a membership
//! degree in (0, 1]; a line without a trailing degree is fully present.
//! Multi-label fields expand to their cross product, every expanded tuple
//! receiving the line's membership.
//!
//! The parser assigns dense integer ids per dimension in order of first
//! appearance and reports per-dimension cardinalities and id-to-label
//! tables. The two dimensions of a clique pair share a single label table.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{MiningError, MiningResult};

/// One expanded input tuple, in external dimension order and parse-time ids.
#[derive(Debug, Clone)]
pub struct NoisyTuple {
    pub coords: Vec<usize>,
    pub membership: f64,
}

/// A parsed relation: tuples, per-dimension domains, crispness.
#[derive(Debug)]
pub struct ParsedRelation {
    pub n: usize,
    pub tuples: Vec<NoisyTuple>,
    /// Id-to-label tables in external dimension order; the tables of a
    /// clique pair have identical content.
    pub labels: Vec<Vec<String>>,
    pub crisp: bool,
}

impl ParsedRelation {
    pub fn cardinalities(&self) -> Vec<usize> {
        self.labels.iter().map(Vec::len).collect()
    }
}

/// Streaming reader over the input lines.
pub struct NoisyTupleReader<'a> {
    path: String,
    element_separator: &'a str,
    dimension_separator: Option<&'a str>,
    fuzzy: Option<bool>,
    clique_dimensions: &'a [usize],
    /// Tuples with membership below this bound are skipped: a single cell
    /// with that much missing mass already exceeds the smallest dimension
    /// budget, so no pattern can contain it.
    min_membership: f64,
}

impl<'a> NoisyTupleReader<'a> {
    pub fn new(
        path: impl Into<String>,
        element_separator: &'a str,
        dimension_separator: &'a str,
        fuzzy: Option<bool>,
        clique_dimensions: &'a [usize],
        min_membership: f64,
    ) -> Self {
        NoisyTupleReader {
            path: path.into(),
            element_separator,
            dimension_separator: if dimension_separator.is_empty() {
                None
            } else {
                Some(dimension_separator)
            },
            fuzzy,
            clique_dimensions,
            min_membership,
        }
    }

    /// Read the whole relation.
    pub fn read<R: BufRead>(&self, reader: R) -> MiningResult<ParsedRelation> {
        let mut n = 0usize;
        let mut fuzzy = self.fuzzy;
        // Dimension id -> label table index; clique dimensions map to one
        // shared table.
        let mut table_of_dim: Vec<usize> = Vec::new();
        let mut tables: Vec<(Vec<String>, HashMap<String, usize>)> = Vec::new();
        let mut cells: HashMap<Vec<usize>, f64> = HashMap::new();
        let mut crisp = true;

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = match self.dimension_separator {
                Some(sep) => trimmed.split(sep).map(str::trim).collect(),
                None => trimmed.split_whitespace().collect(),
            };
            if n == 0 {
                (n, fuzzy) = self.infer_shape(&fields, line_number)?;
                table_of_dim = self.build_table_indices(n, line_number)?;
                let table_count = table_of_dim.iter().max().map_or(0, |m| m + 1);
                tables = (0..table_count)
                    .map(|_| (Vec::new(), HashMap::new()))
                    .collect();
            }
            let expect = n + usize::from(fuzzy == Some(true));
            if fields.len() != expect {
                return Err(self.parse_error(
                    line_number,
                    format!("expected {expect} fields, found {}", fields.len()),
                ));
            }
            let membership = if fuzzy == Some(true) {
                let raw = fields[n];
                let value: f64 = raw.parse().map_err(|_| {
                    self.parse_error(line_number, format!("invalid membership degree '{raw}'"))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(self.parse_error(
                        line_number,
                        format!("membership degree {value} outside [0, 1]"),
                    ));
                }
                value
            } else {
                1.0
            };
            if membership == 0.0 || membership < self.min_membership {
                continue;
            }
            if membership < 1.0 {
                crisp = false;
            }

            // Expand the cross product of the per-dimension label lists.
            let mut id_lists: Vec<Vec<usize>> = Vec::with_capacity(n);
            for (dim, field) in fields.iter().take(n).enumerate() {
                let mut ids = Vec::new();
                for label in field.split(self.element_separator) {
                    if label.is_empty() {
                        return Err(
                            self.parse_error(line_number, format!("empty label in field {dim}"))
                        );
                    }
                    let (labels, index) = &mut tables[table_of_dim[dim]];
                    let next_id = labels.len();
                    let id = *index.entry(label.to_string()).or_insert_with(|| {
                        labels.push(label.to_string());
                        next_id
                    });
                    ids.push(id);
                }
                id_lists.push(ids);
            }
            let mut coords = vec![0usize; n];
            self.expand(&id_lists, 0, &mut coords, membership, &mut cells);
        }

        if n == 0 {
            return Err(MiningError::usage(format!(
                "no tuple found in {}",
                self.path
            )));
        }
        let labels: Vec<Vec<String>> = table_of_dim
            .iter()
            .map(|&t| tables[t].0.clone())
            .collect();
        let tuples = cells
            .into_iter()
            .map(|(coords, membership)| NoisyTuple { coords, membership })
            .collect();
        Ok(ParsedRelation {
            n,
            tuples,
            labels,
            crisp,
        })
    }

    fn infer_shape(
        &self,
        fields: &[&str],
        line_number: usize,
    ) -> MiningResult<(usize, Option<bool>)> {
        match self.fuzzy {
            Some(true) => {
                if fields.len() < 2 {
                    return Err(self.parse_error(
                        line_number,
                        "a fuzzy relation needs at least one dimension field and a membership \
                         degree"
                            .to_string(),
                    ));
                }
                Ok((fields.len() - 1, Some(true)))
            }
            Some(false) => Ok((fields.len(), Some(false))),
            None => {
                // A trailing field parsing as a degree in [0, 1] marks a
                // fuzzy file; the dimension count is fixed from this line on.
                let last_is_degree = fields.len() >= 2
                    && fields
                        .last()
                        .and_then(|f| f.parse::<f64>().ok())
                        .is_some_and(|v| (0.0..=1.0).contains(&v));
                if last_is_degree {
                    Ok((fields.len() - 1, Some(true)))
                } else {
                    Ok((fields.len(), Some(false)))
                }
            }
        }
    }

    fn build_table_indices(&self, n: usize, line_number: usize) -> MiningResult<Vec<usize>> {
        for &dim in self.clique_dimensions {
            if dim >= n {
                return Err(self.parse_error(
                    line_number,
                    format!("clique dimension {dim} does not exist in a {n}-dimensional relation"),
                ));
            }
        }
        let mut table_of_dim = Vec::with_capacity(n);
        let mut next = 0usize;
        let mut clique_table = None;
        for dim in 0..n {
            if self.clique_dimensions.contains(&dim) {
                let table = *clique_table.get_or_insert_with(|| {
                    let t = next;
                    next += 1;
                    t
                });
                table_of_dim.push(table);
            } else {
                table_of_dim.push(next);
                next += 1;
            }
        }
        Ok(table_of_dim)
    }

    fn expand(
        &self,
        id_lists: &[Vec<usize>],
        dim: usize,
        coords: &mut Vec<usize>,
        membership: f64,
        cells: &mut HashMap<Vec<usize>, f64>,
    ) {
        if dim == id_lists.len() {
            // Self-loops of a clique pair are reinserted as zero-noise cells
            // by the store; a parsed one carries no extra information.
            if let [first, second] = self.clique_dimensions {
                if coords[*first] == coords[*second] {
                    return;
                }
            }
            let entry = cells.entry(coords.clone()).or_insert(0.0);
            if membership > *entry {
                *entry = membership;
            }
            return;
        }
        for &id in &id_lists[dim] {
            coords[dim] = id;
            self.expand(id_lists, dim + 1, coords, membership, cells);
        }
    }

    fn parse_error(&self, line_number: usize, message: String) -> MiningError {
        MiningError::Parse {
            path: self.path.clone(),
            line: line_number + 1,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader<'a>(clique: &'a [usize]) -> NoisyTupleReader<'a> {
        NoisyTupleReader::new("test", ",", "", None, clique, 0.0)
    }

    #[test]
    fn test_crisp_relation() {
        let input = "a x\na y\nb x\n";
        let relation = reader(&[]).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.n, 2);
        assert!(relation.crisp);
        assert_eq!(relation.tuples.len(), 3);
        assert_eq!(relation.labels[0], vec!["a", "b"]);
        assert_eq!(relation.labels[1], vec!["x", "y"]);
    }

    #[test]
    fn test_fuzzy_relation() {
        let input = "a x 1\na y 0.5\n";
        let relation = reader(&[]).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.n, 2);
        assert!(!relation.crisp);
        let half = relation
            .tuples
            .iter()
            .find(|t| t.membership < 1.0)
            .expect("fuzzy tuple kept");
        assert_eq!(half.membership, 0.5);
    }

    #[test]
    fn test_cross_product_expansion() {
        let input = "a,b x,y\n";
        let relation = reader(&[]).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.tuples.len(), 4);
    }

    #[test]
    fn test_duplicate_keeps_max_membership() {
        let input = "a x 0.3\na x 0.8\n";
        let relation = reader(&[]).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.tuples.len(), 1);
        assert_eq!(relation.tuples[0].membership, 0.8);
    }

    #[test]
    fn test_clique_shares_label_table() {
        let clique = [0, 1];
        let input = "1 2\n2 3\n3 1\n";
        let relation = reader(&clique).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.labels[0], relation.labels[1]);
        assert_eq!(relation.labels[0].len(), 3);
    }

    #[test]
    fn test_clique_self_loop_skipped() {
        let clique = [0, 1];
        let input = "1 1\n1 2\n";
        let relation = reader(&clique).read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.tuples.len(), 1);
    }

    #[test]
    fn test_min_membership_filter() {
        let input = "a x 0.2\na y 0.9\n";
        let r = NoisyTupleReader::new("test", ",", "", None, &[], 0.5);
        let relation = r.read(Cursor::new(input)).expect("parses");
        assert_eq!(relation.tuples.len(), 1);
        // The filtered label never occurred in a kept tuple.
        assert_eq!(relation.labels[1], vec!["x", "y"][1..].to_vec());
    }

    #[test]
    fn test_field_count_mismatch() {
        let input = "a x\na\n";
        assert!(reader(&[]).read(Cursor::new(input)).is_err());
    }

    #[test]
    fn test_empty_input_is_usage_error() {
        assert!(reader(&[]).read(Cursor::new("")).is_err());
    }
}
