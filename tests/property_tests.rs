//! Property Tests
//!
//! A brute-force reference enumerates every closed pattern of random small
//! crisp matrices; the miner must produce exactly the same set. On a crisp
//! relation the normalized budgets tolerate no missing cell, so closedness
//! by the added element's own budget and maximality among valid patterns
//! coincide and the expected output is the set of closed formal concepts.
//! The miner runs with noise-counter audits on, so every recursion node
//! also cross-checks its incremental state against the store.

use proptest::prelude::*;
use std::io::Cursor;

use nsetmine::{mine_relation, CollectingSink, MiningConfig, MiningError};

type LabelPattern = (Vec<String>, Vec<String>);

/// Exhaustive closed-concept enumeration over the present cells.
fn reference(matrix: &[Vec<u8>]) -> Vec<LabelPattern> {
    let present = |r: usize, c: usize| matrix[r][c] != 0;
    let rows: Vec<usize> = (0..matrix.len())
        .filter(|&r| matrix[r].iter().any(|&cell| cell != 0))
        .collect();
    let columns: Vec<usize> = (0..matrix[0].len())
        .filter(|&c| matrix.iter().any(|row| row[c] != 0))
        .collect();

    let mut patterns = Vec::new();
    for row_mask in 1u32..(1 << rows.len()) {
        for column_mask in 1u32..(1 << columns.len()) {
            let a: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| row_mask >> i & 1 == 1)
                .map(|(_, &r)| r)
                .collect();
            let b: Vec<usize> = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| column_mask >> i & 1 == 1)
                .map(|(_, &c)| c)
                .collect();
            let full = |a: &[usize], b: &[usize]| {
                a.iter().all(|&r| b.iter().all(|&c| present(r, c)))
            };
            if !full(&a, &b) {
                continue;
            }
            let closed = rows
                .iter()
                .all(|&r| a.contains(&r) || !b.iter().all(|&c| present(r, c)))
                && columns
                    .iter()
                    .all(|&c| b.contains(&c) || !a.iter().all(|&r| present(r, c)));
            if closed {
                patterns.push((
                    a.iter().map(|r| format!("r{r}")).collect(),
                    b.iter().map(|c| format!("c{c}")).collect(),
                ));
            }
        }
    }
    patterns.sort();
    patterns
}

fn relation_text(matrix: &[Vec<u8>]) -> String {
    let mut text = String::new();
    for (r, row) in matrix.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            if cell != 0 {
                text.push_str(&format!("r{r} c{c}\n"));
            }
        }
    }
    text
}

fn mine(matrix: &[Vec<u8>], epsilon: [f64; 2]) -> Result<Vec<LabelPattern>, MiningError> {
    let mut config = MiningConfig::default();
    config.constraints.epsilon = epsilon.to_vec();
    config.constraints.min_sizes = vec![1, 1];
    config.engine.audit_noise_counters = true;

    let text = relation_text(matrix);
    let mut sink = CollectingSink::default();
    mine_relation(&config, Cursor::new(text.clone()), "property", &mut sink)?;

    // Recover labels by re-running onto a formatting writer.
    let mut out = Vec::new();
    nsetmine::run(&config, Cursor::new(text), "property", &mut out)?;
    let mut patterns: Vec<LabelPattern> = String::from_utf8(out)
        .expect("utf8 output")
        .lines()
        .map(|line| {
            let (first, second) = line.split_once(' ').expect("two dimensions");
            let mut rows: Vec<String> = first.split(',').map(str::to_string).collect();
            let mut columns: Vec<String> = second.split(',').map(str::to_string).collect();
            rows.sort();
            columns.sort();
            (rows, columns)
        })
        .collect();
    patterns.sort();
    Ok(patterns)
}

fn matrices() -> impl Strategy<Value = Vec<Vec<u8>>> {
    (1usize..=4, 1usize..=4).prop_flat_map(|(rows, columns)| {
        prop::collection::vec(
            prop::collection::vec(0u8..2, columns..=columns),
            rows..=rows,
        )
    })
}

proptest! {
    #[test]
    fn miner_matches_brute_force(
        matrix in matrices(),
        epsilon_row in prop::bool::ANY,
        epsilon_column in prop::bool::ANY,
    ) {
        // Both tolerances normalize to half a unit on a crisp relation;
        // varying them still exercises the front-end paths.
        let epsilon = [
            if epsilon_row { 0.75 } else { 0.25 },
            if epsilon_column { 0.75 } else { 0.25 },
        ];
        let expected = reference(&matrix);
        match mine(&matrix, epsilon) {
            Ok(patterns) => prop_assert_eq!(patterns, expected),
            // An all-zero matrix yields no tuple at all.
            Err(_) => prop_assert!(expected.is_empty()),
        }
    }
}
