//! Hyperparameter grid enumeration
//!
//! A grid is the cross product of independently-specified dimensions. The
//! first dimension varies slowest, so the enumeration order is fixed and
//! reproducible; tie-breaks during selection rely on it.

use crate::error::{Result, TagTuneError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One assignment of values across all dimensions, in dimension order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    entries: Vec<(String, f64)>,
}

impl ParameterSet {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Value for a named dimension, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Name/value pairs in dimension order.
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Ordered enumeration of all parameter combinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterGrid {
    dimensions: Vec<(String, Vec<f64>)>,
    combinations: Vec<ParameterSet>,
}

impl ParameterGrid {
    /// Build a grid from named, ordered value lists. At least one dimension
    /// is required and every dimension must be non-empty.
    pub fn new(dimensions: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(TagTuneError::ConfigError(
                "parameter grid requires at least one dimension".to_string(),
            ));
        }
        for (name, values) in &dimensions {
            if values.is_empty() {
                return Err(TagTuneError::ConfigError(format!(
                    "hyperparameter list for '{name}' is empty"
                )));
            }
        }
        let combinations = cross_product(&dimensions);
        Ok(Self {
            dimensions,
            combinations,
        })
    }

    /// Build a grid from comma-separated value lists, e.g.
    /// `("thickness", "2,4,8,16,32")`.
    pub fn from_comma_lists(dimensions: &[(&str, &str)]) -> Result<Self> {
        let mut parsed = Vec::with_capacity(dimensions.len());
        for (name, list) in dimensions {
            let mut values = Vec::new();
            for literal in list.split(',') {
                let literal = literal.trim();
                if literal.is_empty() {
                    continue;
                }
                let value: f64 = literal.parse().map_err(|_| {
                    TagTuneError::ConfigError(format!(
                        "cannot parse hyperparameter value '{literal}' for '{name}'"
                    ))
                })?;
                values.push(value);
            }
            parsed.push((name.to_string(), values));
        }
        Self::new(parsed)
    }

    /// Number of combinations: the product of all dimension sizes.
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn dimensions(&self) -> &[(String, Vec<f64>)] {
        &self.dimensions
    }

    /// Combinations in enumeration order.
    pub fn combinations(&self) -> &[ParameterSet] {
        &self.combinations
    }

    /// Reverse index: the position of a combination in enumeration order.
    pub fn position(&self, params: &ParameterSet) -> Option<usize> {
        self.combinations.iter().position(|c| c == params)
    }
}

/// Cross product with the first dimension varying slowest.
fn cross_product(dimensions: &[(String, Vec<f64>)]) -> Vec<ParameterSet> {
    let mut combos: Vec<Vec<(String, f64)>> = vec![Vec::new()];
    for (name, values) in dimensions {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for prefix in &combos {
            for &value in values {
                let mut entry = prefix.clone();
                entry.push((name.clone(), value));
                next.push(entry);
            }
        }
        combos = next;
    }
    combos.into_iter().map(ParameterSet::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_is_product_of_dimension_sizes() {
        let grid = ParameterGrid::new(vec![
            ("thickness".to_string(), vec![2.0, 4.0]),
            ("learningRate".to_string(), vec![0.05, 0.1, 0.2]),
        ])
        .unwrap();
        assert_eq!(grid.len(), 6);
    }

    #[test]
    fn test_first_dimension_varies_slowest() {
        let grid = ParameterGrid::new(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![10.0, 20.0]),
        ])
        .unwrap();
        let order: Vec<(f64, f64)> = grid
            .combinations()
            .iter()
            .map(|c| (c.get("a").unwrap(), c.get("b").unwrap()))
            .collect();
        assert_eq!(
            order,
            vec![(1.0, 10.0), (1.0, 20.0), (2.0, 10.0), (2.0, 20.0)]
        );
    }

    #[test]
    fn test_reverse_index() {
        let grid =
            ParameterGrid::from_comma_lists(&[("thickness", "2,4"), ("learningRate", "0.1,0.2")])
                .unwrap();
        for (idx, combo) in grid.combinations().iter().enumerate() {
            assert_eq!(grid.position(combo), Some(idx));
        }
        let foreign = ParameterSet::new(vec![
            ("thickness".to_string(), 8.0),
            ("learningRate".to_string(), 0.1),
        ]);
        assert_eq!(grid.position(&foreign), None);
    }

    #[test]
    fn test_empty_dimension_rejected() {
        let err = ParameterGrid::new(vec![("thickness".to_string(), vec![])]).unwrap_err();
        assert!(matches!(err, TagTuneError::ConfigError(_)));
    }

    #[test]
    fn test_unparseable_value_names_the_literal() {
        let err = ParameterGrid::from_comma_lists(&[("thickness", "2,fast,8")]).unwrap_err();
        match err {
            TagTuneError::ConfigError(msg) => assert!(msg.contains("'fast'")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
