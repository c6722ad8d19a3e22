//! Model collaborator interface and baseline models

use crate::event::{Features, Label};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmType {
    Classification,
    Regression,
    Clustering,
    Other,
}

impl AlgorithmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::Classification => "CLASSIFICATION",
            AlgorithmType::Regression => "REGRESSION",
            AlgorithmType::Clustering => "CLUSTERING",
            AlgorithmType::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classification" => Some(AlgorithmType::Classification),
            "regression" => Some(AlgorithmType::Regression),
            "clustering" => Some(AlgorithmType::Clustering),
            "other" => Some(AlgorithmType::Other),
            _ => None,
        }
    }

    /// Only supervised models carry the true label into evaluation
    pub fn uses_labels(&self) -> bool {
        matches!(self, AlgorithmType::Classification | AlgorithmType::Regression)
    }
}

/// Incrementally trained model driven by an evaluation observer
pub trait StreamModel {
    fn algorithm_type(&self) -> AlgorithmType;

    /// Predict the target of a single instance
    fn predict(&mut self, x: &[f64]) -> Label;

    /// Update the model with a batch; `classes` lists every known class label
    fn partial_fit(&mut self, x: &[Features], y: &[Option<Label>], classes: &[Label]);
}

impl<M: StreamModel + ?Sized> StreamModel for Box<M> {
    fn algorithm_type(&self) -> AlgorithmType {
        (**self).algorithm_type()
    }

    fn predict(&mut self, x: &[f64]) -> Label {
        (**self).predict(x)
    }

    fn partial_fit(&mut self, x: &[Features], y: &[Option<Label>], classes: &[Label]) {
        (**self).partial_fit(x, y, classes)
    }
}

/// Predicts the most frequent class seen so far
///
/// Ties go to the smallest class label. Until a label has been seen, predicts
/// the first entry of the `classes` passed to `partial_fit`, or 0 before the
/// first fit.
#[derive(Debug, Clone, Default)]
pub struct MajorityClass {
    counts: HashMap<u64, (Label, u64)>,
    fallback: Label,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamModel for MajorityClass {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Classification
    }

    fn predict(&mut self, _x: &[f64]) -> Label {
        self.counts
            .values()
            .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then(lb.total_cmp(la)))
            .map(|(label, _)| *label)
            .unwrap_or(self.fallback)
    }

    fn partial_fit(&mut self, _x: &[Features], y: &[Option<Label>], classes: &[Label]) {
        if self.counts.is_empty() {
            if let Some(first) = classes.first() {
                self.fallback = *first;
            }
        }
        for label in y.iter().flatten() {
            self.counts.entry(label.to_bits()).or_insert((*label, 0)).1 += 1;
        }
    }
}

/// Predicts the running mean of every target seen so far
#[derive(Debug, Clone, Default)]
pub struct TargetMean {
    sum: f64,
    count: u64,
}

impl TargetMean {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamModel for TargetMean {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Regression
    }

    fn predict(&mut self, _x: &[f64]) -> Label {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn partial_fit(&mut self, _x: &[Features], y: &[Option<Label>], _classes: &[Label]) {
        for target in y.iter().flatten() {
            self.sum += target;
            self.count += 1;
        }
    }
}

/// Baseline model for `algorithm`
pub fn baseline_for(algorithm: AlgorithmType) -> Box<dyn StreamModel> {
    match algorithm {
        AlgorithmType::Regression => Box::new(TargetMean::new()),
        _ => Box::new(MajorityClass::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_class() {
        let mut model = MajorityClass::new();
        assert_eq!(model.predict(&[0.0]), 0.0, "no classes known before the first fit");

        model.partial_fit(&[], &[], &[2.0, 1.0]);
        assert_eq!(model.predict(&[0.0]), 2.0, "first class until a label is seen");

        let x = vec![vec![0.0]; 4];
        model.partial_fit(&x, &[Some(1.0), Some(2.0), Some(1.0), None], &[2.0, 1.0]);
        assert_eq!(model.predict(&[0.0]), 1.0);

        model.partial_fit(&x[..1], &[Some(2.0)], &[2.0, 1.0]);
        assert_eq!(model.predict(&[0.0]), 1.0, "ties go to the smaller label");
    }

    #[test]
    fn test_target_mean() {
        let mut model = TargetMean::new();
        assert_eq!(model.predict(&[]), 0.0);

        let x = vec![vec![0.0]; 3];
        model.partial_fit(&x, &[Some(1.0), Some(2.0), Some(6.0)], &[]);
        assert_eq!(model.predict(&[]), 3.0);
    }

    #[test]
    fn test_algorithm_type_parsing() {
        assert_eq!(AlgorithmType::from_str("Regression"), Some(AlgorithmType::Regression));
        assert_eq!(AlgorithmType::from_str("nope"), None);
        assert!(AlgorithmType::Classification.uses_labels());
        assert!(!AlgorithmType::Clustering.uses_labels());
        assert_eq!(baseline_for(AlgorithmType::Regression).algorithm_type(), AlgorithmType::Regression);
        assert_eq!(baseline_for(AlgorithmType::Other).algorithm_type(), AlgorithmType::Classification);
    }
}
