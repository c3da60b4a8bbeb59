use rand::Rng;

use crate::{rng, NetworkError, NetworkResult};

/// What the network should produce for one example.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// Compared against the output units directly.
    Vector(Vec<f64>),
    /// Move probabilities and position evaluation for a dual-head output.
    PolicyValue { policy: Vec<f64>, value: f64 },
}

impl Target {
    /// Target for class `label` out of `classes`. A single-unit output is
    /// trained on the label value itself.
    pub fn from_label(label: usize, classes: usize) -> Self {
        if classes == 1 {
            return Self::Vector(vec![label as f64]);
        }

        let mut one_hot = vec![0.0; classes];
        one_hot[label] = 1.0;
        Self::Vector(one_hot)
    }
}

/// Inputs paired with targets, optionally carrying the class label of
/// every example for scoring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Target>,
    labels: Option<Vec<usize>>,
}

impl Dataset {
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<Target>) -> NetworkResult<Self> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::DimensionMismatch { expected: inputs.len(), actual: targets.len() });
        }

        Ok(Self { inputs, targets, labels: None })
    }

    /// Classification data: one-hot targets over `classes` built from `labels`.
    pub fn from_labels(inputs: Vec<Vec<f64>>, labels: Vec<usize>, classes: usize) -> NetworkResult<Self> {
        if classes == 0 {
            return Err(NetworkError::InvalidWidth(classes));
        }

        if let Some(&label) = labels.iter().find(|&&label| classes > 1 && label >= classes) {
            return Err(NetworkError::DimensionMismatch { expected: classes, actual: label + 1 });
        }

        let targets = labels.iter().map(|&label| Target::from_label(label, classes)).collect();
        Self::new(inputs, targets)?.with_labels(labels)
    }

    /// Self-play data for a dual-head network.
    pub fn policy_value(inputs: Vec<Vec<f64>>, policies: Vec<Vec<f64>>, values: Vec<f64>) -> NetworkResult<Self> {
        if policies.len() != values.len() {
            return Err(NetworkError::DimensionMismatch { expected: policies.len(), actual: values.len() });
        }

        let targets = policies.into_iter().zip(values).map(|(policy, value)| Target::PolicyValue { policy, value });
        Self::new(inputs, targets.collect())
    }

    pub fn with_labels(mut self, labels: Vec<usize>) -> NetworkResult<Self> {
        if labels.len() != self.len() {
            return Err(NetworkError::DimensionMismatch { expected: self.len(), actual: labels.len() });
        }

        self.labels = Some(labels);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn labels(&self) -> Option<&[usize]> {
        self.labels.as_deref()
    }

    pub fn input(&self, i: usize) -> &[f64] {
        &self.inputs[i]
    }

    pub fn target(&self, i: usize) -> &Target {
        &self.targets[i]
    }

    /// The examples at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            inputs: indices.iter().map(|&i| self.inputs[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i].clone()).collect(),
            labels: self.labels.as_ref().map(|labels| indices.iter().map(|&i| labels[i]).collect()),
        }
    }

    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        self.subset(&rng::permutation(self.len(), rng))
    }

    /// Shuffles, then splits into a training part of `floor(len * fraction)`
    /// examples and a validation part holding the rest.
    pub fn shuffle_and_split<R: Rng + ?Sized>(&self, fraction: f64, rng: &mut R) -> NetworkResult<(Self, Self)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(NetworkError::InvalidFraction(fraction));
        }

        let order = rng::permutation(self.len(), rng);
        let ntrain = (self.len() as f64 * fraction) as usize;
        let (training, validation) = order.split_at(ntrain);

        Ok((self.subset(training), self.subset(validation)))
    }
}

/// Splits `items` into `sections` contiguous chunks whose lengths differ by
/// at most one, the longer chunks first.
pub fn array_split<T>(items: &[T], sections: usize) -> Vec<&[T]> {
    let sections = sections.max(1);
    let (base, extra) = (items.len() / sections, items.len() % sections);

    let mut chunks = Vec::with_capacity(sections);
    let mut start = 0;

    for i in 0..sections {
        let len = base + usize::from(i < extra);
        chunks.push(&items[start..start + len]);
        start += len;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(n: usize) -> Dataset {
        let inputs = (0..n).map(|i| vec![i as f64]).collect();
        let labels = (0..n).map(|i| i % 3).collect();
        Dataset::from_labels(inputs, labels, 3).unwrap()
    }

    #[test]
    fn array_split_front_loads_remainder() {
        let items: Vec<usize> = (0..10).collect();
        let lens: Vec<usize> = array_split(&items, 3).iter().map(|chunk| chunk.len()).collect();
        assert_eq!(lens, [4, 3, 3]);

        let chunks = array_split(&items, 4);
        assert_eq!(chunks[0], &[0, 1, 2]);
        assert_eq!(chunks[3], &[8, 9]);
        assert_eq!(array_split(&items, 1), vec![&items[..]]);
    }

    #[test]
    fn labels_become_one_hot() {
        let data = labelled(4);
        assert_eq!(data.target(2), &Target::Vector(vec![0.0, 0.0, 1.0]));
        assert_eq!(data.labels(), Some(&[0, 1, 2, 0][..]));

        let single = Dataset::from_labels(vec![vec![0.0], vec![1.0]], vec![0, 1], 1).unwrap();
        assert_eq!(single.target(1), &Target::Vector(vec![1.0]));

        assert!(Dataset::from_labels(vec![vec![0.0]], vec![3], 3).is_err());
        assert!(Dataset::from_labels(vec![vec![0.0]], vec![0, 1], 3).is_err());
    }

    #[test]
    fn subset_keeps_examples_together() {
        let data = labelled(6);
        let sub = data.subset(&[5, 1]);

        assert_eq!(sub.inputs(), &[vec![5.0], vec![1.0]]);
        assert_eq!(sub.labels(), Some(&[2, 1][..]));
        assert_eq!(sub.target(0), &Target::Vector(vec![0.0, 0.0, 1.0]));
    }

    #[test]
    fn shuffle_and_split_partitions() {
        let data = labelled(10);
        let mut rng = rng::seeded(1);
        let (training, validation) = data.shuffle_and_split(0.75, &mut rng).unwrap();

        assert_eq!(training.len(), 7);
        assert_eq!(validation.len(), 3);

        let mut seen: Vec<f64> = training.inputs().iter().chain(validation.inputs()).map(|x| x[0]).collect();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, (0..10).map(|i| i as f64).collect::<Vec<_>>());

        assert!(matches!(data.shuffle_and_split(1.5, &mut rng), Err(NetworkError::InvalidFraction(_))));
    }

    #[test]
    fn policy_value_targets() {
        let data = Dataset::policy_value(vec![vec![0.0; 2]], vec![vec![0.5, 0.5]], vec![-1.0]).unwrap();
        assert_eq!(data.target(0), &Target::PolicyValue { policy: vec![0.5, 0.5], value: -1.0 });
        assert!(Dataset::new(vec![vec![0.0]], vec![]).is_err());
    }
}
