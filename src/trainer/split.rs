//! 層化分割
//!
//! ラベルごとにシャッフルし、各クラスから同じ比率で検証用を取り出す。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use review_sentiment_common::Sentiment;

/// 学習用・検証用の行インデックス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// クラス比を保ったまま分割
///
/// 各クラスから `round(件数 * test_size)` 件を検証用に回す。
/// 同じシードなら同じ結果になる。
pub fn stratified_split(labels: &[Sentiment], test_size: f64, seed: u64) -> Split {
    let test_size = test_size.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut validation = Vec::new();

    for class in Sentiment::ALL {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }

        indices.shuffle(&mut rng);
        let n_val = ((indices.len() as f64 * test_size).round() as usize).min(indices.len());
        validation.extend_from_slice(&indices[..n_val]);
        train.extend_from_slice(&indices[n_val..]);
    }

    train.shuffle(&mut rng);
    validation.shuffle(&mut rng);
    Split { train, validation }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<Sentiment> {
        let mut v = vec![Sentiment::Positive; 50];
        v.extend(vec![Sentiment::Negative; 30]);
        v.extend(vec![Sentiment::Neutral; 20]);
        v
    }

    #[test]
    fn test_split_proportions_per_class() {
        let labels = labels();
        let split = stratified_split(&labels, 0.2, 42);

        assert_eq!(split.validation.len(), 20);
        assert_eq!(split.train.len(), 80);

        let count = |idx: &[usize], s: Sentiment| idx.iter().filter(|&&i| labels[i] == s).count();
        assert_eq!(count(&split.validation, Sentiment::Positive), 10);
        assert_eq!(count(&split.validation, Sentiment::Negative), 6);
        assert_eq!(count(&split.validation, Sentiment::Neutral), 4);
    }

    #[test]
    fn test_split_is_partition() {
        let labels = labels();
        let split = stratified_split(&labels, 0.2, 7);
        let mut all: Vec<usize> = split.train.iter().chain(&split.validation).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic_for_seed() {
        let labels = labels();
        assert_eq!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 42));
        assert_ne!(
            stratified_split(&labels, 0.2, 42).validation,
            stratified_split(&labels, 0.2, 43).validation
        );
    }

    #[test]
    fn test_split_zero_test_size() {
        let split = stratified_split(&[Sentiment::Positive; 5], 0.0, 1);
        assert!(split.validation.is_empty());
        assert_eq!(split.train.len(), 5);
    }
}
