use crate::features::{Candidate, FeatureSpace, Preference};

/// Brute-force nearest neighbours over the current candidate set. Nothing is
/// fitted ahead of time, so new pets show up immediately.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    space: FeatureSpace,
}

impl Recommender {
    pub fn new(space: FeatureSpace) -> Self {
        Self { space }
    }

    /// Indices into `candidates` of the `top_k` closest pets, nearest first.
    /// Equal distances keep candidate order.
    pub fn recommend(&self, pref: &Preference, candidates: &[Candidate], top_k: usize) -> Vec<usize> {
        if candidates.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let (target, mask) = self.space.encode_preference(pref);
        let mut scored: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, distance(&target, &self.space.encode_candidate(c), &mask)))
            .collect();

        // sort_by is stable, which gives the tie order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.into_iter().take(top_k).map(|(i, _)| i).collect()
    }
}

fn distance(a: &[f64], b: &[f64], mask: &[bool]) -> f64 {
    a.iter()
        .zip(b)
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|((x, y), _)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(species: &str, size: &str, temperament: &str, energy: &str, age: i64) -> Candidate {
        Candidate {
            species: species.into(),
            size: Some(size.into()),
            temperament: Some(temperament.into()),
            activity_level: Some(energy.into()),
            age: Some(age),
        }
    }

    #[test]
    fn exact_match_ranks_first() {
        let candidates = vec![
            pet("Cat", "small", "playful", "high", 12),
            pet("Dog", "large", "calm", "low", 36),
            pet("Dog", "large", "friendly", "low", 36),
        ];
        let pref = Preference {
            species: Some("dog".into()),
            size: Some("large".into()),
            temperament: Some("calm".into()),
            activity_level: Some("low".into()),
            ..Default::default()
        };

        let ranked = Recommender::default().recommend(&pref, &candidates, 2);
        assert_eq!(ranked, vec![1, 2]);
    }

    #[test]
    fn age_range_breaks_otherwise_equal_candidates() {
        let candidates = vec![
            pet("Dog", "small", "calm", "low", 60),
            pet("Dog", "small", "calm", "low", 10),
        ];
        let pref = Preference {
            min_age: Some(6),
            max_age: Some(12),
            ..Default::default()
        };

        let ranked = Recommender::default().recommend(&pref, &candidates, 5);
        assert_eq!(ranked, vec![1, 0]);
    }

    #[test]
    fn ties_keep_candidate_order_and_top_k_truncates() {
        let candidates: Vec<_> = (0..6).map(|_| pet("Dog", "small", "calm", "low", 5)).collect();
        let ranked = Recommender::default().recommend(&Preference::default(), &candidates, 4);
        assert_eq!(ranked, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_inputs() {
        let r = Recommender::default();
        assert!(r.recommend(&Preference::default(), &[], 5).is_empty());
        assert!(r.recommend(&Preference::default(), &[pet("Cat", "small", "calm", "low", 1)], 0).is_empty());
    }
}
