//! Partition results into the best competitor and the rest

use crate::model::CompetitorResult;

/// Results split for display
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classified {
    pub best: Option<CompetitorResult>,
    pub others: Vec<CompetitorResult>,
}

impl Classified {
    /// Total number of results across both groups
    pub fn len(&self) -> usize {
        self.others.len() + usize::from(self.best.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_none() && self.others.is_empty()
    }
}

/// The first result flagged `is_best` becomes `best`; everything else,
/// including further flagged results, stays in `others` in input order.
pub fn classify(results: Vec<CompetitorResult>) -> Classified {
    let mut best = None;
    let mut others = Vec::with_capacity(results.len());

    for result in results {
        if result.is_best && best.is_none() {
            best = Some(result);
        } else {
            others.push(result);
        }
    }

    Classified { best, others }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, best: bool) -> CompetitorResult {
        CompetitorResult::new(id, id.to_uppercase(), "").with_best(best)
    }

    fn ids(results: &[CompetitorResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_classify_empty() {
        let classified = classify(Vec::new());
        assert_eq!(classified.best, None);
        assert!(classified.others.is_empty());
        assert!(classified.is_empty());
    }

    #[test]
    fn test_classify_one_best() {
        let classified = classify(vec![result("a", false), result("b", true), result("c", false)]);
        assert_eq!(classified.best.as_ref().map(|b| b.id.as_str()), Some("b"));
        assert_eq!(ids(&classified.others), ["a", "c"]);
        assert_eq!(classified.len(), 3);
    }

    #[test]
    fn test_classify_none_flagged() {
        let input = vec![result("a", false), result("b", false)];
        let classified = classify(input.clone());
        assert_eq!(classified.best, None);
        assert_eq!(classified.others, input);
    }

    #[test]
    fn test_classify_extra_flags_stay_in_others() {
        let classified = classify(vec![result("a", true), result("b", true), result("c", false)]);
        assert_eq!(classified.best.map(|b| b.id), Some("a".to_string()));
        assert_eq!(ids(&classified.others), ["b", "c"]);
    }
}
