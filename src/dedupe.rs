use std::collections::HashSet;

use crate::models::CandidateTransaction;

/// Identity of a candidate within one import batch.
pub fn dedupe_key(txn: &CandidateTransaction) -> String {
    format!("{}|{}|{}|{}", txn.date, txn.description, txn.amount, txn.kind)
}

/// Drop candidates whose key was already seen, keeping the first occurrence
/// and the original order.
pub fn dedupe(candidates: Vec<CandidateTransaction>) -> Vec<CandidateTransaction> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|txn| seen.insert(dedupe_key(txn)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxnType;

    fn txn(date: &str, description: &str, amount: f64, kind: TxnType) -> CandidateTransaction {
        CandidateTransaction {
            description: description.to_string(),
            amount,
            date: date.to_string(),
            kind,
            category: "Otros".to_string(),
        }
    }

    #[test]
    fn test_first_occurrence_wins_and_order_is_kept() {
        let a = txn("2024-01-01", "A", 10.0, TxnType::Expense);
        let b = txn("2024-01-02", "B", 20.0, TxnType::Expense);
        let mut a_dup = a.clone();
        a_dup.category = "Mercado".to_string();
        let c = txn("2024-01-03", "C", 30.0, TxnType::Income);

        let out = dedupe(vec![a.clone(), b.clone(), a_dup, c.clone()]);
        assert_eq!(out, vec![a, b, c]);
    }

    #[test]
    fn test_type_is_part_of_the_key() {
        let out = dedupe(vec![
            txn("2024-01-01", "Ajuste", 10.0, TxnType::Expense),
            txn("2024-01-01", "Ajuste", 10.0, TxnType::Income),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let batch = vec![
            txn("2024-01-01", "A", 10.0, TxnType::Expense),
            txn("2024-01-01", "A", 10.0, TxnType::Expense),
            txn("2024-01-01", "A", 10.5, TxnType::Expense),
        ];
        let once = dedupe(batch);
        let twice = dedupe(once.clone());
        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_batch() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
