use serde::{Deserialize, Serialize};

/// One fragment of a wallet's holdings of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Record address (a token account on Solana).
    pub id: String,
    /// Asset type (the token mint).
    pub asset: String,
    /// Raw amount held by this record.
    pub amount: u64,
}

impl BalanceRecord {
    /// Creates a balance record.
    pub fn new(id: impl Into<String>, asset: impl Into<String>, amount: u64) -> Self {
        Self {
            id: id.into(),
            asset: asset.into(),
            amount,
        }
    }
}

/// Picks the record holding the most, so the fewest records have to move.
///
/// Ties resolve to the first record in the slice.
pub fn largest_record(records: &[BalanceRecord]) -> Option<&BalanceRecord> {
    records
        .iter()
        .reduce(|best, r| if r.amount > best.amount { r } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_record() {
        let records = vec![
            BalanceRecord::new("a", "mint", 5),
            BalanceRecord::new("b", "mint", 50),
            BalanceRecord::new("c", "mint", 50),
        ];
        assert_eq!(largest_record(&records).unwrap().id, "b");
        assert!(largest_record(&[]).is_none());
    }
}
