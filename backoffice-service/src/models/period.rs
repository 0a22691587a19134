use crate::ledger::error::LedgerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, LedgerError> {
        if from > to {
            return Err(LedgerError::Validation(format!(
                "dateFrom {} is after dateTo {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(date("2024-03-01"), date("2024-03-31")).unwrap();
        assert!(range.contains(date("2024-03-01")));
        assert!(range.contains(date("2024-03-31")));
        assert!(!range.contains(date("2024-04-01")));
        assert!(!range.contains(date("2024-02-29")));
    }

    #[test]
    fn single_day_range_is_allowed() {
        let range = DateRange::new(date("2024-03-05"), date("2024-03-05")).unwrap();
        assert!(range.contains(date("2024-03-05")));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::new(date("2024-03-31"), date("2024-03-01")).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
