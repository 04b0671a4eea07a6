//! Futures contract identifiers and expiry resolution.
//!
//! Equity index futures (ES, NQ, YM) expire on the third Friday of the
//! contract month. When that Friday is not a trading day the expiry moves
//! back to the previous trading day.
//!
//! Accepted identifier formats:
//! - `2024-03-15`: an explicit expiry date (a Saturday right after a third
//!   Friday is read as that contract month)
//! - `2024-03`: a contract month
//! - `ESH4`, `NQM24`, `YMZ2023`, `ESH4 Index`: exchange tickers

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Calendar month in which a futures contract expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractMonth {
    pub year: i32,
    pub month: u32,
}

impl ContractMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Third Friday of the month, before any holiday adjustment.
    pub fn third_friday(&self) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let offset = (Weekday::Fri.num_days_from_monday() + 7
            - first.weekday().num_days_from_monday())
            % 7;
        Some(first + Duration::days(offset as i64 + 14))
    }
}

/// Exchange month code to calendar month.
pub fn month_from_code(code: char) -> Option<u32> {
    match code.to_ascii_uppercase() {
        'F' => Some(1),
        'G' => Some(2),
        'H' => Some(3),
        'J' => Some(4),
        'K' => Some(5),
        'M' => Some(6),
        'N' => Some(7),
        'Q' => Some(8),
        'U' => Some(9),
        'V' => Some(10),
        'X' => Some(11),
        'Z' => Some(12),
        _ => None,
    }
}

/// A parsed contract identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractId {
    /// The identifier already is the expiry date.
    Expiry(NaiveDate),
    /// The identifier names a contract month.
    Month(ContractMonth),
}

impl ContractId {
    /// Parse an identifier observed on `as_of`.
    ///
    /// `as_of` only matters for single-digit ticker years, which resolve to
    /// the earliest matching year no older than the year before `as_of`.
    pub fn parse(raw: &str, as_of: NaiveDate) -> Option<Self> {
        // Drop Bloomberg yellow-key suffixes ("ESH4 Index").
        let token = raw.split_whitespace().next()?;

        if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
            return Some(Self::from_expiry_date(date));
        }

        if let Some((year, month)) = token.split_once('-') {
            if year.len() != 4 {
                return None;
            }
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            return ContractMonth::new(year, month).map(Self::Month);
        }

        parse_ticker(token, as_of.year()).map(Self::Month)
    }

    /// Older OptionMetrics data stamps expiries on the Saturday after the
    /// third Friday; those dates mean the contract month.
    fn from_expiry_date(date: NaiveDate) -> Self {
        let is_settlement_saturday =
            date.weekday() == Weekday::Sat && (16..=22).contains(&date.day());
        match ContractMonth::new(date.year(), date.month()) {
            Some(month) if is_settlement_saturday => Self::Month(month),
            _ => Self::Expiry(date),
        }
    }
}

fn parse_ticker(token: &str, as_of_year: i32) -> Option<ContractMonth> {
    if !token.is_ascii() {
        return None;
    }
    let digits_start = token.rfind(|c: char| !c.is_ascii_digit())? + 1;
    let (head, year_digits) = token.split_at(digits_start);
    if year_digits.is_empty() {
        return None;
    }

    let month = month_from_code(head.chars().last()?)?;
    let root = &head[..head.len() - 1];
    if !root.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let year = resolve_year(year_digits, as_of_year)?;
    ContractMonth::new(year, month)
}

fn resolve_year(digits: &str, as_of_year: i32) -> Option<i32> {
    let value: i32 = digits.parse().ok()?;
    match digits.len() {
        1 => {
            let floor = as_of_year - 1;
            let mut year = floor - floor.rem_euclid(10) + value;
            if year < floor {
                year += 10;
            }
            Some(year)
        }
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}

/// Resolves contract identifiers to expiry dates.
#[derive(Debug, Clone, Default)]
pub struct ExpiryCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl ExpiryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Latest trading day on or before `date`.
    pub fn roll_back(&self, mut date: NaiveDate) -> NaiveDate {
        while !self.is_trading_day(date) {
            date -= Duration::days(1);
        }
        date
    }

    pub fn expiry(&self, id: ContractId) -> Option<NaiveDate> {
        match id {
            ContractId::Expiry(date) => Some(date),
            ContractId::Month(month) => month.third_friday().map(|d| self.roll_back(d)),
        }
    }

    /// Parse and resolve in one step.
    pub fn resolve(&self, raw: &str, as_of: NaiveDate) -> Option<NaiveDate> {
        ContractId::parse(raw, as_of).and_then(|id| self.expiry(id))
    }
}
