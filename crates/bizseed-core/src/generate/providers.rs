use std::borrow::Cow;

use chrono::{Duration as ChronoDuration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use fake::faker::address::en::*;
use fake::faker::company::en::*;
use fake::faker::internet::en::*;
use fake::faker::lorem::en::*;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::*;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{BizSeedError, Result};
use crate::generate::value::Value;
use crate::schema::types::{ColumnSpec, ColumnType, TextKind};

/// Source of every random decision the synthesizer makes.
///
/// The default implementation is `FakeValueGenerator`; tests substitute
/// their own to get fully predictable rows.
pub trait ValueGenerator {
    /// A non-null value for a non-key column. `row_index` is zero-based.
    fn value(&mut self, table: &str, column: &ColumnSpec, row_index: usize) -> Value;

    /// A uniformly chosen index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;

    /// Whether a nullable column should be NULL in the current row.
    fn roll_null(&mut self) -> bool;
}

/// Inclusive range of calendar dates that `date` and `timestamp` columns
/// are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(BizSeedError::Config {
                message: format!("date window starts ({}) after it ends ({})", start, end),
            });
        }
        Ok(Self { start, end })
    }

    /// The `years` years up to and including `end`.
    pub fn years_ending(end: NaiveDate, years: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateWindow {
    /// The two years ending today.
    fn default() -> Self {
        Self::years_ending(Local::now().date_naive(), 2)
    }
}

/// Value generator backed by `fake` and a seeded `StdRng`.
pub struct FakeValueGenerator {
    rng: StdRng,
    window: DateWindow,
    null_rate: f64,
}

impl FakeValueGenerator {
    /// `null_rate` is clamped to `[0, 1]`.
    pub fn seeded(seed: u64, window: DateWindow, null_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            window,
            null_rate: if null_rate.is_nan() {
                0.0
            } else {
                null_rate.clamp(0.0, 1.0)
            },
        }
    }

    fn date(&mut self) -> NaiveDate {
        let offset = self.rng.random_range(0..=self.window.days());
        self.window.start + ChronoDuration::days(offset)
    }

    fn timestamp(&mut self) -> NaiveDateTime {
        let date = self.date();
        let seconds = self.rng.random_range(0..86_400u32);
        let time =
            NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN);
        date.and_time(time)
    }

    fn text(&mut self, kind: TextKind, row_index: usize) -> String {
        let rng = &mut self.rng;
        match kind {
            TextKind::FirstName => FirstName().fake_with_rng(rng),
            TextKind::LastName => LastName().fake_with_rng(rng),
            TextKind::FullName => Name().fake_with_rng(rng),
            TextKind::Email => {
                let email: String = SafeEmail().fake_with_rng(rng);
                match email.split_once('@') {
                    Some((user, domain)) => format!("{}.{}@{}", user, row_index + 1, domain),
                    None => format!("user{}@example.com", row_index + 1),
                }
            }
            TextKind::Phone => PhoneNumber().fake_with_rng(rng),
            TextKind::StreetAddress => {
                let number: String = BuildingNumber().fake_with_rng(rng);
                let street: String = StreetName().fake_with_rng(rng);
                format!("{} {}", number, street)
            }
            TextKind::City => CityName().fake_with_rng(rng),
            TextKind::PostalCode => ZipCode().fake_with_rng(rng),
            TextKind::Country => CountryName().fake_with_rng(rng),
            TextKind::CompanyName => CompanyName().fake_with_rng(rng),
            TextKind::ProductName => {
                let head: String = Buzzword().fake_with_rng(rng);
                let tail: String = BuzzwordTail().fake_with_rng(rng);
                format!("{} {}", capitalize(&head), capitalize(&tail))
            }
            TextKind::Word => Word().fake_with_rng(rng),
            TextKind::Sentence => Sentence(5..12).fake_with_rng(rng),
            TextKind::Paragraph => Paragraph(2..5).fake_with_rng(rng),
            TextKind::Sku => format!(
                "SKU-{:05}-{}",
                row_index + 1,
                random_chars(rng, UPPER_ALNUM, 3)
            ),
            TextKind::Code => format!(
                "{}-{:04}",
                random_chars(rng, UPPER, 3),
                rng.random_range(0..10_000)
            ),
            TextKind::TickerSymbol => {
                let len = rng.random_range(3..=4);
                random_chars(rng, UPPER, len)
            }
            TextKind::AccountNumber => random_chars(rng, DIGITS, 10),
            TextKind::Url => {
                let word: String = Word().fake_with_rng(rng);
                let suffix: String = DomainSuffix().fake_with_rng(rng);
                format!("https://{}-{}.example.{}", word, row_index + 1, suffix)
            }
        }
    }
}

impl ValueGenerator for FakeValueGenerator {
    fn value(&mut self, _table: &str, column: &ColumnSpec, row_index: usize) -> Value {
        match &column.column_type {
            ColumnType::Id => Value::Int(row_index as i64 + 1),
            ColumnType::Text { kind } => Value::Text(Cow::Owned(self.text(*kind, row_index))),
            ColumnType::Integer { min, max } => Value::Int(self.rng.random_range(*min..=*max)),
            ColumnType::Decimal { min, max, scale } => {
                let (lo, hi, factor) = scaled_grid(*min, *max, *scale);
                if lo > hi {
                    return Value::Decimal(*min);
                }
                let steps = self.rng.random_range(lo..=hi);
                Value::Decimal((steps as f64 / factor).clamp(*min, *max))
            }
            ColumnType::Date => Value::Date(self.date()),
            ColumnType::Timestamp => Value::Timestamp(self.timestamp()),
            ColumnType::Boolean => Value::Bool(self.rng.random_bool(0.5)),
            ColumnType::Status { values } => {
                let idx = self.pick(values.len());
                Value::Text(Cow::Owned(values[idx].clone()))
            }
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    fn roll_null(&mut self) -> bool {
        self.rng.random_bool(self.null_rate)
    }
}

/// Integer steps of `10^-scale` that fall inside `[min, max]`, plus the
/// scale factor. The range is empty when no such step exists.
fn scaled_grid(min: f64, max: f64, scale: u32) -> (i64, i64, f64) {
    let factor = 10f64.powi(scale as i32);
    ((min * factor).ceil() as i64, (max * factor).floor() as i64, factor)
}

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPER_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DIGITS: &[u8] = b"0123456789";

fn random_chars(rng: &mut impl Rng, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}
