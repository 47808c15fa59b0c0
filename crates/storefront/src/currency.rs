//! Currency display.
//!
//! Catalog prices are stored in USD; shoppers see NPR. Conversion uses a
//! configured rate and formatting follows the locale: English gets a "Rs"
//! prefix with Indian digit grouping (12,34,567), Nepali gets the native
//! rupee sign. Amounts feed straight into rendering, so unparseable input
//! fails soft to zero instead of erroring.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::CurrencyConfig;

/// Display locale for prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Nepali,
}

impl Locale {
    /// Map a BCP 47 language tag onto a display locale.
    /// Anything that is not English renders the native form.
    #[must_use]
    pub fn from_language_tag(tag: &str) -> Self {
        if tag.len() >= 2 && tag.is_char_boundary(2) && tag[..2].eq_ignore_ascii_case("en") {
            Self::English
        } else {
            Self::Nepali
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::English => "Rs ",
            Self::Nepali => "\u{930}\u{941} ", // "रु "
        }
    }
}

/// Parse a decimal amount, treating unparseable input as zero.
#[must_use]
pub fn parse_amount(value: &str) -> Decimal {
    value.trim().parse().unwrap_or(Decimal::ZERO)
}

/// Convert a USD amount to NPR at the given rate.
#[must_use]
pub fn convert_usd_to_npr(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate
}

/// Format an NPR amount for display: rounded to whole rupees, grouped in
/// the Indian convention, prefixed per locale.
#[must_use]
pub fn format_npr(amount: Decimal, locale: Locale) -> String {
    // Half-away-from-zero, matching how shoppers expect prices to round.
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();

    let grouped = group_indian(&digits);
    let sign = if negative { "-" } else { "" };
    format!("{}{}{}", locale.prefix(), sign, grouped)
}

/// Format a USD amount string as NPR (parse fail-soft, convert, format).
#[must_use]
pub fn format_usd_as_npr(value: &str, locale: Locale, rate: Decimal) -> String {
    format_npr(convert_usd_to_npr(parse_amount(value), rate), locale)
}

/// Pre-bound formatter carrying the configured rate and the UI locale.
#[derive(Debug, Clone)]
pub struct CurrencyFormatter {
    rate: Decimal,
    locale: Locale,
}

impl CurrencyFormatter {
    /// Create a formatter from configuration and the active locale.
    #[must_use]
    pub const fn new(config: &CurrencyConfig, locale: Locale) -> Self {
        Self {
            rate: config.usd_to_npr,
            locale,
        }
    }

    /// Format a USD amount.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        format_npr(convert_usd_to_npr(amount, self.rate), self.locale)
    }

    /// Format a USD amount string, failing soft on parse errors.
    #[must_use]
    pub fn format_str(&self, value: &str) -> String {
        format_usd_as_npr(value, self.locale, self.rate)
    }
}

/// Group an unsigned integer digit string in the Indian convention:
/// the last three digits, then groups of two.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<String> = Vec::new();

    let head_chars: Vec<char> = head.chars().collect();
    let mut idx = head_chars.len();
    while idx > 0 {
        let start = idx.saturating_sub(2);
        groups.push(head_chars.get(start..idx).unwrap_or_default().iter().collect());
        idx = start;
    }
    groups.reverse();
    groups.push(tail.to_string());

    groups.join(",")
}
