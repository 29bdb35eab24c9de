//! Numeric field formatting for eCDF forms.
//!
//! eCDF only accepts the comma as decimal separator; the point is accepted
//! neither as decimal nor as thousands separator.

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{FormField, KpiValue};

/// Codes of lines that may be left out when no movement occurred.
///
/// Every other code is emitted as `0,00` when its value is absent.
pub const NO_REQUIRED: &[&str] = &[
    "015", "016", "017", "019", "090", "092", "094", "095", "194", "195", "196", "226", "227",
    "228", "424", "435", "445", "454", "455", "456", "458", "459", "460", "461",
];

/// True if `code` may be omitted when its value is absent.
pub fn is_optional_code(code: &str) -> bool {
    NO_REQUIRED.contains(&code)
}

/// Round to two decimals, half away from zero.
pub fn round_amount(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // -0.001 rounds to a signed zero
    if rounded.is_zero() { Decimal::ZERO } else { rounded }
}

/// Render an amount as eCDF numeric text: two decimals, comma separator.
///
/// The text always carries two decimals, even for values using all 28
/// digits of a `Decimal`. The 15-digit limit of the form is left to the
/// schema check.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_amount(value)).replace('.', ",")
}

/// Build the numeric field for `code`, or `None` if the field is omitted.
///
/// Absent values of [`NO_REQUIRED`] codes are omitted together with their
/// comment; other absent values are emitted as zero. An empty comment is
/// treated as no comment.
pub fn format_field(code: &str, value: KpiValue, comment: Option<&str>) -> Option<FormField> {
    let amount = match value.number() {
        Some(amount) => amount,
        None if is_optional_code(code) => return None,
        None => Decimal::ZERO,
    };
    Some(FormField::Numeric {
        id: code.to_string(),
        value: format_amount(amount),
        comment: comment.filter(|c| !c.is_empty()).map(str::to_string),
    })
}
