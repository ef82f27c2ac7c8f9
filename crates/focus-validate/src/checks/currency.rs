//! ISO 4217 shape of the billing currency column.

use focus_model::ValidationFinding;

use super::CheckContext;
use crate::util::collect_failures;

pub const CURRENCY_COLUMN: &str = "BillingCurrency";

fn is_currency_code(text: &str) -> bool {
    text.len() == 3 && text.bytes().all(|b| b.is_ascii_uppercase())
}

pub fn check(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let Some(column) = ctx.table.column(CURRENCY_COLUMN) else {
        return Vec::new();
    };
    let failures = collect_failures(column.values(), |value| {
        value
            .to_lossless_string()
            .is_some_and(|text| !is_currency_code(&text))
    });
    failures
        .into_finding(
            "focus.currency_format",
            "BillingCurrency must be a 3-letter uppercase ISO 4217 code",
            CURRENCY_COLUMN,
        )
        .into_iter()
        .collect()
}
