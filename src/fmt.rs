use crate::models::TxnType;

/// Bare figure with `,` thousands groups and two decimals, e.g. `3,500,000.00`.
/// Amounts that round to zero never print as `-0.00`.
pub fn amount(val: f64) -> String {
    let fixed = format!("{:.2}", val.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if val < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

/// Positive candidate amount shown with the direction its type implies.
pub fn signed_amount(kind: TxnType, val: f64) -> String {
    match kind {
        TxnType::Income => amount(val),
        TxnType::Expense => amount(-val),
    }
}
