//! Rupee formatting with Indian digit grouping (`1,49,999` rather than
//! `149,999`).

/// Formats whole rupees as `"₹1,49,999"`.
#[must_use]
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₹{}", group_indian(&digits))
}

/// Formats a price band as `"₹45,999 – ₹52,990"`.
#[must_use]
pub fn format_price_range(lowest: i64, highest: i64) -> String {
    format!("{} – {}", format_inr(lowest), format_inr(highest))
}

/// Last three digits form one group, every group before that holds two.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}
