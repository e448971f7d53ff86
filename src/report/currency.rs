const RUPEE: &str = "₹";

pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "-".to_string();
    }
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{RUPEE}{sign}{}", group_indian(&digits))
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.2}% p.a.", rate * 100.0)
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    let mut out = groups.join(",");
    out.push(',');
    out.push_str(tail);
    out
}
