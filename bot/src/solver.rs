/// Answers simple arithmetic questions such as "What is 15 + 27?".
pub fn solve(question: &str) -> Option<String> {
    let lowered = question.trim().to_ascii_lowercase();
    let expr = lowered
        .strip_prefix("what is")
        .unwrap_or(&lowered)
        .trim()
        .trim_end_matches('?')
        .trim();

    let tokens: Vec<&str> = expr.split_whitespace().collect();
    let [lhs, op, rhs] = tokens.as_slice() else {
        return None;
    };
    let lhs: f64 = lhs.parse().ok()?;
    let rhs: f64 = rhs.parse().ok()?;

    let value = match *op {
        "+" | "plus" => lhs + rhs,
        "-" | "minus" => lhs - rhs,
        "*" | "x" | "×" | "times" => lhs * rhs,
        "/" | "÷" => {
            if rhs == 0.0 {
                return None;
            }
            lhs / rhs
        }
        _ => return None,
    };
    Some(format_number(value))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", (value * 100.0).round() / 100.0)
    }
}
