fn normalize(answer: &str) -> String {
    let collapsed = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches('.').trim().to_lowercase()
}

/// Compares a submitted answer with the expected one.
///
/// Matching ignores case, surrounding whitespace, repeated inner spaces and a
/// trailing full stop. When both sides are numbers they are compared by value,
/// so `42` matches `42.0`. An empty submission never matches.
pub fn answers_match(given: &str, expected: &str) -> bool {
    let given = normalize(given);
    let expected = normalize(expected);
    if given.is_empty() {
        return false;
    }

    match (given.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < 1e-9,
        _ => given == expected,
    }
}
