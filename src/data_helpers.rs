use serde_json::Value;

/// Leaf values of arbitrarily nested arrays, depth first.
///
/// Strings and objects are leaves. Uses an explicit stack, so deep nesting
/// does not recurse.
pub fn flatten(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    let mut stack: Vec<std::slice::Iter<'_, Value>> = Vec::new();
    match value {
        Value::Array(items) => stack.push(items.iter()),
        leaf => return vec![leaf],
    }
    while let Some(top) = stack.last_mut() {
        match top.next() {
            None => {
                stack.pop();
            }
            Some(Value::Array(items)) => stack.push(items.iter()),
            Some(leaf) => out.push(leaf),
        }
    }
    out
}

/// `n` followed by its English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th.
pub fn ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
