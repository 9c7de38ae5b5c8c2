use braidcore::ExecutionContext;
use serde_json::Value;

/// Outcome of evaluating a decision expression.
///
/// Evaluation never fails the run: anything that cannot be resolved degrades
/// to a false routing result, with the reason preserved so callers can log
/// why a branch was not taken.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Bool(bool),
    /// Expression without an operator: the trimmed text itself, matched
    /// against edge labels.
    Label(String),
    /// Routes as false.
    Degraded { reason: String },
}

impl Evaluation {
    /// Routing value stored in the results map. Degraded outcomes behave as
    /// false.
    pub fn as_value(&self) -> Value {
        match self {
            Evaluation::Bool(b) => Value::Bool(*b),
            Evaluation::Label(s) => Value::String(s.clone()),
            Evaluation::Degraded { .. } => Value::Bool(false),
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Evaluation::Degraded { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Evaluate a decision expression against the execution context.
///
/// The grammar is deliberately tiny and scanned in priority order: `>`,
/// then `<`, then `===`; an expression containing none of them is an edge
/// label. `>=` and `<=` are not operators here: `a >= b` splits on `>`
/// exactly as persisted workflows expect.
pub fn evaluate(expr: &str, ctx: &ExecutionContext) -> Evaluation {
    if let Some((left, right)) = expr.split_once('>') {
        return numeric_compare(left, right, ctx, |a, b| a > b);
    }
    if let Some((left, right)) = expr.split_once('<') {
        return numeric_compare(left, right, ctx, |a, b| a < b);
    }
    if let Some((left, right)) = expr.split_once("===") {
        let lhs = resolve(left, ctx);
        let rhs = resolve(right, ctx);
        return Evaluation::Bool(strict_eq(&lhs, &rhs));
    }
    Evaluation::Label(expr.trim().to_string())
}

fn numeric_compare(
    left: &str,
    right: &str,
    ctx: &ExecutionContext,
    cmp: impl Fn(f64, f64) -> bool,
) -> Evaluation {
    let lhs = resolve(left, ctx);
    let rhs = resolve(right, ctx);

    let l = match as_number(&lhs) {
        Some(n) => n,
        None => return degraded_operand(left, &lhs),
    };
    let r = match as_number(&rhs) {
        Some(n) => n,
        None => return degraded_operand(right, &rhs),
    };

    Evaluation::Bool(cmp(l, r))
}

fn degraded_operand(token: &str, resolved: &Value) -> Evaluation {
    Evaluation::Degraded {
        reason: format!(
            "operand '{}' is not numeric (resolved to {})",
            token.trim(),
            resolved
        ),
    }
}

/// Resolve one operand token to a JSON value, in this order: quoted string,
/// numeric literal, `$variable`, `@nodeId.path` into prior results, bare
/// literal string.
fn resolve(token: &str, ctx: &ExecutionContext) -> Value {
    let token = token.trim();

    if let Some(inner) = strip_quotes(token) {
        return Value::String(inner.to_string());
    }

    if let Ok(n) = token.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::from(f);
    }

    if let Some(name) = token.strip_prefix('$') {
        return ctx.variable(name).cloned().unwrap_or(Value::Null);
    }

    if let Some(path) = token.strip_prefix('@') {
        let mut segments = path.split('.');
        let node_id = segments.next().unwrap_or_default();
        let mut value = ctx.result(node_id).cloned().unwrap_or(Value::Null);
        // Undefined-safe traversal: a missing segment or a non-object yields
        // null rather than an error.
        for segment in segments {
            value = value.get(segment).cloned().unwrap_or(Value::Null);
        }
        return value;
    }

    Value::String(token.to_string())
}

fn strip_quotes(token: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}

/// Numeric coercion for comparisons: numbers directly, numeric strings
/// parse, booleans count as 1/0. Everything else refuses and degrades.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(true) => Some(1.0),
        Value::Bool(false) => Some(0.0),
        _ => None,
    }
}

/// Strict equality: numbers compare by value regardless of representation,
/// everything else requires matching types.
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        let mut ctx = ExecutionContext::new("proj", "user")
            .with_variable("x", 10)
            .with_variable("name", "alice")
            .with_variable("threshold", "2.5");
        ctx.results.insert(
            "fetch".to_string(),
            json!({"user": {"age": 42, "name": "bob"}, "count": 3}),
        );
        ctx
    }

    #[test]
    fn greater_than_with_variable() {
        assert_eq!(evaluate("$x > 5", &ctx()), Evaluation::Bool(true));
        assert_eq!(evaluate("$x > 15", &ctx()), Evaluation::Bool(false));
    }

    #[test]
    fn less_than_with_numeric_string_variable() {
        // Numeric strings coerce for comparisons.
        assert_eq!(evaluate("$threshold < 3", &ctx()), Evaluation::Bool(true));
    }

    #[test]
    fn strict_equality() {
        assert_eq!(evaluate("$name === 'alice'", &ctx()), Evaluation::Bool(true));
        assert_eq!(evaluate("$name === 'bob'", &ctx()), Evaluation::Bool(false));
        assert_eq!(evaluate("$x === 10", &ctx()), Evaluation::Bool(true));
        // Integer and float representations of the same number are equal.
        assert_eq!(evaluate("$x === 10.0", &ctx()), Evaluation::Bool(true));
        // No cross-type coercion for strict equality.
        assert_eq!(evaluate("$x === '10'", &ctx()), Evaluation::Bool(false));
    }

    #[test]
    fn plain_text_is_a_label() {
        assert_eq!(
            evaluate("  approved ", &ctx()),
            Evaluation::Label("approved".to_string())
        );
    }

    #[test]
    fn result_path_resolution() {
        assert_eq!(evaluate("@fetch.user.age > 40", &ctx()), Evaluation::Bool(true));
        assert_eq!(
            evaluate("@fetch.user.name === 'bob'", &ctx()),
            Evaluation::Bool(true)
        );
        assert_eq!(evaluate("@fetch.count < 10", &ctx()), Evaluation::Bool(true));
    }

    #[test]
    fn missing_path_segments_resolve_to_null() {
        // Undefined-safe traversal, then strict equality against null.
        assert_eq!(
            evaluate("@fetch.user.missing.deeper === @nope.also.missing", &ctx()),
            Evaluation::Bool(true)
        );
    }

    #[test]
    fn missing_variable_degrades_comparison() {
        let outcome = evaluate("$ghost > 5", &ctx());
        let reason = outcome.degraded_reason().unwrap();
        assert!(reason.contains("$ghost"));
        assert!(reason.contains("null"));
        assert_eq!(outcome.as_value(), json!(false));
    }

    #[test]
    fn non_numeric_operand_degrades_with_reason() {
        let outcome = evaluate("$name > 5", &ctx());
        assert!(outcome.degraded_reason().unwrap().contains("$name"));
    }

    #[test]
    fn quoted_operands_are_literal_strings() {
        assert_eq!(evaluate("'a' === \"a\"", &ctx()), Evaluation::Bool(true));
        // A quoted number is a string, not a number.
        assert_eq!(evaluate("'10' === 10", &ctx()), Evaluation::Bool(false));
    }

    #[test]
    fn greater_than_takes_priority_over_other_operators() {
        // The naive scan splits ">=" on ">", leaving "= 5" as the right
        // operand, which cannot coerce.
        let outcome = evaluate("$x >= 5", &ctx());
        assert!(outcome.degraded_reason().is_some());
    }

    #[test]
    fn bare_numeric_comparison() {
        assert_eq!(evaluate("3 > 2", &ctx()), Evaluation::Bool(true));
        assert_eq!(evaluate("2.5 < 2", &ctx()), Evaluation::Bool(false));
    }
}
