//! Minimal handling of descriptor condition expressions.
//!
//! The core deliberately does not implement the full condition grammar of
//! the build toolchain. It understands exactly three shapes:
//!
//! - the empty condition (always true),
//! - the boolean literals `true` / `false`,
//! - a single comparison of one property against a literal:
//!   `'$(TargetFramework)' == 'net472'` (or `!=`).
//!
//! Everything else is opaque: [`evaluate`] returns `None` and callers fall
//! back to preservation or skipping, per their own contract.

/// Comparison operator in the single-comparison condition shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
}

/// A parsed single-comparison condition: one `$(property)` against one
/// string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyComparison {
    pub property: String,
    pub op: Comparison,
    pub literal: String,
}

/// Parse the single-comparison shape. Returns `None` for anything richer.
pub fn parse_comparison(condition: &str) -> Option<PropertyComparison> {
    let condition = condition.trim();
    let (lhs, op, rhs) = if let Some((lhs, rhs)) = condition.split_once("==") {
        (lhs, Comparison::Equal, rhs)
    } else if let Some((lhs, rhs)) = condition.split_once("!=") {
        (lhs, Comparison::NotEqual, rhs)
    } else {
        return None;
    };

    let lhs = unquote(lhs)?;
    if is_compound(lhs) {
        return None;
    }
    let property = lhs
        .strip_prefix("$(")?
        .strip_suffix(')')?
        .trim()
        .to_string();
    if property.is_empty() || property.contains('$') {
        return None;
    }

    let literal = unquote(rhs)?;
    // A literal that itself references a property is outside the shape.
    if literal.contains("$(") || is_compound(literal) {
        return None;
    }

    Some(PropertyComparison {
        property,
        op,
        literal: literal.to_string(),
    })
}

/// An unquoted operand that still carries a quote, another comparison
/// operator, or a boolean connective is a fragment of a larger expression,
/// not a simple operand.
fn is_compound(operand: &str) -> bool {
    if operand.contains('\'') || operand.contains("==") || operand.contains("!=") {
        return true;
    }
    operand
        .split_whitespace()
        .any(|tok| tok.eq_ignore_ascii_case("and") || tok.eq_ignore_ascii_case("or"))
}

fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    match s.strip_prefix('\'') {
        Some(inner) => inner.strip_suffix('\''),
        None => Some(s),
    }
}

/// Evaluate a condition against a property lookup. `None` means the
/// condition is outside the supported shapes; the caller decides whether
/// that means "skip" (oracle) or "preserve" (converter).
pub fn evaluate(condition: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Option<bool> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Some(true);
    }
    if condition.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if condition.eq_ignore_ascii_case("false") {
        return Some(false);
    }

    let cmp = parse_comparison(condition)?;
    let value = lookup(&cmp.property).unwrap_or_default();
    let equal = value.trim().eq_ignore_ascii_case(cmp.literal.trim());
    match cmp.op {
        Comparison::Equal => Some(equal),
        Comparison::NotEqual => Some(!equal),
    }
}

/// Whether a condition references `$(property)` (case-insensitive).
pub fn references_property(condition: &str, property: &str) -> bool {
    let lower = condition.to_ascii_lowercase();
    let needle = format!("$({})", property.to_ascii_lowercase());
    lower.contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name.to_ascii_lowercase().as_str() {
            "targetframework" => Some("net5.0".to_string()),
            "configuration" => Some("Debug".to_string()),
            _ => None,
        }
    }

    #[test]
    fn empty_and_literal_conditions() {
        assert_eq!(evaluate("", &env), Some(true));
        assert_eq!(evaluate("   ", &env), Some(true));
        assert_eq!(evaluate("true", &env), Some(true));
        assert_eq!(evaluate("False", &env), Some(false));
    }

    #[test]
    fn single_comparison_shapes() {
        assert_eq!(evaluate("'$(TargetFramework)' == 'net5.0'", &env), Some(true));
        assert_eq!(evaluate("'$(TargetFramework)' == 'NET5.0'", &env), Some(true));
        assert_eq!(evaluate("'$(TargetFramework)' == 'net472'", &env), Some(false));
        assert_eq!(evaluate("'$(TargetFramework)' != 'net472'", &env), Some(true));
        assert_eq!(evaluate("$(Configuration) == Debug", &env), Some(true));
        // Undefined properties compare as empty.
        assert_eq!(evaluate("'$(Missing)' == ''", &env), Some(true));
    }

    #[test]
    fn richer_grammar_is_opaque() {
        for cond in [
            "'$(A)' == 'x' And '$(B)' == 'y'",
            "'$(TargetFramework)' == 'net5.0' Or 'true' == 'true'",
            "$(A) == 1 Or true",
            "Exists('app.config')",
            "'$(A)|$(B)' == 'x|y'",
            "'$(A)' == '$(B)'",
            "1 == 1",
        ] {
            assert_eq!(evaluate(cond, &env), None, "expected opaque: {cond}");
        }
    }

    #[test]
    fn property_references() {
        assert!(references_property(
            " '$(TargetFrameworkVersion)' == 'v4.7.2' ",
            "targetframeworkversion"
        ));
        assert!(!references_property("'$(Configuration)' == 'Debug'", "Platform"));
    }
}
