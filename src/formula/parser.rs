//! Recursive-descent parser for the concrete formula syntax: keyword
//! dispatch on the head token plus a depth-counting comma splitter for
//! binary connectives. Operates on borrowed `&str` slices with manually
//! tracked byte offsets so [`SyntaxError`] can point at the failing
//! span without repeated substring allocation.

use super::{sort_of, Formula, Sort};
use crate::error::{Error, Result, SyntaxError};

/// Parse a closed formula in the system's concrete syntax.
///
/// `∀v(φ)` desugars to `¬∃v(¬φ)`, and `<->(φ,ψ)` to
/// `and(->(φ,ψ), ->(ψ,φ))`, both at parse time.
pub fn parse(input: &str) -> Result<Formula> {
    let (body, body_offset) = trim_with_offset(input, 0);
    if body.is_empty() {
        return Err(syntax_err("empty formula", input, 0));
    }
    let formula = parse_formula(body, body_offset, input)?;
    Ok(formula)
}

fn syntax_err(message: impl Into<String>, full: &str, offset: usize) -> Error {
    let snippet: String = full[offset.min(full.len())..]
        .chars()
        .take(24)
        .collect();
    Error::Syntax(SyntaxError {
        message: message.into(),
        offset,
        snippet,
    })
}

fn trim_with_offset(s: &str, offset: usize) -> (&str, usize) {
    let start_trimmed = s.trim_start();
    let leading = s.len() - start_trimmed.len();
    (start_trimmed.trim_end(), offset + leading)
}

/// `s` starts with `head` (e.g. `"and"`) followed by a parenthesized,
/// balanced argument list; returns the inner text and its absolute
/// offset within `full`. `None` if `s` doesn't match this shape at all
/// (the caller tries the next alternative rather than erroring).
fn strip_call<'a>(s: &'a str, offset: usize, head: &str) -> Option<(&'a str, usize)> {
    let after_head = s.strip_prefix(head)?;
    let (after_head, offset) = trim_with_offset(after_head, offset + head.len());
    let after_paren = after_head.strip_prefix('(')?;
    let inner = after_paren.strip_suffix(')')?;
    Some((inner, offset + 1))
}

/// Depth-aware split at the first top-level comma, so `and(a,b)` splits
/// at the comma between `a` and `b` even when `a` or `b` itself contains
/// nested parens and commas.
fn split_at_comma<'a>(s: &'a str, offset: usize, full: &str) -> Result<(&'a str, usize, &'a str, usize)> {
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                let left = &s[..i];
                let right_start = i + ch.len_utf8();
                let right = &s[right_start..];
                let (left, left_off) = trim_with_offset(left, offset);
                let (right, right_off) = trim_with_offset(right, offset + right_start);
                return Ok((left, left_off, right, right_off));
            }
            _ => {}
        }
    }
    Err(syntax_err(
        "expected `,` separating arguments",
        full,
        offset,
    ))
}

/// A bare identifier: `[A-Za-z_]\w*`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_var<'a>(s: &'a str, offset: usize, full: &str) -> Result<&'a str> {
    let (trimmed, _) = trim_with_offset(s, offset);
    if !is_identifier(trimmed) {
        return Err(syntax_err(
            format!("expected a variable name, found `{}`", trimmed),
            full,
            offset,
        ));
    }
    Ok(trimmed)
}

fn parse_binary<'a>(
    s: &'a str,
    offset: usize,
    full: &str,
    head: &str,
) -> Option<Result<(&'a str, usize, &'a str, usize)>> {
    let (inner, inner_offset) = strip_call(s, offset, head)?;
    Some(split_at_comma(inner, inner_offset, full))
}

fn parse_formula(s: &str, offset: usize, full: &str) -> Result<Formula> {
    let (s, offset) = trim_with_offset(s, offset);

    if let Some(rest) = s.strip_prefix('∃') {
        return parse_quantifier(rest, offset + '∃'.len_utf8(), full, false);
    }
    if let Some(rest) = s.strip_prefix('∀') {
        return parse_quantifier(rest, offset + '∀'.len_utf8(), full, true);
    }
    if let Some((inner, inner_offset)) = strip_call(s, offset, "not") {
        let sub = parse_formula(inner, inner_offset, full)?;
        return Ok(Formula::Not(Box::new(sub)));
    }
    if let Some(result) = parse_binary(s, offset, full, "and") {
        let (l, lo, r, ro) = result?;
        let left = parse_formula(l, lo, full)?;
        let right = parse_formula(r, ro, full)?;
        return Ok(Formula::And(Box::new(left), Box::new(right)));
    }
    if let Some(result) = parse_binary(s, offset, full, "or") {
        let (l, lo, r, ro) = result?;
        let left = parse_formula(l, lo, full)?;
        let right = parse_formula(r, ro, full)?;
        return Ok(Formula::Or(Box::new(left), Box::new(right)));
    }
    if let Some(result) = parse_binary(s, offset, full, "<->") {
        let (l, lo, r, ro) = result?;
        let left = parse_formula(l, lo, full)?;
        let right = parse_formula(r, ro, full)?;
        // A <-> B  ==  and(->(A,B), ->(B,A))
        return Ok(Formula::And(
            Box::new(Formula::Implies(Box::new(left.clone()), Box::new(right.clone()))),
            Box::new(Formula::Implies(Box::new(right), Box::new(left))),
        ));
    }
    if let Some(result) = parse_binary(s, offset, full, "->") {
        let (l, lo, r, ro) = result?;
        let left = parse_formula(l, lo, full)?;
        let right = parse_formula(r, ro, full)?;
        return Ok(Formula::Implies(Box::new(left), Box::new(right)));
    }
    if let Some(result) = parse_binary(s, offset, full, "le") {
        let (l, lo, r, ro) = result?;
        let v = parse_var(l, lo, full)?;
        let w = parse_var(r, ro, full)?;
        return Ok(Formula::Le(v.to_string(), w.to_string()));
    }
    if let Some(result) = parse_binary(s, offset, full, "in") {
        let (l, lo, r, ro) = result?;
        let set_var = parse_var(l, lo, full)?;
        let elem_var = parse_var(r, ro, full)?;
        return Ok(Formula::In(set_var.to_string(), elem_var.to_string()));
    }
    if let Some(result) = parse_binary(s, offset, full, "left") {
        let (l, lo, r, ro) = result?;
        let v = parse_var(l, lo, full)?;
        let w = parse_var(r, ro, full)?;
        return Ok(Formula::Left(v.to_string(), w.to_string()));
    }
    if let Some(result) = parse_binary(s, offset, full, "right") {
        let (l, lo, r, ro) = result?;
        let v = parse_var(l, lo, full)?;
        let w = parse_var(r, ro, full)?;
        return Ok(Formula::Right(v.to_string(), w.to_string()));
    }
    if let Some(result) = parse_binary(s, offset, full, "card_eq") {
        let (l, lo, r, ro) = result?;
        let v = parse_var(l, lo, full)?;
        let w = parse_var(r, ro, full)?;
        return Ok(Formula::CardEq(v.to_string(), w.to_string()));
    }
    if let Some(rest) = s.strip_prefix("P_") {
        let rest_offset = offset + "P_".len();
        let mut chars = rest.char_indices();
        let (_, symbol) = chars
            .next()
            .ok_or_else(|| syntax_err("expected a symbol after `P_`", full, rest_offset))?;
        let after_symbol = &rest[symbol.len_utf8()..];
        let (inner, inner_offset) = strip_call(after_symbol, rest_offset + symbol.len_utf8(), "")
            .ok_or_else(|| syntax_err("expected `(var)` after `P_<symbol>`", full, rest_offset))?;
        let var = parse_var(inner, inner_offset, full)?;
        return Ok(Formula::Predicate(symbol, var.to_string()));
    }

    Err(syntax_err(
        format!("unrecognized formula head near `{}`", s),
        full,
        offset,
    ))
}

/// Shared by `∃`/`∀`: extract the bound variable name, then its
/// parenthesized body. `negate` is true for `∀`, which desugars to
/// `not(exists(not(body)))`.
fn parse_quantifier(rest: &str, offset: usize, full: &str, negate: bool) -> Result<Formula> {
    let ident_len = rest
        .char_indices()
        .take_while(|&(_, c)| c.is_alphanumeric() || c == '_')
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    if ident_len == 0 {
        return Err(syntax_err(
            "expected a variable name after the quantifier",
            full,
            offset,
        ));
    }
    let var_name = &rest[..ident_len];
    let body_part = &rest[ident_len..];
    let (inner, inner_offset) = strip_call(body_part, offset + ident_len, "")
        .ok_or_else(|| syntax_err("expected `(formula)` after the bound variable", full, offset + ident_len))?;

    let sort = sort_of(var_name);
    if negate {
        let negated_body = Formula::Not(Box::new(parse_formula(inner, inner_offset, full)?));
        let exists = Formula::Exists(var_name.to_string(), sort, Box::new(negated_body));
        Ok(Formula::Not(Box::new(exists)))
    } else {
        let body = parse_formula(inner, inner_offset, full)?;
        Ok(Formula::Exists(var_name.to_string(), sort, Box::new(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn parses_existential_predicate() {
        let f = parse("∃x(P_a(x))").unwrap();
        match f {
            Formula::Exists(name, Sort::First, body) => {
                assert_eq!(name, "x");
                assert_eq!(*body, Formula::Predicate('a', "x".to_string()));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test_log::test]
    fn parses_second_order_quantifier_by_case() {
        let f = parse("∃X(in(X,x))").unwrap();
        match f {
            Formula::Exists(name, Sort::Second, _) => assert_eq!(name, "X"),
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test_log::test]
    fn desugars_forall_to_negated_exists() {
        let f = parse("∀x(P_a(x))").unwrap();
        assert!(matches!(f, Formula::Not(_)));
    }

    #[test_log::test]
    fn desugars_iff_to_conjunction_of_implications() {
        let f = parse("<->(P_a(x),P_b(y))").unwrap();
        match f {
            Formula::And(l, r) => {
                assert!(matches!(*l, Formula::Implies(_, _)));
                assert!(matches!(*r, Formula::Implies(_, _)));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test_log::test]
    fn splits_nested_parens_at_top_level_comma_only() {
        let f = parse("and(P_a(x),le(x,y))").unwrap();
        assert!(matches!(f, Formula::And(_, _)));
    }

    #[test_log::test]
    fn rejects_unknown_head() {
        assert!(parse("bogus(x)").is_err());
    }

    #[test_log::test]
    fn rejects_unbalanced_parens() {
        assert!(parse("and(P_a(x),P_b(y)").is_err());
    }

    #[test_log::test]
    fn parses_card_eq_syntactically() {
        let f = parse("card_eq(X,Y)").unwrap();
        assert_eq!(f, Formula::CardEq("X".to_string(), "Y".to_string()));
    }

    #[test_log::test]
    fn parses_scenario_s2_shape() {
        let f = parse("∀x(->(P_a(x),∃y(and(P_b(y),le(x,y)))))").unwrap();
        assert!(matches!(f, Formula::Not(_)));
    }
}
