//! Inline expressions for data-node lists.
//!
//! `ds_${0..1}.t_order_${0..1}` expands to every combination of its
//! placeholders, leftmost placeholder varying slowest. Placeholders are
//! `${...}` or `$->{...}` holding either an inclusive integer range `a..b`
//! or a list `[a, b, 'c']`. Top-level commas separate independent
//! expressions. Expansion is capped at [`MAX_EXPANDED_NODES`] per expression.

use crate::ConfigError;

/// Upper bound on the names one expression (or one range) may expand to.
pub const MAX_EXPANDED_NODES: usize = 65_536;

///
/// Segment
///

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Choice(Vec<String>),
}

/// Expand a comma-separated list of inline expressions, in order.
pub fn expand(text: &str) -> Result<Vec<String>, ConfigError> {
    let mut expanded = Vec::new();
    for expression in split_top_level(text)? {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(ConfigError::inline(text, "empty entry in list"));
        }
        expanded.extend(expand_one(expression)?);
    }

    Ok(expanded)
}

// Split on commas outside placeholder braces.
fn split_top_level(text: &str) -> Result<Vec<&str>, ConfigError> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ConfigError::inline(text, "unbalanced '}'"))?;
            }
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ConfigError::inline(text, "unclosed placeholder"));
    }
    parts.push(&text[start..]);

    Ok(parts)
}

fn expand_one(expression: &str) -> Result<Vec<String>, ConfigError> {
    let segments = parse_segments(expression)?;

    let total = segments.iter().try_fold(1_usize, |total, segment| match segment {
        Segment::Literal(_) => Some(total),
        Segment::Choice(options) => total
            .checked_mul(options.len())
            .filter(|total| *total <= MAX_EXPANDED_NODES),
    });
    if total.is_none() {
        return Err(ConfigError::inline(
            expression,
            format!("expands to more than {MAX_EXPANDED_NODES} names"),
        ));
    }

    let mut combinations = vec![String::new()];
    for segment in &segments {
        combinations = match segment {
            Segment::Literal(text) => combinations
                .into_iter()
                .map(|prefix| prefix + text)
                .collect(),
            Segment::Choice(options) => combinations
                .iter()
                .flat_map(|prefix| options.iter().map(move |option| format!("{prefix}{option}")))
                .collect(),
        };
    }

    Ok(combinations)
}

fn parse_segments(expression: &str) -> Result<Vec<Segment>, ConfigError> {
    let mut segments = Vec::new();
    let mut rest = expression;
    while let Some((open, body_start)) = find_placeholder(rest) {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }

        let body_len = rest[body_start..]
            .find('}')
            .ok_or_else(|| ConfigError::inline(expression, "unclosed placeholder"))?;
        let body = &rest[body_start..body_start + body_len];
        segments.push(Segment::Choice(parse_choice(expression, body)?));

        rest = &rest[body_start + body_len + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(segments)
}

// Byte offset of the next placeholder opener and of its body.
fn find_placeholder(text: &str) -> Option<(usize, usize)> {
    let open = text.find('$')?;
    let after = &text[open + 1..];
    if after.starts_with('{') {
        Some((open, open + 2))
    } else if after.starts_with("->{") {
        Some((open, open + 4))
    } else {
        find_placeholder(after).map(|(o, b)| (open + 1 + o, open + 1 + b))
    }
}

fn parse_choice(expression: &str, body: &str) -> Result<Vec<String>, ConfigError> {
    let body = body.trim();

    if let Some(list) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        let items: Vec<String> = list
            .split(',')
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return Err(ConfigError::inline(expression, "empty list placeholder"));
        }

        return Ok(items);
    }

    if let Some((start, end)) = body.split_once("..") {
        let bound = |text: &str| {
            let text = text.trim();
            text.parse::<i64>().map_err(|_| {
                ConfigError::inline(expression, format!("range bound '{text}' is not an integer"))
            })
        };
        let (start, end) = (bound(start)?, bound(end)?);
        if start.abs_diff(end) >= MAX_EXPANDED_NODES as u64 {
            return Err(ConfigError::inline(
                expression,
                format!("range {start}..{end} exceeds {MAX_EXPANDED_NODES} values"),
            ));
        }
        let values: Vec<String> = if start <= end {
            (start..=end).map(|v| v.to_string()).collect()
        } else {
            (end..=start).rev().map(|v| v.to_string()).collect()
        };

        return Ok(values);
    }

    if body.is_empty() {
        return Err(ConfigError::inline(expression, "empty placeholder"));
    }

    Ok(vec![unquote(body).to_string()])
}

fn unquote(text: &str) -> &str {
    ['\'', '"']
        .iter()
        .find_map(|q| text.strip_prefix(*q).and_then(|t| t.strip_suffix(*q)))
        .unwrap_or(text)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_expand_leftmost_slowest() {
        assert_eq!(
            expand("ds_${0..1}.t_order_${0..1}").expect("expand"),
            vec![
                "ds_0.t_order_0",
                "ds_0.t_order_1",
                "ds_1.t_order_0",
                "ds_1.t_order_1",
            ]
        );
    }

    #[test]
    fn lists_and_arrow_placeholders_are_accepted() {
        assert_eq!(
            expand("$->{['east', west]}_db.t_user").expect("expand"),
            vec!["east_db.t_user", "west_db.t_user"]
        );
    }

    #[test]
    fn top_level_commas_join_independent_expressions() {
        assert_eq!(
            expand("ds_0.t_${[a,b]}, ds_1.t_c").expect("expand"),
            vec!["ds_0.t_a", "ds_0.t_b", "ds_1.t_c"]
        );
    }

    #[test]
    fn descending_ranges_keep_their_direction() {
        assert_eq!(expand("t_${2..0}").expect("expand"), vec!["t_2", "t_1", "t_0"]);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(expand("ds_0.t_config").expect("expand"), vec!["ds_0.t_config"]);
    }

    #[test]
    fn dollar_without_brace_is_literal() {
        assert_eq!(expand("ds$0.t_${0..1}").expect("expand"), vec!["ds$0.t_0", "ds$0.t_1"]);
    }

    #[test]
    fn oversized_ranges_are_rejected_before_expanding() {
        let err = expand("ds_0.t_${0..9999999999}").expect_err("range too large");
        assert!(
            matches!(err, ConfigError::InlineExpression { ref reason, .. } if reason.contains("exceeds")),
            "{err}"
        );

        let err = expand("ds_${0..999}.t_${0..999}").expect_err("product too large");
        assert!(
            matches!(err, ConfigError::InlineExpression { ref reason, .. } if reason.contains("more than")),
            "{err}"
        );

        assert_eq!(expand("t_${0..65535}").expect("at the cap").len(), MAX_EXPANDED_NODES);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for text in [
            "ds_${0..1.t_order",
            "ds_0}.t_order",
            "ds_${a..b}.t",
            "ds_${[]}.t",
            "ds_0.t,,ds_1.t",
            "ds_${ }.t",
        ] {
            let err = expand(text).expect_err(text);
            assert!(
                matches!(err, ConfigError::InlineExpression { .. }),
                "{text}: {err}"
            );
        }
    }
}
