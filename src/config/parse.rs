//! Parser for line-oriented `key=value` settings files.
//!
//! Follows the conventional properties-file grammar: `#`/`!` comment lines,
//! backslash line continuation, `=`/`:`/whitespace separators and
//! `\t \n \r \f \uXXXX` escapes.

/// A syntax error found while parsing, with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: usize,
    pub message: String,
}

/// Parses settings text into `(key, value)` pairs in file order.
///
/// Values are returned as written (after unescaping); trimming is up to the caller.
pub fn parse_properties(content: &str) -> Result<Vec<(String, String)>, ParseFailure> {
    let lines = natural_lines(content);
    let mut pairs = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line_no = idx + 1;
        let first = strip_leading_ws(lines[idx]);
        idx += 1;

        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut current = first;
        loop {
            if !ends_with_odd_backslashes(current) {
                logical.push_str(current);
                break;
            }
            logical.push_str(&current[..current.len() - 1]);
            match lines.get(idx) {
                Some(next) => {
                    let next = strip_leading_ws(next);
                    if next.is_empty() {
                        // a blank continuation line terminates the logical line
                        break;
                    }
                    idx += 1;
                    current = next;
                }
                None => break,
            }
        }

        pairs.push(split_key_value(&logical, line_no)?);
    }

    Ok(pairs)
}

fn natural_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(pos) => {
                lines.push(&rest[..pos]);
                let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

fn strip_leading_ws(line: &str) -> &str {
    line.trim_start_matches(is_ws)
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(logical: &str, line: usize) -> Result<(String, String), ParseFailure> {
    let chars: Vec<char> = logical.chars().collect();
    let mut key_len = 0;
    let mut value_start = chars.len();
    let mut has_separator = false;
    let mut preceding_backslash = false;

    while key_len < chars.len() {
        let c = chars[key_len];
        if (c == '=' || c == ':') && !preceding_backslash {
            value_start = key_len + 1;
            has_separator = true;
            break;
        } else if is_ws(c) && !preceding_backslash {
            value_start = key_len + 1;
            break;
        }
        preceding_backslash = c == '\\' && !preceding_backslash;
        key_len += 1;
    }

    while value_start < chars.len() {
        let c = chars[value_start];
        if !is_ws(c) {
            if !has_separator && (c == '=' || c == ':') {
                has_separator = true;
            } else {
                break;
            }
        }
        value_start += 1;
    }

    let key = unescape(&chars[..key_len], line)?;
    let value = unescape(&chars[value_start..], line)?;
    Ok((key, value))
}

fn unescape(chars: &[char], line: usize) -> Result<String, ParseFailure> {
    let mut out = String::with_capacity(chars.len());
    let mut units: Vec<u16> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            flush_units(&mut units, &mut out);
            out.push(c);
            continue;
        }
        let Some(&escaped) = chars.get(i) else {
            break;
        };
        i += 1;
        if escaped == 'u' {
            let hex: String = chars.iter().skip(i).take(4).collect();
            let unit = (hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()))
                .then(|| u16::from_str_radix(&hex, 16).ok())
                .flatten()
                .ok_or_else(|| ParseFailure {
                    line,
                    message: format!("malformed \\uxxxx encoding: \\u{hex}"),
                })?;
            units.push(unit);
            i += 4;
            continue;
        }
        flush_units(&mut units, &mut out);
        out.push(match escaped {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\u{000C}',
            other => other,
        });
    }
    flush_units(&mut units, &mut out);
    Ok(out)
}

/// Decodes pending `\uXXXX` code units, pairing surrogates where possible.
fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(content: &str) -> Vec<(String, String)> {
        parse_properties(content).unwrap()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_separators() {
        let pairs = parse("a=1\nb:2\nc 3\nd = 4\ne\t:\t5\nf\n");
        assert_eq!(
            pairs,
            vec![
                pair("a", "1"),
                pair("b", "2"),
                pair("c", "3"),
                pair("d", "4"),
                pair("e", "5"),
                pair("f", ""),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let pairs = parse("# comment\n  ! also a comment\n\n   \nkey=value\n");
        assert_eq!(pairs, vec![pair("key", "value")]);
    }

    #[test]
    fn test_value_keeps_inline_hash() {
        let pairs = parse("url=http://host/#anchor\n");
        assert_eq!(pairs, vec![pair("url", "http://host/#anchor")]);
    }

    #[test]
    fn test_line_continuation() {
        let pairs = parse("sonar.modules=mod-a,\\\n    mod-b,\\\n    mod-c\nnext=1\n");
        assert_eq!(
            pairs,
            vec![pair("sonar.modules", "mod-a,mod-b,mod-c"), pair("next", "1")]
        );
    }

    #[test]
    fn test_continuation_line_starting_with_hash_is_not_a_comment() {
        let pairs = parse("a=x\\\n#y\n");
        assert_eq!(pairs, vec![pair("a", "x#y")]);
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let pairs = parse("path=C:\\\\\nnext=1\n");
        assert_eq!(pairs, vec![pair("path", "C:\\"), pair("next", "1")]);
    }

    #[test]
    fn test_continuation_at_eof() {
        let pairs = parse("a=1\\");
        assert_eq!(pairs, vec![pair("a", "1")]);
    }

    #[test]
    fn test_blank_continuation_ends_logical_line() {
        let pairs = parse("a=1\\\n\nb=2\n");
        assert_eq!(pairs, vec![pair("a", "1"), pair("b", "2")]);
    }

    #[test]
    fn test_escapes() {
        let pairs = parse("tab=a\\tb\nkey\\ with\\=sep=v\\:x\nuni=caf\\u00e9\nplain=\\q\n");
        assert_eq!(
            pairs,
            vec![
                pair("tab", "a\tb"),
                pair("key with=sep", "v:x"),
                pair("uni", "café"),
                pair("plain", "q"),
            ]
        );
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let pairs = parse("emoji=\\ud83d\\ude00\n");
        assert_eq!(pairs, vec![pair("emoji", "\u{1F600}")]);
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = parse_properties("ok=1\nbad=\\u12g4\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("malformed"));
    }

    #[test]
    fn test_line_endings() {
        let pairs = parse("a=1\r\nb=2\rc=3");
        assert_eq!(pairs, vec![pair("a", "1"), pair("b", "2"), pair("c", "3")]);
    }

    #[test]
    fn test_trailing_whitespace_is_kept_by_parser() {
        let pairs = parse("a=value   \n");
        assert_eq!(pairs, vec![pair("a", "value   ")]);
    }

    proptest! {
        #[test]
        fn parser_never_panics(content in "\\PC*") {
            let _ = parse_properties(&content);
        }

        #[test]
        fn simple_pairs_survive(key in "[a-zA-Z][a-zA-Z0-9._-]{0,20}", value in "[a-zA-Z0-9/._ -]{0,20}") {
            let pairs = parse_properties(&format!("{key}={value}\n")).unwrap();
            prop_assert_eq!(pairs, vec![(key, value.trim_start().to_string())]);
        }
    }
}
