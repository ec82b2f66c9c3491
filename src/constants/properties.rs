//! Flat `key=value` properties codec.
//!
//! Reads the usual properties dialect (comments, `=`/`:`/whitespace
//! separators, continuation lines, backslash escapes). Writes one sorted
//! entry per line with no timestamp header, escaping just enough that the
//! output reloads to the same entries.

/// Parse a properties document. Later duplicates win when collected.
pub(super) fn parse(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        entries.push(split_entry(&logical));
    }

    entries
}

/// Render sorted entries, one per line.
pub(super) fn render<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();

    let mut key_end = 0;
    let mut escaped = false;
    while key_end < chars.len() {
        let c = chars[key_end];
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            break;
        }
        key_end += 1;
    }

    let mut value_start = key_end;
    while value_start < chars.len() && is_blank(chars[value_start]) {
        value_start += 1;
    }
    if value_start < chars.len() && matches!(chars[value_start], '=' | ':') {
        value_start += 1;
        while value_start < chars.len() && is_blank(chars[value_start]) {
            value_start += 1;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start..].iter().collect();
    (unescape(&key), unescape(&value))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separators() {
        let entries = parse("a=1\nb: 2\nc 3\nd   =   4\n");
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
                ("d".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let entries = parse("# header\n\n   ! bang comment\nkey=value\n");
        assert_eq!(entries, vec![("key".to_string(), "value".to_string())]);
    }

    #[test]
    fn test_parse_continuation_lines() {
        let entries = parse("list=one, \\\n      two, \\\n      three\n");
        assert_eq!(entries[0].1, "one, two, three");
    }

    #[test]
    fn test_parse_value_keeps_later_separators() {
        let entries = parse("url=http://host:8080/a=b\n");
        assert_eq!(entries[0].0, "url");
        assert_eq!(entries[0].1, "http://host:8080/a=b");
    }

    #[test]
    fn test_parse_unicode_escape() {
        let entries = parse("greeting=caf\\u00e9\n");
        assert_eq!(entries[0].1, "café");
    }

    #[test]
    fn test_parse_empty_value() {
        let entries = parse("empty=\nbare\n");
        assert_eq!(entries[0], ("empty".to_string(), String::new()));
        assert_eq!(entries[1], ("bare".to_string(), String::new()));
    }

    #[test]
    fn test_render_escapes_keys() {
        let out = render([("a key=x", "v")].into_iter());
        assert_eq!(out, "a\\ key\\=x=v\n");
        assert_eq!(parse(&out)[0].0, "a key=x");
    }

    #[test]
    fn test_render_escapes_value_control_chars() {
        let out = render([("k", " two\nlines\\")].into_iter());
        assert_eq!(out, "k=\\ two\\nlines\\\\\n");
        assert_eq!(parse(&out)[0].1, " two\nlines\\");
    }
}
