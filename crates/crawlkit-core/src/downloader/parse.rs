//! Parse raw header lines collected by curl into name/value pairs.

/// Parse header lines from a transfer. With redirects curl reports one header
/// block per hop; only the last block (after the last status line) is kept.
pub(crate) fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut headers = Vec::new();
    for line in &lines[start..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_name_value_pairs() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Type: text/html; charset=utf-8",
            "Content-Length: 12",
            "",
        ]));
        assert_eq!(
            h,
            vec![
                ("Content-Type".to_string(), "text/html; charset=utf-8".to_string()),
                ("Content-Length".to_string(), "12".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_only_last_block_after_redirect() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: /next",
            "",
            "HTTP/1.1 200 OK",
            "Set-Cookie: a=1",
            "",
        ]));
        assert_eq!(h, vec![("Set-Cookie".to_string(), "a=1".to_string())]);
    }

    #[test]
    fn value_may_contain_colons() {
        let h = parse_header_lines(&lines(&["HTTP/1.1 200 OK", "Location: http://h:8080/x"]));
        assert_eq!(h[0].1, "http://h:8080/x");
    }
}
