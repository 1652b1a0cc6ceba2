//! Delimiter-counting code formatter.
//!
//! Emitted code arrives as template fragments with arbitrary leading
//! whitespace; this pass strips it, re-indents by counting the language's
//! open/close delimiters (ignoring everything behind the comment marker),
//! and inserts a blank line above configured section markers.

/// Re-indent `code` using the `(open, close)` delimiter pair, ignoring
/// delimiters behind `comment_marker`, and adding a blank line above any
/// line starting with one of `blank_line_above`.
#[must_use]
pub fn format_code(
    code: &str,
    blank_line_above: &[&str],
    delimiters: (char, char),
    comment_marker: &str,
) -> String {
    let (open, close) = delimiters;

    let delimiter_balance = |line: &str| -> i32 {
        let effective = match line.find(comment_marker) {
            Some(position) => &line[..position],
            None => line,
        };
        let opens = effective.matches(open).count() as i32;
        let closes = effective.matches(close).count() as i32;
        opens - closes
    };

    let mut formatted = Vec::new();
    let mut indent: i32 = 0;

    for line in code.lines() {
        let stripped = line.trim_start();
        if stripped.is_empty() {
            continue;
        }

        let starts_with_close = stripped.starts_with(close);
        if starts_with_close {
            indent -= 1;
        }

        let levels = usize::try_from(indent.max(0)).unwrap_or(0);
        let mut indented = "\t".repeat(levels);
        indented.push_str(stripped);
        let indented = indented.trim_end().to_string();

        if blank_line_above
            .iter()
            .any(|prefix| stripped.starts_with(prefix))
        {
            formatted.push(String::new());
        }
        formatted.push(indented);

        indent += delimiter_balance(stripped);
        if starts_with_close {
            indent += 1;
        }
    }

    formatted.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_drive_indentation() {
        let raw = "void main() {\nint x = 0;\nif (x == 1) {\nx++;\n}\n}\n";
        let formatted = format_code(raw, &[], ('{', '}'), "//");
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines[1], "\tint x = 0;");
        assert_eq!(lines[3], "\t\tx++;");
        assert_eq!(lines[4], "\t}");
        assert_eq!(lines[5], "}");
    }

    #[test]
    fn comments_do_not_affect_balance() {
        let raw = "(module ;; ) stray close in comment\n(func)\n)\n";
        let formatted = format_code(raw, &[], ('(', ')'), ";;");
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines[1], "\t(func)");
        assert_eq!(lines[2], ")");
    }

    #[test]
    fn blank_lines_inserted_above_markers() {
        let raw = "layout(std430) buffer b { uint d[]; };\nvoid main() {\n}\n";
        let formatted = format_code(raw, &["void main()"], ('{', '}'), "//");
        assert!(formatted.contains("\n\nvoid main()"));
    }

    #[test]
    fn empty_lines_are_dropped() {
        let raw = "a\n\n\n\nb\n";
        let formatted = format_code(raw, &[], ('{', '}'), "//");
        assert_eq!(formatted, "a\nb");
    }
}
