//! Text clean-up applied to every candidate span before parsing.

/// Prepares a candidate JSON span for parsing.
///
/// Control characters are dropped, except line breaks and tabs. Raw line
/// breaks and tabs inside string literals are escaped so that a value
/// spanning several lines still parses. Structure outside strings is left
/// alone.
pub fn normalize_record_text(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut in_string = false;
    let mut escape_next = false;

    for c in candidate.chars() {
        if in_string {
            if escape_next {
                escape_next = false;
                // The backslash is already written; finish it as a valid escape.
                match c {
                    '\n' => out.push('n'),
                    '\r' => out.push('r'),
                    '\t' => out.push('t'),
                    c if c.is_control() => out.push_str("u0020"),
                    c => out.push(c),
                }
                continue;
            }
            match c {
                '\\' => {
                    escape_next = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' | '\r' | '\t' => out.push_str(escaped_control(c)),
                c if c.is_control() => {}
                c => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                '\n' | '\r' | '\t' => out.push(c),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
    }

    out
}

fn escaped_control(c: char) -> &'static str {
    match c {
        '\n' => "\\n",
        '\r' => "\\r",
        '\t' => "\\t",
        _ => "",
    }
}
