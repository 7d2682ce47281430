/* Identifier case conversions shared by the backends */

/// `S7Message` -> `s7_message`, `COTPPacket` -> `cotp_packet`, `read-write` -> `read_write`.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        let prev_upper = i > 0 && chars[i - 1].is_uppercase();
        let upper = c.is_uppercase();
        if i > 0 && !prev_upper && upper {
            out.push('_');
            out.extend(c.to_lowercase());
        } else if i + 2 < chars.len() && upper && !chars[i + 1].is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else if prev_upper && upper {
            out.extend(c.to_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.extend(c.to_lowercase());
        }
    }
    match out.strip_prefix('_') {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Double-quoted literal with backslashes and quotes escaped.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
