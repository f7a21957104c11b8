//! Small string helpers

/// Property name for an attribute: each `-` followed by a non-digit is
/// dropped and the following character upper-cased (`foo-bar` → `fooBar`)
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && !next.is_ascii_digit() => {
                out.extend(next.to_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
