//! `\uXXXX` escapes in display text.

/// Replace every well-formed `\uXXXX` escape with its character. Malformed
/// sequences (too few hex digits, surrogate code points) are kept verbatim.
pub(crate) fn resolve_unicode_escapes(text: &str) -> String {
    if !text.contains("\\u") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("\\u") {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 2..];
        match after.get(..4).and_then(decode_hex4) {
            Some(c) => {
                out.push(c);
                rest = &after[4..];
            }
            None => {
                out.push_str("\\u");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_hex4(digits: &str) -> Option<char> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_escapes() {
        assert_eq!(resolve_unicode_escapes("4.7 k\\u03A9"), "4.7 kΩ");
        assert_eq!(resolve_unicode_escapes("\\u00B5F"), "µF");
    }

    #[test]
    fn keeps_malformed_escapes() {
        assert_eq!(resolve_unicode_escapes("\\u12"), "\\u12");
        assert_eq!(resolve_unicode_escapes("\\uZZZZ!"), "\\uZZZZ!");
        assert_eq!(resolve_unicode_escapes("\\uD800"), "\\uD800");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(resolve_unicode_escapes("R1"), "R1");
    }
}
