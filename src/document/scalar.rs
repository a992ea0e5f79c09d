//! Plain-scalar tag resolution and plain-safety checks.
//!
//! Resolution follows the YAML 1.2 core schema: `null`/`~`/empty are null,
//! `true`/`false` in their three spellings are booleans, decimal, octal (`0o`)
//! and hex (`0x`) digits are integers, and decimal/exponent forms plus
//! `.inf`/`.nan` are floats. Everything else is a string.

/// Returns the implicit tag of a plain (unquoted) scalar.
pub fn resolve_plain(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return "!!null",
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return "!!bool",
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF"
        | ".nan" | ".NaN" | ".NAN" => return "!!float",
        _ => {}
    }

    if is_int(value) {
        "!!int"
    } else if is_float(value) {
        "!!float"
    } else {
        "!!str"
    }
}

fn is_int(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(oct) = value.strip_prefix("0o") {
        return !oct.is_empty() && oct.chars().all(|c| ('0'..='7').contains(&c));
    }
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_float(value: &str) -> bool {
    let body = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            (!int.is_empty() || !frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];
const FLOW_INDICATORS: &[char] = &[',', '[', ']', '{', '}'];

/// Returns true if `value` can be written as a plain scalar and read back unchanged.
///
/// `flow` tightens the rules for values inside `[...]` or `{...}`.
pub fn is_plain_safe(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };

    if value.starts_with([' ', '\t']) || value.ends_with([' ', '\t']) {
        return false;
    }
    if value.chars().any(|c| c.is_control()) {
        return false;
    }
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    if INDICATORS.contains(&first) {
        // `-foo`, `?foo` and `:foo` are fine; a lone indicator or one followed by a space is not.
        let allowed = matches!(first, '-' | '?' | ':')
            && value[1..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace() && !(flow && FLOW_INDICATORS.contains(&c)));
        if !allowed {
            return false;
        }
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    if flow && value.contains(FLOW_INDICATORS) {
        return false;
    }

    true
}
