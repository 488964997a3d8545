//! Field name normalization between naming conventions.
//!
//! Canonical form is lowercase snake_case: `successorTrustees`,
//! `Successor Trustees` and `successor-trustees` all become
//! `successor_trustees`. Both directions are total; any input is valid.

/// Convert any field name to its canonical snake_case key.
///
/// Word boundaries are:
/// - any run of non-alphanumeric characters (apostrophes are dropped
///   without splitting, so `Grantor's` reads as one word),
/// - a lowercase letter or digit followed by an uppercase letter,
/// - the last capital of an acronym followed by a lowercase letter
///   (`URLValue` -> `url_value`),
/// - a letter followed by a digit (`address2` -> `address_2`).
pub fn to_canonical(name: &str) -> String {
    let chars: Vec<char> = name
        .chars()
        .filter(|c| *c != '\'')
        .collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut boundary = false;

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            boundary = true;
            continue;
        }

        if i > 0 {
            let prev = chars[i - 1];
            if c.is_uppercase() {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_numeric()
                    || (prev.is_uppercase() && next_is_lower)
                {
                    boundary = true;
                }
            } else if c.is_numeric() && prev.is_alphabetic() {
                boundary = true;
            }
        }

        if boundary && !out.is_empty() {
            out.push('_');
        }
        boundary = false;
        out.extend(c.to_lowercase());
    }

    out
}

/// Convert a canonical key back to a camelCase display name.
///
/// Each separator is removed and the following letter capitalized
/// (`successor_trustees` -> `successorTrustees`). The separator is kept
/// wherever dropping it would lose the word boundary for `to_canonical`:
/// between two digits, before a letter that follows neither a lowercase
/// letter nor a digit, and before a letter with no single-character
/// uppercase form (`名_前`, `x_ß`).
pub fn to_display(canonical: &str) -> String {
    let mut out = String::with_capacity(canonical.len());
    let mut after_separator = false;

    for c in canonical.chars() {
        if !c.is_alphanumeric() {
            after_separator = true;
            continue;
        }
        match out.chars().next_back() {
            Some(prev) if after_separator => {
                let joined = if c.is_numeric() {
                    prev.is_alphabetic().then_some(c)
                } else if prev.is_lowercase() || prev.is_numeric() {
                    reversible_upper(c)
                } else {
                    None
                };
                match joined {
                    Some(j) => out.push(j),
                    None => {
                        out.push('_');
                        out.push(c);
                    }
                }
            }
            _ => out.push(c),
        }
        after_separator = false;
    }

    out
}

/// The uppercase form of `c` if it is one character that lowercases back
/// to `c`.
fn reversible_upper(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None)
            if u != c && u.is_uppercase() && u.to_lowercase().eq(std::iter::once(c)) =>
        {
            Some(u)
        }
        _ => None,
    }
}

/// Words of a canonical key.
pub fn words(canonical: &str) -> impl Iterator<Item = &str> {
    canonical.split('_').filter(|w| !w.is_empty())
}
