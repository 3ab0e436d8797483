//! Addon toolkit version ordering
//!
//! A version is a `.`-separated list of parts. Each part reads as
//! `num_a str_b num_c extra_d`: a number, a non-numeric string, a number,
//! and whatever remains. Parts are compared field by field and a missing
//! part counts as `0`, so `1.0 == 1.0.0`.
//!
//! - `*` as a whole part is greater than any number
//! - `+` in the string position means `num_a + 1` with string `pre`
//!   (`1.0+ == 1.1pre`)
//! - an empty string sorts after a non-empty one (`1.0pre1 < 1.0`)
//!
//! Parsing never fails. Block ranges are checked against whatever versions
//! the catalog holds, and numbers too large for a part saturate.

use std::cmp::Ordering;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct VersionPart {
    num_a: i32,
    str_b: String,
    num_c: i32,
    extra_d: String,
}

impl VersionPart {
    fn parse(part: &str) -> Self {
        let mut parsed = VersionPart::default();
        if part == "*" {
            parsed.num_a = i32::MAX;
            return parsed;
        }

        let (num_a, rest) = split_number(part);
        parsed.num_a = num_a;
        if rest.starts_with('+') {
            parsed.num_a = parsed.num_a.saturating_add(1);
            parsed.str_b = "pre".to_string();
            return parsed;
        }

        let str_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '+' || c == '-')
            .unwrap_or(rest.len());
        parsed.str_b = rest[..str_end].to_string();

        let (num_c, extra) = split_number(&rest[str_end..]);
        parsed.num_c = num_c;
        parsed.extra_d = extra.to_string();
        parsed
    }
}

/// Leading decimal digits, saturating at `i32::MAX`
fn split_number(input: &str) -> (i32, &str) {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let value = input[..end].bytes().fold(0i32, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i32::from(digit - b'0'))
    });
    (value, &input[end..])
}

/// Empty sorts after non-empty, otherwise byte order
fn cmp_suffix(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(b),
    }
}

impl Ord for VersionPart {
    fn cmp(&self, other: &Self) -> Ordering {
        self.num_a
            .cmp(&other.num_a)
            .then_with(|| cmp_suffix(&self.str_b, &other.str_b))
            .then_with(|| self.num_c.cmp(&other.num_c))
            .then_with(|| cmp_suffix(&self.extra_d, &other.extra_d))
    }
}

impl PartialOrd for VersionPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parsed addon version
#[derive(Clone, Debug)]
pub struct AddonVersion {
    parts: Vec<VersionPart>,
}

impl AddonVersion {
    pub fn parse(version: &str) -> Self {
        AddonVersion {
            parts: version.split('.').map(VersionPart::parse).collect(),
        }
    }
}

impl Ord for AddonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = VersionPart::default();
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| {
                let a = self.parts.get(i).unwrap_or(&zero);
                let b = other.parts.get(i).unwrap_or(&zero);
                a.cmp(b)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for AddonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AddonVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AddonVersion {}

/// Compare two version strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    AddonVersion::parse(a).cmp(&AddonVersion::parse(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> AddonVersion {
        AddonVersion::parse(s)
    }

    #[test]
    fn test_documented_ordering_chain() {
        assert!(v("1.0pre1") < v("1.0pre2"));
        assert!(v("1.0pre2") < v("1.0"));
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1.0.0"), v("1.0.0.0"));
        assert!(v("1.0.0.0") < v("1.1pre"));
        assert_eq!(v("1.1pre"), v("1.1pre0"));
        assert_eq!(v("1.1pre0"), v("1.0+"));
        assert!(v("1.0+") < v("1.1pre1a"));
        assert!(v("1.1pre1a") < v("1.1pre1"));
        assert!(v("1.1pre1") < v("1.1pre10a"));
        assert!(v("1.1pre10a") < v("1.1pre10"));
    }

    #[test]
    fn test_star_is_maximum() {
        assert!(v("999999.999") < v("*"));
        assert!(v("1.*") > v("1.99999"));
        assert_eq!(compare_versions("*", "*"), Ordering::Equal);
    }

    #[test]
    fn test_empty_and_zero_are_equal() {
        assert_eq!(v(""), v("0"));
        assert_eq!(v("0"), v("0.0"));
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("2") > v("1.99"));
    }

    #[test]
    fn test_dash_suffix_goes_to_extra() {
        // `1-beta`: no string part, so it only loses to plain `1` on extra_d
        assert!(v("1-beta") < v("1"));
        assert!(v("1-beta") > v("0.9"));
    }

    #[test]
    fn test_oversized_numbers_saturate() {
        assert_eq!(v("99999999999999999999"), v("2147483647"));
        assert!(v("99999999999999999999") < v("*.1"));
    }
}
