//! Natural ordering of device names
//!
//! A name splits into a base (the leading run of non-digit characters)
//! and the rest. Names compare by:
//!
//! 1. base, ascending byte order (an all-numeric name has an empty base
//!    and therefore sorts first),
//! 2. names whose rest is a plain decimal number before names whose rest
//!    is empty or contains anything else,
//! 3. numeric value of the rest, when both are numbers,
//! 4. the full name, ascending byte order.
//!
//! Every step compares a component of a fixed key, so the result is a
//! total order: `/dev/ttyS2 < /dev/ttyS10 < /dev/ttyUSB0`.

use std::cmp::Ordering;

use crate::entry::Entry;

struct NameKey<'a> {
    base: &'a str,
    digits: Option<&'a str>,
    full: &'a str,
}

impl<'a> NameKey<'a> {
    fn new(name: &'a str) -> Self {
        let split = name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(name.len());
        let (base, rest) = name.split_at(split);
        let digits = (!rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            .then(|| rest.trim_start_matches('0'));
        Self {
            base,
            digits,
            full: name,
        }
    }
}

/// Compare digit strings without leading zeros by numeric value
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Total natural order over device names
pub fn compare_device_names(a: &str, b: &str) -> Ordering {
    let (ka, kb) = (NameKey::new(a), NameKey::new(b));
    ka.base
        .cmp(kb.base)
        .then_with(|| match (ka.digits, kb.digits) {
            (Some(da), Some(db)) => cmp_numeric(da, db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| ka.full.cmp(kb.full))
}

/// Sort entries by device file
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| compare_device_names(&a.device_file, &b.device_file));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| compare_device_names(a, b));
        v
    }

    #[test]
    fn test_numeric_suffix_order() {
        assert_eq!(
            sorted(&["/dev/ttyUSB10", "/dev/ttyUSB2", "/dev/ttyUSB0"]),
            vec!["/dev/ttyUSB0", "/dev/ttyUSB2", "/dev/ttyUSB10"]
        );
    }

    #[test]
    fn test_base_is_primary_key() {
        assert_eq!(
            sorted(&["/dev/ttyUSB0", "/dev/ttyS10", "/dev/ttyACM3", "/dev/ttyS2"]),
            vec!["/dev/ttyACM3", "/dev/ttyS2", "/dev/ttyS10", "/dev/ttyUSB0"]
        );
    }

    #[test]
    fn test_all_numeric_names_sort_first_by_value() {
        assert_eq!(
            sorted(&["/dev/ttyS0", "69", "42", "100"]),
            vec!["42", "69", "100", "/dev/ttyS0"]
        );
    }

    #[test]
    fn test_non_numeric_rest_after_numbered_siblings() {
        assert_eq!(
            sorted(&["/dev/ttyX1z", "/dev/ttyX", "/dev/ttyX10", "/dev/ttyX9"]),
            vec!["/dev/ttyX9", "/dev/ttyX10", "/dev/ttyX", "/dev/ttyX1z"]
        );
    }

    #[test]
    fn test_leading_zeros_tie_break_on_full_name() {
        assert_eq!(compare_device_names("tty01", "tty1"), Ordering::Less);
        assert_eq!(compare_device_names("tty1", "tty1"), Ordering::Equal);
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let big = "/dev/ttyS999999999999999999999999999999999999999";
        assert_eq!(compare_device_names("/dev/ttyS9", big), Ordering::Less);
    }

    fn device_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "/dev/tty(S|USB|ACM|AMA)[0-9]{1,3}",
            "[0-9]{1,4}",
            "/dev/tty[A-Z]{0,2}[0-9a-z]{0,3}",
        ]
    }

    proptest! {
        #[test]
        fn order_is_transitive(a in device_name(), b in device_name(), c in device_name()) {
            let mut v = vec![a, b, c];
            v.sort_by(|x, y| compare_device_names(x, y));
            prop_assert!(compare_device_names(&v[0], &v[1]) != Ordering::Greater);
            prop_assert!(compare_device_names(&v[1], &v[2]) != Ordering::Greater);
            prop_assert!(compare_device_names(&v[0], &v[2]) != Ordering::Greater);
        }

        #[test]
        fn order_is_antisymmetric(a in device_name(), b in device_name()) {
            let ab = compare_device_names(&a, &b);
            prop_assert_eq!(ab, compare_device_names(&b, &a).reverse());
            prop_assert_eq!(ab == Ordering::Equal, a == b);
        }

        #[test]
        fn sorting_is_idempotent(names in prop::collection::vec(device_name(), 0..20)) {
            let mut once = names.clone();
            once.sort_by(|x, y| compare_device_names(x, y));
            let mut twice = once.clone();
            twice.sort_by(|x, y| compare_device_names(x, y));
            prop_assert_eq!(once, twice);
        }
    }
}
