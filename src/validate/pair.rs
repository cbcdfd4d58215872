//! Key/value pairs and the runtime type capability used for near-miss diagnostics

use std::fmt;

use crate::common::{Error, Result};

/// Reports the runtime type of a key or value
///
/// Statically typed keys get their Rust type name from the default method.
/// Dynamically typed values (see [`super::Value`]) override it with the
/// name of the variant they hold, which is what makes a "mismatch in value
/// class" diagnostic possible.
pub trait TypeTag {
    fn type_tag(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

macro_rules! impl_type_tag {
    ($($ty:ty),* $(,)?) => {
        $(impl TypeTag for $ty {})*
    };
}

impl_type_tag!(
    String, &str, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    Vec<u8>,
);

/// An immutable key/value tuple compared and hashed as a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair<K, V> {
    key: K,
    value: V,
}

impl<K, V> Pair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Pair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Pair<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.key, self.value)
    }
}

/// Split `"key\tvalue"` on the first tab
pub fn parse_tabbed_pair(line: &str) -> Result<Pair<String, String>> {
    let (key, value) = line
        .split_once('\t')
        .ok_or_else(|| Error::InvalidPair(line.to_string()))?;
    Ok(Pair::new(key.to_string(), value.to_string()))
}

/// Split `"a, b,c"` into trimmed items
///
/// A trailing comma does not produce an empty final item; an empty input
/// yields an empty list.
pub fn parse_comma_delimited_list(list: &str) -> Vec<String> {
    let mut items: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
    if list.is_empty() || list.ends_with(',') {
        items.pop();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pairs_compare_as_a_unit() {
        let a = Pair::new("k1".to_string(), 1i64);
        let b = Pair::new("k1".to_string(), 1i64);
        let c = Pair::new("k1".to_string(), 2i64);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        let pair = Pair::new("hello", 3);
        assert_eq!(pair.to_string(), "(hello, 3)");
    }

    #[test]
    fn test_static_type_tags() {
        assert!(String::new().type_tag().ends_with("String"));
        assert_eq!(5i64.type_tag(), "i64");
        assert_ne!(5i32.type_tag(), 5i64.type_tag());
    }

    #[test]
    fn test_parse_tabbed_pair() {
        let pair = parse_tabbed_pair("key\tvalue\twith tab").unwrap();
        assert_eq!(pair.key(), "key");
        assert_eq!(pair.value(), "value\twith tab");

        let empty = parse_tabbed_pair("\t").unwrap();
        assert_eq!(empty.key(), "");
        assert_eq!(empty.value(), "");
    }

    #[test]
    fn test_parse_tabbed_pair_requires_tab() {
        let err = parse_tabbed_pair("no separator").unwrap_err();
        assert!(matches!(err, Error::InvalidPair(_)));
    }

    #[test]
    fn test_parse_comma_delimited_list() {
        assert_eq!(parse_comma_delimited_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_comma_delimited_list("single"), vec!["single"]);
        assert_eq!(parse_comma_delimited_list("a,,b"), vec!["a", "", "b"]);
        assert_eq!(parse_comma_delimited_list("a,b,"), vec!["a", "b"]);
        assert!(parse_comma_delimited_list("").is_empty());
    }
}
