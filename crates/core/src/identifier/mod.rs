//! Anime identifier normalization.
//!
//! trace.moe reports the AniList id of each match as a JSON number that may
//! arrive as an integer or a float (`12345` or `12345.0`), and occasionally as
//! a string, `null` or not at all. Everything downstream works with a plain
//! [`CanonicalId`]; the ambiguity ends here.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::searcher::SearchMatch;

/// Normalized AniList media id, used as the dedup/lookup key for titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(pub i64);

impl CanonicalId {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CanonicalId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of a match as decoded from the backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "Option<i64>")]
pub enum AnimeId {
    Numeric(CanonicalId),
    #[default]
    Unparseable,
}

impl AnimeId {
    pub fn canonical(self) -> Option<CanonicalId> {
        match self {
            AnimeId::Numeric(id) => Some(id),
            AnimeId::Unparseable => None,
        }
    }
}

impl From<AnimeId> for Option<i64> {
    fn from(id: AnimeId) -> Self {
        id.canonical().map(CanonicalId::value)
    }
}

impl From<&Value> for AnimeId {
    fn from(raw: &Value) -> Self {
        match normalize(raw) {
            Some(id) => AnimeId::Numeric(id),
            None => AnimeId::Unparseable,
        }
    }
}

impl<'de> Deserialize<'de> for AnimeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accept any JSON shape; only numbers survive normalization.
        let raw = Value::deserialize(deserializer)?;
        Ok(AnimeId::from(&raw))
    }
}

/// Normalize an untyped identifier value.
///
/// Integers that fit in `i64` are taken as-is. Finite floats inside the `i64`
/// range are truncated toward zero. Anything else yields `None`.
pub fn normalize(raw: &Value) -> Option<CanonicalId> {
    let number = match raw {
        Value::Number(n) => n,
        _ => return None,
    };

    if let Some(i) = number.as_i64() {
        return Some(CanonicalId(i));
    }
    if number.is_u64() {
        // u64 beyond i64::MAX
        return None;
    }

    let f = number.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(CanonicalId(f.trunc() as i64))
    } else {
        None
    }
}

/// Distinct canonical ids referenced by a set of matches.
///
/// Matches without a usable identifier are skipped.
pub fn distinct_ids<'a, I>(matches: I) -> BTreeSet<CanonicalId>
where
    I: IntoIterator<Item = &'a SearchMatch>,
{
    matches
        .into_iter()
        .filter_map(|m| m.identifier.canonical())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_integer() {
        assert_eq!(normalize(&json!(12345)), Some(CanonicalId(12345)));
        assert_eq!(normalize(&json!(-7)), Some(CanonicalId(-7)));
        assert_eq!(normalize(&json!(0)), Some(CanonicalId(0)));
    }

    #[test]
    fn test_normalize_float_with_zero_fraction() {
        assert_eq!(normalize(&json!(12345.0)), Some(CanonicalId(12345)));
        assert_eq!(normalize(&json!(1e3)), Some(CanonicalId(1000)));
    }

    #[test]
    fn test_normalize_float_truncates() {
        assert_eq!(normalize(&json!(21.9)), Some(CanonicalId(21)));
        assert_eq!(normalize(&json!(-3.5)), Some(CanonicalId(-3)));
    }

    #[test]
    fn test_normalize_non_numeric_is_absent() {
        assert_eq!(normalize(&json!("12345")), None);
        assert_eq!(normalize(&Value::Null), None);
        assert_eq!(normalize(&json!(true)), None);
        assert_eq!(normalize(&json!([1])), None);
        assert_eq!(normalize(&json!({ "id": 1 })), None);
    }

    #[test]
    fn test_normalize_out_of_range_is_absent() {
        assert_eq!(normalize(&json!(u64::MAX)), None);
        assert_eq!(normalize(&json!(1e300)), None);
        assert_eq!(normalize(&json!(-1e300)), None);
    }

    #[test]
    fn test_normalize_i64_bounds() {
        assert_eq!(normalize(&json!(i64::MAX)), Some(CanonicalId(i64::MAX)));
        assert_eq!(normalize(&json!(i64::MIN)), Some(CanonicalId(i64::MIN)));
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default)]
        anilist: AnimeId,
    }

    #[test]
    fn test_anime_id_deserialize_shapes() {
        let int: Holder = serde_json::from_str(r#"{"anilist": 21}"#).unwrap();
        assert_eq!(int.anilist, AnimeId::Numeric(CanonicalId(21)));

        let float: Holder = serde_json::from_str(r#"{"anilist": 21.0}"#).unwrap();
        assert_eq!(float.anilist, AnimeId::Numeric(CanonicalId(21)));

        let string: Holder = serde_json::from_str(r#"{"anilist": "21"}"#).unwrap();
        assert_eq!(string.anilist, AnimeId::Unparseable);

        let null: Holder = serde_json::from_str(r#"{"anilist": null}"#).unwrap();
        assert_eq!(null.anilist, AnimeId::Unparseable);

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.anilist, AnimeId::Unparseable);
    }

    #[test]
    fn test_anime_id_serializes_as_optional_number() {
        assert_eq!(
            serde_json::to_value(AnimeId::Numeric(CanonicalId(5))).unwrap(),
            json!(5)
        );
        assert_eq!(
            serde_json::to_value(AnimeId::Unparseable).unwrap(),
            Value::Null
        );
    }
}
