//! Filter evaluation and ordering for in-memory documents.
//!
//! This module evaluates [`Filter`] values against stored documents, computes text relevance
//! scores, and orders documents the way the store orders mixed BSON values.

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use std::{cmp::Ordering, collections::HashMap};

use docrepo_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, FilterVisitor},
};

use crate::error::MemoryStoreError;

/// Type-erased, comparable representation of BSON values.
///
/// Integers stay exact; doubles compare against them by value. Types without a natural order
/// are kept as their BSON value and only compare for equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    MinKey,
    Null,
    Int(i64),
    Double(f64),
    Decimal([u8; 16]),
    String(&'a str),
    Map(HashMap<&'a str, Comparable<'a>>),
    Array(Vec<Comparable<'a>>),
    Binary(u8, &'a [u8]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Timestamp(u32, u32),
    Other(&'a Bson),
    MaxKey,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::MinKey => Comparable::MinKey,
            Bson::MaxKey => Comparable::MaxKey,
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::Decimal128(value) => Comparable::Decimal(value.bytes()),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::Timestamp(value) => Comparable::Timestamp(value.time, value.increment),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) | Bson::Symbol(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Binary(u8::from(binary.subtype), &binary.bytes),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            other => Comparable::Other(other),
        }
    }
}

/// Exact comparison of an integer with a double; `None` if the double is NaN.
fn cmp_int_double(int: i64, double: f64) -> Option<Ordering> {
    // 2^63, the first double past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return None;
    }
    if double >= LIMIT {
        return Some(Ordering::Less);
    }
    if double < -LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = double.trunc();

    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(double - whole)),
        ordering => Some(ordering),
    }
}

/// Total order on doubles with NaN below every other number.
fn sort_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl<'a> Comparable<'a> {
    /// Position of this value's type in the store's cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::MinKey => 0,
            Comparable::Null => 1,
            Comparable::Int(_) | Comparable::Double(_) => 2,
            Comparable::Decimal(_) => 3,
            Comparable::String(_) => 4,
            Comparable::Map(_) => 5,
            Comparable::Array(_) => 6,
            Comparable::Binary(..) => 7,
            Comparable::ObjectId(_) => 8,
            Comparable::Bool(_) => 9,
            Comparable::DateTime(_) => 10,
            Comparable::Timestamp(..) => 11,
            Comparable::Other(_) => 12,
            Comparable::MaxKey => 13,
        }
    }

    /// Total order used for sorting; values of different types order by type.
    ///
    /// Values of the same type without a natural order sort as equal.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Double(a), Comparable::Double(b)) => sort_doubles(*a, *b),
            (Comparable::Int(a), Comparable::Double(b)) => {
                cmp_int_double(*a, *b).unwrap_or(Ordering::Greater)
            }
            (Comparable::Double(a), Comparable::Int(b)) => cmp_int_double(*b, *a)
                .map(Ordering::reverse)
                .unwrap_or(Ordering::Less),
            _ => self
                .partial_cmp(other)
                .unwrap_or_else(|| self.rank().cmp(&other.rank())),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::MinKey, Comparable::MinKey) => true,
            (Comparable::MaxKey, Comparable::MaxKey) => true,
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Comparable::Int(a), Comparable::Double(b)) | (Comparable::Double(b), Comparable::Int(a)) => {
                cmp_int_double(*a, *b) == Some(Ordering::Equal)
            }
            (Comparable::Decimal(a), Comparable::Decimal(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::Timestamp(a, x), Comparable::Timestamp(b, y)) => (a, x) == (b, y),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Binary(s, a), Comparable::Binary(t, b)) => s == t && a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::MinKey, Comparable::MinKey) => Some(Ordering::Equal),
            (Comparable::MaxKey, Comparable::MaxKey) => Some(Ordering::Equal),
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => cmp_int_double(*a, *b),
            (Comparable::Double(a), Comparable::Int(b)) => cmp_int_double(*b, *a).map(Ordering::reverse),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::Timestamp(a, x), Comparable::Timestamp(b, y)) => (a, x).partial_cmp(&(b, y)),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Binary(s, a), Comparable::Binary(t, b)) => {
                (a.len(), s, a).partial_cmp(&(b.len(), t, b))
            }
            _ => None,
        }
    }
}

/// Lowercased alphanumeric words of `text`.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Relevance of `document` for `term` over the text-indexed `keys`.
///
/// Counts the words of the indexed string fields that occur in the search term.
pub(crate) fn text_score(document: &Document, keys: &[String], term: &str) -> f64 {
    let wanted = tokenize(term).collect::<Vec<_>>();

    keys.iter()
        .filter_map(|key| document.get_str(key).ok())
        .flat_map(tokenize)
        .filter(|word| wanted.contains(word))
        .count() as f64
}

/// Evaluates a filter against a single document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
    text_keys: &'a [String],
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document, text_keys: &'a [String]) -> Self {
        Self { document, text_keys }
    }

    pub fn evaluate(&mut self, filter: &Filter) -> DocumentStoreResult<bool> {
        self.visit_filter(filter)
    }
}

impl<'a> FilterVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_all(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(true)
    }

    fn visit_eq(&mut self, key: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let expected = Comparable::from(value);

        Ok(match self.document.get(key) {
            Some(field_value) => match Comparable::from(field_value) {
                Comparable::Array(items) if !matches!(expected, Comparable::Array(_)) => {
                    items.iter().any(|item| item == &expected)
                }
                actual => actual == expected,
            },
            None => matches!(expected, Comparable::Null),
        })
    }

    fn visit_range(&mut self, key: &str, start: &Bson, end: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(key) else {
            return Ok(false);
        };
        let actual = Comparable::from(field_value);

        Ok(
            matches!(
                actual.partial_cmp(&Comparable::from(start)),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                actual.partial_cmp(&Comparable::from(end)),
                Some(Ordering::Less | Ordering::Equal)
            )
        )
    }

    fn visit_text(&mut self, term: &str) -> Result<Self::Output, Self::Error> {
        if self.text_keys.is_empty() {
            return Err(DocumentStoreError::backend(MemoryStoreError::TextIndexRequired));
        }

        Ok(text_score(self.document, self.text_keys, term) > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn matches(document: &Document, filter: &Filter) -> bool {
        DocumentEvaluator::new(document, &[]).evaluate(filter).unwrap()
    }

    #[test]
    fn equality_matches_scalars_and_array_members() {
        let document = doc! { "name": "test1", "seq": 1_i64, "tags": ["a", "b"] };

        assert!(matches(&document, &Filter::eq("name", "test1")));
        assert!(matches(&document, &Filter::eq("seq", 1_i32)));
        assert!(matches(&document, &Filter::eq("tags", "b")));
        assert!(!matches(&document, &Filter::eq("name", "test2")));
        assert!(!matches(&document, &Filter::eq("missing", "x")));
        assert!(matches(&document, &Filter::eq("missing", Bson::Null)));
    }

    #[test]
    fn range_includes_both_bounds() {
        let start = DateTime::from_millis(1_000);
        let end = DateTime::from_millis(3_000);
        let filter = Filter::range("at", start, end);

        for (millis, expected) in [(999, false), (1_000, true), (2_000, true), (3_000, true), (3_001, false)] {
            let document = doc! { "at": DateTime::from_millis(millis) };
            assert_eq!(matches(&document, &filter), expected, "at {millis}");
        }
    }

    #[test]
    fn range_does_not_cross_types() {
        let filter = Filter::range("at", DateTime::from_millis(0), DateTime::from_millis(10));

        assert!(!matches(&doc! { "at": 5 }, &filter));
        assert!(!matches(&doc! {}, &filter));
    }

    #[test]
    fn text_requires_an_index() {
        let document = doc! { "data": "findme please" };
        let result = DocumentEvaluator::new(&document, &[]).evaluate(&Filter::text("findme"));

        assert!(result.is_err());
    }

    #[test]
    fn text_scores_count_matching_words() {
        let keys = vec!["data".to_string()];
        let document = doc! { "data": "Test that test thing" };

        assert_eq!(text_score(&document, &keys, "test"), 2.0);
        assert_eq!(text_score(&document, &keys, "thing other"), 1.0);
        assert_eq!(text_score(&document, &keys, "findme"), 0.0);
        assert!(DocumentEvaluator::new(&document, &keys).evaluate(&Filter::text("THING")).unwrap());
    }

    #[test]
    fn integers_compare_exactly() {
        let big = 9_007_199_254_740_992_i64;
        let document = doc! { "seq": big, "ratio": 2.5 };

        assert!(!matches(&document, &Filter::eq("seq", big + 1)));
        assert!(matches(&document, &Filter::eq("seq", big)));
        assert!(matches(&document, &Filter::range("ratio", 2_i32, 3_i64)));
        assert!(!matches(&document, &Filter::range("ratio", 3_i32, 4_i32)));
        assert!(matches(&doc! { "n": 3.0 }, &Filter::eq("n", 3_i64)));
    }

    #[test]
    fn binary_and_decimal_values_are_distinct() {
        use bson::{Binary, Decimal128, spec::BinarySubtype};

        let uuid = |byte: u8| Bson::Binary(Binary { subtype: BinarySubtype::Uuid, bytes: vec![byte; 16] });
        let document = doc! { "id": uuid(1), "amount": Decimal128::from_bytes([1; 16]) };

        assert!(matches(&document, &Filter::eq("id", uuid(1))));
        assert!(!matches(&document, &Filter::eq("id", uuid(2))));
        assert!(!matches(&document, &Filter::eq("id", Bson::Null)));
        assert!(matches(&document, &Filter::eq("amount", Decimal128::from_bytes([1; 16]))));
        assert!(!matches(&document, &Filter::eq("amount", Decimal128::from_bytes([2; 16]))));
    }

    #[test]
    fn nan_sorts_below_numbers() {
        let nan = Bson::Double(f64::NAN);
        let one = Bson::Int32(1);
        let half = Bson::Double(0.5);

        assert_eq!(Comparable::from(&nan).sort_cmp(&Comparable::from(&one)), Ordering::Less);
        assert_eq!(Comparable::from(&half).sort_cmp(&Comparable::from(&nan)), Ordering::Greater);
        assert_eq!(Comparable::from(&nan).sort_cmp(&Comparable::from(&nan)), Ordering::Equal);
        assert_eq!(Comparable::from(&half).sort_cmp(&Comparable::from(&one)), Ordering::Less);
    }

    #[test]
    fn sort_orders_mixed_types_by_type() {
        let null = Bson::Null;
        let number = Bson::Int32(4);
        let string = Bson::String("a".into());

        assert_eq!(Comparable::from(&null).sort_cmp(&Comparable::from(&number)), Ordering::Less);
        assert_eq!(Comparable::from(&string).sort_cmp(&Comparable::from(&number)), Ordering::Greater);
    }
}
