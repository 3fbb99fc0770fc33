//! Tuple comparison against a search key, and binary search within a single
//! page. Per §4.3: fewer search fields than the record (with an equal
//! prefix) means the search key is LESS; ties on the key fields fall
//! through to the recid sentinel comparison.

use crate::datum::{Datum, KeySchema};
use crate::errors::BTreeResult;
use crate::layout::{internal_child_page_number, record_payload};
use crate::record_id::{RecIdBound, RecordId};
use page::page::Page;
use std::cmp::Ordering;

/// A key being searched for: a (possibly partial) tuple of field values,
/// plus the recid sentinel used to bias ties during descent.
pub struct SearchKey<'a> {
    /// Field values, in schema order. May be a strict prefix of a full key.
    pub values: &'a [Datum],
    /// Recid sentinel / tie-break.
    pub recid: RecIdBound,
}

/// Compares two key-value tuples field by field; a shorter tuple with an
/// equal prefix is `Less`.
pub(crate) fn compare_key_values<K: KeySchema>(schema: &K, a: &[Datum], b: &[Datum]) -> Ordering {
    for i in 0..a.len().min(b.len()) {
        let c = schema.compare_field(i, &a[i], &b[i]);
        if c != Ordering::Equal {
            return c;
        }
    }
    a.len().cmp(&b.len())
}

/// Whether `a` and `b` are the same length and equal in every field.
pub(crate) fn keys_equal<K: KeySchema>(schema: &K, a: &[Datum], b: &[Datum]) -> bool {
    a.len() == b.len() && compare_key_values(schema, a, b) == Ordering::Equal
}

/// Orders `search` against a record's decoded key values and recid: `search
/// <=> record`.
pub(crate) fn compare_search_key<K: KeySchema>(
    schema: &K,
    search: &SearchKey<'_>,
    record_values: &[Datum],
    record_recid: RecordId,
) -> Ordering {
    let key_cmp = compare_key_values(schema, search.values, record_values);
    if key_cmp != Ordering::Equal {
        return key_cmp;
    }
    search.recid.compare_to(record_recid)
}

/// Finds the largest slot id `sid` such that the record at `sid` compares
/// `<= search` (i.e. `search`'s comparison to it is not `Less`). Returns
/// `None` on a leaf page if `search` is less than even the first record
/// (the "search key not yet reached" sentinel). On an internal page the
/// first record has no key and is treated as `-infinity`, so this never
/// returns `None` for an internal page with at least one record.
pub(crate) fn binary_search_on_page<K: KeySchema>(
    page: &Page,
    is_leaf: bool,
    schema: &K,
    search: &SearchKey<'_>,
) -> BTreeResult<Option<u32>> {
    let max_sid = page.max_slot_id()?;
    if max_sid == 0 {
        return Ok(None);
    }

    let mut lo = 1u32;
    let mut hi = max_sid;
    let mut result: Option<u32> = None;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let cmp = if !is_leaf && mid == 1 {
            // The first record of an internal page carries no key and is
            // defined to compare as -infinity: always <= any search key.
            Ordering::Greater
        } else {
            let rec = page.get_record(mid)?;
            let values = schema.disassemble_payload(record_payload(rec, is_leaf));
            let recid = crate::layout::record_heap_recid(rec, is_leaf);
            compare_search_key(schema, search, &values, recid)
        };

        if cmp != Ordering::Less {
            result = Some(mid);
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    Ok(result)
}

/// Follows `internal_child_page_number` off the record at `sid` of an
/// internal page.
pub(crate) fn child_page_number(page: &Page, sid: u32) -> BTreeResult<u32> {
    Ok(internal_child_page_number(page.get_record(sid)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BTREE_HEADER_SIZE, build_leaf_record};
    use page::page_id::PageId;

    struct IntSchema;

    impl KeySchema for IntSchema {
        fn num_fields(&self) -> usize {
            1
        }

        fn write_payload(&self, values: &[Datum], out: &mut Vec<u8>) {
            let Datum::Int(v) = values[0] else { panic!("expected Int") };
            out.extend_from_slice(&v.to_le_bytes());
        }

        fn disassemble_payload(&self, bytes: &[u8]) -> Vec<Datum> {
            vec![Datum::Int(i64::from_le_bytes(bytes.try_into().unwrap()))]
        }

        fn compare_field(&self, _index: usize, a: &Datum, b: &Datum) -> Ordering {
            let (Datum::Int(a), Datum::Int(b)) = (a, b) else {
                panic!("expected Int")
            };
            a.cmp(b)
        }
    }

    #[test]
    fn compare_key_values_treats_shorter_equal_prefix_as_less() {
        let schema = IntSchema;
        let full = vec![Datum::Int(5), Datum::Int(1)];
        let prefix = vec![Datum::Int(5)];
        assert_eq!(compare_key_values(&schema, &prefix, &full), Ordering::Less);
        assert_eq!(compare_key_values(&schema, &full, &prefix), Ordering::Greater);
    }

    #[test]
    fn keys_equal_requires_same_length() {
        let schema = IntSchema;
        assert!(keys_equal(&schema, &[Datum::Int(1)], &[Datum::Int(1)]));
        assert!(!keys_equal(&schema, &[Datum::Int(1)], &[Datum::Int(1), Datum::Int(2)]));
    }

    fn leaf_page_with(keys: &[i64]) -> Page {
        let mut page = Page::new_zeroed(PageId::new(1, 1));
        page.initialize_page(BTREE_HEADER_SIZE).unwrap();
        for (i, &k) in keys.iter().enumerate() {
            let mut payload = Vec::new();
            IntSchema.write_payload(&[Datum::Int(k)], &mut payload);
            let rec = build_leaf_record(&payload, RecordId::new(1, 1, i as u32 + 1));
            page.insert_record(&rec).unwrap();
        }
        page
    }

    #[test]
    fn binary_search_finds_largest_slot_not_greater_than_search() {
        let schema = IntSchema;
        let page = leaf_page_with(&[10, 20, 30, 40]);
        let search = SearchKey {
            values: &[Datum::Int(25)],
            recid: RecIdBound::PlusInfinity,
        };
        let sid = binary_search_on_page(&page, true, &schema, &search).unwrap();
        assert_eq!(sid, Some(2));
    }

    #[test]
    fn binary_search_returns_none_when_search_precedes_every_record() {
        let schema = IntSchema;
        let page = leaf_page_with(&[10, 20, 30]);
        let search = SearchKey {
            values: &[Datum::Int(5)],
            recid: RecIdBound::PlusInfinity,
        };
        assert_eq!(binary_search_on_page(&page, true, &schema, &search).unwrap(), None);
    }

    #[test]
    fn binary_search_on_empty_page_returns_none() {
        let schema = IntSchema;
        let mut page = Page::new_zeroed(PageId::new(1, 1));
        page.initialize_page(BTREE_HEADER_SIZE).unwrap();
        let search = SearchKey {
            values: &[Datum::Int(5)],
            recid: RecIdBound::PlusInfinity,
        };
        assert_eq!(binary_search_on_page(&page, true, &schema, &search).unwrap(), None);
    }
}
