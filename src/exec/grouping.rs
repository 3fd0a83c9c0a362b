use indexmap::IndexMap;

use crate::catalog::field::FieldRef;
use crate::exec::operator::Row;
use crate::exec::sort::value_or_default;
use crate::exec::value_cmp::compare_keys;
use crate::types::value::Value;

pub(crate) type Groups = IndexMap<Vec<Value>, Vec<Row>>;

pub(crate) fn key_of(row: &Row, keys: &[FieldRef]) -> Vec<Value> {
    keys.iter()
        .map(|f| row.get(&f.key()).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Groups rows on the actual values of `keys`, in key order.
///
/// Ordering treats NULL as the field's default, but the group key keeps the
/// NULL, so a NULL group and a default-valued group stay distinct. With
/// `one_row_per_key` only the first row of each group survives.
pub(crate) fn group_rows(mut rows: Vec<Row>, keys: &[FieldRef], one_row_per_key: bool) -> Groups {
    rows.sort_by_cached_key(|row| SortKey(keys.iter().map(|f| value_or_default(row, f)).collect()));

    let mut groups = Groups::new();
    for row in rows {
        let group = groups.entry(key_of(&row, keys)).or_default();
        if !(one_row_per_key && !group.is_empty()) {
            group.push(row);
        }
    }
    groups
}

/// Adapts [`compare_keys`] to `Ord` for cached-key sorting.
struct SortKey(Vec<Value>);

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        compare_keys(&self.0, &other.0)
    }
}
