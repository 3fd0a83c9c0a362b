use std::collections::HashSet;
use std::fmt;

use crate::catalog::field::{ColumnKey, FieldRef};
use crate::debugger::{Component, DebugLevel};
use crate::{db_debug, db_scope};
use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::exec::grouping::{group_rows, Groups};
use crate::exec::operator::{Operator, Row};
use crate::types::coercion::{cast, coalesce_types};
use crate::types::value::{Kind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Outer,
    Right,
}

impl JoinType {
    pub fn name(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Outer => "outer",
            JoinType::Right => "right",
        }
    }

    pub fn by_name(name: &str) -> QueryResult<JoinType> {
        [JoinType::Inner, JoinType::Left, JoinType::Outer, JoinType::Right]
            .into_iter()
            .find(|how| how.name() == name)
            .ok_or_else(|| QueryError::unknown(IdentifierKind::JoinType, name))
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many rows per key value each side may contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinRelationship {
    ManyToMany,
    ManyToOne,
    OneToMany,
    OneToOne,
    #[default]
    Unenforced,
}

impl JoinRelationship {
    pub const ALL: [JoinRelationship; 5] = [
        JoinRelationship::ManyToMany,
        JoinRelationship::ManyToOne,
        JoinRelationship::OneToMany,
        JoinRelationship::OneToOne,
        JoinRelationship::Unenforced,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JoinRelationship::ManyToMany => "many-to-many",
            JoinRelationship::ManyToOne => "many-to-one",
            JoinRelationship::OneToMany => "one-to-many",
            JoinRelationship::OneToOne => "one-to-one",
            JoinRelationship::Unenforced => "unenforced",
        }
    }

    pub fn by_name(name: &str) -> QueryResult<JoinRelationship> {
        JoinRelationship::ALL
            .into_iter()
            .find(|rel| rel.name() == name)
            .ok_or_else(|| QueryError::unknown(IdentifierKind::JoinRelationship, name))
    }

    /// (left keeps one row per key, right keeps one row per key)
    pub fn one_row_per_key(&self) -> (bool, bool) {
        match self {
            JoinRelationship::OneToOne => (true, true),
            JoinRelationship::OneToMany => (true, false),
            JoinRelationship::ManyToOne => (false, true),
            JoinRelationship::ManyToMany | JoinRelationship::Unenforced => (false, false),
        }
    }

    /// The same constraint seen from the other side.
    pub fn flipped(&self) -> JoinRelationship {
        match self {
            JoinRelationship::OneToMany => JoinRelationship::ManyToOne,
            JoinRelationship::ManyToOne => JoinRelationship::OneToMany,
            other => *other,
        }
    }
}

impl fmt::Display for JoinRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds join keys are compared in.
///
/// `None` where both sides already share a kind; otherwise the coalesced
/// kind both key values are cast to before matching.
pub fn join_key_types(
    left_on: &[FieldRef],
    right_on: &[FieldRef],
) -> QueryResult<Vec<Option<Kind>>> {
    if left_on.len() != right_on.len() {
        return Err(QueryError::schema(format!(
            "the left side of the join has {} fields to join on but the right side has {}",
            left_on.len(),
            right_on.len()
        )));
    }

    left_on
        .iter()
        .zip(right_on)
        .map(|(l, r)| {
            let (lk, rk) = (l.data_type.kind(), r.data_type.kind());
            if lk == rk {
                return Ok(None);
            }
            coalesce_types(&[lk, rk]).map(Some)
        })
        .collect()
}

/// One side of a join: its operator, key fields and full column list.
pub struct JoinInput {
    pub op: Box<dyn Operator>,
    pub keys: Vec<FieldRef>,
    pub columns: Vec<ColumnKey>,
}

impl JoinInput {
    pub fn new(op: Box<dyn Operator>, keys: Vec<FieldRef>, columns: Vec<ColumnKey>) -> Self {
        Self { op, keys, columns }
    }

    fn drain(&mut self) -> QueryResult<Vec<Row>> {
        self.op.open()?;
        let mut rows = Vec::new();
        while let Some(row) = self.op.next()? {
            rows.push(row);
        }
        Ok(rows)
    }

    fn null_row(&self) -> Row {
        self.columns.iter().map(|k| (k.clone(), Value::Null)).collect()
    }
}

/// Sort-and-group equi-join with cardinality enforcement.
///
/// Both inputs are materialised on open. A right join is run as a left join
/// with the inputs swapped.
pub struct JoinExec {
    left: JoinInput,
    right: JoinInput,
    how: JoinType,
    relationship: JoinRelationship,
    key_types: Vec<Option<Kind>>,
    out: Vec<Row>,
    idx: usize,
}

impl JoinExec {
    pub fn new(
        left: JoinInput,
        right: JoinInput,
        how: JoinType,
        relationship: JoinRelationship,
        key_types: Vec<Option<Kind>>,
    ) -> Self {
        let (left, right, how, relationship) = match how {
            JoinType::Right => (right, left, JoinType::Left, relationship.flipped()),
            other => (left, right, other, relationship),
        };
        Self {
            left,
            right,
            how,
            relationship,
            key_types,
            out: Vec::new(),
            idx: 0,
        }
    }

    fn normalise(&self, groups: Groups, one_row_per_key: bool) -> Groups {
        if self.key_types.iter().all(Option::is_none) {
            return groups;
        }

        let mut out = Groups::new();
        for (key, rows) in groups {
            let key = key
                .iter()
                .zip(&self.key_types)
                // a value that cannot be cast keeps its own kind and matches nothing
                .map(|(v, kind)| match kind {
                    Some(kind) => cast(v, *kind).unwrap_or_else(|| v.clone()),
                    None => v.clone(),
                })
                .collect();
            let group = out.entry(key).or_default();
            if one_row_per_key && !group.is_empty() {
                continue;
            }
            group.extend(rows);
            if one_row_per_key {
                group.truncate(1);
            }
        }
        out
    }
}

fn merge(left: &Row, right: &Row) -> Row {
    let mut out = left.clone();
    for (k, v) in right {
        out.insert(k.clone(), v.clone());
    }
    out
}

impl Operator for JoinExec {
    fn open(&mut self) -> QueryResult<()> {
        self.out.clear();
        self.idx = 0;

        let left_rows = self.left.drain()?;
        let right_rows = self.right.drain()?;
        let (left_one, right_one) = self.relationship.one_row_per_key();

        let (left_groups, right_groups) =
            db_scope!(DebugLevel::Trace, Component::Join, "group join inputs", {
                (
                    self.normalise(group_rows(left_rows, &self.left.keys, left_one), left_one),
                    self.normalise(group_rows(right_rows, &self.right.keys, right_one), right_one),
                )
            });

        let keep_unmatched_left = matches!(self.how, JoinType::Left | JoinType::Outer);
        let mut matched = HashSet::new();

        for (key, left_group) in &left_groups {
            match right_groups.get(key) {
                Some(right_group) => {
                    for l in left_group {
                        for r in right_group {
                            self.out.push(merge(l, r));
                        }
                    }
                    matched.insert(key);
                }
                None if keep_unmatched_left => {
                    let empty = self.right.null_row();
                    self.out.extend(left_group.iter().map(|l| merge(l, &empty)));
                }
                None => {}
            }
        }

        if self.how == JoinType::Outer {
            let empty = self.left.null_row();
            for (key, right_group) in &right_groups {
                if !matched.contains(key) {
                    self.out.extend(right_group.iter().map(|r| merge(&empty, r)));
                }
            }
        }

        db_debug!(
            Component::Join,
            "{} {} join: {} left groups, {} right groups, {} rows",
            self.how,
            self.relationship,
            left_groups.len(),
            right_groups.len(),
            self.out.len()
        );
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if self.idx >= self.out.len() {
            return Ok(None);
        }
        let row = std::mem::take(&mut self.out[self.idx]);
        self.idx += 1;
        Ok(Some(row))
    }

    fn close(&mut self) {
        self.out.clear();
        self.left.op.close();
        self.right.op.close();
    }
}
