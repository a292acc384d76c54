//! Disjunctive record filters.
//!
//! A [`DisjunctiveFilter`] is an OR of [`Clause`]s, each clause an AND of
//! equality or set-membership [`Condition`]s on identifier columns. This is
//! the only query shape the batching layer needs: "either endpoint is in S",
//! "(sender = a AND receiver = b) OR (sender = b AND receiver = a)", and so on.

use std::collections::BTreeSet;

use crate::records::{Field, RecordId, StoredRecord};

/// A single predicate on an identifier column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Column equals the given id.
    Eq(Field, RecordId),
    /// Column is one of the given ids.
    In(Field, BTreeSet<RecordId>),
}

impl Condition {
    /// Builds a set-membership condition from any id iterator.
    pub fn in_set(field: Field, ids: impl IntoIterator<Item = RecordId>) -> Self {
        Condition::In(field, ids.into_iter().collect())
    }

    /// Evaluates the condition. A column the record does not have never matches.
    pub fn matches(&self, record: &StoredRecord) -> bool {
        match self {
            Condition::Eq(field, id) => record.field(*field) == Some(*id),
            Condition::In(field, ids) => record
                .field(*field)
                .map_or(false, |value| ids.contains(&value)),
        }
    }
}

/// Conjunction of conditions. An empty clause matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub conditions: Vec<Condition>,
}

impl Clause {
    /// Adds another condition to the conjunction.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

impl From<Condition> for Clause {
    fn from(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

/// Disjunction of clauses. An empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisjunctiveFilter {
    pub clauses: Vec<Clause>,
}

impl DisjunctiveFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alternative clause.
    pub fn or(mut self, clause: impl Into<Clause>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.clauses.iter().any(|c| c.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Connection, Record, User};

    fn edge(id: RecordId, a: RecordId, b: RecordId) -> StoredRecord {
        Connection {
            id,
            user1_id: a,
            user2_id: b,
        }
        .into_stored()
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = DisjunctiveFilter::new();
        assert!(filter.is_empty());
        assert!(!filter.matches(&edge(1, 1, 2)));
    }

    #[test]
    fn test_empty_clause_matches_everything() {
        assert!(Clause::default().matches(&edge(1, 1, 2)));
    }

    #[test]
    fn test_either_endpoint_filter() {
        let filter = DisjunctiveFilter::new()
            .or(Condition::in_set(Field::User1Id, [1, 5]))
            .or(Condition::in_set(Field::User2Id, [1, 5]));

        assert!(filter.matches(&edge(1, 1, 2)));
        assert!(filter.matches(&edge(2, 3, 5)));
        assert!(!filter.matches(&edge(3, 2, 3)));
    }

    #[test]
    fn test_conjunction_requires_all_conditions() {
        let clause = Clause::from(Condition::Eq(Field::User1Id, 1))
            .and(Condition::Eq(Field::User2Id, 2));

        assert!(clause.matches(&edge(1, 1, 2)));
        assert!(!clause.matches(&edge(2, 2, 1)));
    }

    #[test]
    fn test_missing_column_never_matches() {
        let user = User {
            id: 1,
            first_name: "Alice".to_string(),
            last_name: "Johnson".to_string(),
            email: "alice@example.com".to_string(),
        }
        .into_stored();

        assert!(!Condition::Eq(Field::AuthorId, 1).matches(&user));
        assert!(Condition::Eq(Field::Id, 1).matches(&user));
    }
}
