//! Filter shapes shared by the relational loaders and mutations.

use linkgraph_storage::{Clause, Condition, DisjunctiveFilter, Field, RecordId};

/// Connections with either endpoint in `ids`.
pub(crate) fn either_endpoint(ids: impl IntoIterator<Item = RecordId> + Clone) -> DisjunctiveFilter {
    DisjunctiveFilter::new()
        .or(Condition::in_set(Field::User1Id, ids.clone()))
        .or(Condition::in_set(Field::User2Id, ids))
}

/// Records linking `a` and `b` through the two columns, in either orientation.
pub(crate) fn pair_both_orientations(
    filter: DisjunctiveFilter,
    from: Field,
    to: Field,
    a: RecordId,
    b: RecordId,
) -> DisjunctiveFilter {
    filter
        .or(Clause::from(Condition::Eq(from, a)).and(Condition::Eq(to, b)))
        .or(Clause::from(Condition::Eq(from, b)).and(Condition::Eq(to, a)))
}
