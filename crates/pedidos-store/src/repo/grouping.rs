//! Row grouping for one-to-many join results
//!
//! A `LEFT JOIN` of parents to children yields one row per child, with the
//! parent columns repeated, and one row with null child columns for a parent
//! that has no children. [`group_rows_by`] folds such rows back into parents
//! carrying their children, in the order parent keys first appear.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Collapse joined rows into parents with nested children
///
/// - `get_key` extracts the parent key from a row.
/// - `create_parent` builds the parent the first time its key is seen; later
///   rows with the same key never touch the parent's own fields.
/// - `create_child` builds the child for a row, or `None` when the join found
///   no child (outer-join null).
/// - `attach_child` adds a child to its parent.
///
/// A parent whose rows carry no child is still returned, with whatever
/// `create_parent` gave it (typically an empty collection).
pub fn group_rows_by<R, K, P, C, I, FK, FP, FC, FA>(
    rows: I,
    mut get_key: FK,
    mut create_parent: FP,
    mut create_child: FC,
    mut attach_child: FA,
) -> Vec<P>
where
    I: IntoIterator<Item = R>,
    K: Hash + Eq,
    FK: FnMut(&R) -> K,
    FP: FnMut(&R) -> P,
    FC: FnMut(&R) -> Option<C>,
    FA: FnMut(&mut P, C),
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut parents: Vec<P> = Vec::new();

    for row in rows {
        let slot = match slots.entry(get_key(&row)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                parents.push(create_parent(&row));
                *entry.insert(parents.len() - 1)
            }
        };

        if let Some(child) = create_child(&row) {
            attach_child(&mut parents[slot], child);
        }
    }

    parents
}

/// The four grouping operations as one reusable shape
pub trait RowGrouping<R> {
    type Key: Hash + Eq;
    type Parent;
    type Child;

    fn key(&self, row: &R) -> Self::Key;

    fn parent(&self, row: &R) -> Self::Parent;

    /// `None` for a row with no child (outer-join null)
    fn child(&self, row: &R) -> Option<Self::Child>;

    fn attach(&self, parent: &mut Self::Parent, child: Self::Child);
}

/// [`group_rows_by`] driven by a [`RowGrouping`]
pub fn group_rows<R, G>(rows: impl IntoIterator<Item = R>, grouping: &G) -> Vec<G::Parent>
where
    G: RowGrouping<R>,
{
    group_rows_by(
        rows,
        |row| grouping.key(row),
        |row| grouping.parent(row),
        |row| grouping.child(row),
        |parent, child| grouping.attach(parent, child),
    )
}
