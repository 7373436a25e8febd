//! Matching live wizard nodes against saved records.
//!
//! A live node is looked up among its saved siblings by title. When more than
//! one saved sibling carries that title (wizards do repeat captions), the
//! ordinal recorded at capture time picks between them. If no ordinal
//! matches, the first same-titled record wins as a best effort and a warning
//! is logged, since the saved choices applied may then be the wrong ones.

/// A saved record that can be matched against a live node.
///
/// Implemented by every level of the save tree so a single matching
/// algorithm serves steps, groups and choices alike.
pub trait SavedNode {
    /// Human readable name of the level, used in log messages.
    const KIND: &'static str;

    fn title(&self) -> &str;
    fn ordinal(&self) -> i64;
}

/// How a lookup arrived at its result.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// No saved record has the title.
    Missing,
    /// Exactly one saved record has the title.
    Unique(&'a T),
    /// Several records share the title and the ordinal picked one.
    Disambiguated(&'a T),
    /// Several records share the title and none has the wanted ordinal, so
    /// the first of them was taken.
    Ambiguous(&'a T),
}

impl<'a, T> Lookup<'a, T> {
    pub fn record(self) -> Option<&'a T> {
        match self {
            Lookup::Missing => None,
            Lookup::Unique(record) | Lookup::Disambiguated(record) | Lookup::Ambiguous(record) => {
                Some(record)
            }
        }
    }
}

impl<T> Clone for Lookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Lookup<'_, T> {}

/// Finds the saved record matching a live node, reporting how it was chosen.
pub fn lookup_saved<'a, T: SavedNode>(
    records: &'a [T],
    title: &str,
    wanted_ordinal: i64,
) -> Lookup<'a, T> {
    let candidates: Vec<&T> = records
        .iter()
        .filter(|record| record.title() == title)
        .collect();

    match candidates.as_slice() {
        [] => Lookup::Missing,
        [only] => Lookup::Unique(*only),
        [first, ..] => {
            log::debug!(
                "Found {} {}s titled '{}', disambiguating with ordinal {}",
                candidates.len(),
                T::KIND,
                title,
                wanted_ordinal
            );

            match candidates
                .iter()
                .copied()
                .find(|record| record.ordinal() == wanted_ordinal)
            {
                Some(record) => Lookup::Disambiguated(record),
                None => Lookup::Ambiguous(*first),
            }
        }
    }
}

/// Finds the saved record matching a live node.
///
/// Unresolvable duplicates log a warning and fall back to the first
/// candidate; they never fail.
pub fn find_saved<'a, T: SavedNode>(
    records: &'a [T],
    title: &str,
    wanted_ordinal: i64,
) -> Option<&'a T> {
    let lookup = lookup_saved(records, title, wanted_ordinal);

    if let Lookup::Ambiguous(_) = lookup {
        log::warn!(
            "There are multiple {kind}s titled '{title}' and none has ordinal {wanted_ordinal}, \
             choices for this {kind} may be restored incorrectly",
            kind = T::KIND,
        );
    }

    lookup.record()
}
