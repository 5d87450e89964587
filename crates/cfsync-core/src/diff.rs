//! Three-way set difference over sorted key sequences.

use serde::Serialize;

/// Classification of source and target keys.
///
/// `removed` holds keys present only in source, i.e. missing from target and
/// therefore candidates for copying. `added` holds keys present only in
/// target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult<K> {
    pub common: Vec<K>,
    pub added: Vec<K>,
    pub removed: Vec<K>,
}

impl<K> DiffResult<K> {
    /// Returns `true` when both sides hold the same keys.
    pub fn is_identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare `source` against `target`.
///
/// Both inputs are sorted before a single merge pass, so caller order never
/// affects the result. Equal keys are matched occurrence by occurrence: two
/// copies in source against one in target yield one common key and one
/// removed key.
pub fn diff<K: Ord + Clone>(source: &[K], target: &[K]) -> DiffResult<K> {
    let mut source = source.to_vec();
    let mut target = target.to_vec();
    source.sort();
    target.sort();

    let mut result = DiffResult {
        common: Vec::new(),
        added: Vec::new(),
        removed: Vec::new(),
    };

    let mut left = source.into_iter().peekable();
    let mut right = target.into_iter().peekable();

    loop {
        match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => match l.cmp(r) {
                std::cmp::Ordering::Less => result.removed.extend(left.next()),
                std::cmp::Ordering::Greater => result.added.extend(right.next()),
                std::cmp::Ordering::Equal => {
                    result.common.extend(left.next());
                    right.next();
                }
            },
            (Some(_), None) => {
                result.removed.extend(left);
                break;
            }
            (None, Some(_)) => {
                result.added.extend(right);
                break;
            }
            (None, None) => break,
        }
    }

    result
}
