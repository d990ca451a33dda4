/*! Merge of records sharing a natural key.

Records are grouped by key in order of first occurrence. The first record of a key seeds the
group, later ones are folded into it with a combine function, in input order.
Records without a key are set aside, not dropped.
!*/
use std::hash::Hash;

use indexmap::IndexMap;

use crate::record::Conversation;

/// Separator put between answers of merged conversations.
pub const DEFAULT_SEPARATOR: &str = "\n\n---\nAlternative interpretation:\n\n";

#[derive(Debug, Clone, PartialEq)]
pub struct Merged<K, R> {
    pub key: K,
    pub record: R,
    /// number of input records folded into this one
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<K, R> {
    /// one record per key, in order of first occurrence
    pub merged: Vec<Merged<K, R>>,
    /// records `key_fn` could not extract a key from, in input order
    pub unkeyed: Vec<R>,
}

impl<K, R> MergeOutcome<K, R> {
    /// Merged records, then unkeyed ones.
    pub fn into_records(self) -> Vec<R> {
        self.merged
            .into_iter()
            .map(|m| m.record)
            .chain(self.unkeyed)
            .collect()
    }

    /// number of keys that had more than one record
    pub fn nb_collisions(&self) -> usize {
        self.merged.iter().filter(|m| m.count > 1).count()
    }
}

/// Group `records` by `key_fn`, folding repeated keys with `combine_fn(existing, new)`.
pub fn merge<R, K, KF, CF>(
    records: impl IntoIterator<Item = R>,
    key_fn: KF,
    mut combine_fn: CF,
) -> MergeOutcome<K, R>
where
    K: Hash + Eq,
    KF: Fn(&R) -> Option<K>,
    CF: FnMut(&mut R, R),
{
    let mut groups: IndexMap<K, (R, usize)> = IndexMap::new();
    let mut unkeyed = Vec::new();

    for record in records {
        match key_fn(&record) {
            None => unkeyed.push(record),
            Some(key) => match groups.get_mut(&key) {
                Some((existing, count)) => {
                    combine_fn(existing, record);
                    *count += 1;
                }
                None => {
                    groups.insert(key, (record, 1));
                }
            },
        }
    }

    MergeOutcome {
        merged: groups
            .into_iter()
            .map(|(key, (record, count))| Merged { key, record, count })
            .collect(),
        unkeyed,
    }
}

/// Combine function appending the answer of the new conversation to the existing one.
pub fn concat_answers(separator: &str) -> impl FnMut(&mut Conversation, Conversation) + '_ {
    move |existing, new| {
        if let (Some(answer), Some(new_answer)) = (existing.answer_mut(), new.answer()) {
            answer.push_str(separator);
            answer.push_str(new_answer);
        }
    }
}
