use crate::name::Name;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProdVoteEntry {
    pub producer: Name,
    pub value: i64,
}
ledgerdb_codec::codec_struct!(ProdVoteEntry { producer: Name, value: i64 });

/// One producer's current vote for a named chain configuration field, as
/// accumulated by repeated `prodvote` actions. Votes are replaced, not
/// appended: a later `prodvote` from the same producer for the same key
/// overwrites its previous entry.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProdVoteRecord {
    pub key: String,
    pub votes: Vec<ProdVoteEntry>,
}
ledgerdb_codec::codec_struct!(ProdVoteRecord { key: String, votes: Vec<ProdVoteEntry> });

impl ProdVoteRecord {
    pub fn new(key: &str) -> Self {
        ProdVoteRecord { key: key.to_owned(), votes: Vec::new() }
    }

    /// Casts or replaces `producer`'s vote, returning the previous value
    /// if one existed.
    pub fn cast(&mut self, producer: Name, value: i64) -> Option<i64> {
        if let Some(entry) = self.votes.iter_mut().find(|e| e.producer == producer) {
            Some(std::mem::replace(&mut entry.value, value))
        } else {
            self.votes.push(ProdVoteEntry { producer, value });
            None
        }
    }

    /// The median of all cast votes, rounded down for an even count, or
    /// `None` if nobody has voted yet.
    pub fn median(&self) -> Option<i64> {
        if self.votes.is_empty() {
            return None;
        }
        let mut values: Vec<i64> = self.votes.iter().map(|e| e.value).collect();
        values.sort_unstable();
        let mid = values.len() / 2;
        Some(if values.len() % 2 == 1 { values[mid] } else { (values[mid - 1] + values[mid]) / 2 })
    }
}

/// The currently active block producer schedule, replaced wholesale by
/// `updsched`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Schedule {
    pub producers: Vec<Name>,
}
ledgerdb_codec::codec_struct!(Schedule { producers: Vec<Name> });

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn median_of_odd_count() {
        let mut r = ProdVoteRecord::new("max_recursion_depth");
        r.cast(Name::new("p1").unwrap(), 10);
        r.cast(Name::new("p2").unwrap(), 30);
        r.cast(Name::new("p3").unwrap(), 20);
        assert_eq!(r.median(), Some(20));
    }

    #[test]
    fn median_of_even_count_rounds_down() {
        let mut r = ProdVoteRecord::new("max_recursion_depth");
        r.cast(Name::new("p1").unwrap(), 10);
        r.cast(Name::new("p2").unwrap(), 21);
        assert_eq!(r.median(), Some(15));
    }

    #[test]
    fn repeat_vote_from_same_producer_replaces() {
        let mut r = ProdVoteRecord::new("k");
        r.cast(Name::new("p1").unwrap(), 10);
        let prev = r.cast(Name::new("p1").unwrap(), 50);
        assert_eq!(prev, Some(10));
        assert_eq!(r.votes.len(), 1);
    }
}
