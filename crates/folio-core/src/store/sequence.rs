use std::collections::HashMap;
use std::hash::Hash;

/// Identifies one invocation of an operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket<K> {
    kind: K,
    seq: u64,
}

/// Monotonic sequence numbers per operation kind.
///
/// A completion is only applied if its ticket belongs to the most recently
/// started invocation of that kind.
#[derive(Debug)]
pub(crate) struct OpSequence<K> {
    next: u64,
    latest: HashMap<K, u64>,
}

impl<K> Default for OpSequence<K> {
    fn default() -> Self {
        Self {
            next: 0,
            latest: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> OpSequence<K> {
    pub fn begin(&mut self, kind: K) -> Ticket<K> {
        self.next += 1;
        self.latest.insert(kind, self.next);
        Ticket {
            kind,
            seq: self.next,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Op {
        A,
        B,
    }

    #[test]
    fn test_newer_invocation_supersedes() {
        let mut seq = OpSequence::default();
        let first = seq.begin(Op::A);
        let second = seq.begin(Op::A);
        assert!(!seq.is_current(&first));
        assert!(seq.is_current(&second));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut seq = OpSequence::default();
        let a = seq.begin(Op::A);
        let b = seq.begin(Op::B);
        assert!(seq.is_current(&a));
        assert!(seq.is_current(&b));
    }
}
