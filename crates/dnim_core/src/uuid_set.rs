//! Bounded set of recently delivered message UUIDs, for duplicate
//! suppression independent of the AEAD nonce replay window.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

const CAPACITY: usize = 4096;

#[derive(Debug, Default)]
pub struct SeenMessageIds {
    seen: HashSet<Uuid>,
    order: VecDeque<Uuid>,
}

impl SeenMessageIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` was already present (duplicate delivery).
    pub fn check_and_insert(&mut self, id: Uuid) -> bool {
        if self.seen.contains(&id) {
            return true;
        }
        if self.order.len() >= CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(id);
        self.order.push_back(id);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delivery_is_not_a_duplicate() {
        let mut s = SeenMessageIds::new();
        assert!(!s.check_and_insert(Uuid::nil()));
    }

    #[test]
    fn redelivery_is_flagged() {
        let mut s = SeenMessageIds::new();
        let id = Uuid::from_u128(42);
        assert!(!s.check_and_insert(id));
        assert!(s.check_and_insert(id));
    }
}
