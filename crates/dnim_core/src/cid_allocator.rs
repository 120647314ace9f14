//! 32-bit connection identifier allocation with a cooldown list so a
//! just-retired CID isn't handed straight back out to a new peer while
//! stray packets for the old session may still be in flight.

use std::collections::{HashSet, VecDeque};

use rand_core::RngCore;

const COOLDOWN_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
pub struct CidAllocator {
    in_use: HashSet<u32>,
    cooldown: HashSet<u32>,
    cooldown_order: VecDeque<u32>,
}

impl CidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh CID, avoiding both the currently-in-use set and the
    /// cooldown list. `0` is never allocated; it's reserved as a sentinel.
    pub fn allocate<R: RngCore>(&mut self, rng: &mut R) -> u32 {
        loop {
            let candidate = rng.next_u32();
            if candidate == 0 {
                continue;
            }
            if self.in_use.contains(&candidate) || self.cooldown.contains(&candidate) {
                continue;
            }
            self.in_use.insert(candidate);
            return candidate;
        }
    }

    /// Marks `cid` as no longer in use and moves it into the cooldown list,
    /// evicting the oldest cooldown entry once the list is full.
    pub fn retire(&mut self, cid: u32) {
        self.in_use.remove(&cid);
        if self.cooldown.insert(cid) {
            if self.cooldown_order.len() >= COOLDOWN_CAPACITY {
                if let Some(oldest) = self.cooldown_order.pop_front() {
                    self.cooldown.remove(&oldest);
                }
            }
            self.cooldown_order.push_back(cid);
        }
    }

    pub fn is_in_use(&self, cid: u32) -> bool {
        self.in_use.contains(&cid)
    }
}
