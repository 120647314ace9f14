//! CID-indexed table of live sessions, guarded for concurrent access from
//! the I/O worker and the maintenance scheduler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand_core::RngCore;

use crate::cid_allocator::CidAllocator;
use crate::error::CoreError;
use crate::session::{Role, Session};

#[derive(Clone, Default)]
pub struct SessionTable {
    inner: Arc<RwLock<HashMap<u32, Arc<Mutex<Session>>>>>,
    allocator: Arc<Mutex<CidAllocator>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<R: RngCore>(
        &self,
        rng: &mut R,
        role: Role,
        peer_endpoint: SocketAddr,
    ) -> Arc<Mutex<Session>> {
        let cid = self.allocator.lock().allocate(rng);
        let session = Arc::new(Mutex::new(Session::new(cid, role, peer_endpoint)));
        self.inner.write().insert(cid, session.clone());
        session
    }

    /// Inserts a session under a CID chosen by the peer (used by the
    /// responder, who must reuse the initiator's CID on the wire).
    pub fn insert_with_cid(&self, cid: u32, session: Session) -> Arc<Mutex<Session>> {
        let session = Arc::new(Mutex::new(session));
        self.inner.write().insert(cid, session.clone());
        session
    }

    pub fn get(&self, cid: u32) -> Result<Arc<Mutex<Session>>, CoreError> {
        self.inner
            .read()
            .get(&cid)
            .cloned()
            .ok_or(CoreError::UnknownSession { cid })
    }

    pub fn retire(&self, cid: u32) {
        self.inner.write().remove(&cid);
        self.allocator.lock().retire(cid);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_cids(&self) -> Vec<u32> {
        self.inner.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9000)
    }

    #[test]
    fn create_then_get_round_trips() {
        let table = SessionTable::new();
        let mut rng = StepRng::new(1, 1);
        let session = table.create(&mut rng, Role::Initiator, addr());
        let cid = session.lock().cid;
        assert!(table.get(cid).is_ok());
    }

    #[test]
    fn get_unknown_cid_errors() {
        let table = SessionTable::new();
        assert!(matches!(
            table.get(0xDEAD_BEEF),
            Err(CoreError::UnknownSession { .. })
        ));
    }

    #[test]
    fn retire_removes_from_table() {
        let table = SessionTable::new();
        let mut rng = StepRng::new(3, 1);
        let session = table.create(&mut rng, Role::Initiator, addr());
        let cid = session.lock().cid;
        table.retire(cid);
        assert!(table.get(cid).is_err());
    }
}
