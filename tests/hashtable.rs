use tracker::insn::Instr;
use tracker::store::{InstrStore, StoreError, DEFAULT_STORE_SIZE};

#[test]
fn test_store_01() {
    assert_eq!(InstrStore::new(0).err(), Some(StoreError::ZeroCapacity));
}

#[test]
fn test_store_02() {
    let store = InstrStore::new(DEFAULT_STORE_SIZE).unwrap();
    assert_eq!(store.buckets(), 65536);
    assert_eq!(store.entries(), 0);
    assert_eq!(store.collisions(), 0);
    assert_eq!(store.filled_buckets(), 0);
}

#[test]
fn test_store_03() {
    // A fresh insertion hands back a handle onto the stored record.
    let mut store = InstrStore::new(16).unwrap();
    let (id, fresh) = store.insert(nop(0x1000));
    assert!(fresh);
    assert_eq!(store.get(id).address(), 0x1000);
    assert_eq!(store.get(id).opcodes(), &[0x90]);
    assert_eq!(store.entries(), 1);
}

#[test]
fn test_store_04() {
    // Ten identities over four buckets: every bucket fills, and
    // each insertion past the first in a bucket is one collision.
    let mut store = InstrStore::new(4).unwrap();
    for addr in 0x1000..0x100a {
        let (_, fresh) = store.insert(nop(addr));
        assert!(fresh);
    }
    assert_eq!(store.entries(), 10);
    assert_eq!(store.collisions(), 6);
    assert_eq!(store.filled_buckets(), 4);
    // Re-inserting any of them is reported as a duplicate and
    // changes nothing.
    for addr in 0x1000..0x100a {
        let before = store.entries();
        let (id, fresh) = store.insert(nop(addr));
        assert!(!fresh);
        assert_eq!(store.get(id).address(), addr);
        assert_eq!(store.entries(), before);
    }
    assert_eq!(store.collisions(), 6);
    assert_eq!(store.filled_buckets(), 4);
}

#[test]
fn test_store_05() {
    // Lookup holds for every inserted identity, and fails for a
    // distinct one.
    let mut store = InstrStore::new(4).unwrap();
    for addr in 0x1000..0x100a {
        store.insert(nop(addr));
    }
    for addr in 0x1000..0x100a {
        assert!(store.contains(&nop(addr)));
        assert!(store.find(&nop(addr)).is_some());
    }
    assert!(!store.contains(&nop(0x2000)));
    // Same address, different bytes: a different identity.
    let ret = Instr::new(0x1000, 1, &[0xc3], None).unwrap();
    assert!(!store.contains(&ret));
}

#[test]
fn test_store_06() {
    // Identity is the full triple, so the same address can hold
    // several byte sequences at once.
    let mut store = InstrStore::new(8).unwrap();
    let (i1, fresh1) = store.insert(nop(0x1000));
    let (i2, fresh2) = store.insert(Instr::new(0x1000, 2, &[0xEB, 0xFE], None).unwrap());
    assert!(fresh1 && fresh2);
    assert_ne!(i1, i2);
    assert_eq!(store.entries(), 2);
}

#[test]
fn test_store_07() {
    // Duplicate insertion returns the canonical handle.
    let mut store = InstrStore::new(8).unwrap();
    let (first, _) = store.insert(nop(0x4000));
    let (again, fresh) = store.insert(nop(0x4000));
    assert!(!fresh);
    assert_eq!(first, again);
}

fn nop(addr: u64) -> Instr {
    Instr::new(addr, 1, &[0x90], None).unwrap()
}
