use tracker::insn::Instr;
use tracker::store::{InstrId, InstrStore};
use tracker::trace::Trace;

#[test]
fn test_trace_01() {
    let tr = Trace::new();
    assert_eq!(tr.len(), 0);
    assert!(tr.is_empty());
    assert_eq!(tr.get(1), None);
}

#[test]
fn test_trace_02() {
    // Positions are 1-based; zero and past-the-end yield nothing.
    let (_, ids) = sample_ids(3);
    let mut tr = Trace::new();
    for id in &ids {
        tr.append(*id);
    }
    assert_eq!(tr.len(), 3);
    assert_eq!(tr.get(0), None);
    assert_eq!(tr.get(1), Some(ids[0]));
    assert_eq!(tr.get(2), Some(ids[1]));
    assert_eq!(tr.get(3), Some(ids[2]));
    assert_eq!(tr.get(4), None);
}

#[test]
fn test_trace_03() {
    // A trace always equals itself, the empty trace included.
    let (_, ids) = sample_ids(4);
    let mut tr = Trace::new();
    assert_eq!(tr.compare(&tr), 0);
    for id in &ids {
        tr.append(*id);
    }
    assert_eq!(tr.compare(&tr), 0);
    assert_eq!(tr.compare(&tr.clone()), 0);
}

#[test]
fn test_trace_04() {
    // An empty trace differs from a non-empty one at the head.
    let (_, ids) = sample_ids(2);
    let empty = Trace::new();
    let mut tr = Trace::new();
    tr.append(ids[0]);
    assert_eq!(empty.compare(&tr), 1);
    assert_eq!(tr.compare(&empty), 1);
}

#[test]
fn test_trace_05() {
    // The reported position is the first difference, and the traces
    // indeed disagree there.
    let (_, ids) = sample_ids(4);
    let mut t1 = Trace::new();
    let mut t2 = Trace::new();
    for id in &ids[..3] {
        t1.append(*id);
        t2.append(*id);
    }
    t1.append(ids[3]);
    t2.append(ids[0]);
    let k = t1.compare(&t2);
    assert_eq!(k, 4);
    assert_ne!(t1.get(k), t2.get(k));
}

#[test]
fn test_trace_06() {
    // A proper prefix differs just past its end.
    let (_, ids) = sample_ids(3);
    let mut t1 = Trace::new();
    let mut t2 = Trace::new();
    for id in &ids {
        t1.append(*id);
    }
    for id in &ids[..2] {
        t2.append(*id);
    }
    assert_eq!(t1.compare(&t2), 3);
    assert_eq!(t2.compare(&t1), 3);
}

#[test]
fn test_trace_07() {
    // Appends keep execution order, duplicates included.
    let (_, ids) = sample_ids(2);
    let mut tr = Trace::new();
    tr.append(ids[0]);
    tr.append(ids[1]);
    tr.append(ids[0]);
    let collected: Vec<_> = tr.iter().copied().collect();
    assert_eq!(collected, vec![ids[0], ids[1], ids[0]]);
}

/// Build a store holding `n` distinct single-byte instructions and
/// return their handles.
fn sample_ids(n: usize) -> (InstrStore, Vec<InstrId>) {
    let mut store = InstrStore::new(64).unwrap();
    let mut ids = Vec::new();
    for k in 0..n {
        let instr = Instr::new(0x1000 + k as u64, 1, &[0x90], None).unwrap();
        let (id, fresh) = store.insert(instr);
        assert!(fresh);
        ids.push(id);
    }
    (store, ids)
}
