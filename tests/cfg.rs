use tracker::cfg::{Cfg, CfgError, NodeId, MAX_CALL_DEPTH};
use tracker::insn::{Instr, InstrKind};
use tracker::store::InstrStore;

#[test]
fn test_cfg_01() {
    // Three straight-line instructions chain into a path; every
    // node stays in function 0.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let a = cfg.entry(&mut store, nop(0x1000));
    let b = cfg.insert(&mut store, a, nop(0x1001)).unwrap();
    let c = cfg.insert(&mut store, b, nop(0x1002)).unwrap();
    assert_eq!(cfg.len(), 3);
    assert_eq!(cfg.node(a).successors(), &[b]);
    assert_eq!(cfg.node(b).successors(), &[c]);
    assert_eq!(cfg.node(a).in_degree(), 0);
    assert_eq!(cfg.node(b).in_degree(), 1);
    assert_eq!(cfg.node(c).in_degree(), 1);
    for id in [a, b, c] {
        assert_eq!(cfg.node(id).function(), 0);
    }
    check_degrees(&cfg);
}

#[test]
fn test_cfg_02() {
    // Revisiting an instruction reuses its node and adds no second
    // edge to the same destination.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let a = cfg.entry(&mut store, jmp(0x1000));
    let b = cfg.insert(&mut store, a, nop(0x2000)).unwrap();
    let a2 = cfg.insert(&mut store, b, jmp(0x1000)).unwrap();
    assert_eq!(a, a2);
    let b2 = cfg.insert(&mut store, a2, nop(0x2000)).unwrap();
    assert_eq!(b, b2);
    assert_eq!(cfg.len(), 2);
    assert_eq!(cfg.node(a).successors(), &[b]);
    assert_eq!(cfg.node(b).successors(), &[a]);
    assert_eq!(cfg.node(a).in_degree(), 1);
    assert_eq!(cfg.node(b).in_degree(), 1);
    check_degrees(&cfg);
}

#[test]
fn test_cfg_03() {
    // Call and return: the callee opens function 1, the return
    // lands as a successor of the caller, and the call stack drains.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let a = cfg.entry(&mut store, nop(0x1000));
    let b = cfg.insert(&mut store, a, call(0x1001)).unwrap();
    assert_eq!(cfg.call_depth(), 0);
    let c = cfg.insert(&mut store, b, nop(0x2000)).unwrap();
    assert_eq!(cfg.call_depth(), 1);
    let d = cfg.insert(&mut store, c, ret(0x2001)).unwrap();
    // 0x1006 lies exactly after the five-byte call at 0x1001.
    let e = cfg.insert(&mut store, d, nop(0x1006)).unwrap();
    assert_eq!(cfg.call_depth(), 0);
    // The return edge originates at the caller, not the ret.
    assert!(cfg.node(b).successors().contains(&e));
    assert!(!cfg.node(d).successors().contains(&e));
    assert_eq!(cfg.node(b).out_degree(), 2);
    assert_eq!(cfg.node(d).out_degree(), 0);
    // Function grouping: the callee body is function 1.
    assert_eq!(cfg.node(a).function(), 0);
    assert_eq!(cfg.node(b).function(), 0);
    assert_eq!(cfg.node(c).function(), 1);
    assert_eq!(cfg.node(d).function(), 1);
    assert_eq!(cfg.node(e).function(), 0);
    assert_eq!(cfg.function_entries().len(), 2);
    assert_eq!(cfg.function_entries()[1], c);
    assert_eq!(cfg.function_size(0), 3);
    assert_eq!(cfg.function_size(1), 2);
    check_degrees(&cfg);
}

#[test]
fn test_cfg_04() {
    // A conditional branch takes two successors and refuses a
    // third.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let x = cfg.entry(&mut store, branch(0x1000));
    let y = cfg.insert(&mut store, x, nop(0x1002)).unwrap();
    let z = cfg.insert(&mut store, x, nop(0x1007)).unwrap();
    assert_eq!(cfg.node(x).successors(), &[y, z]);
    let w = cfg.insert(&mut store, x, nop(0x3000));
    assert_eq!(w.unwrap_err(), CfgError::BranchLimit(0x1000));
    assert_eq!(cfg.node(x).out_degree(), 2);
    check_degrees(&cfg);
}

#[test]
fn test_cfg_05() {
    // Re-observing an existing branch edge is not a third edge.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let x = cfg.entry(&mut store, branch(0x1000));
    let y = cfg.insert(&mut store, x, nop(0x1002)).unwrap();
    let z = cfg.insert(&mut store, x, nop(0x1007)).unwrap();
    let y2 = cfg.insert(&mut store, x, nop(0x1002)).unwrap();
    assert_eq!(y, y2);
    assert_eq!(cfg.node(x).successors(), &[y, z]);
    check_degrees(&cfg);
}

#[test]
fn test_cfg_06() {
    // An indirect jump accumulates arbitrarily many distinct
    // targets.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let j = cfg.entry(&mut store, jmp(0x1000));
    let mut targets = Vec::new();
    for k in 0..9u64 {
        let t = cfg.insert(&mut store, j, nop(0x2000 + k)).unwrap();
        targets.push(t);
    }
    assert_eq!(cfg.node(j).out_degree(), 9);
    assert_eq!(cfg.node(j).successors(), &targets[..]);
    check_degrees(&cfg);
}

#[test]
fn test_cfg_07() {
    // A return whose destination is not the caller's follower falls
    // back to linking from the ret itself.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let a = cfg.entry(&mut store, call(0x1001));
    let b = cfg.insert(&mut store, a, nop(0x2000)).unwrap();
    let c = cfg.insert(&mut store, b, ret(0x2001)).unwrap();
    // 0x5000 is nowhere near 0x1006.
    let d = cfg.insert(&mut store, c, nop(0x5000)).unwrap();
    assert_eq!(cfg.call_depth(), 0);
    assert!(cfg.node(c).successors().contains(&d));
    assert!(!cfg.node(a).successors().contains(&d));
    check_degrees(&cfg);
}

#[test]
fn test_cfg_08() {
    // A return with no call on the stack also links from itself.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let r = cfg.entry(&mut store, ret(0x1000));
    let n = cfg.insert(&mut store, r, nop(0x4000)).unwrap();
    assert!(cfg.node(r).successors().contains(&n));
    check_degrees(&cfg);
}

#[test]
fn test_cfg_09() {
    // Nesting deeper than the bound is refused rather than
    // truncated.
    let mut store = InstrStore::new(1024).unwrap();
    let mut cfg = Cfg::new();
    let mut cur = cfg.entry(&mut store, call(0x1000));
    for k in 1..=(MAX_CALL_DEPTH + 1) as u64 {
        match cfg.insert(&mut store, cur, call(0x1000 + 5 * k)) {
            Ok(next) => cur = next,
            Err(e) => {
                assert_eq!(e, CfgError::CallDepthExceeded(MAX_CALL_DEPTH));
                assert_eq!(k, (MAX_CALL_DEPTH + 1) as u64);
                assert_eq!(cfg.call_depth(), MAX_CALL_DEPTH);
                return;
            }
        }
    }
    panic!("call stack bound never enforced");
}

#[test]
fn test_cfg_10() {
    // Each fresh call target opens the next function id, from 1.
    let mut store = InstrStore::new(64).unwrap();
    let mut cfg = Cfg::new();
    let c1 = cfg.entry(&mut store, call(0x1000));
    let f1 = cfg.insert(&mut store, c1, call(0x2000)).unwrap();
    let f2 = cfg.insert(&mut store, f1, nop(0x3000)).unwrap();
    assert_eq!(cfg.node(f1).function(), 1);
    assert_eq!(cfg.node(f2).function(), 2);
    assert_eq!(cfg.function_entries().len(), 3);
    assert_eq!(cfg.function_entries()[0], c1);
    assert_eq!(cfg.function_entries()[1], f1);
    assert_eq!(cfg.function_entries()[2], f2);
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn nop(addr: u64) -> Instr {
    Instr::new(addr, 1, &[0x90], None).unwrap()
}

fn call(addr: u64) -> Instr {
    let instr = Instr::new(addr, 5, &[0xE8, 0x00, 0x00, 0x00, 0x00], None).unwrap();
    assert_eq!(instr.kind(), InstrKind::Call);
    instr
}

fn ret(addr: u64) -> Instr {
    let instr = Instr::new(addr, 1, &[0xC3], None).unwrap();
    assert_eq!(instr.kind(), InstrKind::Ret);
    instr
}

fn branch(addr: u64) -> Instr {
    let instr = Instr::new(addr, 2, &[0x74, 0x05], None).unwrap();
    assert_eq!(instr.kind(), InstrKind::Branch);
    instr
}

fn jmp(addr: u64) -> Instr {
    let instr = Instr::new(addr, 2, &[0xEB, 0xFE], None).unwrap();
    assert_eq!(instr.kind(), InstrKind::Jump);
    instr
}

/// Out-degrees always match successor lists, in-degrees count the
/// incoming edges, and no list repeats a destination.
fn check_degrees(cfg: &Cfg) {
    let mut incoming = vec![0u16; cfg.len()];
    let mut edges = Vec::new();
    for id in cfg.node_ids() {
        let node = cfg.node(id);
        assert_eq!(node.out_degree() as usize, node.successors().len());
        let mut seen: Vec<NodeId> = Vec::new();
        for succ in node.successors() {
            assert!(!seen.contains(succ));
            seen.push(*succ);
            incoming[succ.index()] += 1;
            edges.push((id, *succ));
        }
    }
    for id in cfg.node_ids() {
        assert_eq!(cfg.node(id).in_degree(), incoming[id.index()]);
    }
    // The edge iterator agrees with the successor lists.
    let iterated: Vec<_> = cfg.edges().collect();
    assert_eq!(iterated, edges);
    assert_eq!(cfg.edge_count(), edges.len());
}
