//! GC heap — Cheney-style semi-space copying collector
//!
//! Runtime objects (heap strings, arrays, maps) live in slots of the
//! from-space; a [`HeapRef`] is an index into it. Each slot pairs a
//! [`GcHeader`] with its payload, and live objects are threaded through the
//! headers' `next` field starting at the collector's `head`.
//!
//! A cycle marks everything reachable from the roots (registers and the
//! whole frame chain's variable tables), copies marked objects into the
//! to-space while leaving a forward index in the old header, rewrites every
//! live reference through [`Heap::forward_or_self`], and finally flips the
//! spaces. After a flip no live value references an old slot.

use crate::arena::Stats;
use crate::consts::GC_MIN_HEAP;
use crate::error::RuntimeError;
use crate::interpreter::Frame;
use crate::value::{fnv1a, StrRef, Value, ValueKind};

use tracing::debug;

pub mod list;
pub mod map;

pub use list::List;
pub use map::{Map, MapEntry};

/// Index of an object in the collector's current space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapRef(u32);

impl HeapRef {
    /// Reference to slot `idx`.
    pub const fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Raw slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for HeapRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{:#06x}", self.0)
    }
}

/// Heap object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjKind {
    /// Raw bytes, e.g. string storage.
    Raw = 0,
    /// A string view into a [`ObjKind::Raw`] object.
    Str = 1,
    /// A growable list of values.
    List = 2,
    /// A hashed string-to-value map.
    Map = 3,
}

/// Heap string payload: a view over a [`ObjKind::Raw`] object.
#[derive(Debug, Clone, Copy)]
pub struct HeapStr {
    /// The backing raw object. Copied together with this view; the link is
    /// rewritten during a cycle.
    pub bytes: HeapRef,
    /// View length in bytes.
    pub len: u32,
    /// Hash computed at construction.
    pub hash: u64,
}

/// Payload of a heap slot.
#[derive(Debug)]
pub enum Payload {
    /// Raw bytes.
    Raw(Box<[u8]>),
    /// String view.
    Str(HeapStr),
    /// List of values.
    List(List),
    /// String-keyed map.
    Map(Map),
}

impl Default for Payload {
    fn default() -> Self {
        Self::Raw(Box::default())
    }
}

impl Payload {
    const fn kind(&self) -> ObjKind {
        match self {
            Payload::Raw(_) => ObjKind::Raw,
            Payload::Str(_) => ObjKind::Str,
            Payload::List(_) => ObjKind::List,
            Payload::Map(_) => ObjKind::Map,
        }
    }

    fn size_estimate(&self) -> usize {
        match self {
            Payload::Raw(b) => b.len(),
            Payload::Str(_) => std::mem::size_of::<HeapStr>(),
            Payload::List(l) => l.size_estimate(),
            Payload::Map(m) => m.size_estimate(),
        }
    }
}

/// Object header preceding every payload.
#[derive(Debug, Clone, Copy)]
pub struct GcHeader {
    /// Payload kind.
    pub kind: ObjKind,
    /// Set during the mark stage of a cycle.
    pub marked: bool,
    /// Payload size estimate in bytes, used for heap accounting.
    pub size: usize,
    /// New-space index once the object was copied. Only ever set on
    /// old-space headers; fresh copies start with `None`.
    pub forward: Option<HeapRef>,
    /// Intrusive list threading all live objects.
    pub next: Option<HeapRef>,
}

/// One heap slot: header plus payload.
#[derive(Debug)]
pub struct Slot {
    /// The object header.
    pub header: GcHeader,
    /// The object payload.
    pub payload: Payload,
}

/// Mutable view of the collector's root set: the register file and every
/// frame's variable table, current frame and ancestors alike.
pub struct Roots<'a> {
    /// The VM register file.
    pub registers: &'a mut [Value],
    /// The whole frame chain.
    pub frames: &'a mut [Frame],
}

/// The runtime heap.
#[derive(Debug)]
pub struct Heap {
    from: Vec<Slot>,
    to: Vec<Slot>,
    head: Option<HeapRef>,
    threshold: usize,
    live: usize,
    total_allocated: usize,
    enabled: bool,
    max_memory: Option<usize>,
}

impl Heap {
    /// Heap with the default pressure threshold.
    pub fn new(enabled: bool, max_memory: Option<usize>) -> Self {
        Self {
            from: Vec::new(),
            to: Vec::new(),
            head: None,
            threshold: GC_MIN_HEAP,
            live: 0,
            total_allocated: 0,
            enabled,
            max_memory,
        }
    }

    /// `true` once heap pressure calls for a cycle. Allocation sites check
    /// this before allocating and run [`Heap::cycle`] with the VM's roots.
    pub fn needs_cycle(&self) -> bool {
        self.enabled && self.live >= self.threshold
    }

    /// Usage counters: `current` is the live estimate (drops at each
    /// cycle), `allocated` is cumulative.
    pub fn stats(&self) -> Stats {
        Stats {
            current: self.live,
            allocated: self.total_allocated,
        }
    }

    fn alloc(&mut self, payload: Payload) -> Result<HeapRef, RuntimeError> {
        let size = payload.size_estimate();
        if let Some(limit) = self.max_memory {
            if self.live + size > limit {
                return Err(RuntimeError::OutOfMemory {
                    requested: size,
                    limit,
                });
            }
        }
        let r = HeapRef::new(self.from.len() as u32);
        self.from.push(Slot {
            header: GcHeader {
                kind: payload.kind(),
                marked: false,
                size,
                forward: None,
                next: self.head,
            },
            payload,
        });
        self.head = Some(r);
        self.live += size;
        self.total_allocated += size;
        Ok(r)
    }

    /// Allocates raw byte storage.
    pub fn alloc_raw(&mut self, bytes: &[u8]) -> Result<HeapRef, RuntimeError> {
        self.alloc(Payload::Raw(bytes.into()))
    }

    /// Allocates a heap string: a raw object for the bytes plus the string
    /// view over it. The hash is computed here, once.
    pub fn alloc_str(&mut self, bytes: &[u8]) -> Result<HeapRef, RuntimeError> {
        let raw = self.alloc_raw(bytes)?;
        self.alloc(Payload::Str(HeapStr {
            bytes: raw,
            len: bytes.len() as u32,
            hash: fnv1a(bytes),
        }))
    }

    /// Moves `list` onto the heap.
    pub fn alloc_list(&mut self, list: List) -> Result<HeapRef, RuntimeError> {
        self.alloc(Payload::List(list))
    }

    /// Moves `map` onto the heap.
    pub fn alloc_map(&mut self, map: Map) -> Result<HeapRef, RuntimeError> {
        self.alloc(Payload::Map(map))
    }

    /// The slot behind `r`.
    pub fn slot(&self, r: HeapRef) -> &Slot {
        &self.from[r.index()]
    }

    /// The string view behind `r`. Panics when `r` is not a string object —
    /// the compiler only emits string-typed references here.
    pub fn str_obj(&self, r: HeapRef) -> &HeapStr {
        match &self.slot(r).payload {
            Payload::Str(s) => s,
            _ => unreachable!("heap ref is not a string"),
        }
    }

    /// The bytes of the heap string behind `r`.
    pub fn str_bytes(&self, r: HeapRef) -> &[u8] {
        let s = self.str_obj(r);
        match &self.slot(s.bytes).payload {
            Payload::Raw(b) => &b[..s.len as usize],
            _ => unreachable!("string bytes are not raw storage"),
        }
    }

    /// The list behind `r`.
    pub fn list(&self, r: HeapRef) -> &List {
        match &self.slot(r).payload {
            Payload::List(l) => l,
            _ => unreachable!("heap ref is not a list"),
        }
    }

    /// Mutable list behind `r`.
    pub fn list_mut(&mut self, r: HeapRef) -> &mut List {
        match &mut self.from[r.index()].payload {
            Payload::List(l) => l,
            _ => unreachable!("heap ref is not a list"),
        }
    }

    /// The map behind `r`.
    pub fn map(&self, r: HeapRef) -> &Map {
        match &self.slot(r).payload {
            Payload::Map(m) => m,
            _ => unreachable!("heap ref is not a map"),
        }
    }

    /// Mutable map behind `r`.
    pub fn map_mut(&mut self, r: HeapRef) -> &mut Map {
        match &mut self.from[r.index()].payload {
            Payload::Map(m) => m,
            _ => unreachable!("heap ref is not a map"),
        }
    }

    /// Accounts one appended element against the container at `r`, keeping
    /// the pressure trigger honest for containers that grow after their
    /// allocation.
    pub fn note_append(&mut self, r: HeapRef) {
        let delta = std::mem::size_of::<Value>();
        self.from[r.index()].header.size += delta;
        self.live += delta;
        self.total_allocated += delta;
    }

    /// The forward index of `r` if it was copied this cycle, `r` unchanged
    /// otherwise. Idempotent: an object reachable through registers, the
    /// variable tables and container interiors at once resolves to the same
    /// new-space slot every time.
    pub fn forward_or_self(&self, r: HeapRef) -> HeapRef {
        forward_or_self(&self.from, r)
    }

    /// Runs one full collection cycle: mark, copy, rewrite, flip.
    pub fn cycle(&mut self, roots: Roots<'_>) {
        debug!(
            live = self.live,
            threshold = self.threshold,
            objects = self.from.len(),
            "gc: starting cycle"
        );

        self.mark(&roots);
        let (new_head, new_live) = self.copy();
        self.rewrite(roots, new_head);

        // flip: bulk-free the old space, swap, adopt the new intrusive list
        self.from.clear();
        std::mem::swap(&mut self.from, &mut self.to);
        self.head = new_head;
        let freed = self.live.saturating_sub(new_live);
        self.live = new_live;
        if self.live >= self.threshold {
            self.threshold *= 2;
        }

        debug!(
            freed,
            live = self.live,
            threshold = self.threshold,
            "gc: cycle done"
        );
    }

    fn mark(&mut self, roots: &Roots<'_>) {
        let mut worklist: Vec<HeapRef> = Vec::new();
        for v in roots.registers.iter() {
            if let Some(r) = value_heap_ref(v) {
                worklist.push(r);
            }
        }
        for frame in roots.frames.iter() {
            for v in frame.bindings() {
                if let Some(r) = value_heap_ref(&v) {
                    worklist.push(r);
                }
            }
        }

        while let Some(r) = worklist.pop() {
            let slot = &mut self.from[r.index()];
            if slot.header.marked {
                continue;
            }
            slot.header.marked = true;

            let slot = &self.from[r.index()];
            match &slot.payload {
                Payload::Raw(_) => {}
                // a heap string is both the view and its byte storage
                Payload::Str(s) => worklist.push(s.bytes),
                Payload::List(l) => {
                    worklist.extend(l.iter().filter_map(|v| value_heap_ref(&v)));
                }
                Payload::Map(m) => {
                    for entry in m.iter() {
                        if let StrRef::Heap(k) = entry.key {
                            worklist.push(k);
                        }
                        if let Some(r) = value_heap_ref(&entry.value) {
                            worklist.push(r);
                        }
                    }
                    if let Some((StrRef::Heap(k), _)) = m.pending_key {
                        worklist.push(k);
                    }
                }
            }
        }
    }

    fn copy(&mut self) -> (Option<HeapRef>, usize) {
        let mut new_head = None;
        let mut new_live = 0;
        let mut cursor = self.head;
        while let Some(r) = cursor {
            let header = self.from[r.index()].header;
            cursor = header.next;
            if !header.marked || header.forward.is_some() {
                continue;
            }
            let payload = std::mem::take(&mut self.from[r.index()].payload);
            let fresh = HeapRef::new(self.to.len() as u32);
            self.to.push(Slot {
                header: GcHeader {
                    kind: header.kind,
                    marked: false,
                    size: header.size,
                    forward: None,
                    next: new_head,
                },
                payload,
            });
            self.from[r.index()].header.forward = Some(fresh);
            new_head = Some(fresh);
            new_live += header.size;
        }
        (new_head, new_live)
    }

    fn rewrite(&mut self, roots: Roots<'_>, new_head: Option<HeapRef>) {
        let from = &self.from;

        for v in roots.registers.iter_mut() {
            rewrite_value(from, v);
        }
        for frame in roots.frames.iter_mut() {
            for v in frame.bindings_mut() {
                rewrite_value(from, v);
            }
        }

        // interior references of every fresh copy still point at the old
        // space; chase them through the forward indices
        let mut cursor = new_head;
        while let Some(r) = cursor {
            let slot = &mut self.to[r.index()];
            cursor = slot.header.next;
            match &mut slot.payload {
                Payload::Raw(_) => {}
                Payload::Str(s) => s.bytes = forward_or_self(from, s.bytes),
                Payload::List(l) => {
                    for v in l.iter_mut() {
                        rewrite_value(from, v);
                    }
                }
                Payload::Map(m) => {
                    for entry in m.iter_mut() {
                        rewrite_str_ref(from, &mut entry.key);
                        rewrite_value(from, &mut entry.value);
                    }
                    if let Some((key, _)) = &mut m.pending_key {
                        rewrite_str_ref(from, key);
                    }
                }
            }
        }
    }
}

fn forward_or_self(from: &[Slot], r: HeapRef) -> HeapRef {
    from.get(r.index())
        .and_then(|slot| slot.header.forward)
        .unwrap_or(r)
}

fn value_heap_ref(v: &Value) -> Option<HeapRef> {
    match v.kind {
        ValueKind::Str(StrRef::Heap(r)) => Some(r),
        ValueKind::Array(r) | ValueKind::Obj(r) => Some(r),
        _ => None,
    }
}

fn rewrite_value(from: &[Slot], v: &mut Value) {
    match &mut v.kind {
        ValueKind::Str(s) => rewrite_str_ref(from, s),
        ValueKind::Array(r) | ValueKind::Obj(r) => *r = forward_or_self(from, *r),
        _ => {}
    }
}

fn rewrite_str_ref(from: &[Slot], s: &mut StrRef) {
    if let StrRef::Heap(r) = s {
        *r = forward_or_self(from, *r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> Heap {
        Heap::new(true, None)
    }

    #[test]
    fn str_pairs_with_raw_storage() {
        let mut h = heap();
        let s = h.alloc_str(b"garden").unwrap();
        assert_eq!(h.slot(s).header.kind, ObjKind::Str);
        let raw = h.str_obj(s).bytes;
        assert_eq!(h.slot(raw).header.kind, ObjKind::Raw);
        assert_eq!(h.str_bytes(s), b"garden");
    }

    #[test]
    fn cycle_keeps_rooted_objects() {
        let mut h = heap();
        let s = h.alloc_str(b"keep me").unwrap();
        let _garbage = h.alloc_str(b"drop me").unwrap();
        let mut registers = [Value::str(StrRef::Heap(s))];
        let mut frames: [Frame; 0] = [];

        let before = h.stats();
        h.cycle(Roots {
            registers: &mut registers,
            frames: &mut frames,
        });
        let after = h.stats();

        assert!(after.current < before.current);
        // the register was rewritten into the new space and still resolves
        match registers[0].kind {
            ValueKind::Str(StrRef::Heap(r)) => assert_eq!(h.str_bytes(r), b"keep me"),
            _ => panic!("register lost its string"),
        }
    }

    #[test]
    fn cycle_preserves_sharing() {
        let mut h = heap();
        let s = h.alloc_str(b"shared").unwrap();
        let mut list = List::new();
        list.push(Value::str(StrRef::Heap(s)));
        let l = h.alloc_list(list).unwrap();

        // the same string is reachable through a register and a container
        let mut registers = [Value::str(StrRef::Heap(s)), Value::array(l)];
        let mut frames: [Frame; 0] = [];
        h.cycle(Roots {
            registers: &mut registers,
            frames: &mut frames,
        });

        let direct = match registers[0].kind {
            ValueKind::Str(StrRef::Heap(r)) => r,
            _ => panic!("register lost its string"),
        };
        let through_list = match registers[1].kind {
            ValueKind::Array(r) => match h.list(r).get(0).unwrap().kind {
                ValueKind::Str(StrRef::Heap(r)) => r,
                _ => panic!("list lost its string"),
            },
            _ => panic!("register lost its list"),
        };
        assert_eq!(direct, through_list);
        assert_eq!(h.str_bytes(direct), b"shared");
    }

    #[test]
    fn forwarding_is_idempotent() {
        let mut h = heap();
        let s = h.alloc_str(b"x").unwrap();
        let raw = h.str_obj(s).bytes;
        let untouched = h.alloc_str(b"garbage").unwrap();
        let mut registers = [Value::str(StrRef::Heap(s))];
        let mut frames: [Frame; 0] = [];

        // run mark and copy by hand so the old headers are still in place,
        // then resolve the same old refs repeatedly
        h.mark(&Roots {
            registers: &mut registers,
            frames: &mut frames,
        });
        let (new_head, _) = h.copy();

        assert_eq!(h.forward_or_self(s), h.forward_or_self(s));
        assert_eq!(h.forward_or_self(raw), h.forward_or_self(raw));
        assert_ne!(h.forward_or_self(s), h.forward_or_self(raw));
        // unreachable objects were never copied and resolve to themselves
        assert_eq!(h.forward_or_self(untouched), untouched);

        h.rewrite(
            Roots {
                registers: &mut registers,
                frames: &mut frames,
            },
            new_head,
        );
    }

    #[test]
    fn new_space_headers_have_no_forward() {
        let mut h = heap();
        let s = h.alloc_str(b"x").unwrap();
        let mut registers = [Value::str(StrRef::Heap(s))];
        let mut frames: [Frame; 0] = [];
        h.cycle(Roots {
            registers: &mut registers,
            frames: &mut frames,
        });
        let mut cursor = h.head;
        while let Some(r) = cursor {
            let slot = h.slot(r);
            assert!(slot.header.forward.is_none());
            assert!(!slot.header.marked);
            cursor = slot.header.next;
        }
    }

    #[test]
    fn max_memory_is_enforced() {
        let mut h = Heap::new(false, Some(64));
        assert!(h.alloc_raw(&[0u8; 32]).is_ok());
        assert!(matches!(
            h.alloc_raw(&[0u8; 64]),
            Err(RuntimeError::OutOfMemory { .. })
        ));
    }
}
