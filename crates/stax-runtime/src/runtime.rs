//! The runtime: object heap, handle slots, compacting collector,
//! scratchpad, value stack, local frames and undo snapshots.
//!
//! All objects live densely in one bump arena. An [`ObjectId`] is an index
//! into a slot table, never a heap address: the collector slides object
//! bytes toward the base and rewrites offsets inside the slots, so an id
//! held anywhere stays valid across a collection. The roots are the value
//! stack, the protect stack, local frames, the directory tree and the undo
//! snapshots; a slot reachable from none of them is reclaimed.
//!
//! Discipline for transient ids: an id that is not yet on any root must be
//! parked on the protect stack before the next potentially-allocating
//! call, and released LIFO. Most operations avoid the question entirely by
//! copying payload bytes out of the heap, computing, then allocating the
//! result once.

use stax_core::object::{self, build};
use stax_core::{Error, Result, Tag};

use crate::directory::DirectoryTree;

/// Default heap capacity in bytes.
const DEFAULT_CAPACITY: usize = 1 << 20;

/// How many undo snapshots are kept before the oldest is dropped.
const UNDO_DEPTH: usize = 16;

/// Relocatable reference to a heap object.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId(u32);

impl ObjectId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Free { next: Option<u32> },
    Used { offset: u32, len: u32, pins: u32 },
}

/// One frame of named local bindings (loop variables, `→` locals).
pub type LocalFrame = Vec<(String, ObjectId)>;

/// The object memory and its roots.
pub struct Runtime {
    heap: Vec<u8>,
    capacity: usize,
    slots: Vec<Slot>,
    free_slots: Option<u32>,
    stack: Vec<ObjectId>,
    protects: Vec<ObjectId>,
    locals: Vec<LocalFrame>,
    directory: DirectoryTree,
    undo: Vec<Vec<ObjectId>>,
    scratch: Vec<u8>,
    gc_runs: u64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A runtime with a fixed heap budget; allocations beyond it collect,
    /// then fail with `OutOfMemory`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::new(),
            capacity,
            slots: Vec::new(),
            free_slots: None,
            stack: Vec::new(),
            protects: Vec::new(),
            locals: Vec::new(),
            directory: DirectoryTree::new(),
            undo: Vec::new(),
            scratch: Vec::new(),
            gc_runs: 0,
        }
    }

    // ========================================================================
    //   Allocation
    // ========================================================================

    /// Intern a fully built object encoding as a new heap object.
    ///
    /// This is the single allocation chokepoint: it may collect, and on
    /// success nothing observable has moved except slot offsets.
    pub fn insert(&mut self, bytes: &[u8]) -> Result<ObjectId> {
        debug_assert_eq!(object::size_of(bytes), Ok(bytes.len()));
        self.reserve(bytes.len())?;
        let offset = self.heap.len() as u32;
        self.heap.extend_from_slice(bytes);
        Ok(self.new_slot(offset, bytes.len() as u32))
    }

    fn reserve(&mut self, needed: usize) -> Result<()> {
        if self.used() + needed > self.capacity {
            self.gc();
            if self.used() + needed > self.capacity {
                log::warn!(
                    "heap exhausted: {} used + {} requested > {} capacity",
                    self.used(),
                    needed,
                    self.capacity
                );
                return Err(Error::OutOfMemory);
            }
        }
        Ok(())
    }

    fn new_slot(&mut self, offset: u32, len: u32) -> ObjectId {
        match self.free_slots {
            Some(index) => {
                let next = match &self.slots[index as usize] {
                    Slot::Free { next } => *next,
                    Slot::Used { .. } => unreachable!("used slot on free list"),
                };
                self.free_slots = next;
                self.slots[index as usize] = Slot::Used {
                    offset,
                    len,
                    pins: 0,
                };
                ObjectId(index)
            }
            None => {
                self.slots.push(Slot::Used {
                    offset,
                    len,
                    pins: 0,
                });
                ObjectId(self.slots.len() as u32 - 1)
            }
        }
    }

    /// Heap bytes in use, scratchpad included.
    pub fn used(&self) -> usize {
        self.heap.len() + self.scratch.len()
    }

    /// Number of collections run so far.
    pub fn gc_runs(&self) -> u64 {
        self.gc_runs
    }

    // ========================================================================
    //   Typed constructors
    // ========================================================================

    pub fn make_integer(&mut self, value: i64) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::integer(value, &mut buf);
        self.insert(&buf)
    }

    /// A small integer kind with an explicit tag (based, or sign-in-tag).
    pub fn make_small(&mut self, tag: Tag, magnitude: u64) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::small(tag, magnitude, &mut buf);
        self.insert(&buf)
    }

    /// A bignum kind from a canonical little-endian magnitude.
    pub fn make_bignum(&mut self, tag: Tag, magnitude: &[u8]) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::bignum(tag, magnitude, &mut buf);
        self.insert(&buf)
    }

    pub fn make_symbol(&mut self, name: &str) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::string(Tag::Symbol, name, &mut buf);
        self.insert(&buf)
    }

    pub fn make_text(&mut self, contents: &str) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::string(Tag::Text, contents, &mut buf);
        self.insert(&buf)
    }

    /// A length-prefixed composite from an already concatenated body.
    pub fn make_sized(&mut self, tag: Tag, body: &[u8]) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::sized(tag, body, &mut buf);
        self.insert(&buf)
    }

    /// A two-child composite from existing objects.
    pub fn make_pair(&mut self, tag: Tag, first: ObjectId, second: ObjectId) -> Result<ObjectId> {
        let mut buf = Vec::new();
        stax_core::leb128::write_uleb(tag.as_u8() as u64, &mut buf);
        buf.extend_from_slice(self.bytes(first));
        buf.extend_from_slice(self.bytes(second));
        self.insert(&buf)
    }

    pub fn make_command(&mut self, tag: Tag) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::command(tag, &mut buf);
        self.insert(&buf)
    }

    pub fn make_decimal(&mut self, flags: u8, exponent: i32, coefficient: u128) -> Result<ObjectId> {
        let mut buf = Vec::new();
        build::decimal(flags, exponent, coefficient, &mut buf);
        self.insert(&buf)
    }

    // ========================================================================
    //   Object access
    // ========================================================================

    fn slot(&self, id: ObjectId) -> (u32, u32) {
        match self.slots.get(id.index()) {
            Some(Slot::Used { offset, len, .. }) => (*offset, *len),
            _ => panic!("stale object id {:?}", id),
        }
    }

    /// The exact byte encoding of an object. The borrow must end before
    /// the next allocating call; copy with [`Runtime::object_vec`] to keep
    /// bytes across one.
    pub fn bytes(&self, id: ObjectId) -> &[u8] {
        let (offset, len) = self.slot(id);
        &self.heap[offset as usize..(offset + len) as usize]
    }

    /// Owned copy of an object's encoding.
    pub fn object_vec(&self, id: ObjectId) -> Vec<u8> {
        self.bytes(id).to_vec()
    }

    pub fn tag(&self, id: ObjectId) -> Tag {
        match object::tag_of(self.bytes(id)) {
            Ok(tag) => tag,
            Err(_) => panic!("corrupt object heap at {:?}", id),
        }
    }

    /// Intern a copy of an object embedded in some other object's body.
    pub fn adopt(&mut self, embedded: &[u8]) -> Result<ObjectId> {
        let size = object::size_of(embedded)?;
        let owned = embedded[..size].to_vec();
        self.insert(&owned)
    }

    // ========================================================================
    //   Value stack
    // ========================================================================

    pub fn push(&mut self, id: ObjectId) {
        self.stack.push(id);
    }

    pub fn pop(&mut self) -> Result<ObjectId> {
        self.stack.pop().ok_or(Error::NotEnoughArguments)
    }

    /// Look at the id at `depth` below the top without removing it.
    pub fn peek(&self, depth: usize) -> Result<ObjectId> {
        if depth >= self.stack.len() {
            return Err(Error::NotEnoughArguments);
        }
        Ok(self.stack[self.stack.len() - 1 - depth])
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// All stack ids, bottom to top.
    pub fn stack(&self) -> &[ObjectId] {
        &self.stack
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// Drop the top `n` entries.
    pub fn drop_n(&mut self, n: usize) -> Result<()> {
        if n > self.stack.len() {
            return Err(Error::NotEnoughArguments);
        }
        self.stack.truncate(self.stack.len() - n);
        Ok(())
    }

    /// Copy the nth entry to the top; `pick(1)` duplicates the top.
    pub fn pick(&mut self, n: usize) -> Result<()> {
        if n == 0 || n > self.stack.len() {
            return Err(Error::NotEnoughArguments);
        }
        let id = self.stack[self.stack.len() - n];
        self.stack.push(id);
        Ok(())
    }

    /// Move the nth entry to the top; `roll(2)` is swap.
    pub fn roll(&mut self, n: usize) -> Result<()> {
        if n == 0 || n > self.stack.len() {
            return Err(Error::NotEnoughArguments);
        }
        let index = self.stack.len() - n;
        let id = self.stack.remove(index);
        self.stack.push(id);
        Ok(())
    }

    pub fn swap(&mut self) -> Result<()> {
        let len = self.stack.len();
        if len < 2 {
            return Err(Error::NotEnoughArguments);
        }
        self.stack.swap(len - 1, len - 2);
        Ok(())
    }

    pub fn over(&mut self) -> Result<()> {
        self.pick(2)
    }

    pub fn rot(&mut self) -> Result<()> {
        self.roll(3)
    }

    pub fn dup(&mut self) -> Result<()> {
        self.pick(1)
    }

    // ========================================================================
    //   Transient protection
    // ========================================================================

    /// Park an id on the protect stack; returns the mark to release to.
    pub fn protect(&mut self, id: ObjectId) -> usize {
        let mark = self.protects.len();
        self.protects.push(id);
        mark
    }

    /// Release every protection taken since `mark`, LIFO.
    pub fn unprotect_to(&mut self, mark: usize) {
        debug_assert!(mark <= self.protects.len());
        self.protects.truncate(mark);
    }

    // ========================================================================
    //   Local frames
    // ========================================================================

    pub fn push_frame(&mut self) {
        self.locals.push(LocalFrame::new());
    }

    pub fn pop_frame(&mut self) {
        self.locals.pop();
    }

    /// Bind a name in the innermost frame.
    pub fn bind_local(&mut self, name: &str, id: ObjectId) {
        if let Some(frame) = self.locals.last_mut() {
            if let Some(entry) = frame.iter_mut().find(|(n, _)| n == name) {
                entry.1 = id;
            } else {
                frame.push((name.to_string(), id));
            }
        }
    }

    /// Innermost binding for a name, searching frames top down.
    pub fn lookup_local(&self, name: &str) -> Option<ObjectId> {
        for frame in self.locals.iter().rev() {
            if let Some((_, id)) = frame.iter().find(|(n, _)| n == name) {
                return Some(*id);
            }
        }
        None
    }

    // ========================================================================
    //   Directory
    // ========================================================================

    pub fn directory(&self) -> &DirectoryTree {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut DirectoryTree {
        &mut self.directory
    }

    /// Resolve a name: innermost local frame first, then the directory.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.lookup_local(name)
            .or_else(|| self.directory.recall(name))
    }

    // ========================================================================
    //   Undo snapshots
    // ========================================================================

    /// Shallow snapshot of the value stack, for undoable execution.
    pub fn save(&mut self) {
        if self.undo.len() == UNDO_DEPTH {
            self.undo.remove(0);
        }
        self.undo.push(self.stack.clone());
    }

    /// Restore the most recent snapshot. Returns false when there is none.
    pub fn restore(&mut self) -> bool {
        match self.undo.pop() {
            Some(saved) => {
                self.stack = saved;
                true
            }
            None => false,
        }
    }

    /// Discard the most recent snapshot without restoring it.
    pub fn commit(&mut self) {
        self.undo.pop();
    }

    // ========================================================================
    //   Scratchpad
    // ========================================================================

    /// Claim `n` transient bytes above the heap. Pairs with [`Runtime::free`],
    /// LIFO. Returns the offset of the claimed region.
    pub fn allocate(&mut self, n: usize) -> Result<usize> {
        self.reserve(n)?;
        let offset = self.scratch.len();
        self.scratch.resize(offset + n, 0);
        Ok(offset)
    }

    /// Release the topmost `n` scratchpad bytes.
    pub fn free(&mut self, n: usize) {
        debug_assert!(n <= self.scratch.len());
        let keep = self.scratch.len().saturating_sub(n);
        self.scratch.truncate(keep);
    }

    pub fn scratch(&self) -> &[u8] {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut [u8] {
        &mut self.scratch
    }

    /// Freeze the whole scratchpad into a length-prefixed object of `tag`
    /// and release it.
    pub fn scratch_to_object(&mut self, tag: Tag) -> Result<ObjectId> {
        let mut buf = Vec::new();
        if matches!(tag, Tag::Symbol | Tag::Text) {
            stax_core::leb128::write_uleb(tag.as_u8() as u64, &mut buf);
            stax_core::leb128::write_uleb(self.scratch.len() as u64, &mut buf);
            buf.extend_from_slice(&self.scratch);
        } else if tag.is_sized_composite() {
            build::sized(tag, &self.scratch.clone(), &mut buf);
        } else {
            return Err(Error::TypeMismatch);
        }
        let whole = self.scratch.len();
        self.free(whole);
        self.insert(&buf)
    }

    // ========================================================================
    //   Collection
    // ========================================================================

    /// Mark-compact collection: reclaim unreachable slots, slide live
    /// objects toward the base and rewrite slot offsets. Observable state
    /// is unchanged; only addresses move.
    pub fn gc(&mut self) {
        self.gc_runs += 1;

        // Mark phase: every id reachable from a root keeps its slot.
        let mut live = vec![false; self.slots.len()];
        let mut mark = |id: &ObjectId| {
            live[id.index()] = true;
        };
        self.stack.iter().for_each(&mut mark);
        self.protects.iter().for_each(&mut mark);
        for frame in &self.locals {
            frame.iter().for_each(|(_, id)| mark(id));
        }
        for snapshot in &self.undo {
            snapshot.iter().for_each(&mut mark);
        }
        self.directory.visit(&mut |id| mark(&id));
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Used { pins, .. } = slot {
                if *pins > 0 {
                    live[index] = true;
                }
            }
        }

        // Sweep phase: dead slots go back to the free list.
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if matches!(slot, Slot::Used { .. }) && !live[index] {
                *slot = Slot::Free {
                    next: self.free_slots,
                };
                self.free_slots = Some(index as u32);
            }
        }

        // Compact phase: slide live byte ranges toward the base.
        let mut ranges: Vec<(u32, u32, u32)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Used { offset, len, .. } => Some((*offset, *len, index as u32)),
                Slot::Free { .. } => None,
            })
            .collect();
        ranges.sort_unstable_by_key(|&(offset, _, _)| offset);

        let mut cursor: usize = 0;
        for &(offset, len, index) in &ranges {
            let offset = offset as usize;
            let len = len as usize;
            if offset != cursor {
                self.heap.copy_within(offset..offset + len, cursor);
            }
            if let Slot::Used { offset: o, .. } = &mut self.slots[index as usize] {
                *o = cursor as u32;
            }
            cursor += len;
        }
        self.heap.truncate(cursor);
    }

    /// Explicitly pin a slot so it survives collection without being on
    /// any root. Pairs with [`Runtime::unpin`].
    pub fn pin(&mut self, id: ObjectId) {
        if let Some(Slot::Used { pins, .. }) = self.slots.get_mut(id.index()) {
            *pins += 1;
        }
    }

    pub fn unpin(&mut self, id: ObjectId) {
        if let Some(Slot::Used { pins, .. }) = self.slots.get_mut(id.index()) {
            *pins = pins.saturating_sub(1);
        }
    }

    // Internal accessors for persistence.
    pub(crate) fn heap_bytes(&self) -> &[u8] {
        &self.heap
    }

    pub(crate) fn used_slots(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Used { offset, len, .. } => Some((index as u32, *offset, *len)),
                Slot::Free { .. } => None,
            })
    }

    pub(crate) fn stack_ids(&self) -> &[ObjectId] {
        &self.stack
    }

    pub(crate) fn restore_state(
        &mut self,
        heap: Vec<u8>,
        slots: Vec<(u32, u32, u32)>,
        stack: Vec<u32>,
        directory: DirectoryTree,
    ) {
        let max_slot = slots.iter().map(|&(i, _, _)| i).max().map_or(0, |m| m + 1);
        self.heap = heap;
        self.slots = vec![Slot::Free { next: None }; max_slot as usize];
        for &(index, offset, len) in &slots {
            self.slots[index as usize] = Slot::Used {
                offset,
                len,
                pins: 0,
            };
        }
        // Rebuild the free list over the remaining holes.
        self.free_slots = None;
        for index in (0..self.slots.len()).rev() {
            if matches!(self.slots[index], Slot::Free { .. }) {
                self.slots[index] = Slot::Free {
                    next: self.free_slots,
                };
                self.free_slots = Some(index as u32);
            }
        }
        self.stack = stack.into_iter().map(ObjectId).collect();
        self.protects.clear();
        self.locals.clear();
        self.undo.clear();
        self.scratch.clear();
        self.directory = directory;
    }

    pub(crate) fn id_from_raw(raw: u32) -> ObjectId {
        ObjectId(raw)
    }

    pub(crate) fn id_raw(id: ObjectId) -> u32 {
        id.0
    }
}
