//! Heap persistence: one binary blob of the object heap plus roots.
//!
//! The blob stores the heap bytes verbatim along with the used slots, the
//! value stack and the flattened directory tree. Loading restores exactly
//! the reachable state; transient state (protect stack, locals, undo,
//! scratchpad) is not persisted. No compatibility is promised across
//! versions that change the tag set.

use std::io::{Read, Write};

use thiserror::Error;

use crate::directory::DirectoryTree;
use crate::runtime::{ObjectId, Runtime};

const MAGIC: &[u8; 4] = b"STAX";
const VERSION: u32 = 1;

/// Errors from saving or loading a heap blob.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("not a heap blob (bad magic)")]
    BadMagic,

    #[error("unsupported blob version {0}")]
    BadVersion(u32),

    #[error("malformed blob: {0}")]
    Malformed(&'static str),
}

fn put_u32(out: &mut impl Write, value: u32) -> Result<(), PersistError> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn put_u64(out: &mut impl Write, value: u64) -> Result<(), PersistError> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn put_str(out: &mut impl Write, value: &str) -> Result<(), PersistError> {
    put_u64(out, value.len() as u64)?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

fn get_u32(input: &mut impl Read) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn get_u64(input: &mut impl Read) -> Result<u64, PersistError> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn get_str(input: &mut impl Read) -> Result<String, PersistError> {
    let len = get_u64(input)? as usize;
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| PersistError::Malformed("non-UTF-8 name"))
}

/// Write the runtime's persistent state as a blob.
pub fn save_blob(rt: &Runtime, out: &mut impl Write) -> Result<(), PersistError> {
    out.write_all(MAGIC)?;
    put_u32(out, VERSION)?;

    let heap = rt.heap_bytes();
    put_u64(out, heap.len() as u64)?;
    out.write_all(heap)?;

    let slots: Vec<(u32, u32, u32)> = rt.used_slots().collect();
    put_u64(out, slots.len() as u64)?;
    for (index, offset, len) in slots {
        put_u32(out, index)?;
        put_u32(out, offset)?;
        put_u32(out, len)?;
    }

    let stack = rt.stack_ids();
    put_u64(out, stack.len() as u64)?;
    for &id in stack {
        put_u32(out, Runtime::id_raw(id))?;
    }

    let entries = rt.directory().flatten();
    put_u64(out, entries.len() as u64)?;
    for (path, name, id) in entries {
        put_u64(out, path.len() as u64)?;
        for part in &path {
            put_str(out, part)?;
        }
        put_str(out, &name)?;
        put_u32(out, Runtime::id_raw(id))?;
    }
    Ok(())
}

/// Replace the runtime's state with a previously saved blob.
pub fn load_blob(rt: &mut Runtime, input: &mut impl Read) -> Result<(), PersistError> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(PersistError::BadMagic);
    }
    let version = get_u32(input)?;
    if version != VERSION {
        log::warn!("refusing heap blob version {version}, expected {VERSION}");
        return Err(PersistError::BadVersion(version));
    }

    let heap_len = get_u64(input)? as usize;
    let mut heap = vec![0u8; heap_len];
    input.read_exact(&mut heap)?;

    let slot_count = get_u64(input)? as usize;
    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        let index = get_u32(input)?;
        let offset = get_u32(input)?;
        let len = get_u32(input)?;
        if offset as usize + len as usize > heap_len {
            return Err(PersistError::Malformed("slot outside heap"));
        }
        slots.push((index, offset, len));
    }

    let stack_len = get_u64(input)? as usize;
    let mut stack = Vec::with_capacity(stack_len);
    for _ in 0..stack_len {
        let raw = get_u32(input)?;
        if !slots.iter().any(|&(i, _, _)| i == raw) {
            return Err(PersistError::Malformed("stack id with no slot"));
        }
        stack.push(raw);
    }

    let entry_count = get_u64(input)? as usize;
    let mut entries: Vec<(Vec<String>, String, ObjectId)> = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let path_len = get_u64(input)? as usize;
        let mut path = Vec::with_capacity(path_len);
        for _ in 0..path_len {
            path.push(get_str(input)?);
        }
        let name = get_str(input)?;
        let raw = get_u32(input)?;
        if !slots.iter().any(|&(i, _, _)| i == raw) {
            return Err(PersistError::Malformed("directory id with no slot"));
        }
        entries.push((path, name, Runtime::id_from_raw(raw)));
    }

    let directory = DirectoryTree::from_flat(entries);
    rt.restore_state(heap, slots, stack, directory);
    Ok(())
}
