//! Host functions exposed to WASM plugins.
//!
//! Guests import them from the `conch` module:
//!
//! - `write(ptr: i32, len: i32)` writes guest bytes to the output channel.
//! - `read_line(ptr: i32, cap: i32) -> i32` reads one line, line ending
//!   stripped, copies at most `cap` bytes of it to `ptr` and returns the
//!   number copied, or `-1` once input is exhausted.

use std::io::Write;
use std::ops::Range;

use conch_core::Channels;
use wasmtime::{Caller, Extern, Linker, Memory};

/// Import module name guests link against.
pub const HOST_MODULE: &str = "conch";

/// Per-instance store data.
///
/// Holds detached channels except while the instance is executing, when the
/// session's channels are swapped in.
#[derive(Default)]
pub struct HostState {
    io: Channels,
}

impl HostState {
    pub(crate) fn channels_mut(&mut self) -> &mut Channels {
        &mut self.io
    }
}

/// Host functions that plugins can call.
pub struct HostFunctions;

impl HostFunctions {
    /// Defines every host import on the linker.
    pub fn link(linker: &mut Linker<HostState>) -> wasmtime::Result<()> {
        linker.func_wrap(HOST_MODULE, "write", host_write)?;
        linker.func_wrap(HOST_MODULE, "read_line", host_read_line)?;
        Ok(())
    }
}

fn host_write(mut caller: Caller<'_, HostState>, ptr: i32, len: i32) -> wasmtime::Result<()> {
    let memory = guest_memory(&mut caller)?;
    let (data, state) = memory.data_and_store_mut(&mut caller);

    let range = guest_range(data.len(), ptr as u32, len as u32)?;
    state.io.output().write_all(&data[range])?;
    Ok(())
}

fn host_read_line(
    mut caller: Caller<'_, HostState>,
    ptr: i32,
    cap: i32,
) -> wasmtime::Result<i32> {
    let memory = guest_memory(&mut caller)?;
    let (data, state) = memory.data_and_store_mut(&mut caller);

    let range = guest_range(data.len(), ptr as u32, cap as u32)?;

    // Whatever the guest printed as a prompt must be visible before blocking.
    state.io.output().flush()?;
    let Some(line) = state.io.read_line()? else {
        return Ok(-1);
    };

    let copied = line.len().min(range.len());
    data[range.start..range.start + copied].copy_from_slice(&line.as_bytes()[..copied]);
    Ok(i32::try_from(copied)?)
}

fn guest_memory(caller: &mut Caller<'_, HostState>) -> wasmtime::Result<Memory> {
    caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or_else(|| wasmtime::Error::msg("guest does not export `memory`"))
}

/// Bounds-checks a guest `(ptr, len)` pair against a memory of `size` bytes.
pub(crate) fn guest_range(size: usize, ptr: u32, len: u32) -> wasmtime::Result<Range<usize>> {
    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .filter(|&end| end <= size)
        .ok_or_else(|| {
            wasmtime::Error::msg(format!(
                "guest range {start}..{start}+{len} exceeds memory of {size} bytes"
            ))
        })?;
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_range_in_bounds() {
        assert_eq!(guest_range(100, 10, 5).unwrap(), 10..15);
        assert_eq!(guest_range(100, 100, 0).unwrap(), 100..100);
    }

    #[test]
    fn test_guest_range_out_of_bounds() {
        assert!(guest_range(100, 98, 5).is_err());
        assert!(guest_range(100, u32::MAX, u32::MAX).is_err());
    }
}
