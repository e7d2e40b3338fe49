//! VM parameters

/* REGISTER FILE */

/// Register count, including the accumulator.
pub const VM_REGISTER_COUNT: usize = 128;

/// The accumulator. Expression results, call return values and builtin
/// results all land here.
pub const REG_RET: usize = 0;

/* FRAMES */

/// Slots in a frame's variable table. Must be a power of two; the compiler
/// masks identifier hashes into this range.
pub const VARIABLE_TABLE_SIZE: usize = 256;

/// Frames preallocated into the free list before execution starts.
/// Prefetching a typical recursion depth keeps the first calls off the
/// allocator.
pub const FRAME_POOL_PRELOAD: usize = 32;

/// Leading variable-table slots reserved for call arguments: `CALL` seeds
/// slot `i` with argument `i` and the function prologue rebinds it. The
/// compiler never assigns these slots to variables, and a call can pass at
/// most this many arguments.
pub const CALL_ARG_SLOTS: usize = 16;

/// First variable-table slot of the spill region. The register file is
/// shared across frames, so the compiler parks live temporaries in the
/// caller's frame around a `CALL`; register `r` spills into slot
/// `REGISTER_SPILL_SLOTS + r - 1`.
pub const REGISTER_SPILL_SLOTS: usize = CALL_ARG_SLOTS;

/// First variable-table slot the compiler hands out to named variables;
/// everything below belongs to the argument and spill regions.
pub const VARIABLE_SLOT_BASE: usize = REGISTER_SPILL_SLOTS + VM_REGISTER_COUNT;

/* COMPILER */

/// Upper bound for the global constant pool.
pub const GLOBAL_SIZE: usize = 1 << 20;

/// Global pool slot of the interned `false` singleton.
pub const GLOBAL_FALSE: u32 = 0;

/// Global pool slot of the interned `true` singleton.
pub const GLOBAL_TRUE: u32 = 1;

/// Global pool slot of the interned `None` singleton.
pub const GLOBAL_NONE: u32 = 2;

/// Upper bound for the flat builtin function table.
pub const MAX_BUILTIN_SIZE: usize = 1024;

/* GARBAGE COLLECTOR */

/// Initial heap-pressure threshold in bytes; a collection cycle runs once
/// the live estimate crosses it.
pub const GC_MIN_HEAP: usize = 50 * 1024;

/* PIPELINE ARENA */

/// Initial block size of the bump arena backing interned strings.
pub const ARENA_MIN_BLOCK: usize = 4 * 1024;

/// Upper bound on arena blocks. Blocks double in size, so this bounds the
/// arena at `ARENA_MIN_BLOCK << ARENA_MAX_BLOCKS` bytes overall.
pub const ARENA_MAX_BLOCKS: usize = 28;
