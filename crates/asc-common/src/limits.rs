//! Centralized limits and thresholds for the compiler.
//!
//! Recursion and iteration guards live here so every crate agrees on them.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of expressions and statements the parser descends into.
///
/// Beyond this the parser reports a syntax problem and skips the construct
/// instead of overflowing the stack.
pub const MAX_PARSER_RECURSION_DEPTH: u32 = 256;

/// Maximum depth of nested `include` directives.
pub const MAX_INCLUDE_DEPTH: u32 = 32;

/// Maximum number of base classes followed when searching inherited members
/// or protected namespaces. Guards against circular `extends` chains.
pub const MAX_INHERITANCE_DEPTH: u32 = 64;

/// Maximum number of scopes walked in one lexical lookup.
pub const MAX_SCOPE_WALK_ITERATIONS: u32 = 10_000;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Entries kept in a thread's local reference cache before it is cleared.
pub const MAX_LOCAL_REFERENCE_CACHE_ENTRIES: usize = 4_096;

/// Shared reference cache size at which dead entries are first swept. The
/// threshold doubles with the live size after each sweep.
pub const REFERENCE_CACHE_PURGE_THRESHOLD: usize = 1_024;

/// How long a blocked request waiter sleeps between cancellation checks.
pub const REQUEST_CANCEL_POLL_MS: u64 = 20;
