//! Shared limits for fuzz targets.

/// Inputs past this size only slow the fuzzer down without reaching new
/// parser states.
#[allow(dead_code)]
pub const MAX_INPUT_SIZE: usize = 1 << 20;
