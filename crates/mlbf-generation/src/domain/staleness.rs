//! Generation staleness decision

/// Whether block membership may have changed since the last generation
///
/// A block modified in the same millisecond as the last generation counts
/// as covered by it. With no recorded generation, one is always needed.
pub fn needs_new_generation(
    last_generation_time: Option<u64>,
    latest_block_modified: Option<u64>,
) -> bool {
    match (last_generation_time, latest_block_modified) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(previous), Some(latest)) => latest > previous,
    }
}
