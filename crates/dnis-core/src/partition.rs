//! Ordered chunk partitioning

use crate::error::PlanError;

/// Split `items` into ordered chunks of at most `max_size` elements.
///
/// Every chunk but the last holds exactly `max_size` items. An empty input
/// yields no chunks.
///
/// # Errors
/// `PlanError::InvalidConfiguration` if `max_size` is zero
pub fn partition<T: Clone>(items: &[T], max_size: usize) -> Result<Vec<Vec<T>>, PlanError> {
    if max_size == 0 {
        return Err(PlanError::InvalidConfiguration(
            "max identifiers per request must be positive".to_string(),
        ));
    }

    Ok(items.chunks(max_size).map(<[T]>::to_vec).collect())
}
