//! Multipart chunk planning.
//!
//! Parts are 1-based and contiguous. Every part is `part_size` bytes except
//! the last, which carries the remainder. An empty object is a single empty
//! part.

use s3kit_model::part_count;

use crate::error::{ClientError, ClientResult};

/// Byte range of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based part number.
    pub part_number: u32,
    /// Offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub len: u64,
    /// Number of parts in the object.
    pub total_parts: u64,
}

impl PartRange {
    /// Whether this is the final part.
    #[must_use]
    pub fn is_last(&self) -> bool {
        u64::from(self.part_number) == self.total_parts
    }
}

/// Result of planning a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartPlan {
    /// The part exists.
    Part(PartRange),
    /// The part number is past the end of the object.
    NoMoreParts,
}

/// Compute the byte range of `part_number`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] if `part_number` or `part_size` is zero.
///
/// # Examples
///
/// ```
/// use s3kit_client::chunk::{PartPlan, plan_part};
///
/// let PartPlan::Part(last) = plan_part(12_000_000, 5_242_880, 3).unwrap() else {
///     panic!("part 3 exists");
/// };
/// assert_eq!(last.offset, 10_485_760);
/// assert_eq!(last.len, 1_514_240);
/// assert_eq!(plan_part(12_000_000, 5_242_880, 4).unwrap(), PartPlan::NoMoreParts);
/// ```
pub fn plan_part(total_size: u64, part_size: u64, part_number: u32) -> ClientResult<PartPlan> {
    if part_number == 0 {
        return Err(ClientError::InvalidInput(
            "part numbers start at 1".to_owned(),
        ));
    }
    if part_size == 0 {
        return Err(ClientError::InvalidInput(
            "part size must be positive".to_owned(),
        ));
    }

    let total_parts = part_count(total_size, part_size);
    if u64::from(part_number) > total_parts {
        return Ok(PartPlan::NoMoreParts);
    }

    let offset = part_size * u64::from(part_number - 1);
    let len = if u64::from(part_number) == total_parts {
        total_size - offset
    } else {
        part_size
    };

    Ok(PartPlan::Part(PartRange {
        part_number,
        offset,
        len,
        total_parts,
    }))
}

/// Plan every part of an object, in ascending order.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] if `part_size` is zero or the object
/// needs more parts than a `u32` part number can address.
pub fn plan_all(total_size: u64, part_size: u64) -> ClientResult<Vec<PartRange>> {
    if part_size == 0 {
        return Err(ClientError::InvalidInput(
            "part size must be positive".to_owned(),
        ));
    }
    let total_parts = part_count(total_size, part_size);
    let last = u32::try_from(total_parts).map_err(|_| {
        ClientError::InvalidInput(format!("{total_parts} parts exceed the part number range"))
    })?;

    let mut parts = Vec::with_capacity(usize::try_from(total_parts).unwrap_or_default());
    for part_number in 1..=last {
        if let PartPlan::Part(range) = plan_part(total_size, part_size, part_number)? {
            parts.push(range);
        }
    }
    Ok(parts)
}
