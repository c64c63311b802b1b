use crate::models::{BlockRange, MAX_BLOCK_RANGE};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameters: {0}")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("start_block must be less than or equal to end_block")]
    InvalidRange,

    #[error("Block range too large. Maximum range is 20 blocks.")]
    RangeTooLarge,
}

fn parse_block(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Validate the `start_block`/`end_block` pair of a range request.
pub fn validate_block_range(
    start_block: Option<&str>,
    end_block: Option<&str>,
) -> Result<BlockRange, ValidationError> {
    let (start, end) = match (start_block, end_block) {
        (Some(start), Some(end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
            (start, end)
        }
        _ => {
            return Err(ValidationError::MissingParameter(
                "start_block and end_block".to_string(),
            ))
        }
    };

    let (start_block, end_block) = match (parse_block(start), parse_block(end)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ValidationError::InvalidArgument(
                "Block numbers must be integers".to_string(),
            ))
        }
    };

    if start_block > end_block {
        return Err(ValidationError::InvalidRange);
    }

    // i128 keeps the width check exact for extreme bounds
    if (end_block as i128) - (start_block as i128) > MAX_BLOCK_RANGE as i128 {
        return Err(ValidationError::RangeTooLarge);
    }

    Ok(BlockRange { start_block, end_block })
}

/// Validate the path segment of a timestamp request.
pub fn validate_block_number(raw: &str) -> Result<u64, ValidationError> {
    match parse_block(raw) {
        Some(block) if block >= 0 => Ok(block as u64),
        _ => Err(ValidationError::InvalidArgument("Invalid block number".to_string())),
    }
}
