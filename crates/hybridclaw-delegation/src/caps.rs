//! Depth computation and the depth/per-turn cap checks.

use crate::error::{DelegationError, DelegationResult};

/// Prefix a child delegation session id carries: `delegate:d<N>:...`.
const DEPTH_PREFIX: &str = "delegate:d";

/// Parse the delegation depth out of a session id. A session id with no
/// `delegate:d<N>:` prefix is depth 0.
#[must_use]
pub fn parent_depth(session_id: &str) -> u32 {
    let Some(rest) = session_id.strip_prefix(DEPTH_PREFIX) else {
        return 0;
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Reject a plan whose parent depth + 1 would exceed `max_depth`.
///
/// # Errors
///
/// Returns [`DelegationError::DepthExceeded`] when over the limit.
pub fn check_depth(parent_session_id: &str, max_depth: u32) -> DelegationResult<u32> {
    let depth = parent_depth(parent_session_id) + 1;
    if depth > max_depth {
        return Err(DelegationError::DepthExceeded { depth, max_depth });
    }
    Ok(depth)
}

/// Reject a plan whose tasks would push this turn's accepted total past
/// `max_per_turn`.
///
/// # Errors
///
/// Returns [`DelegationError::PerTurnCapExceeded`] when over the limit.
pub fn check_per_turn_cap(
    requested: usize,
    already_accepted_this_turn: usize,
    max_per_turn: usize,
) -> DelegationResult<()> {
    let total = already_accepted_this_turn + requested;
    if total > max_per_turn {
        return Err(DelegationError::PerTurnCapExceeded {
            requested,
            total,
            max_per_turn,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_session_id_is_depth_zero() {
        assert_eq!(parent_depth("chan-123"), 0);
    }

    #[test]
    fn parses_depth_from_prefixed_session_id() {
        assert_eq!(parent_depth("delegate:d2:parent:1700000000:ab12"), 2);
    }

    #[test]
    fn check_depth_allows_up_to_the_max() {
        assert_eq!(check_depth("delegate:d2:parent:1:ab", 3).unwrap(), 3);
    }

    #[test]
    fn check_depth_rejects_past_the_max() {
        let result = check_depth("delegate:d3:parent:1:ab", 3);
        assert!(matches!(result, Err(DelegationError::DepthExceeded { depth: 4, max_depth: 3 })));
    }

    #[test]
    fn per_turn_cap_allows_up_to_the_max() {
        assert!(check_per_turn_cap(3, 3, 6).is_ok());
    }

    #[test]
    fn per_turn_cap_rejects_over_the_max() {
        let result = check_per_turn_cap(4, 3, 6);
        assert!(matches!(
            result,
            Err(DelegationError::PerTurnCapExceeded { requested: 4, total: 7, max_per_turn: 6 })
        ));
    }
}
