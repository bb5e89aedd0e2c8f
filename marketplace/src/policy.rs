//! Table-driven order lifecycle policy.
//!
//! Status transitions are authorized in one place: a role is mapped to the
//! set of target statuses it may set, and the lifecycle only ever moves
//! forward through the status sequence. Callers run this guard once, before
//! any mutation.

use crate::error::{ApiError, ApiResult};
use crate::model::{OrderStatus, Role};

/// Target statuses a role is allowed to set. Restaurants own the kitchen half
/// of the lifecycle, riders own the delivery half; nobody else mutates status.
pub fn permitted_targets(role: Role) -> &'static [OrderStatus] {
    match role {
        Role::Restaurant => &[
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Rejected,
        ],
        Role::Rider => &[
            OrderStatus::PickedUp,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ],
        Role::Customer | Role::Admin => &[],
    }
}

/// Authorize a transition from `current` to `target` by an actor with `role`.
///
/// Checks, in order: the role may set `target` at all, the order is not in a
/// terminal state, and `target` ranks strictly after `current`. Skipping
/// forward within the role's permitted set is allowed; moving backwards or
/// re-entering a state never is.
pub fn authorize_transition(role: Role, current: OrderStatus, target: OrderStatus) -> ApiResult<()> {
    if !permitted_targets(role).contains(&target) {
        return Err(ApiError::Authorization(format!(
            "{role} actors cannot set order status to '{target}'"
        )));
    }
    if current.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "order is already '{current}' and cannot change status"
        )));
    }
    if target.rank() <= current.rank() {
        return Err(ApiError::Conflict(format!(
            "cannot move order status from '{current}' back to '{target}'"
        )));
    }
    Ok(())
}
