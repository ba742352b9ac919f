use crate::model::enums::CommentStatus;
use crate::model::user::UserRole;
use std::collections::HashSet;

/// Collects every authority id granted by `roles`.
pub fn granted_authorities(roles: &[UserRole]) -> HashSet<&str> {
    roles.iter().flat_map(UserRole::authority_ids).collect()
}

/// Status a new comment starts in. Comments skip review when one of the
/// author's roles grants `no_review_authority_id`.
pub fn initial_status(roles: &[UserRole], no_review_authority_id: &str) -> CommentStatus {
    match granted_authorities(roles).contains(no_review_authority_id) {
        true => CommentStatus::FreeReview,
        false => CommentStatus::PendingReview,
    }
}
