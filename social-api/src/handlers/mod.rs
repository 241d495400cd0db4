/// HTTP handlers
///
/// Handlers translate requests into service calls and pick the response
/// shape explicitly: List (counts only), Detail (full like/comment lists)
/// or Create. The requester identity arrives as a `UserId` extractor from
/// the auth middleware; nothing here reads global state.
pub mod comments;
pub mod jobs;
pub mod posts;
pub mod users;

/// Default page size, capped to keep list queries bounded.
const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Clamp client-supplied pagination to sane bounds.
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(page(None, None), (10, 0));
        assert_eq!(page(Some(1000), Some(-5)), (100, 0));
        assert_eq!(page(Some(0), Some(20)), (1, 20));
    }
}
