/// Business logic layer
///
/// Services own the SQL. Every read query is scoped by the visibility
/// rules (see `crate::visibility`); every multi-statement mutation runs in
/// a single transaction so the uniqueness invariants hold under concurrent
/// requests.
pub mod comments;
pub mod follow;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use follow::FollowService;
pub use posts::PostService;
pub use users::UserService;

/// Escape LIKE wildcards in a user-supplied containment term so the
/// resulting pattern matches the term literally.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
