/// Post/comment visibility rules
///
/// A post is readable by a requester when it is displayed and the requester
/// is either its author or follows the author. Write access (update/delete)
/// is author-only; follow edges grant no write access. Hidden posts
/// (`is_displayed = false`, i.e. scheduled and not yet published) are
/// excluded from every read path, the author's included.
///
/// The list queries in the service layer apply the same rules in SQL; the
/// predicates here cover single-object checks on already-fetched rows and
/// keep the rules unit-testable without a database.
use uuid::Uuid;

/// The relation between a requester and a post's author, as resolved
/// against the follow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorRelation {
    pub author_id: Uuid,
    pub requester_id: Uuid,
    /// Whether a follow edge (follower = requester, followed = author) exists
    pub requester_follows_author: bool,
}

impl AuthorRelation {
    fn is_author(&self) -> bool {
        self.requester_id == self.author_id
    }
}

/// Read access: displayed, and authored by the requester or by someone the
/// requester follows.
pub fn can_read(is_displayed: bool, relation: AuthorRelation) -> bool {
    is_displayed && (relation.is_author() || relation.requester_follows_author)
}

/// Write access: displayed and authored by the requester.
pub fn can_write(is_displayed: bool, relation: AuthorRelation) -> bool {
    is_displayed && relation.is_author()
}

/// Case-insensitive containment match, mirroring the `ILIKE '%..%'` filter
/// the list queries use.
pub fn hashtag_matches(post_hashtag: Option<&str>, filter: &str) -> bool {
    match post_hashtag {
        Some(tag) => tag.to_lowercase().contains(&filter.to_lowercase()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(author: Uuid, requester: Uuid, follows: bool) -> AuthorRelation {
        AuthorRelation {
            author_id: author,
            requester_id: requester,
            requester_follows_author: follows,
        }
    }

    #[test]
    fn follower_reads_displayed_post() {
        let author = Uuid::new_v4();
        let reader = Uuid::new_v4();
        assert!(can_read(true, relation(author, reader, true)));
    }

    #[test]
    fn non_follower_cannot_read() {
        let author = Uuid::new_v4();
        let reader = Uuid::new_v4();
        assert!(!can_read(true, relation(author, reader, false)));
    }

    #[test]
    fn author_reads_own_displayed_post_without_edges() {
        let author = Uuid::new_v4();
        assert!(can_read(true, relation(author, author, false)));
    }

    #[test]
    fn hidden_post_is_invisible_even_to_author() {
        let author = Uuid::new_v4();
        assert!(!can_read(false, relation(author, author, false)));
        assert!(!can_read(false, relation(author, Uuid::new_v4(), true)));
    }

    #[test]
    fn follow_edge_grants_no_write_access() {
        let author = Uuid::new_v4();
        let follower = Uuid::new_v4();
        assert!(!can_write(true, relation(author, follower, true)));
        assert!(can_write(true, relation(author, author, false)));
    }

    #[test]
    fn hidden_post_is_not_writable() {
        let author = Uuid::new_v4();
        assert!(!can_write(false, relation(author, author, false)));
    }

    #[test]
    fn hashtag_filter_is_case_insensitive_containment() {
        assert!(hashtag_matches(Some("RustLang"), "rust"));
        assert!(hashtag_matches(Some("rustlang"), "LANG"));
        assert!(!hashtag_matches(Some("cooking"), "rust"));
        assert!(!hashtag_matches(None, "rust"));
    }
}
