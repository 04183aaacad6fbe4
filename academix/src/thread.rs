//! Comment threads. Comments are stored flat with an optional parent id; a
//! thread is materialized per fetch as an arena of nodes linked by index.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::CommentView;

/// Deepest reply level accepted for new comments and rendered as nesting.
/// Top-level comments are level 0.
pub const MAX_REPLY_DEPTH: usize = 10;

#[derive(Debug, Clone)]
struct ThreadNode {
    comment: CommentView,
    parent: Option<usize>,
    /// Replies, in listing order
    children: Vec<usize>,
}

/// Arena of comments for one blog.
///
/// `roots` holds top-level comments in listing order. A reply whose parent is
/// not among the fetched comments (deleted, or on another blog) lands in
/// `orphans` instead of disappearing, as does any reply that would close a
/// parent cycle.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    nodes: Vec<ThreadNode>,
    roots: Vec<usize>,
    orphans: Vec<usize>,
}

impl CommentThread {
    /// Build from comments already in the desired order
    pub fn build(comments: Vec<CommentView>) -> Self {
        let index: HashMap<String, usize> = comments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut thread = Self {
            nodes: comments
                .into_iter()
                .map(|comment| ThreadNode {
                    comment,
                    parent: None,
                    children: Vec::new(),
                })
                .collect(),
            ..Default::default()
        };

        for i in 0..thread.nodes.len() {
            let parent = thread.nodes[i]
                .comment
                .parent_comment
                .as_ref()
                .map(|id| index.get(id).copied());

            match parent {
                None => thread.roots.push(i),
                Some(Some(p)) if !thread.is_ancestor_or_self(i, p) => {
                    thread.nodes[i].parent = Some(p);
                    thread.nodes[p].children.push(i);
                }
                Some(_) => thread.orphans.push(i),
            }
        }

        thread
    }

    /// Whether `candidate` is `node` or one of its linked ancestors
    fn is_ancestor_or_self(&self, candidate: usize, node: usize) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.nodes[current].parent;
        }
        false
    }

    pub fn comment_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> impl Iterator<Item = &CommentView> {
        self.roots.iter().map(|&i| &self.nodes[i].comment)
    }

    pub fn orphans(&self) -> impl Iterator<Item = &CommentView> {
        self.orphans.iter().map(|&i| &self.nodes[i].comment)
    }

    /// Nested rendering for API responses. Nesting stops at
    /// `MAX_REPLY_DEPTH`; anything deeper is listed flat, in thread order,
    /// under its ancestor at that level.
    pub fn nested(&self) -> NestedThread {
        NestedThread {
            roots: self.roots.iter().map(|&i| self.nest(i, 0)).collect(),
            orphans: self.orphans.iter().map(|&i| self.nest(i, 0)).collect(),
        }
    }

    fn nest(&self, index: usize, depth: usize) -> ThreadedComment {
        let node = &self.nodes[index];
        let replies = if depth < MAX_REPLY_DEPTH {
            node.children.iter().map(|&c| self.nest(c, depth + 1)).collect()
        } else {
            self.descendants(index)
                .into_iter()
                .map(|i| ThreadedComment {
                    comment: self.nodes[i].comment.clone(),
                    replies: Vec::new(),
                })
                .collect()
        };
        ThreadedComment {
            comment: node.comment.clone(),
            replies,
        }
    }

    /// Every comment below `index`, depth first
    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.nodes[index].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.nodes[current].children.iter().rev());
        }
        found
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadedComment {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<ThreadedComment>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NestedThread {
    pub roots: Vec<ThreadedComment>,
    pub orphans: Vec<ThreadedComment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorSummary;
    use chrono::Utc;

    fn reply_ids<'a>(thread: &'a CommentThread, id: &str) -> Vec<&'a str> {
        thread
            .nodes
            .iter()
            .find(|n| n.comment.id == id)
            .map(|n| n.children.iter().map(|&c| thread.nodes[c].comment.id.as_str()).collect())
            .unwrap_or_default()
    }

    fn comment(id: &str, parent: Option<&str>) -> CommentView {
        let now = Utc::now();
        CommentView {
            id: id.to_string(),
            content: format!("comment {id}"),
            author: AuthorSummary::unknown("u1"),
            blog: "b1".to_string(),
            parent_comment: parent.map(str::to_string),
            likes: vec![],
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_builds_nested_replies_in_listing_order() {
        let thread = CommentThread::build(vec![
            comment("c1", None),
            comment("r2", Some("c1")),
            comment("c2", None),
            comment("r1", Some("c1")),
            comment("rr1", Some("r1")),
        ]);

        let roots: Vec<&str> = thread.roots().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, vec!["c1", "c2"]);
        assert_eq!(reply_ids(&thread, "c1"), vec!["r2", "r1"]);
        assert_eq!(reply_ids(&thread, "r1"), vec!["rr1"]);
        assert_eq!(thread.orphans().count(), 0);
    }

    #[test]
    fn test_reply_listed_before_parent_is_still_attached() {
        let thread = CommentThread::build(vec![comment("r1", Some("c1")), comment("c1", None)]);
        assert_eq!(reply_ids(&thread, "c1"), vec!["r1"]);
        assert_eq!(thread.roots().count(), 1);
    }

    #[test]
    fn test_missing_parent_makes_an_orphan() {
        let thread = CommentThread::build(vec![
            comment("c1", None),
            comment("r1", Some("deleted")),
            comment("rr1", Some("r1")),
        ]);

        let orphans: Vec<&str> = thread.orphans().map(|c| c.id.as_str()).collect();
        assert_eq!(orphans, vec!["r1"]);

        let nested = thread.nested();
        assert_eq!(nested.roots.len(), 1);
        assert_eq!(nested.orphans[0].replies[0].comment.id, "rr1");
    }

    #[test]
    fn test_parent_cycle_is_broken() {
        let thread = CommentThread::build(vec![
            comment("a", Some("b")),
            comment("b", Some("a")),
            comment("self", Some("self")),
        ]);

        assert_eq!(thread.comment_count(), 3);
        let orphans: Vec<&str> = thread.orphans().map(|c| c.id.as_str()).collect();
        assert_eq!(orphans, vec!["b", "self"]);
        assert_eq!(reply_ids(&thread, "b").len(), 1);
    }

    #[test]
    fn test_nested_serialization_flattens_comment() {
        let thread = CommentThread::build(vec![comment("c1", None), comment("r1", Some("c1"))]);
        let json = serde_json::to_value(thread.nested()).unwrap();

        assert_eq!(json["roots"][0]["id"], "c1");
        assert_eq!(json["roots"][0]["replies"][0]["parentComment"], "c1");
        assert!(json["orphans"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_long_reply_chain_renders_flat_below_the_cap() {
        let length = 5_000;
        let mut comments = vec![comment("c0", None)];
        for i in 1..length {
            let parent = format!("c{}", i - 1);
            comments.push(comment(&format!("c{i}"), Some(&parent)));
        }

        let thread = CommentThread::build(comments);
        assert_eq!(thread.comment_count(), length);
        assert_eq!(thread.roots().count(), 1);

        let nested = thread.nested();
        let mut level = &nested.roots[0];
        for _ in 0..MAX_REPLY_DEPTH {
            assert_eq!(level.replies.len(), 1);
            level = &level.replies[0];
        }
        assert_eq!(level.comment.id, format!("c{MAX_REPLY_DEPTH}"));
        assert_eq!(level.replies.len(), length - MAX_REPLY_DEPTH - 1);
        assert!(level.replies.iter().all(|r| r.replies.is_empty()));
        assert_eq!(level.replies[0].comment.id, format!("c{}", MAX_REPLY_DEPTH + 1));

        let json = serde_json::to_string(&nested).unwrap();
        assert!(json.contains(&format!("\"c{}\"", length - 1)));
    }
}
