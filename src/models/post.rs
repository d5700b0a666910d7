//! Community feed post model.
//!
//! Likes, comments and replies live inside the post document. All mutations
//! here are in-memory transforms; the caller persists the whole document with
//! a version check.

use serde::{Deserialize, Serialize};

use super::{required_text, Document, Stored};
use crate::errors::{AppError, AppResult};

/// Author details copied into posts, comments and replies at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// An uploaded image or video attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub url: String,
    pub content_type: String,
}

impl MediaItem {
    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}

/// Single-level reply to a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub author: AuthorSnapshot,
    pub text: String,
    pub created_at: String,
}

/// Top-level comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: AuthorSnapshot,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// A user-authored entry in the community feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub author: AuthorSnapshot,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// User IDs that liked the post, without duplicates
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Diary this post was shared from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diary_id: Option<String>,
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";
    const KIND: &'static str = "Post";
}

impl Post {
    /// Build a post, rejecting one with neither text nor media.
    pub fn new(author: AuthorSnapshot, text: &str, media: Vec<MediaItem>) -> AppResult<Self> {
        let text = text.trim().to_string();
        if text.is_empty() && media.is_empty() {
            return Err(AppError::Validation(
                "A post needs text or at least one media file".to_string(),
            ));
        }
        Ok(Self {
            author,
            text,
            media,
            likes: Vec::new(),
            comments: Vec::new(),
            diary_id: None,
        })
    }

    pub fn ensure_author(&self, user_id: &str) -> AppResult<()> {
        if self.author.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can change this post".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the text of the post. Only the author may do this.
    pub fn edit_text(&mut self, user_id: &str, text: &str) -> AppResult<()> {
        self.ensure_author(user_id)?;
        let text = text.trim();
        if text.is_empty() && self.media.is_empty() {
            return Err(AppError::Validation(
                "A post needs text or at least one media file".to_string(),
            ));
        }
        self.text = text.to_string();
        Ok(())
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    /// Add or remove `user_id` from the likes. Returns whether the post is now liked.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if self.is_liked_by(user_id) {
            self.likes.retain(|id| id != user_id);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }

    fn comment_mut(&mut self, comment_id: &str) -> AppResult<&mut Comment> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))
    }

    /// Append a comment and return it.
    pub fn add_comment(
        &mut self,
        id: String,
        author: AuthorSnapshot,
        text: &str,
        now: String,
    ) -> AppResult<&Comment> {
        let text = required_text("Comment text", text)?;
        self.comments.push(Comment {
            id,
            author,
            text,
            created_at: now,
            edited_at: None,
            replies: Vec::new(),
        });
        Ok(&self.comments[self.comments.len() - 1])
    }

    /// Change the text of a comment. Only its author may do this.
    pub fn edit_comment(
        &mut self,
        comment_id: &str,
        user_id: &str,
        text: &str,
        now: String,
    ) -> AppResult<()> {
        let text = required_text("Comment text", text)?;
        let comment = self.comment_mut(comment_id)?;
        if comment.author.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this comment".to_string(),
            ));
        }
        comment.text = text;
        comment.edited_at = Some(now);
        Ok(())
    }

    /// Remove a comment together with its replies. Only its author may do this.
    pub fn delete_comment(&mut self, comment_id: &str, user_id: &str) -> AppResult<Comment> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        if self.comments[index].author.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this comment".to_string(),
            ));
        }
        Ok(self.comments.remove(index))
    }

    /// Append a reply under a comment and return it.
    pub fn add_reply(
        &mut self,
        comment_id: &str,
        id: String,
        author: AuthorSnapshot,
        text: &str,
        now: String,
    ) -> AppResult<&Reply> {
        let text = required_text("Reply text", text)?;
        let comment = self.comment_mut(comment_id)?;
        comment.replies.push(Reply {
            id,
            author,
            text,
            created_at: now,
        });
        Ok(&comment.replies[comment.replies.len() - 1])
    }

    /// Remove a reply. Only its author may do this.
    pub fn delete_reply(&mut self, comment_id: &str, reply_id: &str, user_id: &str) -> AppResult<()> {
        let comment = self.comment_mut(comment_id)?;
        let index = comment
            .replies
            .iter()
            .position(|r| r.id == reply_id)
            .ok_or_else(|| AppError::not_found("Reply", reply_id))?;
        if comment.replies[index].author.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this reply".to_string(),
            ));
        }
        comment.replies.remove(index);
        Ok(())
    }
}

/// Post as shown in the feed, with counts recomputed from the arrays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Stored<Post>,
    pub like_count: usize,
    pub comment_count: usize,
    pub liked_by_user: bool,
}

impl PostView {
    pub fn new(post: Stored<Post>, viewer: Option<&str>) -> Self {
        Self {
            like_count: post.doc.likes.len(),
            comment_count: post.doc.comments.len(),
            liked_by_user: viewer.is_some_and(|id| post.doc.is_liked_by(id)),
            post,
        }
    }
}

/// Request body for editing a post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub text: String,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for a comment or reply.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: &str) -> AuthorSnapshot {
        AuthorSnapshot {
            user_id: id.to_string(),
            display_name: id.to_uppercase(),
            photo_url: None,
        }
    }

    fn post() -> Post {
        Post::new(author("alice"), "Sunrise at Batur", Vec::new()).unwrap()
    }

    fn stored(post: Post) -> Stored<Post> {
        Stored {
            id: "p1".to_string(),
            version: 1,
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
            doc: post,
        }
    }

    #[test]
    fn test_empty_post_is_rejected() {
        assert!(Post::new(author("alice"), "   ", Vec::new()).is_err());

        let media = vec![MediaItem {
            url: "https://cdn.example/a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
        }];
        let media_only = Post::new(author("alice"), "", media).unwrap();
        assert_eq!(media_only.text, "");
        assert!(!media_only.media[0].is_video());
    }

    #[test]
    fn test_toggle_like_flips_state_and_count() {
        let mut post = post();
        let before = PostView::new(stored(post.clone()), Some("bob"));
        assert!(!before.liked_by_user);

        assert!(post.toggle_like("bob"));
        let after = PostView::new(stored(post.clone()), Some("bob"));
        assert!(after.liked_by_user);
        assert_eq!(after.like_count, before.like_count + 1);

        assert!(!post.toggle_like("bob"));
        let back = PostView::new(stored(post.clone()), Some("bob"));
        assert!(!back.liked_by_user);
        assert_eq!(back.like_count, before.like_count);
    }

    #[test]
    fn test_even_toggles_restore_likes() {
        let mut post = post();
        post.toggle_like("carol");
        let original = post.likes.clone();

        for _ in 0..6 {
            post.toggle_like("bob");
        }
        assert_eq!(post.likes, original);
    }

    #[test]
    fn test_likes_from_different_users_are_independent() {
        let mut post = post();
        post.toggle_like("bob");
        post.toggle_like("carol");
        post.toggle_like("bob");

        assert_eq!(post.likes, vec!["carol".to_string()]);
        let view = PostView::new(stored(post), None);
        assert!(!view.liked_by_user);
        assert_eq!(view.like_count, 1);
    }

    #[test]
    fn test_whitespace_comment_is_rejected() {
        let mut post = post();
        let err = post
            .add_comment("c1".to_string(), author("bob"), " \n ", "t".to_string())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_comment_edit_and_delete_are_author_only() {
        let mut post = post();
        post.add_comment("c1".to_string(), author("bob"), " Nice! ", "t1".to_string())
            .unwrap();
        assert_eq!(post.comments[0].text, "Nice!");

        let err = post
            .edit_comment("c1", "alice", "hijack", "t2".to_string())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        post.edit_comment("c1", "bob", "Very nice!", "t2".to_string())
            .unwrap();
        assert_eq!(post.comments[0].text, "Very nice!");
        assert_eq!(post.comments[0].edited_at.as_deref(), Some("t2"));

        assert!(post.delete_comment("c1", "alice").is_err());
        post.delete_comment("c1", "bob").unwrap();
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_replies_nest_under_their_comment() {
        let mut post = post();
        post.add_comment("c1".to_string(), author("bob"), "first", "t1".to_string())
            .unwrap();
        post.add_comment("c2".to_string(), author("carol"), "second", "t2".to_string())
            .unwrap();

        post.add_reply("c2", "r1".to_string(), author("alice"), "thanks", "t3".to_string())
            .unwrap();
        assert!(post.comments[0].replies.is_empty());
        assert_eq!(post.comments[1].replies[0].text, "thanks");

        assert!(post
            .add_reply("missing", "r2".to_string(), author("alice"), "x", "t4".to_string())
            .is_err());
        assert!(post
            .add_reply("c1", "r3".to_string(), author("alice"), "  ", "t4".to_string())
            .is_err());

        assert!(post.delete_reply("c2", "r1", "bob").is_err());
        post.delete_reply("c2", "r1", "alice").unwrap();
        assert!(post.comments[1].replies.is_empty());

        let view = PostView::new(stored(post), Some("alice"));
        assert_eq!(view.comment_count, 2);
    }

    #[test]
    fn test_edit_text_is_author_only() {
        let mut post = post();
        assert!(post.edit_text("bob", "mine now").is_err());
        assert!(post.edit_text("alice", "  ").is_err());
        post.edit_text("alice", "Sunset at Uluwatu").unwrap();
        assert_eq!(post.text, "Sunset at Uluwatu");
    }
}
