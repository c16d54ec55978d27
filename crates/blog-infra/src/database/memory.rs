//! In-memory repositories - used when no database is configured, and in tests.
//!
//! All three repositories share one [`MemoryStore`] so that deleting a post
//! can drop its comments under the same lock. Data is lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    // Kept in insertion order.
    comments: Vec<Comment>,
}

/// Shared backing store for the in-memory repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Replace the row with the same id, or append.
fn upsert<T: Clone>(rows: &mut Vec<T>, row: T, same: impl Fn(&T) -> bool) -> T {
    match rows.iter_mut().find(|r| same(r)) {
        Some(existing) => *existing = row.clone(),
        None => rows.push(row.clone()),
    }
    row
}

pub struct InMemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint(format!(
                "username {} already exists",
                user.username
            )));
        }

        let id = user.id;
        Ok(upsert(&mut tables.users, user, |u| u.id == id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }

        // Posts cascade with their author, and comments with their posts.
        let orphaned: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|p| p.author_id != id);
        tables.comments.retain(|c| !orphaned.contains(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

pub struct InMemoryPostRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryPostRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        let id = post.id;
        Ok(upsert(&mut tables.posts, post, |p| p.id == id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }

        tables.comments.retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_published(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.is_published(now))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn list_drafts(&self) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.is_draft())
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.created_at);
        Ok(posts)
    }
}

pub struct InMemoryCommentRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryCommentRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;

        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }

        let id = comment.id;
        Ok(upsert(&mut tables.comments, comment, |c| c.id == id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn find_approved_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    struct Repos {
        posts: InMemoryPostRepository,
        comments: InMemoryCommentRepository,
    }

    fn repos() -> Repos {
        let store = MemoryStore::new();
        Repos {
            posts: InMemoryPostRepository::new(store.clone()),
            comments: InMemoryCommentRepository::new(store),
        }
    }

    fn post(title: &str) -> Post {
        Post::new(Uuid::new_v4(), title.to_string(), "body".to_string())
    }

    #[tokio::test]
    async fn test_published_list_excludes_drafts_and_future_posts() {
        let repos = repos();
        let now = Utc::now();

        let mut older = post("older");
        older.publish_at(now - TimeDelta::days(2));
        let mut newer = post("newer");
        newer.publish_at(now - TimeDelta::hours(1));
        let mut scheduled = post("scheduled");
        scheduled.publish_at(now + TimeDelta::days(1));
        let draft = post("draft");

        for p in [older, newer, scheduled, draft] {
            repos.posts.save(p).await.unwrap();
        }

        let titles: Vec<String> = repos
            .posts
            .list_published(now)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);

        let drafts = repos.posts.list_drafts().await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "draft");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_post() {
        let repos = repos();
        let mut p = repos.posts.save(post("first")).await.unwrap();

        p.edit("second".to_string(), "changed".to_string());
        repos.posts.save(p.clone()).await.unwrap();

        let found = repos.posts.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(found.title, "second");
        assert_eq!(repos.posts.list_drafts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_post_cascades_to_comments() {
        let repos = repos();
        let keep = repos.posts.save(post("keep")).await.unwrap();
        let doomed = repos.posts.save(post("doomed")).await.unwrap();

        let c1 = Comment::new(doomed.id, "a".to_string(), "x".to_string());
        let c2 = Comment::new(keep.id, "b".to_string(), "y".to_string());
        repos.comments.save(c1.clone()).await.unwrap();
        repos.comments.save(c2.clone()).await.unwrap();

        repos.posts.delete(doomed.id).await.unwrap();

        assert!(repos.comments.find_by_id(c1.id).await.unwrap().is_none());
        assert!(repos.comments.find_by_id(c2.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let repos = repos();
        let result = repos.posts.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_approved_comments_in_insertion_order() {
        let repos = repos();
        let p = repos.posts.save(post("p")).await.unwrap();

        let mut first = Comment::new(p.id, "first".to_string(), "1".to_string());
        first.approve();
        let pending = Comment::new(p.id, "pending".to_string(), "2".to_string());
        let mut last = Comment::new(p.id, "last".to_string(), "3".to_string());
        last.approve();

        for c in [first, pending, last] {
            repos.comments.save(c).await.unwrap();
        }

        let approved: Vec<String> = repos
            .comments
            .find_approved_by_post(p.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.author)
            .collect();
        assert_eq!(approved, vec!["first", "last"]);
        assert_eq!(repos.comments.find_by_post(p.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let repos = repos();
        let orphan = Comment::new(Uuid::new_v4(), "a".to_string(), "x".to_string());

        let result = repos.comments.save(orphan).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let users = InMemoryUserRepository::new(MemoryStore::new());
        users
            .save(User::new("admin".to_string(), "h".to_string()))
            .await
            .unwrap();

        let result = users
            .save(User::new("admin".to_string(), "h2".to_string()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert!(users.find_by_username("admin").await.unwrap().is_some());
    }
}
