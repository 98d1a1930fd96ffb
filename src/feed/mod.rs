//! Live social feed: a bounded, newest-first window of posts.
//!
//! Producers push; readers take a snapshot and run the filter and
//! aggregation engines over it without knowing where posts came from.

pub mod simulate;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::SocialPost;

pub const DEFAULT_CAPACITY: usize = 50;

pub type SharedFeed = Arc<RwLock<LiveFeed>>;

#[derive(Debug, Clone)]
pub struct LiveFeed {
    posts: VecDeque<SocialPost>,
    capacity: usize,
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { posts: VecDeque::with_capacity(capacity), capacity }
    }

    /// Seeds the window from posts already ordered newest first; anything
    /// past `capacity` is dropped.
    pub fn with_posts(capacity: usize, posts: Vec<SocialPost>) -> Self {
        let mut feed = Self::new(capacity);
        feed.posts.extend(posts.into_iter().take(feed.capacity));
        feed
    }

    /// Prepends `post`, evicting the oldest entry once the window is full.
    pub fn push(&mut self, post: SocialPost) {
        self.posts.push_front(post);
        self.posts.truncate(self.capacity);
    }

    pub fn snapshot(&self) -> Vec<SocialPost> {
        self.posts.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn shared(self) -> SharedFeed {
        Arc::new(RwLock::new(self))
    }
}

/// Drains `rx` into the shared feed until every sender is dropped.
pub async fn run_consumer(feed: SharedFeed, mut rx: mpsc::Receiver<SocialPost>) {
    while let Some(post) = rx.recv().await {
        let id = post.id.clone();
        let len = {
            let mut guard = feed.write().await;
            guard.push(post);
            guard.len()
        };
        log(
            Level::Debug,
            Domain::Feed,
            "post_ingested",
            obj(&[("post_id", v_str(&id)), ("window", serde_json::json!(len))]),
        );
    }
    log(Level::Info, Domain::Feed, "consumer_stopped", obj(&[]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn post(id: &str) -> SocialPost {
        let mut p = sample::social_posts().remove(0);
        p.id = id.to_string();
        p
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut feed = LiveFeed::new(3);
        feed.push(post("a"));
        feed.push(post("b"));
        let ids: Vec<_> = feed.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut feed = LiveFeed::new(3);
        for id in ["1", "2", "3", "4", "5"] {
            feed.push(post(id));
        }
        assert_eq!(feed.len(), 3);
        let ids: Vec<_> = feed.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["5", "4", "3"]);
    }

    #[test]
    fn test_seed_truncates_to_capacity() {
        let feed = LiveFeed::with_posts(4, sample::social_posts());
        assert_eq!(feed.len(), 4);
        assert_eq!(feed.snapshot()[0].id, "1");
        assert_eq!(LiveFeed::new(0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_consumer_applies_channel_posts() {
        let feed = LiveFeed::new(DEFAULT_CAPACITY).shared();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(run_consumer(feed.clone(), rx));
        tx.send(post("x")).await.unwrap();
        tx.send(post("y")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        let snap = feed.read().await.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, "y");
    }
}
