//! Simulated post producer for demos and local runs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::logging::{log, obj, Domain, Level};
use crate::model::{Engagement, Platform, Sentiment, SocialPost};

const CONTENT: &str = "New social media post about ocean conditions...";
const KEYWORDS: [&str; 3] = ["waves", "ocean", "weather"];

pub struct PostGenerator {
    rng: StdRng,
    seq: u64,
}

impl PostGenerator {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy(), seq: 0 }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), seq: 0 }
    }

    pub fn generate(&mut self, now: DateTime<Utc>) -> SocialPost {
        self.seq += 1;
        let platform = Platform::ALL[self.rng.gen_range(0..Platform::ALL.len())];
        let sentiment = Sentiment::ALL[self.rng.gen_range(0..Sentiment::ALL.len())];
        SocialPost {
            id: format!("live-{}-{}", now.timestamp_millis(), self.seq),
            platform,
            content: CONTENT.to_string(),
            author: format!("@user{}", self.rng.gen_range(0..1000)),
            timestamp: now,
            location: None,
            sentiment,
            keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
            engagement: Engagement {
                likes: self.rng.gen_range(0..100),
                shares: self.rng.gen_range(0..50),
                comments: self.rng.gen_range(0..25),
            },
        }
    }
}

impl Default for PostGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends one generated post per tick until the receiver is dropped.
pub async fn run_producer(mut generator: PostGenerator, every: Duration, tx: mpsc::Sender<SocialPost>) {
    log(
        Level::Info,
        Domain::Feed,
        "simulator_started",
        obj(&[("interval_secs", serde_json::json!(every.as_secs()))]),
    );
    let mut ticker = interval(every);
    // First tick fires immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if tx.send(generator.generate(Utc::now())).await.is_err() {
            break;
        }
    }
    log(Level::Info, Domain::Feed, "simulator_stopped", obj(&[]));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_post_shape() {
        let mut gen = PostGenerator::seeded(7);
        let now = Utc::now();
        let a = gen.generate(now);
        let b = gen.generate(now);
        assert_ne!(a.id, b.id);
        assert!(a.location.is_none());
        assert_eq!(a.keywords, vec!["waves", "ocean", "weather"]);
        assert!(a.engagement.likes < 100 && a.engagement.shares < 50 && a.engagement.comments < 25);
        assert!(a.author.starts_with("@user"));
    }

    #[tokio::test]
    async fn test_producer_stops_when_receiver_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(run_producer(PostGenerator::seeded(1), Duration::from_millis(5), tx));
        let first = rx.recv().await.unwrap();
        assert!(first.id.starts_with("live-"));
        drop(rx);
        task.await.unwrap();
    }
}
