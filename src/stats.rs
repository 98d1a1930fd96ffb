//! Aggregation engine: summary statistics over an already filtered
//! collection. Every count map is pre-seeded with all enum variants so an
//! empty input yields zeros, never missing keys.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::model::{HazardReport, HazardType, Platform, Sentiment, Severity, SocialPost, Source, Status};

/// Size of the keyword frequency table.
pub const KEYWORD_TABLE_LIMIT: usize = 50;

/// `part` as a percentage of `total`; zero when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Whole-number percentage as shown on the dashboard cards.
pub fn rounded_percentage(part: u64, total: u64) -> u64 {
    percentage(part, total).round() as u64
}

fn zeroed<K: Ord + Copy>(all: &[K]) -> BTreeMap<K, u64> {
    all.iter().map(|k| (*k, 0)).collect()
}

fn bump<K: Ord>(counts: &mut BTreeMap<K, u64>, key: K) {
    *counts.entry(key).or_insert(0) += 1;
}

/// Record types with a summary statistics shape.
pub trait Aggregate {
    type Stats;

    fn aggregate<'a, I>(records: I) -> Self::Stats
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a;
}

pub fn aggregate<'a, R, I>(records: I) -> R::Stats
where
    R: Aggregate + 'a,
    I: IntoIterator<Item = &'a R>,
{
    R::aggregate(records)
}

// =============================================================================
// Hazard reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStats {
    pub total: u64,
    pub by_severity: BTreeMap<Severity, u64>,
    pub by_status: BTreeMap<Status, u64>,
    pub by_source: BTreeMap<Source, u64>,
    pub by_hazard_type: BTreeMap<HazardType, u64>,
}

impl ReportStats {
    pub fn severity(&self, severity: Severity) -> u64 {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn status(&self, status: Status) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn source(&self, source: Source) -> u64 {
        self.by_source.get(&source).copied().unwrap_or(0)
    }

    pub fn verified_share(&self) -> f64 {
        percentage(self.status(Status::Verified), self.total)
    }
}

impl Aggregate for HazardReport {
    type Stats = ReportStats;

    fn aggregate<'a, I>(records: I) -> ReportStats
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut stats = ReportStats {
            total: 0,
            by_severity: zeroed(Severity::ALL),
            by_status: zeroed(Status::ALL),
            by_source: zeroed(Source::ALL),
            by_hazard_type: zeroed(HazardType::ALL),
        };
        for report in records {
            stats.total += 1;
            bump(&mut stats.by_severity, report.severity);
            bump(&mut stats.by_status, report.status);
            bump(&mut stats.by_source, report.source);
            bump(&mut stats.by_hazard_type, report.hazard_type);
        }
        stats
    }
}

// =============================================================================
// Social posts
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementTotals {
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostStats {
    pub total: u64,
    pub by_sentiment: BTreeMap<Sentiment, u64>,
    pub by_platform: BTreeMap<Platform, u64>,
    pub platform_sentiment: BTreeMap<Platform, BTreeMap<Sentiment, u64>>,
    pub engagement: EngagementTotals,
    pub keywords: Vec<KeywordCount>,
    pub distinct_keywords: usize,
}

impl PostStats {
    pub fn sentiment(&self, sentiment: Sentiment) -> u64 {
        self.by_sentiment.get(&sentiment).copied().unwrap_or(0)
    }

    pub fn platform(&self, platform: Platform) -> u64 {
        self.by_platform.get(&platform).copied().unwrap_or(0)
    }

    /// Share of posts with the given sentiment, in percent.
    pub fn sentiment_share(&self, sentiment: Sentiment) -> f64 {
        percentage(self.sentiment(sentiment), self.total)
    }
}

impl Aggregate for SocialPost {
    type Stats = PostStats;

    fn aggregate<'a, I>(records: I) -> PostStats
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut stats = PostStats {
            total: 0,
            by_sentiment: zeroed(Sentiment::ALL),
            by_platform: zeroed(Platform::ALL),
            platform_sentiment: Platform::ALL.iter().map(|p| (*p, zeroed(Sentiment::ALL))).collect(),
            engagement: EngagementTotals::default(),
            keywords: Vec::new(),
            distinct_keywords: 0,
        };
        let mut ranking = KeywordRanking::default();

        for post in records {
            stats.total += 1;
            bump(&mut stats.by_sentiment, post.sentiment);
            bump(&mut stats.by_platform, post.platform);
            if let Some(row) = stats.platform_sentiment.get_mut(&post.platform) {
                bump(row, post.sentiment);
            }
            stats.engagement.likes += post.engagement.likes;
            stats.engagement.shares += post.engagement.shares;
            stats.engagement.comments += post.engagement.comments;
            stats.engagement.total += post.engagement.total();
            for keyword in &post.keywords {
                ranking.add(keyword);
            }
        }

        stats.distinct_keywords = ranking.len();
        stats.keywords = ranking.top(KEYWORD_TABLE_LIMIT);
        stats
    }
}

/// Keyword counts in first-seen order.
#[derive(Default)]
struct KeywordRanking {
    order: Vec<KeywordCount>,
    index: HashMap<String, usize>,
}

impl KeywordRanking {
    fn add(&mut self, keyword: &str) {
        match self.index.get(keyword) {
            Some(&i) => self.order[i].count += 1,
            None => {
                self.index.insert(keyword.to_string(), self.order.len());
                self.order.push(KeywordCount { keyword: keyword.to_string(), count: 1 });
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    /// Descending by count; the stable sort keeps first-seen order on ties.
    fn top(mut self, n: usize) -> Vec<KeywordCount> {
        self.order.sort_by(|a, b| b.count.cmp(&a.count));
        self.order.truncate(n);
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Engagement;
    use crate::sample;
    use chrono::Utc;

    fn post(keywords: &[&str], sentiment: Sentiment, platform: Platform) -> SocialPost {
        SocialPost {
            id: "x".to_string(),
            platform,
            content: String::new(),
            author: "@a".to_string(),
            timestamp: Utc::now(),
            location: None,
            sentiment,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            engagement: Engagement { likes: 3, shares: 2, comments: 1 },
        }
    }

    #[test]
    fn test_empty_reports_all_zero() {
        let stats = aggregate::<HazardReport, _>(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_severity.len(), Severity::ALL.len());
        assert!(stats.by_severity.values().all(|c| *c == 0));
        assert!(stats.by_status.values().all(|c| *c == 0));
        assert!(stats.by_source.values().all(|c| *c == 0));
        assert_eq!(stats.verified_share(), 0.0);
    }

    #[test]
    fn test_empty_posts_all_zero() {
        let stats = aggregate::<SocialPost, _>(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.keywords.is_empty());
        assert_eq!(stats.distinct_keywords, 0);
        assert_eq!(stats.engagement, EngagementTotals::default());
        assert_eq!(stats.sentiment_share(Sentiment::Negative), 0.0);
        assert_eq!(stats.platform_sentiment.len(), Platform::ALL.len());
    }

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(0, 0), 0);
    }

    #[test]
    fn test_keyword_ties_keep_first_seen_order() {
        let posts = vec![
            post(&["beta", "alpha"], Sentiment::Neutral, Platform::Twitter),
            post(&["gamma", "alpha", "beta"], Sentiment::Neutral, Platform::Twitter),
            post(&["delta"], Sentiment::Neutral, Platform::Twitter),
        ];
        let stats = aggregate(&posts);
        let ranked: Vec<(&str, u64)> = stats.keywords.iter().map(|k| (k.keyword.as_str(), k.count)).collect();
        assert_eq!(ranked, vec![("beta", 2), ("alpha", 2), ("gamma", 1), ("delta", 1)]);
        assert_eq!(stats.distinct_keywords, 4);
    }

    #[test]
    fn test_keyword_table_capped() {
        let words: Vec<String> = (0..80).map(|i| format!("kw{}", i)).collect();
        let refs: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
        let posts = vec![post(&refs, Sentiment::Positive, Platform::Youtube)];
        let stats = aggregate(&posts);
        assert_eq!(stats.keywords.len(), KEYWORD_TABLE_LIMIT);
        assert_eq!(stats.distinct_keywords, 80);
        assert_eq!(stats.keywords[0].keyword, "kw0");
    }

    #[test]
    fn test_engagement_and_breakdowns() {
        let posts = vec![
            post(&[], Sentiment::Negative, Platform::Twitter),
            post(&[], Sentiment::Positive, Platform::Twitter),
            post(&[], Sentiment::Negative, Platform::Facebook),
        ];
        let stats = aggregate(&posts);
        assert_eq!(stats.engagement.likes, 9);
        assert_eq!(stats.engagement.total, 18);
        assert_eq!(stats.platform(Platform::Twitter), 2);
        assert_eq!(stats.platform(Platform::Youtube), 0);
        assert_eq!(stats.platform_sentiment[&Platform::Twitter][&Sentiment::Negative], 1);
        assert_eq!(stats.platform_sentiment[&Platform::Facebook][&Sentiment::Negative], 1);
        assert_eq!(rounded_percentage(stats.sentiment(Sentiment::Negative), stats.total), 67);
    }

    #[test]
    fn test_sample_report_counts() {
        let reports = sample::hazard_reports();
        let stats = aggregate(&reports);
        assert_eq!(stats.total, 20);
        assert_eq!(stats.severity(Severity::Critical), 4);
        assert_eq!(stats.severity(Severity::Low), 0);
        assert_eq!(stats.status(Status::Verified) + stats.status(Status::Pending), 20);
        assert_eq!(stats.source(Source::SocialMedia), 2);
    }

    #[test]
    fn test_stats_json_keys_are_snake_case() {
        let stats = aggregate::<HazardReport, _>(&[]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_status"]["false_alarm"], 0);
        assert_eq!(json["by_hazard_type"]["abnormal_sea_behavior"], 0);
    }
}
