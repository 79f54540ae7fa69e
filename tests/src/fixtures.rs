//! Seed data shared by the end-to-end tests.
//!
//! | id | name                  | base classification         | facts (2024-03-01)          |
//! |----|-----------------------|-----------------------------|-----------------------------|
//! | 1  | Google Search Brand   | Google / Search             | 10 sessions at 10:00        |
//! | 2  | Google Search Generic | Google / Search             | 20 sessions at 11:00        |
//! | 3  | Facebook Mobile Feed  | Facebook / Social           | 100+50 sessions, 25+10 regs |
//! | 4  | Reddit Promoted       | Reddit / Community          | none                        |
//! | 5  | Untracked Display     | none                        | 40 sessions on 2024-03-02   |

use chrono::{NaiveDate, Utc};
use dashboard_core::{Campaign, CampaignId, ClassificationMapping, RawCounters, SECONDS_PER_HOUR};
use rollup_engine::memory::InMemoryStore;

pub const FACT_DAY: &str = "2024-03-01";
pub const NEXT_DAY: &str = "2024-03-02";

pub const GOOGLE_BRAND: CampaignId = 1;
pub const GOOGLE_GENERIC: CampaignId = 2;
pub const FACEBOOK_FEED: CampaignId = 3;
pub const REDDIT_IDLE: CampaignId = 4;
pub const UNMAPPED_DISPLAY: CampaignId = 5;

/// Unix hour for `hour:00` UTC on a `YYYY-MM-DD` day.
pub fn unix_hour(day: &str, hour: u32) -> i64 {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
    date.and_hms_opt(hour, 0, 0).unwrap().and_utc().timestamp() / SECONDS_PER_HOUR
}

pub fn counters(sessions: u64, registrations: u64, converted_users: u64) -> RawCounters {
    RawCounters {
        sessions,
        registrations,
        converted_users,
        ..Default::default()
    }
}

pub fn mapping(campaign_id: CampaignId, network: &str, domain: &str) -> ClassificationMapping {
    ClassificationMapping {
        campaign_id,
        network: network.into(),
        domain: domain.into(),
        placement: "Feed".into(),
        targeting: "Broad".into(),
        special: "Standard".into(),
        confidence: 0.8,
        updated_at: Utc::now(),
    }
}

/// Populate `store` with the table above.
pub fn seed(store: &InMemoryStore) {
    store.insert_campaign(Campaign::new(GOOGLE_BRAND, "Google Search Brand"));
    store.insert_campaign(Campaign::new(GOOGLE_GENERIC, "Google Search Generic"));
    store.insert_campaign(Campaign::new(FACEBOOK_FEED, "Facebook Mobile Feed"));
    store.insert_campaign(Campaign::new(REDDIT_IDLE, "Reddit Promoted"));
    store.insert_campaign(Campaign::new(UNMAPPED_DISPLAY, "Untracked Display"));

    store.insert_mapping(mapping(GOOGLE_BRAND, "Google", "Search"));
    store.insert_mapping(mapping(GOOGLE_GENERIC, "Google", "Search"));
    store.insert_mapping(mapping(FACEBOOK_FEED, "Facebook", "Social"));
    store.insert_mapping(mapping(REDDIT_IDLE, "Reddit", "Community"));

    store.insert_fact(GOOGLE_BRAND, unix_hour(FACT_DAY, 10), counters(10, 1, 0));
    store.insert_fact(GOOGLE_GENERIC, unix_hour(FACT_DAY, 11), counters(20, 2, 1));
    store.insert_fact(FACEBOOK_FEED, unix_hour(FACT_DAY, 12), counters(100, 25, 5));
    store.insert_fact(FACEBOOK_FEED, unix_hour(FACT_DAY, 13), counters(50, 10, 2));
    store.insert_fact(UNMAPPED_DISPLAY, unix_hour(NEXT_DAY, 9), counters(40, 4, 0));
}
