//! Built-in sample dataset: twenty hazard reports along the Indian coast and
//! ten social posts about the same events. Used to seed a fresh database and
//! the live feed, and as a fixture in tests.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use crate::logging::{log, obj, Domain, Level};
use crate::storage::StateStore;

use crate::model::{
    Engagement, GeoPoint, HazardReport, HazardType, Platform, Sentiment, SocialPost, Severity, Source, Status,
};

/// All sample timestamps fall in January 2024.
fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn geo(lat: f64, lng: f64, address: &str) -> GeoPoint {
    GeoPoint { lat, lng, address: address.to_string() }
}

#[allow(clippy::too_many_arguments)]
fn report(
    id: &str,
    hazard_type: HazardType,
    description: &str,
    location: GeoPoint,
    timestamp: DateTime<Utc>,
    severity: Severity,
    source: Source,
    status: Status,
    media: Option<&str>,
    reported_by: &str,
) -> HazardReport {
    HazardReport {
        id: id.to_string(),
        hazard_type,
        description: description.to_string(),
        location,
        timestamp,
        severity,
        source,
        status,
        media: media.map(|m| vec![m.to_string()]),
        reported_by: reported_by.to_string(),
    }
}

pub fn hazard_reports() -> Vec<HazardReport> {
    use HazardType::*;
    use Severity::{Critical, High, Medium};
    use Status::{Pending, Verified};

    vec![
        report(
            "1",
            HighWaves,
            "Unusually high waves observed at Marina Beach, approximately 4-5 meters high. Waves are crashing over the promenade and flooding nearby roads. Local fishermen have moved their boats to safety.",
            geo(13.0475, 80.2824, "Marina Beach, Chennai, Tamil Nadu"),
            at(15, 10, 30),
            High,
            Source::Citizen,
            Verified,
            Some("/high-waves-at-beach.jpg"),
            "Rajesh Kumar - Local Fisherman",
        ),
        report(
            "2",
            Flooding,
            "Coastal flooding in low-lying areas due to high tide combined with strong winds. Water has entered shops and homes near the beach road. Traffic is being diverted.",
            geo(11.9416, 79.8083, "Puducherry Promenade, Puducherry"),
            at(15, 8, 15),
            Medium,
            Source::Official,
            Verified,
            None,
            "INCOIS Puducherry Station",
        ),
        report(
            "3",
            AbnormalSeaBehavior,
            "Sea water receding unusually far from shore, exposing coral reefs that are normally underwater. Local residents are concerned about potential tsunami activity.",
            geo(8.0883, 77.5385, "Kanyakumari Beach, Tamil Nadu"),
            at(15, 6, 45),
            Critical,
            Source::Citizen,
            Pending,
            Some("/receding-sea-water.jpg"),
            "Murugan S - Local Fisherman",
        ),
        report(
            "4",
            StormSurge,
            "Storm surge affecting coastal areas, water levels rising rapidly due to cyclonic activity. Waves reaching 6-7 meters height at Juhu Beach.",
            geo(19.076, 72.8777, "Juhu Beach, Mumbai, Maharashtra"),
            at(14, 22, 30),
            High,
            Source::SocialMedia,
            Verified,
            None,
            "Mumbai Weather Updates",
        ),
        report(
            "5",
            Tsunami,
            "Small tsunami waves observed following underwater seismic activity. Waves approximately 1-2 meters above normal high tide level. Coastal areas evacuated as precaution.",
            geo(11.7401, 92.6586, "Port Blair, Andaman and Nicobar Islands"),
            at(15, 14, 20),
            Critical,
            Source::Official,
            Verified,
            None,
            "INCOIS Tsunami Warning Center",
        ),
        report(
            "6",
            HighWaves,
            "Extremely high waves due to monsoon winds. Fishing activities suspended. Waves breaking over sea walls and flooding coastal roads.",
            geo(15.2993, 74.124, "Panaji Beach, Goa"),
            at(15, 12, 45),
            High,
            Source::Citizen,
            Verified,
            Some("/goa-high-waves.jpg"),
            "Antonio D'Silva - Beach Resort Owner",
        ),
        report(
            "7",
            CoastalErosion,
            "Severe coastal erosion observed after recent storms. Beach has receded by approximately 15 meters. Several coconut trees have fallen into the sea.",
            geo(10.8505, 76.2711, "Fort Kochi Beach, Kerala"),
            at(14, 16, 30),
            Medium,
            Source::Citizen,
            Pending,
            Some("/sea-foam-puri.jpg"),
            "Priya Nair - Environmental Activist",
        ),
        report(
            "8",
            Flooding,
            "Tidal flooding in low-lying fishing village. Water has entered homes and damaged fishing nets. Community seeking immediate assistance.",
            geo(16.216, 81.804, "Kakinada Beach, Andhra Pradesh"),
            at(15, 7, 20),
            Medium,
            Source::Citizen,
            Verified,
            None,
            "Venkata Rao - Village Head",
        ),
        report(
            "9",
            AbnormalSeaBehavior,
            "Unusual sea foam and discoloration observed. Strong sulfur smell reported. Marine life appearing distressed. Possible underwater volcanic activity.",
            geo(20.2961, 85.8245, "Puri Beach, Odisha"),
            at(15, 9, 15),
            High,
            Source::Citizen,
            Pending,
            Some("/sea-foam-puri.jpg"),
            "Dr. Subash Panda - Marine Biologist",
        ),
        report(
            "10",
            StormSurge,
            "Storm surge from Bay of Bengal cyclone. Waves overtopping embankments. Emergency evacuation of coastal villages in progress.",
            geo(13.6288, 79.4192, "Mahabalipuram, Tamil Nadu"),
            at(15, 11, 45),
            Critical,
            Source::Official,
            Verified,
            None,
            "Tamil Nadu Disaster Management",
        ),
        report(
            "11",
            HighWaves,
            "Massive waves hitting the lighthouse area. Spray reaching up to 20 meters height. Tourists advised to maintain safe distance from shore.",
            geo(22.4707, 69.7725, "Dwarka Lighthouse, Gujarat"),
            at(15, 13, 30),
            Medium,
            Source::Citizen,
            Verified,
            None,
            "Ramesh Patel - Lighthouse Keeper",
        ),
        report(
            "12",
            Flooding,
            "King tide flooding combined with heavy rainfall. Water logging in Colaba area. Marine Drive partially submerged.",
            geo(18.9067, 72.8147, "Marine Drive, Mumbai, Maharashtra"),
            at(15, 5, 45),
            Medium,
            Source::SocialMedia,
            Verified,
            None,
            "Mumbai Traffic Police",
        ),
        report(
            "13",
            Tsunami,
            "Minor tsunami waves detected by deep ocean sensors. Wave height 0.5-1 meter above normal. Coastal monitoring stations on high alert.",
            geo(12.2958, 76.6394, "Mangalore Coast, Karnataka"),
            at(15, 15, 10),
            High,
            Source::Official,
            Verified,
            None,
            "INCOIS Deep Ocean Monitoring",
        ),
        report(
            "14",
            CoastalErosion,
            "Rapid beach erosion following cyclone. Sand dunes completely washed away. Coastal highway under threat.",
            geo(19.6176, 85.2799, "Chandipur Beach, Odisha"),
            at(14, 18, 20),
            High,
            Source::Citizen,
            Pending,
            None,
            "Bikash Mohanty - Local Resident",
        ),
        report(
            "15",
            AbnormalSeaBehavior,
            "Sea turning unusual reddish color with dead fish washing ashore. Possible algal bloom or pollution incident. Foul smell reported.",
            geo(17.6868, 83.2185, "Visakhapatnam Beach, Andhra Pradesh"),
            at(15, 8, 50),
            Medium,
            Source::Citizen,
            Pending,
            Some("/red-sea-vizag.jpg"),
            "Lakshmi Devi - Fish Vendor",
        ),
        report(
            "16",
            HighWaves,
            "Dangerous waves at popular surfing spot. Several surfers rescued by coast guard. Beach closed for public safety.",
            geo(8.3869, 76.956, "Kovalam Beach, Kerala"),
            at(15, 14, 15),
            High,
            Source::Official,
            Verified,
            None,
            "Kerala Coast Guard",
        ),
        report(
            "17",
            Flooding,
            "Backwater flooding due to high tide and heavy rains. Houseboat operations suspended. Water entering ground floor of waterfront buildings.",
            geo(9.4981, 76.3388, "Alleppey Backwaters, Kerala"),
            at(15, 6, 30),
            Medium,
            Source::Citizen,
            Verified,
            None,
            "Thomas Joseph - Houseboat Operator",
        ),
        report(
            "18",
            StormSurge,
            "Severe storm surge from Arabian Sea depression. Waves reaching 8 meters. Fishing harbor completely flooded.",
            geo(21.8974, 70.202, "Porbandar Harbor, Gujarat"),
            at(14, 20, 45),
            Critical,
            Source::Official,
            Verified,
            None,
            "Gujarat Maritime Board",
        ),
        report(
            "19",
            AbnormalSeaBehavior,
            "Unusual whirlpool formation observed 2 km from shore. Strong underwater currents detected. Fishing boats advised to avoid the area.",
            geo(14.0426, 74.9956, "Karwar Coast, Karnataka"),
            at(15, 10, 20),
            High,
            Source::Citizen,
            Pending,
            None,
            "Captain Suresh Naik - Fishing Vessel",
        ),
        report(
            "20",
            CoastalErosion,
            "Accelerated erosion threatening ancient temple complex. Sea has advanced 50 meters inland in past month. Archaeological site at risk.",
            geo(12.6186, 80.1919, "Mamallapuram Shore Temple, Tamil Nadu"),
            at(15, 12, 0),
            High,
            Source::Official,
            Verified,
            None,
            "Archaeological Survey of India",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn post(
    id: &str,
    platform: Platform,
    content: &str,
    author: &str,
    timestamp: DateTime<Utc>,
    location: GeoPoint,
    keywords: &[&str],
    engagement: (u64, u64, u64),
) -> SocialPost {
    SocialPost {
        id: id.to_string(),
        platform,
        content: content.to_string(),
        author: author.to_string(),
        timestamp,
        location: Some(location),
        sentiment: Sentiment::Negative,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        engagement: Engagement {
            likes: engagement.0,
            shares: engagement.1,
            comments: engagement.2,
        },
    }
}

pub fn social_posts() -> Vec<SocialPost> {
    use Platform::{Facebook, Twitter, Youtube};

    vec![
        post(
            "1",
            Twitter,
            "Massive waves hitting Chennai coast! Never seen anything like this before #ChennaiFloods #Tsunami #HighWaves",
            "@chennai_local",
            at(15, 11, 0),
            geo(13.0475, 80.2824, "Chennai, Tamil Nadu"),
            &["waves", "Chennai", "tsunami", "floods", "massive"],
            (245, 89, 34),
        ),
        post(
            "2",
            Facebook,
            "Water levels rising in Puducherry. Authorities should take immediate action. Promenade completely flooded!",
            "Coastal Watch Group",
            at(15, 9, 30),
            geo(11.9416, 79.8083, "Puducherry"),
            &["water levels", "Puducherry", "authorities", "action", "flooded"],
            (156, 67, 23),
        ),
        post(
            "3",
            Twitter,
            "URGENT: Sea receding rapidly at Kanyakumari! This looks exactly like 2004 tsunami warning signs. Everyone please move to higher ground immediately! #TsunamiAlert #Kanyakumari",
            "@tsunami_watch_india",
            at(15, 7, 0),
            geo(8.0883, 77.5385, "Kanyakumari, Tamil Nadu"),
            &["sea receding", "tsunami", "Kanyakumari", "urgent", "warning"],
            (892, 456, 123),
        ),
        post(
            "4",
            Youtube,
            "Live footage of storm surge hitting Mumbai coastline. Waves are massive! Stay safe everyone. #MumbaiStorm #StormSurge",
            "Mumbai Weather Live",
            at(14, 23, 15),
            geo(19.076, 72.8777, "Mumbai, Maharashtra"),
            &["storm surge", "Mumbai", "waves", "massive", "live footage"],
            (1234, 567, 89),
        ),
        post(
            "5",
            Facebook,
            "Port Blair experiencing unusual wave activity. Tsunami warning sirens activated. All coastal residents please evacuate immediately as per disaster management protocol.",
            "Andaman Nicobar Administration",
            at(15, 14, 30),
            geo(11.7401, 92.6586, "Port Blair, Andaman and Nicobar Islands"),
            &["Port Blair", "tsunami warning", "evacuate", "wave activity", "sirens"],
            (445, 234, 67),
        ),
        post(
            "6",
            Twitter,
            "Goa beaches closed due to dangerous waves. Monsoon fury at its peak! #GoaWeather #HighWaves #MonsoonAlert",
            "@goa_tourism_official",
            at(15, 13, 0),
            geo(15.2993, 74.124, "Panaji, Goa"),
            &["Goa", "beaches closed", "dangerous waves", "monsoon", "peak"],
            (678, 234, 45),
        ),
        post(
            "7",
            Facebook,
            "Coastal erosion in Fort Kochi is getting worse every day. We're losing our beautiful beach. Government needs to take action before it's too late!",
            "Save Kerala Coasts",
            at(14, 17, 45),
            geo(10.8505, 76.2711, "Fort Kochi, Kerala"),
            &["coastal erosion", "Fort Kochi", "losing beach", "government action", "worse"],
            (234, 89, 56),
        ),
        post(
            "8",
            Twitter,
            "Kakinada fishing community needs help! Tidal flooding has destroyed our nets and boats. #KakinadaFloods #FishermanHelp #AndhraPradesh",
            "@kakinada_fishermen",
            at(15, 8, 30),
            geo(16.216, 81.804, "Kakinada, Andhra Pradesh"),
            &["Kakinada", "fishing community", "tidal flooding", "destroyed", "help needed"],
            (345, 123, 78),
        ),
        post(
            "9",
            Youtube,
            "Strange sea foam at Puri beach! Never seen anything like this. The smell is terrible. What's happening to our ocean? #PuriBeach #SeaFoam #OceanPollution",
            "Odisha Coastal Vlogs",
            at(15, 10, 0),
            geo(20.2961, 85.8245, "Puri, Odisha"),
            &["sea foam", "Puri beach", "strange", "terrible smell", "ocean pollution"],
            (567, 234, 89),
        ),
        post(
            "10",
            Twitter,
            "Cyclone impact at Mahabalipuram! Ancient monuments at risk from storm surge. UNESCO site needs protection! #Mahabalipuram #CycloneAlert #HeritageAtRisk",
            "@heritage_watch_tn",
            at(15, 12, 15),
            geo(13.6288, 79.4192, "Mahabalipuram, Tamil Nadu"),
            &["cyclone", "Mahabalipuram", "monuments at risk", "storm surge", "UNESCO"],
            (789, 345, 123),
        ),
    ]
}

/// Loads the sample reports into an empty report table. Returns how many
/// were inserted; a table that already holds reports is left alone.
pub fn seed_store(store: &mut StateStore) -> Result<usize> {
    if store.report_count()? > 0 {
        return Ok(0);
    }
    let reports = hazard_reports();
    store.insert_reports(&reports)?;
    log(
        Level::Info,
        Domain::Store,
        "seeded",
        obj(&[("reports", serde_json::json!(reports.len()))]),
    );
    Ok(reports.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_store_only_once() {
        let mut store = StateStore::new(":memory:").unwrap();
        store.init().unwrap();
        assert_eq!(seed_store(&mut store).unwrap(), 20);
        assert_eq!(seed_store(&mut store).unwrap(), 0);
        assert_eq!(store.report_count().unwrap(), 20);
    }

    #[test]
    fn test_sample_sizes() {
        assert_eq!(hazard_reports().len(), 20);
        assert_eq!(social_posts().len(), 10);
    }

    #[test]
    fn test_sample_ids_unique() {
        let reports = hazard_reports();
        let mut ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_sample_locations_valid() {
        assert!(hazard_reports().iter().all(|r| r.location.is_valid()));
        assert!(social_posts().iter().all(|p| p.location.as_ref().map_or(false, |l| l.is_valid())));
    }
}
