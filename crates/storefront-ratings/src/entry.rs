use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::wilson::wilson_rating;

/// Star-rating counts for one app: index `n` holds the number of `n`-star
/// ratings, index 0 the number of ratings without stars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingsEntry {
    pub app_id: String,
    pub star_counts: [u32; 6],
}

impl RatingsEntry {
    pub fn new(app_id: impl Into<String>, star_counts: [u32; 6]) -> Self {
        Self {
            app_id: app_id.into(),
            star_counts,
        }
    }

    /// Number of ratings that carry stars.
    pub fn total(&self) -> u64 {
        self.star_counts[1..].iter().map(|&n| u64::from(n)).sum()
    }

    /// Lower-bound Wilson score in `0..=100`, `None` without any rating.
    pub fn rating(&self) -> Option<u8> {
        wilson_rating(&self.star_counts)
    }
}

#[derive(Deserialize)]
struct StarCounts {
    star0: u64,
    star1: u64,
    star2: u64,
    star3: u64,
    star4: u64,
    star5: u64,
}

impl StarCounts {
    fn into_array(self) -> [u32; 6] {
        [self.star0, self.star1, self.star2, self.star3, self.star4, self.star5]
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    }
}

/// Parse a ratings document into entries sorted by app id.
///
/// The document is a JSON object mapping app ids to objects with the
/// members `star0` to `star5`. Members that are not objects, or that lack
/// any of the six counts, are skipped.
///
/// # Errors
///
/// [`Error::Parse`] when the input is not JSON or its root is not an object.
pub fn parse_ratings(json: &[u8]) -> Result<Vec<RatingsEntry>> {
    let root: Value = serde_json::from_slice(json)?;
    let Value::Object(apps) = root else {
        return Err(Error::Parse("root is not an object".to_string()));
    };

    let mut entries: Vec<RatingsEntry> = apps
        .into_iter()
        .filter_map(|(app_id, counts)| {
            if !counts.is_object() {
                debug!(app_id, "skipping ratings entry that is not an object");
                return None;
            }
            match serde_json::from_value::<StarCounts>(counts) {
                Ok(counts) => Some(RatingsEntry::new(app_id, counts.into_array())),
                Err(e) => {
                    debug!(app_id, error = %e, "skipping incomplete ratings entry");
                    None
                }
            }
        })
        .collect();

    entries.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    Ok(entries)
}
