//! Related/recommended sampling over tag-linked videos
//!
//! Candidates are the ids of every video linked to any tag of the focal video. The pool is
//! deduplicated by id (a video sharing several tags is still one candidate), the focal video is
//! removed, the rest is shuffled uniformly and capped at [`RELATED_SAMPLE_SIZE`]. After the
//! display fields are re-fetched, the first [`RELATED_SPLIT`] videos go to the "related"
//! region and the remainder to the "recommended" region.

use crate::VideoRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Maximum number of sampled candidates
pub const RELATED_SAMPLE_SIZE: usize = 18;

/// Number of sampled videos shown in the "related" region
pub const RELATED_SPLIT: usize = 12;

/// Pick up to [`RELATED_SAMPLE_SIZE`] candidate ids in random order
pub fn select_candidates<I, R>(focal_id: u64, candidates: I, rng: &mut R) -> Vec<u64>
where
    I: IntoIterator<Item = u64>,
    R: Rng + ?Sized,
{
    let mut seen = HashSet::new();
    let mut pool: Vec<u64> = candidates
        .into_iter()
        .filter(|id| *id != focal_id && seen.insert(*id))
        .collect();

    let available = pool.len();
    pool.shuffle(rng);
    pool.truncate(RELATED_SAMPLE_SIZE);
    debug!("Sampled {} of {} related candidates", pool.len(), available);
    pool
}

/// The two page regions filled from one sampled pool
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedVideoSet {
    pub related: Vec<VideoRecord>,
    pub recommended: Vec<VideoRecord>,
}

impl RelatedVideoSet {
    /// Split an ordered sample, dropping the focal video and anything past the sample size
    pub fn split(focal_id: u64, videos: Vec<VideoRecord>) -> Self {
        let mut videos: Vec<VideoRecord> = videos
            .into_iter()
            .filter(|video| video.id != focal_id)
            .take(RELATED_SAMPLE_SIZE)
            .collect();

        let recommended = if videos.len() > RELATED_SPLIT {
            videos.split_off(RELATED_SPLIT)
        } else {
            Vec::new()
        };

        Self {
            related: videos,
            recommended,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.related.is_empty() && self.recommended.is_empty()
    }

    pub fn len(&self) -> usize {
        self.related.len() + self.recommended.len()
    }
}
