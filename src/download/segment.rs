use std::num::NonZeroU64;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clip::{Clip, Timestamp};
use crate::error::InputError;
use crate::options::Options;

/// One fixed-length chunk of a clip: where it lives remotely and where it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub clip: Arc<Clip>,
    pub index: u64,
    pub remote_url: String,
    pub local_path: PathBuf,
}

/// Builds segment descriptors for a clip. Pure: no I/O happens here.
#[derive(Debug, Clone)]
pub struct SegmentResolver {
    base_url: String,
    cache_dir: PathBuf,
    segments_dir: String,
    segment_seconds: NonZeroU64,
}

impl SegmentResolver {
    pub fn new(
        base_url: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        segments_dir: impl Into<String>,
        segment_seconds: NonZeroU64,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            cache_dir: cache_dir.into(),
            segments_dir: segments_dir.into(),
            segment_seconds,
        }
    }

    pub fn from_options(options: &Options) -> Self {
        Self::new(
            options.base_url.as_str(),
            options.cache_dir.as_path(),
            options.segments_dir.as_str(),
            options.segment_seconds,
        )
    }

    pub fn segment_seconds(&self) -> NonZeroU64 {
        self.segment_seconds
    }

    /// Indexes of every segment touching `from..=to`.
    pub fn index_range(&self, from: Timestamp, to: Timestamp) -> RangeInclusive<u64> {
        from.to_segment_index(self.segment_seconds)..=to.to_segment_index(self.segment_seconds)
    }

    /// Cache directory of a clip: `{cache}/{download dir name}`.
    pub fn clip_dir(&self, clip: &Clip) -> PathBuf {
        self.cache_dir.join(clip.download_dir_name())
    }

    pub fn resolve(
        &self,
        clip: &Clip,
        indexes: RangeInclusive<u64>,
    ) -> Result<Vec<Segment>, InputError> {
        let (_, remote_dir) = clip.compound_parts()?;
        let tag = clip.remote_tag()?;
        let segments_path = self.clip_dir(clip).join(&self.segments_dir);
        let clip = Arc::new(clip.clone());

        Ok(indexes
            .map(|index| Segment {
                clip: Arc::clone(&clip),
                index,
                remote_url: format!(
                    "{}/{}/{}/segment_{}_{:05}.ts",
                    self.base_url,
                    clip.collection_id(),
                    remote_dir,
                    tag,
                    index
                ),
                local_path: segment_path(&segments_path, index),
            })
            .collect())
    }
}

fn segment_path(segments_path: &Path, index: u64) -> PathBuf {
    segments_path.join(format!("seg_{:05}.ts", index))
}
