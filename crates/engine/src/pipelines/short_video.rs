//! Short-video pipeline (C6): unlike the other three, this one never calls
//! out to any catalog adapter. Its candidates are already in the user's own
//! library — items on channels they've rated highly that they haven't
//! consumed yet.

use std::collections::{HashMap, HashSet};

use media_store::{Media, MediaStatus, MediaType, NewRecommendation, RecommendationSource};
use tracing::instrument;

const TOP_CHANNELS: usize = 10;
const MAX_PER_CHANNEL: usize = 5;
const BASE_SCORE: f32 = 0.7;
const RATING_BONUS_PER_STAR: f32 = 0.1;
const COUNT_BONUS_PER_VIDEO: f32 = 0.02;
const SCORE_CEILING: f32 = 0.98;

pub struct ShortVideoRun<'a> {
    pub library: &'a [Media],
    pub excluded_ids: &'a HashSet<String>,
}

pub struct ShortVideoPipeline;

impl ShortVideoPipeline {
    #[instrument(skip_all)]
    pub fn run(&self, run: ShortVideoRun<'_>) -> Vec<NewRecommendation> {
        let channels = self.rank_channels(run.library);
        let mut out = Vec::new();

        for (channel_name, avg_rating, count) in channels.into_iter().take(TOP_CHANNELS) {
            let score = (BASE_SCORE
                + (avg_rating - 4.0) * RATING_BONUS_PER_STAR
                + count as f32 * COUNT_BONUS_PER_VIDEO)
                .min(SCORE_CEILING);

            let unconsumed = run
                .library
                .iter()
                .filter(|m| {
                    m.media_type == MediaType::ShortVideo
                        && m.status == MediaStatus::ToConsume
                        && channel_of(m).as_deref() == Some(channel_name.as_str())
                        && !run.excluded_ids.contains(&m.external_id)
                })
                .take(MAX_PER_CHANNEL);

            for video in unconsumed {
                out.push(NewRecommendation {
                    user_id: video.user_id,
                    media_type: MediaType::ShortVideo,
                    external_id: video.external_id.clone(),
                    title: video.title.clone(),
                    year: video.year,
                    cover_url: video.short_video.as_ref().and_then(|sv| sv.cover_url.clone()),
                    description: video.description.clone(),
                    score,
                    source: RecommendationSource::FavoriteChannel,
                    genre_name: Some(channel_name.clone()),
                    catalog_rating: None,
                    is_streamable: false,
                    streaming_providers: None,
                    external_url: video.short_video.as_ref().and_then(|sv| sv.external_url.clone()),
                });
            }
        }

        out
    }

    /// Channels ranked by `avg_rating * count` over videos rated >= 4,
    /// highest engagement first.
    fn rank_channels(&self, library: &[Media]) -> Vec<(String, f32, usize)> {
        let mut sums: HashMap<String, (f32, usize)> = HashMap::new();
        for media in library {
            if media.media_type != MediaType::ShortVideo {
                continue;
            }
            let Some(rating) = media.rating else { continue };
            if rating < 4 {
                continue;
            }
            let Some(channel) = channel_of(media) else { continue };
            let entry = sums.entry(channel).or_insert((0.0, 0));
            entry.0 += rating as f32;
            entry.1 += 1;
        }

        let mut ranked: Vec<(String, f32, usize, f32)> = sums
            .into_iter()
            .map(|(channel, (sum, count))| {
                let avg = sum / count as f32;
                let engagement = avg * count as f32;
                (channel, avg, count, engagement)
            })
            .collect();
        ranked.sort_by(|a, b| b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().map(|(c, avg, count, _)| (c, avg, count)).collect()
    }
}

fn channel_of(media: &Media) -> Option<String> {
    media.short_video.as_ref().and_then(|sv| sv.channel_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_store::ShortVideoMetadata;

    fn video(channel: &str, rating: Option<u8>, status: MediaStatus, external_id: &str) -> Media {
        Media {
            user_id: 1,
            title: format!("Video {external_id}"),
            media_type: MediaType::ShortVideo,
            year: None,
            external_id: external_id.to_string(),
            description: None,
            status,
            rating,
            genres: vec![],
            embedding: None,
            short_video: Some(ShortVideoMetadata {
                channel_name: Some(channel.to_string()),
                external_url: Some(format!("https://video/{external_id}")),
                cover_url: None,
            }),
        }
    }

    #[test]
    fn higher_engagement_channels_rank_first() {
        let library = vec![
            video("Low Engagement", Some(4), MediaStatus::Done, "a"),
            video("High Engagement", Some(5), MediaStatus::Done, "b"),
            video("High Engagement", Some(5), MediaStatus::Done, "c"),
            video("High Engagement", Some(5), MediaStatus::ToConsume, "d"),
        ];
        let pipeline = ShortVideoPipeline;
        let admitted = pipeline.run(ShortVideoRun {
            library: &library,
            excluded_ids: &HashSet::new(),
        });
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].genre_name.as_deref(), Some("High Engagement"));
    }

    #[test]
    fn only_unconsumed_videos_are_recommended() {
        let library = vec![
            video("Channel", Some(5), MediaStatus::Done, "watched"),
            video("Channel", Some(5), MediaStatus::ToConsume, "unwatched"),
        ];
        let pipeline = ShortVideoPipeline;
        let admitted = pipeline.run(ShortVideoRun {
            library: &library,
            excluded_ids: &HashSet::new(),
        });
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].external_id, "unwatched");
    }

    #[test]
    fn excluded_ids_are_skipped() {
        let library = vec![video("Channel", Some(5), MediaStatus::ToConsume, "already-rec")];
        let mut excluded = HashSet::new();
        excluded.insert("already-rec".to_string());
        let pipeline = ShortVideoPipeline;
        let admitted = pipeline.run(ShortVideoRun {
            library: &library,
            excluded_ids: &excluded,
        });
        assert!(admitted.is_empty());
    }

    #[test]
    fn ratings_below_four_dont_count_toward_channel_ranking() {
        let library = vec![
            video("Channel", Some(3), MediaStatus::ToConsume, "a"),
        ];
        let pipeline = ShortVideoPipeline;
        let admitted = pipeline.run(ShortVideoRun {
            library: &library,
            excluded_ids: &HashSet::new(),
        });
        assert!(admitted.is_empty());
    }
}
