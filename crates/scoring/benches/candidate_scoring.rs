//! Benchmarks for the additive candidate scorer's hot loop.
//!
//! Run with: cargo bench --package scoring

use std::collections::HashMap;

use catalog::ScreenContentCandidate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use embedding::EmbeddingService;
use scoring::{CandidateInput, CandidateScorer, ScoringSource, ScoringWeights};
use tokio::runtime::Runtime;

fn candidate(id: i64) -> ScreenContentCandidate {
    ScreenContentCandidate {
        id,
        title: format!("Title {id}"),
        year: Some(2015 + (id % 10) as u16),
        overview: Some(format!("A story about candidate number {id} and its adventures.")),
        poster_url: None,
        vote_average: 5.0 + (id % 5) as f32,
        vote_count: 100 * (id % 50 + 1) as u32,
        popularity: (id % 500) as f32,
        genre_ids: vec![18, 878],
    }
}

fn build_inputs(count: usize) -> Vec<CandidateInput> {
    (0..count as i64)
        .map(|id| CandidateInput {
            candidate: candidate(id),
            source: if id % 3 == 0 {
                ScoringSource::Similar
            } else if id % 3 == 1 {
                ScoringSource::PreferredGenre
            } else {
                ScoringSource::GenreDiscover
            },
            genre_name: Some("Drama".to_string()),
            seed_rating: Some(5),
        })
        .collect()
}

fn bench_score_all(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut genre_scores = HashMap::new();
    genre_scores.insert("Drama".to_string(), 0.6);

    let embedding = EmbeddingService::new();
    let profile_embedding = Some(embedding.encode("acclaimed prestige dramas with strong character work"));
    let scorer = CandidateScorer::new(
        ScoringWeights::default(),
        genre_scores,
        profile_embedding,
        Vec::new(),
        embedding,
    );

    c.bench_function("score_all_300_candidates", |b| {
        b.iter_batched(
            || build_inputs(300),
            |inputs| runtime.block_on(async { black_box(scorer.score_all(black_box(inputs), 2025).await) }),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_score_all);
criterion_main!(benches);
