use std::time::Instant;

use anyhow::{Context, Result};
use catalog::{InMemoryBookAdapter, InMemoryScreenContentAdapter, ScreenContentCandidate, WatchProviders};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use embedding::EmbeddingService;
use engine::{Orchestrator, ProgressEvent, Step};
use media_store::{InMemoryRepository, Media, MediaStatus, MediaType, Recommendation, RecommendationId, UserId};
use tokio_stream::StreamExt;

type DemoOrchestrator = Orchestrator<InMemoryRepository, InMemoryScreenContentAdapter, InMemoryBookAdapter>;

/// taste-engine - multi-type recommendation engine (films, series, books, short videos)
#[derive(Parser)]
#[command(name = "taste-engine")]
#[command(about = "Recommendation engine driving films, series, books, and short videos", long_about = None)]
struct Cli {
    /// User to operate on
    #[arg(long, default_value_t = 1)]
    user_id: UserId,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full-refresh generation and print the result once it completes
    Generate {
        /// Skip the staleness check and regenerate even if recent recommendations exist
        #[arg(long)]
        force: bool,
    },

    /// Run a full-refresh generation, printing each progress event as it arrives
    Stream,

    /// Top up existing recommendations without deleting any of them
    Complete,

    /// Dismiss a stored recommendation
    Dismiss {
        #[arg(long)]
        recommendation_id: RecommendationId,
    },

    /// Mark a recommendation as added to the user's library
    MarkAdded {
        #[arg(long)]
        external_id: String,
        #[arg(long, value_enum)]
        media_type: MediaTypeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MediaTypeArg {
    Film,
    Series,
    Book,
    ShortVideo,
}

impl From<MediaTypeArg> for MediaType {
    fn from(value: MediaTypeArg) -> Self {
        match value {
            MediaTypeArg::Film => MediaType::Film,
            MediaTypeArg::Series => MediaType::Series,
            MediaTypeArg::Book => MediaType::Book,
            MediaTypeArg::ShortVideo => MediaType::ShortVideo,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let orchestrator = build_demo_orchestrator();

    match cli.command {
        Commands::Generate { force } => handle_generate(&orchestrator, cli.user_id, force).await?,
        Commands::Stream => handle_stream(&orchestrator, cli.user_id).await?,
        Commands::Complete => handle_complete(&orchestrator, cli.user_id).await?,
        Commands::Dismiss { recommendation_id } => {
            orchestrator
                .dismiss(cli.user_id, recommendation_id)
                .context("failed to dismiss recommendation")?;
            println!("{} dismissed recommendation {}", "✓".green(), recommendation_id);
        }
        Commands::MarkAdded { external_id, media_type } => {
            orchestrator
                .mark_added(cli.user_id, &external_id, media_type.into())
                .context("failed to mark recommendation as added")?;
            println!("{} marked {} as added to library", "✓".green(), external_id);
        }
    }

    Ok(())
}

async fn handle_generate(orchestrator: &DemoOrchestrator, user_id: UserId, force: bool) -> Result<()> {
    let start = Instant::now();
    let recs = orchestrator.generate(user_id, force).await?;
    println!("{} generated in {:?}", "✓".green(), start.elapsed());
    print_recommendations(&recs);
    Ok(())
}

async fn handle_stream(orchestrator: &DemoOrchestrator, user_id: UserId) -> Result<()> {
    let mut events = Box::pin(orchestrator.generate_streaming(user_id));
    while let Some(event) = events.next().await {
        print_progress_event(&event);
    }
    Ok(())
}

async fn handle_complete(orchestrator: &DemoOrchestrator, user_id: UserId) -> Result<()> {
    let mut events = Box::pin(orchestrator.complete_streaming(user_id));
    while let Some(event) = events.next().await {
        print_progress_event(&event);
    }
    Ok(())
}

fn print_progress_event(event: &ProgressEvent) {
    let marker = if event.step == Step::Error { "✗".red() } else { "•".cyan() };
    println!(
        "{} [{:>3}%] {:<8} {} (count={})",
        marker,
        event.progress,
        event.step.as_str(),
        event.status,
        event.count
    );
}

fn print_recommendations(recs: &[Recommendation]) {
    println!("{}", "Recommendations:".bold().blue());
    for rec in recs {
        let genre = rec.genre_name.as_deref().unwrap_or(media_store::FALLBACK_GENRE);
        println!(
            "  {} [{}] {} ({}) - score {:.2}, source {}",
            rec.media_type.as_str(),
            genre,
            rec.title,
            rec.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string()),
            rec.score,
            rec.source.as_str(),
        );
    }
}

/// Wires an in-memory repository and deterministic catalog adapters with a
/// small seed library, standing in for a real database and real TMDB/Open
/// Library/YouTube clients. Good enough to exercise every code path in
/// `engine` without any network access or credentials.
fn build_demo_orchestrator() -> DemoOrchestrator {
    let repo = InMemoryRepository::new();
    repo.seed_media(vec![
        rated_film("550", "Fight Club", 1999, 5, &["Drama"]),
        rated_film("13", "Forrest Gump", 1994, 4, &["Drama"]),
        rated_film("603", "The Matrix", 1999, 5, &["Science Fiction"]),
        owned_book("Dune", "Frank Herbert", "Science Fiction"),
        rated_short_video("yt-1", "Cooking Basics", "Chef Channel", 5),
        library_short_video("yt-2", "Knife Skills", "Chef Channel"),
    ]);

    let screen_catalog = vec![
        candidate(551, "Se7en", 8.3, 6000, vec![80, 18]),
        candidate(604, "The Matrix Reloaded", 7.2, 5000, vec![878]),
        candidate(14, "Big", 7.0, 2000, vec![35, 18]),
    ];
    let screen_adapter = InMemoryScreenContentAdapter::new(screen_catalog)
        .with_similar(550, vec![551])
        .with_similar(603, vec![604])
        .with_watch_providers(604, "FR", WatchProviders { flatrate: vec!["Netflix".into()] });

    let book_adapter = InMemoryBookAdapter::new(vec![]);

    Orchestrator::new(repo, screen_adapter, book_adapter, EmbeddingService::new())
}

fn candidate(id: i64, title: &str, vote_average: f32, vote_count: u32, genre_ids: Vec<i32>) -> ScreenContentCandidate {
    ScreenContentCandidate {
        id,
        title: title.to_string(),
        year: Some(2003),
        overview: Some(format!("A story about {title}")),
        poster_url: None,
        vote_average,
        vote_count,
        popularity: vote_average * 10.0,
        genre_ids,
    }
}

fn rated_film(external_id: &str, title: &str, year: u16, rating: u8, genres: &[&str]) -> Media {
    Media {
        user_id: 1,
        title: title.to_string(),
        media_type: MediaType::Film,
        year: Some(year),
        external_id: external_id.to_string(),
        description: Some(format!("{title} ({year})")),
        status: MediaStatus::Done,
        rating: Some(rating),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        embedding: None,
        short_video: None,
    }
}

fn owned_book(title: &str, author: &str, genre: &str) -> Media {
    Media {
        user_id: 1,
        title: title.to_string(),
        media_type: MediaType::Book,
        year: None,
        external_id: format!("book-{title}"),
        description: Some(format!("by {author}")),
        status: MediaStatus::Done,
        rating: Some(5),
        genres: vec![genre.to_string()],
        embedding: None,
        short_video: None,
    }
}

fn rated_short_video(external_id: &str, title: &str, channel: &str, rating: u8) -> Media {
    Media {
        user_id: 1,
        title: title.to_string(),
        media_type: MediaType::ShortVideo,
        year: None,
        external_id: external_id.to_string(),
        description: None,
        status: MediaStatus::Done,
        rating: Some(rating),
        genres: vec![],
        embedding: None,
        short_video: Some(media_store::ShortVideoMetadata {
            channel_name: Some(channel.to_string()),
            external_url: Some(format!("https://video/{external_id}")),
            cover_url: None,
        }),
    }
}

fn library_short_video(external_id: &str, title: &str, channel: &str) -> Media {
    Media {
        user_id: 1,
        title: title.to_string(),
        media_type: MediaType::ShortVideo,
        year: None,
        external_id: external_id.to_string(),
        description: None,
        status: MediaStatus::ToConsume,
        rating: None,
        genres: vec![],
        embedding: None,
        short_video: Some(media_store::ShortVideoMetadata {
            channel_name: Some(channel.to_string()),
            external_url: Some(format!("https://video/{external_id}")),
            cover_url: None,
        }),
    }
}
