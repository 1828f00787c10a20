//! Static genre tables for screen content (films and series).
//!
//! Mirrors the genre id vocabulary a real screen-content catalog (TMDB-shaped)
//! uses: small integer ids, shared across movies and tv with a handful of
//! divergences. Kept as flat tables rather than an enum because adapters need
//! to round-trip ids they didn't mint themselves.

/// Which of the two screen-content catalogs a genre id/name belongs to.
/// Movie and tv genre ids overlap for most names but diverge for a few
/// (e.g. tv has no id 10752 "War"; movie has no id 10759 "Action & Adventure").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    Movie,
    Tv,
}

pub static MOVIE_GENRES: &[(&str, i32)] = &[
    ("Action", 28),
    ("Adventure", 12),
    ("Animation", 16),
    ("Comedy", 35),
    ("Crime", 80),
    ("Documentary", 99),
    ("Drama", 18),
    ("Family", 10751),
    ("Fantasy", 14),
    ("History", 36),
    ("Horror", 27),
    ("Music", 10402),
    ("Mystery", 9648),
    ("Romance", 10749),
    ("Science Fiction", 878),
    ("Thriller", 53),
    ("War", 10752),
    ("Western", 37),
];

pub static TV_GENRES: &[(&str, i32)] = &[
    ("Action & Adventure", 10759),
    ("Animation", 16),
    ("Comedy", 35),
    ("Crime", 80),
    ("Documentary", 99),
    ("Drama", 18),
    ("Family", 10751),
    ("Kids", 10762),
    ("Mystery", 9648),
    ("Sci-Fi & Fantasy", 10765),
    ("War & Politics", 10768),
    ("Western", 37),
];

fn table(kind: ScreenKind) -> &'static [(&'static str, i32)] {
    match kind {
        ScreenKind::Movie => MOVIE_GENRES,
        ScreenKind::Tv => TV_GENRES,
    }
}

/// All genres known for `kind`, name paired with catalog id.
pub fn all_genres(kind: ScreenKind) -> &'static [(&'static str, i32)] {
    table(kind)
}

/// Catalog id for a genre name, if recognized for `kind`.
pub fn genre_id(kind: ScreenKind, name: &str) -> Option<i32> {
    table(kind).iter().find(|(n, _)| *n == name).map(|(_, id)| *id)
}

/// The first recognized genre name among `genre_ids`, used to tag a
/// `similar`-sourced candidate with a genre label it didn't request by name.
pub fn primary_genre_name(kind: ScreenKind, genre_ids: &[i32]) -> Option<&'static str> {
    table(kind)
        .iter()
        .find(|(_, id)| genre_ids.contains(id))
        .map(|(name, _)| *name)
}
