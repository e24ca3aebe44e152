use serde::Serialize;

/// TMDB genre ids with their pt-BR display labels, movie and TV lists merged.
pub const GENRES: &[(u32, &str)] = &[
    (28, "Ação"),
    (12, "Aventura"),
    (16, "Animação"),
    (35, "Comédia"),
    (80, "Crime"),
    (99, "Documentário"),
    (18, "Drama"),
    (10751, "Família"),
    (14, "Fantasia"),
    (36, "História"),
    (27, "Terror"),
    (10402, "Música"),
    (9648, "Mistério"),
    (10749, "Romance"),
    (878, "Ficção Científica"),
    (10770, "TV Movie"),
    (53, "Suspense"),
    (10752, "Guerra"),
    (37, "Faroeste"),
    (10759, "Ação & Aventura"),
    (10762, "Kids"),
    (10763, "Notícias"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasia"),
    (10766, "Novela"),
    (10767, "Talk Show"),
    (10768, "Guerra & Política"),
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenreLabel {
    pub id: u32,
    pub label: &'static str,
}

pub fn label(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, label)| *label)
}

pub fn all() -> Vec<GenreLabel> {
    GENRES
        .iter()
        .map(|&(id, label)| GenreLabel { id, label })
        .collect()
}
