//! Page logic of the single-page front-end.

/// Highscores of one track or one player.
pub mod board;
/// Edit forms of every entity.
pub mod edit;
/// Collection list pages.
pub mod list;

pub use board::{BoardEntry, HighscoreBoard, MEDALS, unescape_route_param};
pub use edit::{
    HighscoreEditor, HighscoreForm, PlayerEditor, PlayerForm, TrackEditor, TrackForm,
};
pub use list::{ListEntry, ListPage, ListView, Listed};

/// Client-side route, rendered as a location hash such as `#/edit-player/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Player list.
    Players,
    /// Track list.
    Tracks,
    /// Highscore list.
    Highscores,
    /// Edit page; `None` opens an empty record.
    EditPlayer(Option<String>),
    /// Track edit page.
    EditTrack(Option<String>),
    /// Highscore edit page.
    EditHighscore(Option<String>),
    /// Highscores of one player, keyed by name.
    HighscoresByPlayer(String),
    /// Highscores on one track, keyed by title.
    HighscoresByTrack(String),
}

const ROUTES: [(&str, fn(&str) -> Navigation); 8] = [
    ("/player/", |_| Navigation::Players),
    ("/tracks/", |_| Navigation::Tracks),
    ("/highscores/", |_| Navigation::Highscores),
    ("/edit-player/", |id| Navigation::EditPlayer(non_empty(id))),
    ("/edit-track/", |id| Navigation::EditTrack(non_empty(id))),
    ("/edit-highscore/", |id| Navigation::EditHighscore(non_empty(id))),
    ("/highscore-by-track/", |title| {
        Navigation::HighscoresByTrack(title.to_owned())
    }),
    ("/highscore-by-player/", |name| {
        Navigation::HighscoresByPlayer(name.to_owned())
    }),
];

fn non_empty(param: &str) -> Option<String> {
    (!param.is_empty()).then(|| param.to_owned())
}

impl Navigation {
    /// Location hash of this route. Spaces are escaped as `%20` the way a
    /// browser stores them.
    pub fn hash(&self) -> String {
        let (prefix, param) = match self {
            Navigation::Players => ("/player/", ""),
            Navigation::Tracks => ("/tracks/", ""),
            Navigation::Highscores => ("/highscores/", ""),
            Navigation::EditPlayer(id) => ("/edit-player/", id.as_deref().unwrap_or_default()),
            Navigation::EditTrack(id) => ("/edit-track/", id.as_deref().unwrap_or_default()),
            Navigation::EditHighscore(id) => {
                ("/edit-highscore/", id.as_deref().unwrap_or_default())
            }
            Navigation::HighscoresByTrack(title) => ("/highscore-by-track/", title.as_str()),
            Navigation::HighscoresByPlayer(name) => ("/highscore-by-player/", name.as_str()),
        };
        format!("#{prefix}{}", param.replace(' ', "%20"))
    }

    /// Resolve a location hash; anything unknown shows the highscore list.
    ///
    /// Route parameters are kept raw, pages unescape them.
    pub fn from_hash(hash: &str) -> Self {
        let path = hash.strip_prefix('#').unwrap_or(hash);
        ROUTES
            .iter()
            .find_map(|(prefix, route)| path.strip_prefix(prefix).map(route))
            .unwrap_or(Navigation::Highscores)
    }
}
