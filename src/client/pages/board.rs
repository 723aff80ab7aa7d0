//! Highscore boards filtered to one track or one player.

use crate::{
    client::{
        backend::Backend,
        error::ClientResult,
        prompt::{Prompt, show_error},
    },
    dao::models::{Highscore, RecordId, Stored},
};

use super::{Navigation, list::Listed};

/// Glyphs prefixed to the three fastest entries of a track board.
pub const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Undo the `%20` escaping a browser applies to route parameters.
///
/// Only spaces are unescaped; other percent sequences stay as they are.
pub fn unescape_route_param(raw: &str) -> String {
    raw.replace("%20", " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Track,
    Player,
}

impl Scope {
    fn key(self, highscore: &Highscore) -> &str {
        match self {
            Scope::Track => &highscore.track,
            Scope::Player => &highscore.name,
        }
    }
}

/// One row of a highscore board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    /// Id of the highscore.
    pub id: RecordId,
    /// Player name as displayed, with a medal on track boards.
    pub display_name: String,
    /// Stored highscore.
    pub highscore: Highscore,
    /// Edit page of the highscore.
    pub edit: Navigation,
}

/// Highscores of one track or one player, fastest first.
pub struct HighscoreBoard<'a> {
    backend: &'a Backend,
    subject: String,
    entries: Vec<BoardEntry>,
}

impl<'a> HighscoreBoard<'a> {
    /// Board of the track named by the raw route parameter.
    pub async fn by_track(backend: &'a Backend, route_param: &str) -> ClientResult<Self> {
        Self::load(backend, Scope::Track, route_param).await
    }

    /// Board of the player named by the raw route parameter.
    pub async fn by_player(backend: &'a Backend, route_param: &str) -> ClientResult<Self> {
        Self::load(backend, Scope::Player, route_param).await
    }

    async fn load(backend: &'a Backend, scope: Scope, route_param: &str) -> ClientResult<Self> {
        let subject = unescape_route_param(route_param);
        let highscores = backend.list::<Highscore>().await?;
        Ok(Self {
            backend,
            entries: rank(scope, &subject, highscores),
            subject,
        })
    }

    /// Track title or player name the board is about.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Rows in display order.
    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    /// Whether the "nothing here yet" placeholder is visible.
    pub fn empty_placeholder(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ask for confirmation, delete the highscore and drop its row.
    ///
    /// Medals are not re-assigned, matching a page that only removes the row.
    pub async fn delete(&mut self, id: &RecordId, prompt: &impl Prompt) -> ClientResult<bool> {
        let Some(entry) = self.entries.iter().find(|entry| &entry.id == id) else {
            return Ok(false);
        };
        if !prompt.confirm(&entry.highscore.delete_question()) {
            return Ok(false);
        }

        if let Err(err) = self.backend.remove::<Highscore>(id.as_str()).await {
            show_error(prompt, &err);
            return Err(err);
        }
        self.entries.retain(|entry| &entry.id != id);
        Ok(true)
    }
}

/// Filter the full collection to `subject` and order it by `time`.
///
/// `time` is compared as a plain string, which orders the zero-padded
/// `"HHh MMm SSs"` format correctly. Ties keep their collection order.
fn rank(scope: Scope, subject: &str, highscores: Vec<Stored<Highscore>>) -> Vec<BoardEntry> {
    let mut selected: Vec<_> = highscores
        .into_iter()
        .filter(|stored| scope.key(&stored.record) == subject)
        .collect();
    selected.sort_by(|a, b| a.record.time.cmp(&b.record.time));

    selected
        .into_iter()
        .enumerate()
        .map(|(rank, stored)| {
            let medal = match scope {
                Scope::Track => MEDALS.get(rank),
                Scope::Player => None,
            };
            let display_name = match medal {
                Some(medal) => format!("{medal} {}", stored.record.name),
                None => stored.record.name.clone(),
            };
            BoardEntry {
                edit: Highscore::edit_target(&stored.id),
                id: stored.id,
                display_name,
                highscore: stored.record,
            }
        })
        .collect()
}
