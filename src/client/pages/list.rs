//! Collection list pages.

use tracing::debug;

use crate::{
    client::{
        backend::Backend,
        error::ClientResult,
        prompt::{Prompt, show_error},
    },
    dao::models::{Highscore, Player, Record, RecordId, Stored, Track},
};

use super::Navigation;

/// Per-entity behaviour of a list page.
pub trait Listed: Record {
    /// Edit page of one record.
    fn edit_target(id: &RecordId) -> Navigation;

    /// "Show related highscores" target, when the entity has one.
    fn related_target(&self) -> Option<Navigation> {
        None
    }

    /// Confirmation asked before deleting this record.
    fn delete_question(&self) -> String;
}

impl Listed for Player {
    fn edit_target(id: &RecordId) -> Navigation {
        Navigation::EditPlayer(Some(id.to_string()))
    }

    fn related_target(&self) -> Option<Navigation> {
        Some(Navigation::HighscoresByPlayer(self.name.clone()))
    }

    fn delete_question(&self) -> String {
        format!("Really delete player `{}`?", self.name)
    }
}

impl Listed for Track {
    fn edit_target(id: &RecordId) -> Navigation {
        Navigation::EditTrack(Some(id.to_string()))
    }

    fn related_target(&self) -> Option<Navigation> {
        Some(Navigation::HighscoresByTrack(self.track_title.clone()))
    }

    fn delete_question(&self) -> String {
        format!("Really delete track `{}`?", self.track_title)
    }
}

impl Listed for Highscore {
    fn edit_target(id: &RecordId) -> Navigation {
        Navigation::EditHighscore(Some(id.to_string()))
    }

    fn delete_question(&self) -> String {
        format!(
            "Really delete the highscore of `{}` on `{}`?",
            self.name, self.track
        )
    }
}

/// One rendered list row.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry<R> {
    /// Id used by the edit and delete actions.
    pub id: RecordId,
    /// Displayed fields.
    pub record: R,
    /// Edit page of the record.
    pub edit: Navigation,
    /// "Show highscores" target, for players and tracks.
    pub related: Option<Navigation>,
}

impl<R: Listed> From<Stored<R>> for ListEntry<R> {
    fn from(stored: Stored<R>) -> Self {
        Self {
            edit: R::edit_target(&stored.id),
            related: stored.record.related_target(),
            id: stored.id,
            record: stored.record,
        }
    }
}

/// What a list page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<R> {
    /// Rows in the server's sort order.
    pub entries: Vec<ListEntry<R>>,
    /// Whether the "nothing here yet" placeholder is visible.
    pub empty_placeholder: bool,
}

impl<R> ListView<R> {
    fn new(entries: Vec<ListEntry<R>>) -> Self {
        let empty_placeholder = entries.is_empty();
        Self {
            entries,
            empty_placeholder,
        }
    }
}

/// List page of one collection, in the server's sort order.
pub struct ListPage<'a, R> {
    backend: &'a Backend,
    view: ListView<R>,
}

impl<'a, R: Listed> ListPage<'a, R> {
    /// Fetch the whole collection.
    pub async fn load(backend: &'a Backend) -> ClientResult<Self> {
        let records = backend.list::<R>().await?;
        Ok(Self {
            backend,
            view: ListView::new(records.into_iter().map(ListEntry::from).collect()),
        })
    }

    /// Current rows.
    pub fn view(&self) -> &ListView<R> {
        &self.view
    }

    /// Ask for confirmation, delete the record and drop its row.
    ///
    /// Returns `Ok(false)` when the user declines or the row is unknown.
    /// Failures are shown to the user before being returned.
    pub async fn delete(&mut self, id: &RecordId, prompt: &impl Prompt) -> ClientResult<bool> {
        let Some(entry) = self.view.entries.iter().find(|entry| &entry.id == id) else {
            return Ok(false);
        };
        if !prompt.confirm(&entry.record.delete_question()) {
            return Ok(false);
        }

        if let Err(err) = self.backend.remove::<R>(id.as_str()).await {
            show_error(prompt, &err);
            return Err(err);
        }
        debug!(collection = R::COLLECTION, %id, "deleted from list page");

        self.view.entries.retain(|entry| &entry.id != id);
        self.view.empty_placeholder = self.view.entries.is_empty();
        Ok(true)
    }
}
