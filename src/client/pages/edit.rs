//! Edit pages: load a record (or start empty), check the form, save, go back to the list.

use validator::Validate;

use crate::{
    client::{
        backend::Backend,
        error::{ClientError, ClientResult},
        prompt::{Prompt, show_error},
    },
    dao::models::{Highscore, Player, Record, Stored, Track},
};

use super::Navigation;

/// Raw form input for a record of [`Form::Record`].
pub trait Form: Validate {
    /// Record the form saves.
    type Record: Record;

    /// Copy with surrounding whitespace removed from every input.
    fn trimmed(&self) -> Self;

    /// Record holding the (already trimmed) inputs.
    fn into_record(self) -> Self::Record;
}

/// Inputs of the player edit page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct PlayerForm {
    /// Player name.
    #[validate(length(min = 1, message = "Enter a name first."))]
    pub name: String,
    /// Skill level, free text.
    #[validate(length(min = 1, message = "Enter a skill level first."))]
    pub skill_level: String,
}

impl Form for PlayerForm {
    type Record = Player;

    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            skill_level: self.skill_level.trim().to_owned(),
        }
    }

    fn into_record(self) -> Player {
        Player {
            name: self.name,
            skill_level: self.skill_level,
        }
    }
}

/// Inputs of the track edit page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TrackForm {
    /// Track title.
    #[validate(length(min = 1, message = "Enter a title first."))]
    pub track_title: String,
    /// Game the track belongs to.
    #[validate(length(min = 1, message = "Enter a game version first."))]
    pub game_version: String,
}

impl Form for TrackForm {
    type Record = Track;

    fn trimmed(&self) -> Self {
        Self {
            track_title: self.track_title.trim().to_owned(),
            game_version: self.game_version.trim().to_owned(),
        }
    }

    fn into_record(self) -> Track {
        Track {
            track_title: self.track_title,
            game_version: self.game_version,
        }
    }
}

/// Inputs of the highscore edit page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct HighscoreForm {
    /// Name of an existing player.
    #[validate(length(min = 1, message = "Enter a name first."))]
    pub name: String,
    /// Title of an existing track.
    #[validate(length(min = 1, message = "Enter a title first."))]
    pub track: String,
    /// Time as `00h 00m 00s`.
    #[validate(length(min = 1, message = "Enter a time first."))]
    pub time: String,
}

impl Form for HighscoreForm {
    type Record = Highscore;

    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            track: self.track.trim().to_owned(),
            time: self.time.trim().to_owned(),
        }
    }

    fn into_record(self) -> Highscore {
        Highscore {
            name: self.name,
            track: self.track,
            time: self.time,
        }
    }
}

/// Trim and validate `form`, reporting the first violation in field order.
fn required<F: Form>(form: &F) -> ClientResult<F::Record> {
    let form = form.trimmed();
    if let Err(errors) = form.validate() {
        let fields = errors.field_errors();
        let message = <F::Record as Record>::FIELDS
            .iter()
            .find_map(|name| fields.get(*name).and_then(|errs| errs.first()))
            .and_then(|err| err.message.as_deref())
            .unwrap_or("Fill in every field first.");
        return Err(ClientError::Validation(message.to_owned()));
    }
    Ok(form.into_record())
}

/// Show any failure to the user and turn it into "stay on the page".
fn stay_on_failure<T>(result: ClientResult<T>, prompt: &impl Prompt) -> Option<T> {
    result.map_err(|err| show_error(prompt, &err)).ok()
}

/// State shared by every edit page: the record under edit and where it lives.
struct Session<'a, R> {
    backend: &'a Backend,
    id: Option<String>,
    record: R,
}

impl<'a, R: Record> Session<'a, R> {
    /// Load the record `id`, or start from an empty one when no id is given.
    async fn open(backend: &'a Backend, id: Option<&str>) -> ClientResult<Self> {
        let id = id.filter(|id| !id.is_empty()).map(str::to_owned);
        let record = match &id {
            Some(id) => backend.get::<R>(id).await?.record,
            None => R::default(),
        };
        Ok(Self {
            backend,
            id,
            record,
        })
    }

    fn title(&self, new_title: &str, describe: impl FnOnce(&R) -> String) -> String {
        match self.id {
            Some(_) => describe(&self.record),
            None => new_title.to_owned(),
        }
    }

    /// POST a new record or PUT over the existing one.
    async fn submit(&mut self, record: R) -> ClientResult<Stored<R>> {
        let stored = match &self.id {
            Some(id) => self.backend.replace(id, &record).await?,
            None => self.backend.create(&record).await?,
        };
        self.id = Some(stored.id.to_string());
        self.record = stored.record.clone();
        Ok(stored)
    }
}

/// Player edit page; refuses to rename onto a name that is already taken.
pub struct PlayerEditor<'a> {
    session: Session<'a, Player>,
    players: Vec<Stored<Player>>,
}

impl<'a> PlayerEditor<'a> {
    /// Open the page on record `id`, or on an empty record when there is none.
    pub async fn open(backend: &'a Backend, id: Option<&str>) -> ClientResult<Self> {
        let session = Session::open(backend, id).await?;
        let players = backend.list::<Player>().await?;
        Ok(Self { session, players })
    }

    /// Record the form is pre-filled with.
    pub fn record(&self) -> &Player {
        &self.session.record
    }

    /// Id of the record under edit, once it exists.
    pub fn id(&self) -> Option<&str> {
        self.session.id.as_deref()
    }

    /// Page heading.
    pub fn title(&self) -> String {
        self.session
            .title("Add player", |player| player.name.clone())
    }

    /// Validate `form` without sending anything.
    pub fn check(&self, form: &PlayerForm) -> ClientResult<Player> {
        let player = required(form)?;
        let renamed = player.name != self.session.record.name;
        if renamed && self.players.iter().any(|p| p.record.name == player.name) {
            return Err(ClientError::Validation(format!(
                "Player `{}` already exists!",
                player.name
            )));
        }
        Ok(player)
    }

    /// Check and store the form, returning the page to go to next.
    pub async fn save(&mut self, form: &PlayerForm) -> ClientResult<Navigation> {
        let player = self.check(form)?;
        self.session.submit(player).await?;
        Ok(Navigation::Players)
    }

    /// [`Self::save`], alerting any failure instead of returning it.
    pub async fn save_and_exit(
        &mut self,
        form: &PlayerForm,
        prompt: &impl Prompt,
    ) -> Option<Navigation> {
        stay_on_failure(self.save(form).await, prompt)
    }
}

/// Track edit page.
pub struct TrackEditor<'a> {
    session: Session<'a, Track>,
}

impl<'a> TrackEditor<'a> {
    /// Open the page on record `id`, or on an empty record when there is none.
    pub async fn open(backend: &'a Backend, id: Option<&str>) -> ClientResult<Self> {
        Ok(Self {
            session: Session::open(backend, id).await?,
        })
    }

    /// Record the form is pre-filled with.
    pub fn record(&self) -> &Track {
        &self.session.record
    }

    /// Id of the record under edit, once it exists.
    pub fn id(&self) -> Option<&str> {
        self.session.id.as_deref()
    }

    /// Page heading.
    pub fn title(&self) -> String {
        self.session
            .title("Add track", |track| track.track_title.clone())
    }

    /// Validate `form` without sending anything.
    pub fn check(&self, form: &TrackForm) -> ClientResult<Track> {
        required(form)
    }

    /// Check and store the form, returning the page to go to next.
    pub async fn save(&mut self, form: &TrackForm) -> ClientResult<Navigation> {
        let track = self.check(form)?;
        self.session.submit(track).await?;
        Ok(Navigation::Tracks)
    }

    /// [`Self::save`], alerting any failure instead of returning it.
    pub async fn save_and_exit(
        &mut self,
        form: &TrackForm,
        prompt: &impl Prompt,
    ) -> Option<Navigation> {
        stay_on_failure(self.save(form).await, prompt)
    }
}

/// Highscore edit page.
///
/// Loads every player and track up front and refuses to save a highscore
/// whose name or track matches none of them.
pub struct HighscoreEditor<'a> {
    session: Session<'a, Highscore>,
    players: Vec<Stored<Player>>,
    tracks: Vec<Stored<Track>>,
}

impl<'a> HighscoreEditor<'a> {
    /// Open the page on record `id`, or on an empty record when there is none.
    pub async fn open(backend: &'a Backend, id: Option<&str>) -> ClientResult<Self> {
        let session = Session::open(backend, id).await?;
        let players = backend.list::<Player>().await?;
        let tracks = backend.list::<Track>().await?;
        Ok(Self {
            session,
            players,
            tracks,
        })
    }

    /// Record the form is pre-filled with.
    pub fn record(&self) -> &Highscore {
        &self.session.record
    }

    /// Id of the record under edit, once it exists.
    pub fn id(&self) -> Option<&str> {
        self.session.id.as_deref()
    }

    /// Page heading.
    pub fn title(&self) -> String {
        self.session
            .title("Add highscore", |highscore| highscore.name.clone())
    }

    /// Validate `form` without sending anything.
    pub fn check(&self, form: &HighscoreForm) -> ClientResult<Highscore> {
        let highscore = required(form)?;
        if !self.players.iter().any(|p| p.record.name == highscore.name) {
            return Err(ClientError::Validation(format!(
                "Player `{}` is not known!",
                highscore.name
            )));
        }
        if !self
            .tracks
            .iter()
            .any(|t| t.record.track_title == highscore.track)
        {
            return Err(ClientError::Validation(format!(
                "Track `{}` is not known!",
                highscore.track
            )));
        }
        Ok(highscore)
    }

    /// Check and store the form, returning the page to go to next.
    pub async fn save(&mut self, form: &HighscoreForm) -> ClientResult<Navigation> {
        let highscore = self.check(form)?;
        self.session.submit(highscore).await?;
        Ok(Navigation::Highscores)
    }

    /// [`Self::save`], alerting any failure instead of returning it.
    pub async fn save_and_exit(
        &mut self,
        form: &HighscoreForm,
        prompt: &impl Prompt,
    ) -> Option<Navigation> {
        stay_on_failure(self.save(form).await, prompt)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::*;
    use crate::{client::RecordingPrompt, dao::models::RecordId};

    fn offline() -> Backend {
        // Nothing listens here; checks must fail before any request.
        Backend::with_client(Client::new(), "http://127.0.0.1:9")
    }

    fn stored<R>(record: R) -> Stored<R> {
        Stored {
            id: RecordId::generate(),
            record,
        }
    }

    fn player(name: &str) -> Player {
        Player {
            name: name.into(),
            skill_level: "Pro".into(),
        }
    }

    fn message(err: ClientError) -> String {
        match err {
            ClientError::Validation(message) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    fn highscore_editor(backend: &Backend) -> HighscoreEditor<'_> {
        HighscoreEditor {
            session: Session {
                backend,
                id: None,
                record: Highscore::default(),
            },
            players: vec![stored(player("Ada"))],
            tracks: vec![stored(Track {
                track_title: "Moo Moo Meadows".into(),
                game_version: "Mario Kart Wii".into(),
            })],
        }
    }

    #[test]
    fn required_fields_are_reported_in_field_order() {
        let err = required(&HighscoreForm {
            name: " ".into(),
            track: String::new(),
            time: String::new(),
        })
        .unwrap_err();
        assert_eq!(message(err), "Enter a name first.");

        let err = required(&HighscoreForm {
            name: "Ada".into(),
            track: "Rainbow Road".into(),
            time: "  ".into(),
        })
        .unwrap_err();
        assert_eq!(message(err), "Enter a time first.");
    }

    #[test]
    fn input_is_trimmed() {
        let track = required(&TrackForm {
            track_title: "  Rainbow Road ".into(),
            game_version: "Mario Kart 8\n".into(),
        })
        .unwrap();
        assert_eq!(track.track_title, "Rainbow Road");
        assert_eq!(track.game_version, "Mario Kart 8");
    }

    #[test]
    fn highscores_need_a_known_track() {
        let backend = offline();
        let editor = highscore_editor(&backend);
        let form = HighscoreForm {
            name: "Ada".into(),
            track: "Rainbow Road".into(),
            time: "00h 01m 00s".into(),
        };
        assert_eq!(
            message(editor.check(&form).unwrap_err()),
            "Track `Rainbow Road` is not known!"
        );

        let form = HighscoreForm {
            name: "Bob".into(),
            ..form
        };
        assert_eq!(
            message(editor.check(&form).unwrap_err()),
            "Player `Bob` is not known!"
        );
    }

    #[test]
    fn renaming_onto_a_taken_name_is_refused() {
        let backend = offline();
        let editor = PlayerEditor {
            session: Session {
                backend: &backend,
                id: Some(RecordId::generate().to_string()),
                record: player("Ada"),
            },
            players: vec![stored(player("Ada")), stored(player("Bea"))],
        };

        let keep = PlayerForm {
            name: "Ada".into(),
            skill_level: "Beginner".into(),
        };
        assert_eq!(editor.check(&keep).unwrap().skill_level, "Beginner");

        let taken = PlayerForm {
            name: "Bea".into(),
            ..keep
        };
        assert_eq!(
            message(editor.check(&taken).unwrap_err()),
            "Player `Bea` already exists!"
        );
        assert_eq!(editor.title(), "Ada");
    }

    #[tokio::test]
    async fn failed_checks_alert_and_stay_on_the_page() {
        let backend = offline();
        let mut editor = highscore_editor(&backend);
        let prompt = RecordingPrompt::new();

        let next = editor
            .save_and_exit(&HighscoreForm::default(), &prompt)
            .await;
        assert_eq!(next, None);
        assert_eq!(prompt.alerts(), ["Enter a name first."]);
        assert_eq!(editor.title(), "Add highscore");
    }
}
