use std::sync::Arc;

use kart_highscores::{
    client::{
        Backend, ClientError, RecordingPrompt,
        pages::{
            HighscoreBoard, HighscoreEditor, HighscoreForm, ListPage, Navigation, PlayerEditor,
            PlayerForm, TrackEditor, TrackForm,
        },
    },
    config::{AppConfig, ReferencePolicy},
    dao::{
        document_store::memory::MemoryDocumentStore,
        models::{Highscore, Player, Track},
    },
    routes,
    state::{AppState, SharedState},
};
use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};
use tokio::net::TcpListener;

struct TestApp {
    /// `http://127.0.0.1:{port}` plus the resource prefix.
    api: String,
    /// `http://127.0.0.1:{port}`.
    root: String,
    http: Client,
    state: SharedState,
}

impl TestApp {
    async fn spawn(policy: ReferencePolicy, prefix: &str) -> Self {
        let state = AppState::new(policy, prefix);
        state
            .install_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        Self::serve(state).await
    }

    async fn serve(state: SharedState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let root = format!("http://{addr}");
        Self {
            api: format!("{root}{}", state.resource_prefix()),
            root,
            http: Client::new(),
            state,
        }
    }

    fn backend(&self) -> Backend {
        Backend::with_client(self.http.clone(), &self.api)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(format!("{}{path}", self.api))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{path}", self.api))
            .send()
            .await
            .unwrap()
    }

    async fn json(&self, path: &str) -> Value {
        self.get(path).await.json().await.unwrap()
    }

    async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.post(path, body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn create_then_read_returns_defaulted_record_with_links() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;

    let response = app.post("/player", json!({"name": "Ada"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_owned();
    let created: Value = response.json().await.unwrap();
    let id = id_of(&created);

    assert_eq!(location, format!("/player/{id}"));
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["skill_level"], "");
    for (link, method) in [
        ("read", "GET"),
        ("update", "PUT"),
        ("patch", "PATCH"),
        ("delete", "DELETE"),
    ] {
        assert_eq!(created["links"][link]["url"], location.as_str());
        assert_eq!(created["links"][link]["method"], method);
    }

    let read = app.get(&format!("/player/{id}")).await;
    assert_eq!(read.status(), StatusCode::OK);
    assert_eq!(read.json::<Value>().await.unwrap(), created);
}

#[tokio::test]
async fn post_without_body_creates_an_empty_record() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let response = app
        .http
        .post(format!("{}/highscore", app.api))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["name"], "");
    assert_eq!(created["track"], "");
    assert_eq!(created["time"], "");
}

#[tokio::test]
async fn updates_only_apply_truthy_fields() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let created = app
        .create(
            "/track",
            json!({"track_title": "Rainbow Road", "game_version": "Mario Kart 8"}),
        )
        .await;
    let url = format!("{}/track/{}", app.api, id_of(&created));

    let response = app.http.put(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.json::<Value>().await.unwrap(), created);

    let response = app
        .http
        .patch(&url)
        .json(&json!({"track_title": "", "game_version": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.json::<Value>().await.unwrap(), created);

    let response = app
        .http
        .patch(&url)
        .json(&json!({"game_version": "Mario Kart 64", "id": "ignored"}))
        .send()
        .await
        .unwrap();
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["track_title"], "Rainbow Road");
    assert_eq!(updated["game_version"], "Mario Kart 64");
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;

    let response = app.get("/player/doesnotexist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("not found"));

    let response = app.get("/player/65a1f0c2e4b0a1b2c3d4e5f6").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "player not found");

    let response = app
        .http
        .put(format!("{}/player/65a1f0c2e4b0a1b2c3d4e5f6", app.api))
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.json("/player").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let created = app.create("/player", json!({"name": "Ada"})).await;
    let url = format!("{}/player/{}", app.api, id_of(&created));

    for _ in 0..2 {
        let response = app.http.delete(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.bytes().await.unwrap().is_empty());
    }
    let gone = app.get(&format!("/player/{}", id_of(&created))).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let response = app
        .http
        .delete(format!("{}/player/doesnotexist", app.api))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_sorts_and_filters_by_query_string() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    for (name, skill) in [
        ("Zoe", "Pro"),
        ("Ada", "Pro"),
        ("Ada", "Beginner"),
        ("Stefan G.", "Pro"),
    ] {
        app.create("/player", json!({"name": name, "skill_level": skill}))
            .await;
    }

    let all = app.json("/player").await;
    let order: Vec<(&str, &str)> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["name"].as_str().unwrap(), p["skill_level"].as_str().unwrap()))
        .collect();
    assert_eq!(
        order,
        [
            ("Ada", "Beginner"),
            ("Ada", "Pro"),
            ("Stefan G.", "Pro"),
            ("Zoe", "Pro")
        ]
    );

    let pros = app.json("/player?skill_level=Pro").await;
    assert_eq!(pros.as_array().unwrap().len(), 3);

    let stefan = app.json("/player?name=Stefan%20G.&skill_level=Pro").await;
    assert_eq!(stefan.as_array().unwrap().len(), 1);
    assert!(stefan[0]["links"]["read"]["url"].is_string());

    assert!(app.json("/player?name=ada").await.as_array().unwrap().is_empty());
    assert!(app.json("/player?nickname=Ada").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_object_bodies_are_bad_requests() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let response = app.post("/player", json!(["Ada"])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .http
        .post(format!("{}/player", app.api))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn highscore_for_unknown_track_is_refused_by_the_editor() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let backend = app.backend();
    let prompt = RecordingPrompt::new();

    let mut players = PlayerEditor::open(&backend, None).await.unwrap();
    let next = players
        .save(&PlayerForm {
            name: "Ada".into(),
            skill_level: "Pro".into(),
        })
        .await
        .unwrap();
    assert_eq!(next, Navigation::Players);

    let form = HighscoreForm {
        name: "Ada".into(),
        track: "Rainbow Road".into(),
        time: "00h 01m 00s".into(),
    };
    let mut editor = HighscoreEditor::open(&backend, None).await.unwrap();
    assert_eq!(editor.save_and_exit(&form, &prompt).await, None);
    assert_eq!(prompt.alerts(), ["Track `Rainbow Road` is not known!"]);
    assert!(app.json("/highscore").await.as_array().unwrap().is_empty());

    let mut tracks = TrackEditor::open(&backend, None).await.unwrap();
    tracks
        .save(&TrackForm {
            track_title: "Rainbow Road".into(),
            game_version: "Mario Kart 8".into(),
        })
        .await
        .unwrap();

    // Player and track lists are loaded when the page opens.
    let mut editor = HighscoreEditor::open(&backend, None).await.unwrap();
    assert_eq!(
        editor.save_and_exit(&form, &prompt).await,
        Some(Navigation::Highscores)
    );
    let stored = app.json("/highscore").await;
    assert_eq!(stored[0]["track"], "Rainbow Road");
}

#[tokio::test]
async fn enforced_policy_rejects_orphan_highscores_server_side() {
    let app = TestApp::spawn(ReferencePolicy::Enforced, "").await;
    app.create("/player", json!({"name": "Ada", "skill_level": "Pro"}))
        .await;

    let response = app
        .post(
            "/highscore",
            json!({"name": "Ada", "track": "Rainbow Road", "time": "00h 01m 00s"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "track `Rainbow Road` is not known");

    let err = app
        .backend()
        .create(&Highscore {
            name: "Ada".into(),
            track: "Rainbow Road".into(),
            time: "00h 01m 00s".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
}

#[tokio::test]
async fn default_configuration_stores_orphan_highscores() {
    let config = AppConfig::default();
    let app = TestApp::spawn(config.reference_policy, &config.api_prefix).await;

    let payload = json!({"name": "Ghost", "track": "Nowhere", "time": "00h 01m 00s"});
    let created = app.create("/highscore", payload.clone()).await;
    let read = app.json(&format!("/highscore/{}", id_of(&created))).await;
    for field in ["name", "track", "time"] {
        assert_eq!(read[field], payload[field]);
    }
}

#[tokio::test]
async fn soft_policy_stores_orphans() {
    let app = TestApp::spawn(ReferencePolicy::Soft, "").await;
    let created = app
        .create("/highscore", json!({"name": "Ghost", "track": "Nowhere"}))
        .await;
    assert_eq!(created["name"], "Ghost");
}

#[tokio::test]
async fn track_board_orders_by_time_and_awards_medals() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    for name in ["Ada", "Bea", "Cem", "Dan"] {
        app.create("/player", json!({"name": name, "skill_level": "Pro"}))
            .await;
    }
    for title in ["Rainbow Road", "Moo Moo Meadows"] {
        app.create("/track", json!({"track_title": title})).await;
    }
    for (name, track, time) in [
        ("Cem", "Rainbow Road", "24h 00m 00s"),
        ("Ada", "Rainbow Road", "00h 00m 01s"),
        ("Dan", "Moo Moo Meadows", "00h 00m 00s"),
        ("Bea", "Rainbow Road", "00h 02m 30s"),
    ] {
        app.create(
            "/highscore",
            json!({"name": name, "track": track, "time": time}),
        )
        .await;
    }

    let backend = app.backend();
    let route = Navigation::HighscoresByTrack("Rainbow Road".into()).hash();
    let Navigation::HighscoresByTrack(param) = Navigation::from_hash(&route) else {
        panic!("unexpected route for {route}");
    };
    let board = HighscoreBoard::by_track(&backend, &param).await.unwrap();
    assert_eq!(board.subject(), "Rainbow Road");
    let rows: Vec<(&str, &str)> = board
        .entries()
        .iter()
        .map(|e| (e.display_name.as_str(), e.highscore.time.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            ("🥇 Ada", "00h 00m 01s"),
            ("🥈 Bea", "00h 02m 30s"),
            ("🥉 Cem", "24h 00m 00s"),
        ]
    );

    let board = HighscoreBoard::by_player(&backend, "Dan").await.unwrap();
    assert_eq!(board.entries().len(), 1);
    assert_eq!(board.entries()[0].display_name, "Dan");
}

#[tokio::test]
async fn board_delete_removes_the_confirmed_entry() {
    let app = TestApp::spawn(ReferencePolicy::Soft, "").await;
    app.create(
        "/highscore",
        json!({"name": "Ada", "track": "Rainbow Road", "time": "00h 01m 00s"}),
    )
    .await;

    let backend = app.backend();
    let mut board = HighscoreBoard::by_player(&backend, "Ada").await.unwrap();
    let id = board.entries()[0].id.clone();

    let decline = RecordingPrompt::answering([false]);
    assert!(!board.delete(&id, &decline).await.unwrap());
    assert_eq!(
        decline.questions(),
        ["Really delete the highscore of `Ada` on `Rainbow Road`?"]
    );
    assert_eq!(app.json("/highscore").await.as_array().unwrap().len(), 1);

    assert!(board.delete(&id, &RecordingPrompt::new()).await.unwrap());
    assert!(board.empty_placeholder());
    assert!(app.json("/highscore").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn renaming_a_player_keeps_old_highscores() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let player = app
        .create(
            "/player",
            json!({"name": "Stefan Geiselhart", "skill_level": "Pro"}),
        )
        .await;
    app.create("/track", json!({"track_title": "Rainbow Road"}))
        .await;
    app.create(
        "/highscore",
        json!({"name": "Stefan Geiselhart", "track": "Rainbow Road", "time": "00h 01m 00s"}),
    )
    .await;

    let backend = app.backend();
    let id = id_of(&player);
    let mut editor = PlayerEditor::open(&backend, Some(&id)).await.unwrap();
    assert_eq!(editor.title(), "Stefan Geiselhart");
    let next = editor
        .save(&PlayerForm {
            name: "Stefan G.".into(),
            skill_level: editor.record().skill_level.clone(),
        })
        .await
        .unwrap();
    assert_eq!(next, Navigation::Players);

    let renamed = app.json(&format!("/player/{id}")).await;
    assert_eq!(renamed["name"], "Stefan G.");
    let orphans = app.json("/highscore?name=Stefan%20Geiselhart").await;
    assert_eq!(orphans.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_player_names_are_refused_on_rename() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    app.create("/player", json!({"name": "Ada", "skill_level": "Pro"}))
        .await;
    let bea = app
        .create("/player", json!({"name": "Bea", "skill_level": "Pro"}))
        .await;

    let backend = app.backend();
    let mut editor = PlayerEditor::open(&backend, Some(&id_of(&bea)))
        .await
        .unwrap();
    let err = editor
        .save(&PlayerForm {
            name: "Ada".into(),
            skill_level: "Pro".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref message) if message == "Player `Ada` already exists!"));
}

#[tokio::test]
async fn list_pages_show_entries_and_delete_after_confirmation() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let backend = app.backend();

    let empty = ListPage::<Track>::load(&backend).await.unwrap();
    assert!(empty.view().empty_placeholder);

    let created = app
        .create("/track", json!({"track_title": "Rainbow Road", "game_version": "Mario Kart 8"}))
        .await;
    let mut page = ListPage::<Track>::load(&backend).await.unwrap();
    let entry = &page.view().entries[0];
    assert_eq!(entry.id.as_str(), id_of(&created));
    assert_eq!(
        entry.related,
        Some(Navigation::HighscoresByTrack("Rainbow Road".into()))
    );
    let id = entry.id.clone();

    let prompt = RecordingPrompt::new();
    assert!(page.delete(&id, &prompt).await.unwrap());
    assert_eq!(prompt.questions(), ["Really delete track `Rainbow Road`?"]);
    assert!(page.view().empty_placeholder);
    assert!(ListPage::<Track>::load(&backend)
        .await
        .unwrap()
        .view()
        .entries
        .is_empty());
}

#[tokio::test]
async fn editors_surface_transport_errors() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let backend = app.backend();

    let err = TrackEditor::open(&backend, Some("65a1f0c2e4b0a1b2c3d4e5f6"))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let editor = TrackEditor::open(&backend, Some("")).await.unwrap();
    assert_eq!(editor.id(), None);
    assert_eq!(editor.title(), "Add track");
}

#[tokio::test]
async fn prefix_is_applied_to_routes_and_links() {
    let app = TestApp::spawn(ReferencePolicy::default(), "/api").await;
    let created = app.create("/player", json!({"name": "Ada"})).await;
    assert_eq!(
        created["links"]["read"]["url"],
        format!("/api/player/{}", id_of(&created))
    );

    let unprefixed = app
        .http
        .get(format!("{}/player", app.root))
        .send()
        .await
        .unwrap();
    assert_eq!(unprefixed.status(), StatusCode::NOT_FOUND);

    let backend = app.backend();
    let players = ListPage::<Player>::load(&backend).await.unwrap();
    assert_eq!(players.view().entries.len(), 1);

    let health: Value = app
        .http
        .get(format!("{}/healthcheck", app.root))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() {
    let app = TestApp::serve(AppState::new(ReferencePolicy::default(), "")).await;

    let response = app.get("/player").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let health = app.json("/healthcheck").await;
    assert_eq!(health["status"], "degraded");

    app.state
        .install_document_store(Arc::new(MemoryDocumentStore::new()))
        .await;
    assert_eq!(app.get("/player").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn(ReferencePolicy::default(), "").await;
    let doc: Value = app
        .http
        .get(format!("{}/api-doc/openapi.json", app.root))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(doc["paths"]["/highscore/{id}"]["patch"].is_object());
}
