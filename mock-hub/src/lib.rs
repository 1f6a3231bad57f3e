//! In-process stand-in for the level hub.
//!
//! Serves the same five endpoints as the live hub with a small in-memory
//! store. Login decrypts and checks the real payload format. The routes
//! under `/_test/` inject failures and delays for exercising client error
//! paths.

pub mod payload;

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const BUILD: &str = "22-jun-2020-v160";

const FIRST_LEVEL_ID: u64 = 6001;

#[derive(Clone, Debug)]
pub struct Account {
    pub user_id: i64,
    pub name: String,
    pub pass: String,
}

/// A stored level and every version uploaded so far (index 0 is version 1).
#[derive(Clone, Debug)]
pub struct Level {
    pub level_id: u64,
    pub user_id: i64,
    pub title: String,
    pub note: String,
    pub live: bool,
    pub min_level: u32,
    pub versions: Vec<String>,
}

impl Level {
    pub fn version(&self) -> usize {
        self.versions.len()
    }
}

#[derive(Debug)]
pub struct Hub {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, i64>,
    levels: BTreeMap<u64, Level>,
    next_level_id: u64,
    next_user_id: i64,
}

impl Default for Hub {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            levels: BTreeMap::new(),
            next_level_id: FIRST_LEVEL_ID,
            next_user_id: 1,
        }
    }
}

impl Hub {
    /// Two accounts (`alice`/`secret`, `bob`/`hunter2`) and one level owned
    /// by alice with id 6001.
    pub fn seeded() -> Self {
        Hub::default()
            .with_account("alice", "secret")
            .with_account("bob", "hunter2")
            .with_level("alice", "Tutorial", "LEVEL_DATA_V1&data=0;1;2`3")
    }

    pub fn with_account(mut self, name: &str, pass: &str) -> Self {
        let user_id = self.next_user_id;
        self.next_user_id += 1;
        self.accounts.insert(
            name.to_string(),
            Account {
                user_id,
                name: name.to_string(),
                pass: pass.to_string(),
            },
        );
        self
    }

    /// Add a live level. Unknown owners get user id 0.
    pub fn with_level(mut self, owner: &str, title: &str, data: &str) -> Self {
        let user_id = self.accounts.get(owner).map_or(0, |a| a.user_id);
        self.save_level(user_id, title, "", true, 0, data);
        self
    }

    pub fn level(&self, level_id: u64) -> Option<&Level> {
        self.levels.get(&level_id)
    }

    fn user_name(&self, user_id: i64) -> &str {
        self.accounts
            .values()
            .find(|a| a.user_id == user_id)
            .map_or("", |a| a.name.as_str())
    }

    /// Uploading a title the user already owns adds a version to it.
    fn save_level(
        &mut self,
        user_id: i64,
        title: &str,
        note: &str,
        live: bool,
        min_level: u32,
        data: &str,
    ) -> (u64, usize) {
        let existing = self
            .levels
            .values_mut()
            .find(|l| l.user_id == user_id && l.title == title);
        if let Some(level) = existing {
            level.note = note.to_string();
            level.live = live;
            level.min_level = min_level;
            level.versions.push(data.to_string());
            return (level.level_id, level.version());
        }
        let level_id = self.next_level_id;
        self.next_level_id += 1;
        self.levels.insert(
            level_id,
            Level {
                level_id,
                user_id,
                title: title.to_string(),
                note: note.to_string(),
                live,
                min_level,
                versions: vec![data.to_string()],
            },
        );
        (level_id, 1)
    }
}

pub type Db = Arc<RwLock<Hub>>;

pub fn app() -> Router {
    app_with(Hub::seeded())
}

pub fn app_with(hub: Hub) -> Router {
    let db: Db = Arc::new(RwLock::new(hub));
    Router::new()
        .route("/login.php", post(login))
        .route("/levels_get.php", get(levels_get))
        .route("/levels/{file}", get(level_file))
        .route("/upload_level.php", post(upload_level))
        .route("/delete_level.php", post(delete_level))
        .route("/_test/status/{code}", get(fixed_status).post(fixed_status))
        .route("/_test/delay/{ms}", get(delayed))
        .route("/_test/malformed", get(malformed))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Hub::seeded()).await
}

pub async fn run_with(listener: TcpListener, hub: Hub) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(hub)).await
}

fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

// --- login ---

#[derive(Deserialize)]
pub struct LoginForm {
    pub build: String,
    pub i: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReply {
    pub success: bool,
    pub error: String,
    pub message: Option<String>,
    pub user_id: i64,
    pub token: String,
    pub email: bool,
    pub ant: bool,
    pub time: i64,
    pub last_read: String,
    pub last_recv: Option<String>,
    pub guild: String,
    pub guild_owner: i64,
    pub guild_name: String,
    pub emblem: String,
    pub favorite_levels: Vec<i64>,
}

impl LoginReply {
    fn failure(error: &str) -> Self {
        Self {
            error: error.to_string(),
            ..Self::default()
        }
    }
}

async fn login(
    State(db): State<Db>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginReply>, StatusCode> {
    if !headers.contains_key(header::REFERER) {
        return Err(StatusCode::FORBIDDEN);
    }
    let doc = payload::open(&form.i).ok_or(StatusCode::BAD_REQUEST)?;
    if form.build != BUILD || doc.build != BUILD {
        return Ok(Json(LoginReply::failure(
            "Your version of the game is out of date.",
        )));
    }

    let mut hub = db.write().await;
    let user_id = match hub.accounts.get(&doc.user_name) {
        Some(account) if account.pass == doc.user_pass => account.user_id,
        _ => return Ok(Json(LoginReply::failure("That login is incorrect."))),
    };
    let token = Uuid::new_v4().simple().to_string();
    hub.tokens.insert(token.clone(), user_id);
    let favorite_levels = hub
        .levels
        .values()
        .filter(|l| l.user_id == user_id)
        .map(|l| l.level_id as i64)
        .collect();
    info!(user_id, remember = doc.remember, "login");

    Ok(Json(LoginReply {
        success: true,
        user_id,
        token,
        time: unix_time(),
        last_read: "0".to_string(),
        guild: "0".to_string(),
        favorite_levels,
        ..LoginReply::default()
    }))
}

// --- listing and fetch ---

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelRow {
    pub level_id: String,
    pub version: String,
    pub title: String,
    pub rating: f64,
    pub play_count: String,
    pub min_level: String,
    pub note: String,
    pub live: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub name: String,
    pub power: String,
    pub trial_mod: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelsReply {
    pub success: bool,
    pub error: String,
    pub levels: Vec<LevelRow>,
}

async fn levels_get(State(db): State<Db>) -> Json<LevelsReply> {
    let hub = db.read().await;
    let levels = hub
        .levels
        .values()
        .filter(|l| l.live)
        .map(|l| LevelRow {
            level_id: l.level_id.to_string(),
            version: l.version().to_string(),
            title: l.title.clone(),
            rating: 0.0,
            play_count: "0".to_string(),
            min_level: l.min_level.to_string(),
            note: l.note.clone(),
            live: "1".to_string(),
            kind: "r".to_string(),
            time: unix_time().to_string(),
            name: hub.user_name(l.user_id).to_string(),
            power: "1".to_string(),
            trial_mod: "0".to_string(),
            user_id: l.user_id.to_string(),
        })
        .collect();
    Json(LevelsReply {
        success: true,
        error: String::new(),
        levels,
    })
}

#[derive(Deserialize)]
pub struct VersionQuery {
    pub version: Option<usize>,
}

async fn level_file(
    State(db): State<Db>,
    Path(file): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let level_id: u64 = file
        .strip_suffix(".txt")
        .and_then(|id| id.parse().ok())
        .ok_or(StatusCode::NOT_FOUND)?;
    let hub = db.read().await;
    let level = hub.level(level_id).ok_or(StatusCode::NOT_FOUND)?;
    let version = query.version.unwrap_or(level.version());
    let data = version
        .checked_sub(1)
        .and_then(|idx| level.versions.get(idx))
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        data.clone(),
    ))
}

// --- upload and delete ---

fn form_reply(pairs: &[(&str, &str)]) -> impl IntoResponse {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        serializer.finish(),
    )
}

async fn upload_level(
    State(db): State<Db>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut hub = db.write().await;
    let Some(&user_id) = fields.get("token").and_then(|t| hub.tokens.get(t)) else {
        return form_reply(&[("error", "Could not find a valid login token. Please log in again.")]);
    };
    let (Some(title), Some(data)) = (fields.get("title"), fields.get("data")) else {
        return form_reply(&[("error", "Missing title or level data.")]);
    };
    let note = fields.get("note").map_or("", String::as_str);
    let live = fields.get("live").is_some_and(|v| v == "1");
    let min_level = fields
        .get("min_level")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let (level_id, version) = hub.save_level(user_id, title, note, live, min_level, data);
    info!(user_id, level_id, version, "level uploaded");
    let level_id = level_id.to_string();
    let version = version.to_string();
    form_reply(&[
        ("message", "The save was successful."),
        ("level_id", level_id.as_str()),
        ("version", version.as_str()),
    ])
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub level_id: String,
    pub token: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteReply {
    pub success: bool,
    pub error: String,
}

impl DeleteReply {
    fn failure(error: &str) -> Json<Self> {
        Json(Self {
            success: false,
            error: error.to_string(),
        })
    }
}

async fn delete_level(State(db): State<Db>, Form(form): Form<DeleteForm>) -> Json<DeleteReply> {
    let mut hub = db.write().await;
    let Some(&user_id) = hub.tokens.get(&form.token) else {
        return DeleteReply::failure("Could not find a valid login token. Please log in again.");
    };
    let Ok(level_id) = form.level_id.parse::<u64>() else {
        return DeleteReply::failure("Invalid level id.");
    };
    match hub.levels.get(&level_id) {
        None => return DeleteReply::failure("Could not find a level with that id."),
        Some(level) if level.user_id != user_id => {
            return DeleteReply::failure("This is not your level.")
        }
        Some(_) => {}
    }
    hub.levels.remove(&level_id);
    info!(user_id, level_id, "level deleted");
    Json(DeleteReply {
        success: true,
        error: String::new(),
    })
}

// --- fault injection ---

async fn fixed_status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn delayed(Path(ms): Path<u64>) -> String {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("slept {ms}ms")
}

async fn malformed() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"success": tru"#,
    )
}
