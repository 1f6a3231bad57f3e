//! Wire DTOs for the level hub.
//!
//! # Design
//! Response types default every field so a reply missing optional keys still
//! decodes. Only a body that is not JSON at all, or has a field of the wrong
//! type, is a decode error. The hub sends most numeric columns of a level
//! record as strings; those stay `String` here.
//!
//! The mock hub defines its own copies of these shapes; the integration tests
//! catch drift between the two.

use serde::{Deserialize, Serialize};

/// Account credentials for [`crate::HubClient::login`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
    #[serde(default)]
    pub remember: bool,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>, remember: bool) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            remember,
        }
    }
}

/// The document that gets encrypted into the login `i` field. Field order is
/// the wire order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginPayload {
    pub build: String,
    pub domain: String,
    pub login_id: u32,
    pub remember: bool,
    pub user_name: String,
    pub user_pass: String,
    pub server: ServerInfo,
}

impl LoginPayload {
    pub fn new(credentials: &Credentials, build: &str) -> Self {
        Self {
            build: build.to_string(),
            domain: "pr2hub.com".to_string(),
            login_id: 12985,
            remember: credentials.remember,
            user_name: credentials.user.clone(),
            user_pass: credentials.pass.clone(),
            server: ServerInfo::default(),
        }
    }
}

/// Game server the client claims to be joining.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerInfo {
    pub port: u16,
    pub status: String,
    pub server_id: u32,
    pub happy_hour: u32,
    pub server_name: String,
    pub address: String,
    pub guild_id: u32,
    pub tournament: String,
    pub population: u32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            port: 9160,
            status: "open".to_string(),
            server_id: 1,
            happy_hour: 0,
            server_name: "Derron".to_string(),
            address: "45.76.24.255".to_string(),
            guild_id: 0,
            tournament: "0".to_string(),
            population: 40,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoginResponse {
    pub success: bool,
    pub error: String,
    pub message: serde_json::Value,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub token: String,
    pub email: bool,
    pub ant: bool,
    pub time: i64,
    #[serde(rename = "lastRead")]
    pub last_read: String,
    #[serde(rename = "lastRecv")]
    pub last_recv: serde_json::Value,
    pub guild: String,
    #[serde(rename = "guildOwner")]
    pub guild_owner: i64,
    #[serde(rename = "guildName")]
    pub guild_name: String,
    pub emblem: String,
    #[serde(rename = "favoriteLevels")]
    pub favorite_levels: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelsResponse {
    pub success: bool,
    pub error: String,
    pub levels: Vec<LevelSummary>,
}

/// One row of the level listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelSummary {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeleteLevelResponse {
    pub success: bool,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_serializes_in_wire_order() {
        let payload = LoginPayload::new(&Credentials::new("alice", "secret", false), "b1");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"build":"b1","domain":"pr2hub.com","login_id":12985,"remember":false,"#,
                r#""user_name":"alice","user_pass":"secret","server":{"port":9160,"status":"open","#,
                r#""server_id":1,"happy_hour":0,"server_name":"Derron","address":"45.76.24.255","#,
                r#""guild_id":0,"tournament":"0","population":40}}"#
            )
        );
    }

    #[test]
    fn login_payload_escapes_user_input() {
        let payload = LoginPayload::new(&Credentials::new("a\"b", "p\\q", true), "b1");
        let json = serde_json::to_string(&payload).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["user_name"], "a\"b");
        assert_eq!(back["user_pass"], "p\\q");
        assert_eq!(back["remember"], true);
    }

    #[test]
    fn login_response_tolerates_missing_fields() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"success":true,"token":"t","userId":42}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.token, "t");
        assert_eq!(resp.user_id, 42);
        assert!(resp.favorite_levels.is_empty());
        assert!(resp.message.is_null());
    }

    #[test]
    fn login_response_reads_camel_case() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"success":true,"error":"","message":null,"userId":7,"token":"x","email":true,
                "ant":false,"time":1600000000,"lastRead":"0","lastRecv":null,"guild":"0",
                "guildOwner":0,"guildName":"","emblem":"","favoriteLevels":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(resp.user_id, 7);
        assert!(resp.email);
        assert_eq!(resp.favorite_levels, vec![1, 2]);
    }

    #[test]
    fn levels_response_reads_string_columns() {
        let resp: LevelsResponse = serde_json::from_str(
            r#"{"success":true,"error":"","levels":[{"level_id":"6001","version":"3",
                "title":"Hi","rating":4.25,"play_count":"10","type":"r","user_id":"1"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.levels.len(), 1);
        let level = &resp.levels[0];
        assert_eq!(level.level_id, "6001");
        assert_eq!(level.kind, "r");
        assert_eq!(level.rating, 4.25);
        assert_eq!(level.note, "");
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let result: Result<DeleteLevelResponse, _> =
            serde_json::from_str(r#"{"success":"yes","error":""}"#);
        assert!(result.is_err());
    }
}
