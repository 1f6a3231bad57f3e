//! Verify the codec and the request builders against JSON test vectors stored
//! in `test-vectors/`.
//!
//! The cipher vectors were produced by an independent AES implementation, so
//! they pin down key, IV, padding rule and base64 alphabet at once. Request
//! vectors describe the exact wire shape of each named operation.

use pr2hub_core::codec::{self, BLOCK_SIZE};
use pr2hub_core::{Credentials, HttpMethod, HubClient, HubConfig};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> HubClient {
    HubClient::new(HubConfig::with_base_url(BASE_URL))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

#[test]
fn cipher_test_vectors() {
    let raw = include_str!("../../test-vectors/cipher.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let plaintext = case["plaintext"].as_str().unwrap();
        let padded_len = case["padded_len"].as_u64().unwrap() as usize;
        let transport = case["transport"].as_str().unwrap();

        let padded = codec::zero_pad(plaintext.as_bytes());
        assert_eq!(padded.len(), padded_len, "{name}: padded length");
        assert_eq!(padded.len() % BLOCK_SIZE, 0, "{name}: block aligned");

        assert_eq!(codec::encode_payload(plaintext), transport, "{name}: ciphertext");
        assert_eq!(codec::decode_payload(transport).unwrap(), plaintext, "{name}: inverse");
    }
}

#[test]
fn login_payload_matches_vector() {
    let raw = include_str!("../../test-vectors/cipher.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    let case = vectors["cases"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "login_alice")
        .unwrap();

    let req = client()
        .build_login(&Credentials::new("alice", "secret", false))
        .unwrap();
    let form = pr2hub_core::decode::form(req.body.as_deref().unwrap().as_bytes()).unwrap();
    assert_eq!(form.get("i"), case["transport"].as_str());

    let plaintext = codec::decode_payload(form.get("i").unwrap()).unwrap();
    assert_eq!(plaintext, case["plaintext"].as_str().unwrap());
    let doc: serde_json::Value = serde_json::from_str(&plaintext).unwrap();
    assert_eq!(doc["user_name"], "alice");
    assert_eq!(doc["user_pass"], "secret");
    assert_eq!(doc["remember"], false);
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let str_in = |key: &str| input[key].as_str().unwrap().to_string();

        let req = match case["operation"].as_str().unwrap() {
            "authenticate" => {
                let creds = Credentials::new(
                    str_in("user"),
                    str_in("pass"),
                    input["remember"].as_bool().unwrap(),
                );
                c.build_login(&creds).unwrap()
            }
            "list_levels" => c.build_list_levels(),
            "fetch_level" => c.build_fetch_level(&str_in("id"), &str_in("version")),
            "upload_level" => c.build_upload_level(&str_in("data")),
            "delete_level" => c.build_delete_level(&str_in("id"), &str_in("token")),
            other => panic!("{name}: unknown operation {other}"),
        };

        let expected = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
    }
}
