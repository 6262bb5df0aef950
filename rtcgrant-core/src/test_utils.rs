//! Test fixtures shared by the unit tests

#![cfg(test)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

pub const TEST_API_KEY: &str = "abcdefg";
pub const TEST_API_SECRET: &str = "abababa";

/// A webhook body as the media server posts it
pub const ROOM_STARTED_BODY: &str = r#"{"event":"room_started","room":{"sid":"RM_hycBMAjmt6Ub","name":"Demo Room","emptyTimeout":300,"creationTime":"1692985556","numParticipants":0},"id":"EV_eugWmGhovZmm","createdAt":"1692985556"}"#;

/// Decode the payload segment of a compact JWT without verifying it
pub fn decode_payload(token: &str) -> serde_json::Value {
    let payload_b64 = token.split('.').nth(1).expect("token has a payload segment");
    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .expect("payload is base64url");
    serde_json::from_slice(&payload_json).expect("payload is JSON")
}
