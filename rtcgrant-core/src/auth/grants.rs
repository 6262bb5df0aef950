//! Video grants carried in access tokens
//!
//! A token holds one [`VideoGrant`]. Grants added to a [`GrantSet`] overlay
//! onto the existing record field by field, so successive additions
//! accumulate instead of replacing each other.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Media sources a participant may be allowed to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSource {
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

impl TrackSource {
    /// Name used inside grants
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackSource::Unknown => "unknown",
            TrackSource::Camera => "camera",
            TrackSource::Microphone => "microphone",
            TrackSource::ScreenShare => "screen_share",
            TrackSource::ScreenShareAudio => "screen_share_audio",
        }
    }

    /// Parse either the grant spelling (`screen_share`) or the event
    /// spelling (`SCREEN_SHARE`). Anything else maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "camera" => TrackSource::Camera,
            "microphone" => TrackSource::Microphone,
            "screen_share" => TrackSource::ScreenShare,
            "screen_share_audio" => TrackSource::ScreenShareAudio,
            _ => TrackSource::Unknown,
        }
    }

    /// Map the numeric wire value used by event payloads
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => TrackSource::Camera,
            2 => TrackSource::Microphone,
            3 => TrackSource::ScreenShare,
            4 => TrackSource::ScreenShareAudio,
            _ => TrackSource::Unknown,
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TrackSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TrackSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Code(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => TrackSource::parse(&name),
            Repr::Code(code) => TrackSource::from_code(code),
        })
    }
}

/// Permissions for one media session.
///
/// Every field is optional; unset fields are left out of the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Permission to create rooms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_create: Option<bool>,

    /// Permission to list available rooms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_list: Option<bool>,

    /// Permission to start a recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_record: Option<bool>,

    /// Permission to control a specific room, `room` must be set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_admin: Option<bool>,

    /// Permission to join a room, requires an identity on the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_join: Option<bool>,

    /// Name of the room the grant applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish_data: Option<bool>,

    /// Sources the participant may publish; replaced wholesale on merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish_sources: Option<Vec<TrackSource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_update_own_metadata: Option<bool>,

    /// Permission to manage ingress endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_admin: Option<bool>,

    /// Participant is invisible to others
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Participant is a recorder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorder: Option<bool>,
}

macro_rules! overlay {
    ($base:ident, $top:ident; $($field:ident),+ $(,)?) => {
        $(
            if $top.$field.is_some() {
                $base.$field = $top.$field;
            }
        )+
    };
}

impl VideoGrant {
    /// Grant to join a single room
    pub fn join(room: impl Into<String>) -> Self {
        VideoGrant {
            room_join: Some(true),
            room: Some(room.into()),
            ..Default::default()
        }
    }

    /// Grant to create rooms
    pub fn create() -> Self {
        VideoGrant {
            room_create: Some(true),
            ..Default::default()
        }
    }

    /// Overlay `other` onto this grant: fields set in `other` win, unset
    /// fields keep their current value. Nested values are not merged.
    pub fn merge(&mut self, other: VideoGrant) {
        let base = self;
        let top = other;
        overlay!(base, top;
            room_create,
            room_list,
            room_record,
            room_admin,
            room_join,
            room,
            can_publish,
            can_subscribe,
            can_publish_data,
            can_publish_sources,
            can_update_own_metadata,
            ingress_admin,
            hidden,
            recorder,
        );
    }

    /// Whether the grant asks to join a room
    pub fn requests_join(&self) -> bool {
        self.room_join == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        *self == VideoGrant::default()
    }
}

/// Claims payload of an access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSet {
    /// Display name of the bearer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoGrant>,

    /// Opaque metadata passed through to participants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Base64 SHA-256 of a webhook body bound to this token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl GrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay a video grant onto the current one
    pub fn add_grant(&mut self, grant: VideoGrant) {
        self.video.get_or_insert_with(VideoGrant::default).merge(grant);
    }

    /// True when the video grant asks to join a room
    pub fn requires_identity(&self) -> bool {
        self.video.as_ref().is_some_and(VideoGrant::requests_join)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_grant_accumulates() {
        let mut grants = GrantSet::new();
        grants.add_grant(VideoGrant::create());
        grants.add_grant(VideoGrant {
            room_join: Some(true),
            ..Default::default()
        });

        let video = grants.video.unwrap();
        assert_eq!(video.room_create, Some(true));
        assert_eq!(video.room_join, Some(true));
    }

    #[test]
    fn test_later_grant_wins_on_overlap() {
        let mut grants = GrantSet::new();
        grants.add_grant(VideoGrant::join("first"));
        grants.add_grant(VideoGrant {
            room: Some("second".to_string()),
            can_publish: Some(false),
            ..Default::default()
        });

        let video = grants.video.unwrap();
        assert_eq!(video.room.as_deref(), Some("second"));
        assert_eq!(video.room_join, Some(true));
        assert_eq!(video.can_publish, Some(false));
    }

    #[test]
    fn test_nested_sources_replaced_wholesale() {
        let mut grant = VideoGrant {
            can_publish_sources: Some(vec![TrackSource::Camera, TrackSource::Microphone]),
            ..Default::default()
        };
        grant.merge(VideoGrant {
            can_publish_sources: Some(vec![TrackSource::ScreenShare]),
            ..Default::default()
        });

        assert_eq!(
            grant.can_publish_sources,
            Some(vec![TrackSource::ScreenShare])
        );
    }

    #[test]
    fn test_requires_identity() {
        let mut grants = GrantSet::new();
        assert!(!grants.requires_identity());

        grants.add_grant(VideoGrant::create());
        assert!(!grants.requires_identity());

        grants.add_grant(VideoGrant {
            room_join: Some(false),
            ..Default::default()
        });
        assert!(!grants.requires_identity());

        grants.add_grant(VideoGrant::join("room1"));
        assert!(grants.requires_identity());
    }

    #[test]
    fn test_grant_wire_shape() {
        let mut grants = GrantSet::new();
        grants.name = Some("Alice".to_string());
        grants.add_grant(VideoGrant {
            room_join: Some(true),
            room: Some("room1".to_string()),
            can_publish_sources: Some(vec![TrackSource::ScreenShareAudio]),
            ..Default::default()
        });

        let value = serde_json::to_value(&grants).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Alice",
                "video": {
                    "roomJoin": true,
                    "room": "room1",
                    "canPublishSources": ["screen_share_audio"],
                },
            })
        );
    }

    #[test]
    fn test_unrecognized_track_sources_are_unknown() {
        assert_eq!(TrackSource::from_code(0), TrackSource::Unknown);
        assert_eq!(TrackSource::from_code(99), TrackSource::Unknown);
        assert_eq!(TrackSource::from_code(-1), TrackSource::Unknown);
        assert_eq!(TrackSource::parse("UNKNOWN"), TrackSource::Unknown);
        assert_eq!(TrackSource::parse("hologram"), TrackSource::Unknown);

        let source: TrackSource = serde_json::from_str("7").unwrap();
        assert_eq!(source, TrackSource::Unknown);
        assert_eq!(serde_json::to_string(&source).unwrap(), "\"unknown\"");
    }

    #[test]
    fn test_track_source_spellings() {
        let sources: Vec<TrackSource> =
            serde_json::from_str(r#"["camera", "SCREEN_SHARE", 2, "hologram"]"#).unwrap();

        assert_eq!(
            sources,
            vec![
                TrackSource::Camera,
                TrackSource::ScreenShare,
                TrackSource::Microphone,
                TrackSource::Unknown,
            ]
        );
    }
}
