//! Webhook event payloads
//!
//! The media server posts events as proto3 JSON: camelCase field names,
//! unset fields omitted, 64-bit integers usually encoded as strings, and
//! enums as symbolic names. Unknown fields are ignored so newer servers
//! can add data without breaking receivers.

use crate::auth::TrackSource;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! proto_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            Unrecognized,
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unrecognized => "UNRECOGNIZED",
                }
            }

            pub fn from_code(code: i64) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    _ => $name::Unrecognized,
                }
            }

            pub fn parse(s: &str) -> Self {
                match s {
                    $($wire => $name::$variant,)+
                    _ => $name::Unrecognized,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::from_code(0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
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
                    Repr::Name(name) => $name::parse(&name),
                    Repr::Code(code) => $name::from_code(code),
                })
            }
        }
    };
}

proto_enum! {
    /// How media reaches an ingress endpoint
    pub enum IngressInput {
        RtmpInput = 0 => "RTMP_INPUT",
        WhipInput = 1 => "WHIP_INPUT",
        /// Pulled from an HTTP URL (media file or HLS stream)
        UrlInput = 2 => "URL_INPUT",
    }
}

proto_enum! {
    /// Lifecycle of an ingress endpoint
    pub enum IngressStatus {
        EndpointInactive = 0 => "ENDPOINT_INACTIVE",
        EndpointBuffering = 1 => "ENDPOINT_BUFFERING",
        EndpointPublishing = 2 => "ENDPOINT_PUBLISHING",
        EndpointError = 3 => "ENDPOINT_ERROR",
        EndpointComplete = 4 => "ENDPOINT_COMPLETE",
    }
}

proto_enum! {
    pub enum ParticipantState {
        Joining = 0 => "JOINING",
        Joined = 1 => "JOINED",
        Active = 2 => "ACTIVE",
        Disconnected = 3 => "DISCONNECTED",
    }
}

proto_enum! {
    pub enum TrackType {
        Audio = 0 => "AUDIO",
        Video = 1 => "VIDEO",
        Data = 2 => "DATA",
    }
}

/// int64 fields arrive as strings or numbers
mod int64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub sid: String,
    pub name: String,
    /// Seconds an empty room stays open
    pub empty_timeout: u32,
    pub max_participants: u32,
    #[serde(deserialize_with = "int64::deserialize")]
    pub creation_time: i64,
    pub metadata: String,
    pub num_participants: u32,
    pub active_recording: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantInfo {
    pub sid: String,
    pub identity: String,
    pub name: String,
    pub metadata: String,
    pub state: ParticipantState,
    #[serde(deserialize_with = "int64::deserialize")]
    pub joined_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackInfo {
    pub sid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackType,
    pub source: Option<TrackSource>,
    pub muted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngressState {
    pub status: IngressStatus,
    /// Error or non-compliance description, if any
    pub error: String,
    /// Current or previous room published to
    pub room_id: String,
    #[serde(deserialize_with = "int64::deserialize")]
    pub started_at: i64,
    #[serde(deserialize_with = "int64::deserialize")]
    pub ended_at: i64,
    pub resource_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngressInfo {
    pub ingress_id: String,
    pub name: String,
    pub stream_key: String,
    /// Where the encoder pushes to, or where media is pulled from
    pub url: String,
    pub input_type: IngressInput,
    pub bypass_transcoding: bool,
    pub room_name: String,
    pub participant_identity: String,
    pub participant_name: String,
    pub reusable: bool,
    pub state: Option<IngressState>,
}

/// Kinds of events the media server sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    RoomStarted,
    RoomFinished,
    ParticipantJoined,
    ParticipantLeft,
    TrackPublished,
    TrackUnpublished,
    EgressStarted,
    EgressEnded,
    IngressStarted,
    IngressEnded,
    Other(String),
}

impl EventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "room_started" => EventKind::RoomStarted,
            "room_finished" => EventKind::RoomFinished,
            "participant_joined" => EventKind::ParticipantJoined,
            "participant_left" => EventKind::ParticipantLeft,
            "track_published" => EventKind::TrackPublished,
            "track_unpublished" => EventKind::TrackUnpublished,
            "egress_started" => EventKind::EgressStarted,
            "egress_ended" => EventKind::EgressEnded,
            "ingress_started" => EventKind::IngressStarted,
            "ingress_ended" => EventKind::IngressEnded,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// A webhook notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    /// Event name, e.g. `room_started`
    pub event: String,
    pub room: Option<Room>,
    pub participant: Option<ParticipantInfo>,
    pub track: Option<TrackInfo>,
    pub ingress_info: Option<IngressInfo>,
    /// Unique event id, stable across delivery retries
    pub id: String,
    /// Seconds since the epoch
    #[serde(deserialize_with = "int64::deserialize")]
    pub created_at: i64,
    /// Events dropped before this one was sent
    pub num_dropped: i32,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event)
    }
}
