//! Subcommand handlers

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use rtcgrant_core::{
    AccessToken, ApiCredentials, TokenOptions, TokenVerifier, TrackSource, Ttl, VideoGrant,
    WebhookReceiver,
};
use std::io::Read;
use tracing::{info, warn};

pub fn run(matches: &ArgMatches) -> Result<()> {
    let credentials = credentials(matches)?;

    match matches.subcommand() {
        Some(("create-token", sub)) => {
            println!("{}", create_token(credentials, sub)?);
        }
        Some(("verify-token", sub)) => {
            let claims = verify_token(credentials, sub)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Some(("verify-webhook", sub)) => {
            let event = verify_webhook(credentials, sub)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Some((other, _)) => bail!("unknown subcommand: {}", other),
        None => bail!("a subcommand is required"),
    }

    Ok(())
}

fn credentials(matches: &ArgMatches) -> Result<ApiCredentials> {
    let api_key = matches.get_one::<String>("api-key").cloned().unwrap_or_default();
    let api_secret = matches.get_one::<String>("api-secret").cloned().unwrap_or_default();

    ApiCredentials::new(api_key, api_secret)
        .context("set --api-key and --api-secret, or LIVEKIT_API_KEY and LIVEKIT_API_SECRET")
}

/// Bare numbers are seconds, anything else a duration expression
fn parse_ttl(value: &str) -> Result<Ttl> {
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Ttl::Seconds(secs));
    }
    Ok(Ttl::expression(value)?)
}

fn flag(sub: &ArgMatches, id: &str) -> Option<bool> {
    sub.get_flag(id).then_some(true)
}

fn build_grant(sub: &ArgMatches) -> Result<VideoGrant> {
    let can_publish_sources = match sub.get_many::<String>("sources") {
        Some(values) => {
            let mut sources = Vec::new();
            for value in values {
                let source = TrackSource::parse(value);
                if source == TrackSource::Unknown {
                    bail!("unknown track source: {}", value);
                }
                sources.push(source);
            }
            Some(sources)
        }
        None => None,
    };

    Ok(VideoGrant {
        room_create: flag(sub, "create"),
        room_list: flag(sub, "list"),
        room_record: flag(sub, "record"),
        room_admin: flag(sub, "admin"),
        room_join: flag(sub, "join"),
        room: sub.get_one::<String>("room").cloned(),
        can_publish: sub.get_one::<bool>("can-publish").copied(),
        can_subscribe: sub.get_one::<bool>("can-subscribe").copied(),
        can_publish_data: sub.get_one::<bool>("can-publish-data").copied(),
        can_publish_sources,
        can_update_own_metadata: None,
        ingress_admin: flag(sub, "ingress-admin"),
        hidden: flag(sub, "hidden"),
        recorder: flag(sub, "recorder"),
    })
}

fn create_token(credentials: ApiCredentials, sub: &ArgMatches) -> Result<String> {
    let options = TokenOptions {
        identity: sub.get_one::<String>("identity").cloned(),
        name: sub.get_one::<String>("name").cloned(),
        metadata: sub.get_one::<String>("metadata").cloned(),
        ttl: sub.get_one::<String>("ttl").map(|v| parse_ttl(v)).transpose()?,
    };

    let mut token = AccessToken::from_credentials(credentials, options)?;
    let grant = build_grant(sub)?;
    if !grant.is_empty() {
        token.add_grant(grant);
    }

    let jwt = token.to_jwt()?;
    info!(
        "Issued token: identity={:?}, ttl={}",
        token.identity(),
        token.ttl()
    );
    Ok(jwt)
}

fn verify_token(credentials: ApiCredentials, sub: &ArgMatches) -> Result<serde_json::Value> {
    let token = sub
        .get_one::<String>("token")
        .context("token argument is required")?;

    let verified = TokenVerifier::from_credentials(credentials).verify_claims(token)?;

    Ok(serde_json::json!({
        "issuer": verified.issuer,
        "identity": verified.identity,
        "notBefore": verified.not_before,
        "expiresAt": verified.expires_at,
        "grants": serde_json::to_value(&verified.grants)?,
    }))
}

fn read_body(path: &str) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    if path == "-" {
        std::io::stdin()
            .read_to_end(&mut body)
            .context("failed to read body from stdin")?;
    } else {
        body = std::fs::read(path).with_context(|| format!("failed to read body from {}", path))?;
    }
    Ok(body)
}

fn verify_webhook(
    credentials: ApiCredentials,
    sub: &ArgMatches,
) -> Result<rtcgrant_core::WebhookEvent> {
    let path = sub.get_one::<String>("body").context("--body is required")?;
    let body = read_body(path)?;
    let token = sub.get_one::<String>("token").map(String::as_str);
    let skip_auth = sub.get_flag("skip-auth");

    if skip_auth {
        warn!("Skipping webhook authentication");
    }

    let event = WebhookReceiver::from_credentials(credentials).receive(&body, token, skip_auth)?;
    info!("Received webhook event: {} ({})", event.event, event.id);
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcgrant_core::GrantError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEY: &str = "APIclitest";
    const SECRET: &str = "cli-test-secret";

    fn sub_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["rtcgrant", "--api-key", KEY, "--api-secret", SECRET];
        argv.extend_from_slice(args);
        crate::cli().try_get_matches_from(argv).unwrap()
    }

    fn creds() -> ApiCredentials {
        ApiCredentials::new(KEY, SECRET).unwrap()
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("3600").unwrap(), Ttl::Seconds(3600));
        assert_eq!(parse_ttl("2h").unwrap(), Ttl::Expression("2h".to_string()));
        assert!(parse_ttl("later").is_err());
    }

    #[test]
    fn test_create_then_verify() {
        let matches = sub_matches(&[
            "create-token",
            "--identity",
            "alice",
            "--room",
            "room1",
            "--join",
            "--can-publish",
            "false",
            "--sources",
            "camera,microphone",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let jwt = create_token(creds(), sub).unwrap();

        let grants = TokenVerifier::from_credentials(creds()).verify(&jwt).unwrap();
        let video = grants.video.unwrap();
        assert_eq!(video.room_join, Some(true));
        assert_eq!(video.room.as_deref(), Some("room1"));
        assert_eq!(video.can_publish, Some(false));
        assert_eq!(video.room_create, None);
        assert_eq!(
            video.can_publish_sources,
            Some(vec![TrackSource::Camera, TrackSource::Microphone])
        );

        let matches = sub_matches(&["verify-token", jwt.as_str()]);
        let (_, sub) = matches.subcommand().unwrap();
        let claims = verify_token(creds(), sub).unwrap();
        assert_eq!(claims["identity"], "alice");
        assert_eq!(claims["issuer"], KEY);
    }

    #[test]
    fn test_join_without_identity_fails() {
        let matches = sub_matches(&["create-token", "--room", "room1", "--join"]);
        let (_, sub) = matches.subcommand().unwrap();

        let err = create_token(creds(), sub).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GrantError>(),
            Some(GrantError::IdentityRequired)
        ));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let matches = sub_matches(&["create-token", "--sources", "camera,hologram"]);
        let (_, sub) = matches.subcommand().unwrap();

        assert!(build_grant(sub).is_err());
    }

    #[test]
    fn test_verify_webhook_from_file() {
        let body = br#"{"event":"participant_joined","id":"EV_1","participant":{"identity":"bob"}}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body).unwrap();

        let jwt = AccessToken::from_credentials(creds(), TokenOptions::default())
            .unwrap()
            .with_body_digest(body)
            .to_jwt()
            .unwrap();

        let path = file.path().to_str().unwrap();
        let matches = sub_matches(&["verify-webhook", "--body", path, "--token", jwt.as_str()]);
        let (_, sub) = matches.subcommand().unwrap();
        let event = verify_webhook(creds(), sub).unwrap();
        assert_eq!(event.participant.unwrap().identity, "bob");

        let matches = sub_matches(&["verify-webhook", "--body", path]);
        let (_, sub) = matches.subcommand().unwrap();
        let err = verify_webhook(creds(), sub).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GrantError>(),
            Some(GrantError::MissingCredential)
        ));
    }

    #[test]
    fn test_verify_webhook_rejects_edited_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"event\":\"room_started\"}").unwrap();

        let jwt = AccessToken::from_credentials(creds(), TokenOptions::default())
            .unwrap()
            .with_body_digest(b"{\"event\":\"room_finished\"}")
            .to_jwt()
            .unwrap();

        let path = file.path().to_str().unwrap();
        let matches = sub_matches(&["verify-webhook", "--body", path, "--token", jwt.as_str()]);
        let (_, sub) = matches.subcommand().unwrap();
        let err = verify_webhook(creds(), sub).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GrantError>(),
            Some(GrantError::PayloadTampered)
        ));
    }
}
