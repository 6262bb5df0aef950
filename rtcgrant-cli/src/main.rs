//! rtcgrant command line: mint, inspect and verify access tokens

use clap::{Arg, ArgAction, Command};
use rtcgrant_core::{API_KEY_ENV, API_SECRET_ENV};
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    Command::new("rtcgrant")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Issue and verify media session access tokens")
        .subcommand_required(true)
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key, used as the token issuer")
                .env(API_KEY_ENV)
                .global(true),
        )
        .arg(
            Arg::new("api-secret")
                .long("api-secret")
                .value_name("SECRET")
                .help("API secret, used as the signing key")
                .env(API_SECRET_ENV)
                .hide_env_values(true)
                .global(true),
        )
        .subcommand(
            Command::new("create-token")
                .about("Sign a new access token and print it")
                .arg(Arg::new("identity").long("identity").value_name("IDENTITY"))
                .arg(Arg::new("name").long("name").value_name("NAME"))
                .arg(Arg::new("metadata").long("metadata").value_name("JSON"))
                .arg(
                    Arg::new("ttl")
                        .long("ttl")
                        .value_name("TTL")
                        .help("Seconds, or a duration such as 2h or \"10 minutes\""),
                )
                .arg(Arg::new("room").long("room").value_name("ROOM"))
                .arg(
                    Arg::new("join")
                        .long("join")
                        .action(ArgAction::SetTrue)
                        .help("Allow joining --room (requires --identity)"),
                )
                .arg(Arg::new("create").long("create").action(ArgAction::SetTrue))
                .arg(Arg::new("list").long("list").action(ArgAction::SetTrue))
                .arg(Arg::new("record").long("record").action(ArgAction::SetTrue))
                .arg(Arg::new("admin").long("admin").action(ArgAction::SetTrue))
                .arg(Arg::new("ingress-admin").long("ingress-admin").action(ArgAction::SetTrue))
                .arg(Arg::new("hidden").long("hidden").action(ArgAction::SetTrue))
                .arg(Arg::new("recorder").long("recorder").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("can-publish")
                        .long("can-publish")
                        .value_name("BOOL")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new("can-subscribe")
                        .long("can-subscribe")
                        .value_name("BOOL")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new("can-publish-data")
                        .long("can-publish-data")
                        .value_name("BOOL")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new("sources")
                        .long("sources")
                        .value_name("LIST")
                        .value_delimiter(',')
                        .help("Sources allowed to publish: camera,microphone,screen_share,screen_share_audio"),
                ),
        )
        .subcommand(
            Command::new("verify-token")
                .about("Verify a token and print its claims")
                .arg(Arg::new("token").required(true).value_name("TOKEN")),
        )
        .subcommand(
            Command::new("verify-webhook")
                .about("Authenticate a webhook body and print the event")
                .arg(
                    Arg::new("body")
                        .long("body")
                        .value_name("PATH")
                        .required(true)
                        .help("File with the raw request body, - for stdin"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .value_name("TOKEN")
                        .help("Value of the Authorize header"),
                )
                .arg(
                    Arg::new("skip-auth")
                        .long("skip-auth")
                        .action(ArgAction::SetTrue)
                        .help("Parse without verifying (trusted input only)"),
                ),
        )
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so token output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    commands::run(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }
}
