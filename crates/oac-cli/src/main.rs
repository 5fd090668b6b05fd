//! Binary entrypoint: resolve the spec (embedded or `--spec`), build the
//! clap tree, dispatch builtins and API actions, write the rendered
//! result to the right stream, and exit 0/1 per the result contract.

mod cli;
mod embedded;

use std::io::Read;
use std::path::PathBuf;

use clap::ArgMatches;
use indexmap::IndexMap;
use serde_json::json;

use oac_core::execute::{Executor, ReqwestFetcher};
use oac_core::introspect;
use oac_core::load::{load, FsRead, LoadOptions};
use oac_core::profile::{effective_profile_name, JsonFileStore, ProfileStore};
use oac_core::render::{render, OutputFormat, OutputStream};
use oac_core::request::{Globals, Invocation};
use oac_core::result::{CommandResult, Outcome, ValidationIssue};
use oac_core::ApiContext;

fn main() {
    env_logger::init();
    std::process::exit(run(std::env::args().collect()));
}

fn run(args: Vec<String>) -> i32 {
    let spec_arg = prescan_spec(&args);
    let loaded = match load(&LoadOptions {
        spec: spec_arg.as_deref(),
        embedded_text: embedded::SPEC_TEXT,
        reader: &FsRead,
    }) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    let ctx = match ApiContext::from_loaded(loaded) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let name = embedded::cli_name();
    let version = embedded::cli_version();
    let command = cli::build_cli(name, version, &ctx);
    let matches = match command.try_get_matches_from(&args) {
        Ok(matches) => matches,
        Err(e) => {
            use clap::error::ErrorKind;
            let benign = matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            let _ = e.print();
            return if benign { 0 } else { 1 };
        }
    };

    let format = if matches.get_flag("json") {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let store = JsonFileStore::new(profiles_path());
    let defaults = embedded::defaults();

    let (globals, input_issues) = parse_globals(&matches);
    let result = if !input_issues.is_empty() {
        CommandResult::new(Outcome::Validation {
            errors: input_issues,
            request: None,
        })
    } else {
        match matches.subcommand() {
            Some(("login", sub)) => handle_login(&ctx, &store, sub),
            Some(("logout", _)) => handle_logout(&ctx, &store),
            Some(("whoami", _)) => handle_whoami(&ctx, &store),
            Some(("__schema", sub)) => {
                if sub.get_flag("minimal") {
                    CommandResult::data("schema-minimal", introspect::minimal_payload(&ctx))
                } else {
                    CommandResult::data("schema", introspect::schema_payload(&ctx))
                }
            }
            Some(("completions", sub)) => {
                let shell = *sub
                    .get_one::<clap_complete::Shell>("shell")
                    .expect("shell is required");
                let mut command = cli::build_cli(name, version, &ctx);
                clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
                return 0;
            }
            Some((resource, res_matches)) => {
                dispatch_action(&ctx, &store, &defaults, &globals, resource, res_matches)
            }
            None => unreachable!("arg_required_else_help"),
        }
    };

    let rendered = render(&result, format);
    match rendered.stream {
        OutputStream::Stdout => println!("{}", rendered.text),
        OutputStream::Stderr => eprintln!("{}", rendered.text),
    }
    rendered.exit_code
}

fn dispatch_action(
    ctx: &ApiContext,
    store: &JsonFileStore,
    defaults: &oac_core::request::EmbeddedDefaults,
    globals: &Globals,
    resource: &str,
    res_matches: &ArgMatches,
) -> CommandResult {
    let Some((action_name, act_matches)) = res_matches.subcommand() else {
        return CommandResult::error(format!("action required for resource '{resource}'"));
    };
    let action = match ctx.find_action(resource, action_name) {
        Ok(action) => action,
        Err(e) => return CommandResult::error(e.to_string()),
    };

    let mut invocation: Invocation = cli::extract_invocation(action, act_matches);
    if let Some(raw) = invocation.raw_body.take() {
        match read_body_input(&raw) {
            Ok(resolved) => invocation.raw_body = Some(resolved),
            Err(e) => return CommandResult::error(format!("{e:#}")),
        }
    }

    let fetcher = ReqwestFetcher::default();
    let executor = Executor::new(&fetcher);
    executor.execute(
        &ctx.build_context(defaults, store),
        action,
        &invocation,
        globals,
    )
}

fn handle_login(ctx: &ApiContext, store: &JsonFileStore, matches: &ArgMatches) -> CommandResult {
    let Some(token) = matches.get_one::<String>("token") else {
        return CommandResult::new(Outcome::Validation {
            errors: vec![ValidationIssue {
                path: "token".to_string(),
                message: "missing required value 'token'".to_string(),
                value: None,
            }],
            request: None,
        });
    };
    let profile = effective_profile_name(store);
    if let Err(e) = store.set_token(&ctx.spec.spec_id, &profile, token) {
        return CommandResult::error(format!("failed to store token: {e}"));
    }
    CommandResult::data(
        "login",
        json!({"specId": ctx.spec.spec_id, "profile": profile}),
    )
}

fn handle_logout(ctx: &ApiContext, store: &JsonFileStore) -> CommandResult {
    let profile = effective_profile_name(store);
    match store.remove_token(&ctx.spec.spec_id, &profile) {
        Ok(removed) => CommandResult::data(
            "logout",
            json!({"specId": ctx.spec.spec_id, "profile": profile, "removed": removed}),
        ),
        Err(e) => CommandResult::error(format!("failed to remove token: {e}")),
    }
}

fn handle_whoami(ctx: &ApiContext, store: &JsonFileStore) -> CommandResult {
    let profile = store.get_profile(None);
    let profile_name = profile
        .as_ref()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| effective_profile_name(store));
    let token = store.get_token(&ctx.spec.spec_id, &profile_name);
    CommandResult::data(
        "whoami",
        json!({
            "specId": ctx.spec.spec_id,
            "profile": profile_name,
            "server": profile.as_ref().and_then(|p| p.server.clone()),
            "authScheme": profile.as_ref().and_then(|p| p.auth_scheme.clone()),
            "token": if token.is_some() { "set" } else { "none" },
        }),
    )
}

/// Find `--spec <value>` or `--spec=<value>` before clap runs; the tree
/// itself depends on the loaded spec.
fn prescan_spec(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--spec" {
            return iter.next().cloned();
        }
        if let Some(value) = arg.strip_prefix("--spec=") {
            return Some(value.to_string());
        }
    }
    None
}

/// Read root-level overrides; malformed `k=v` or `Name: Value` inputs
/// become validation issues rather than process aborts.
fn parse_globals(matches: &ArgMatches) -> (Globals, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    let mut server_vars = IndexMap::new();
    if let Some(values) = matches.get_many::<String>("server-var") {
        for raw in values {
            match raw.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    server_vars.insert(name.trim().to_string(), value.trim().to_string());
                }
                _ => issues.push(ValidationIssue {
                    path: "--server-var".to_string(),
                    message: format!("expected NAME=VALUE, got '{raw}'"),
                    value: None,
                }),
            }
        }
    }

    let mut headers = Vec::new();
    if let Some(values) = matches.get_many::<String>("header") {
        for raw in values {
            match raw.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
                _ => issues.push(ValidationIssue {
                    path: "--header".to_string(),
                    message: format!("expected 'Name: Value', got '{raw}'"),
                    value: None,
                }),
            }
        }
    }

    let globals = Globals {
        server: matches.get_one::<String>("server").cloned(),
        server_vars,
        headers,
        auth: matches.get_one::<String>("auth").cloned(),
        bearer_token: matches
            .get_one::<String>("bearer-token")
            .or_else(|| matches.get_one::<String>("oauth-token"))
            .cloned(),
        username: matches.get_one::<String>("username").cloned(),
        password: matches.get_one::<String>("password").cloned(),
        api_key: matches.get_one::<String>("api-key").cloned(),
    };
    (globals, issues)
}

/// `@-` and `-` read stdin, `@path` reads a file, anything else is the
/// literal payload.
fn read_body_input(value: &str) -> anyhow::Result<String> {
    use anyhow::Context;
    if value == "@-" || value == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read body from stdin")?;
        return Ok(buf);
    }
    if let Some(path) = value.strip_prefix('@') {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read body file '{path}'"));
    }
    Ok(value.to_string())
}

fn profiles_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".config")
            .join("oac")
            .join("profiles.json"),
        None => PathBuf::from(".oac-profiles.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prescan_finds_spec_in_both_forms() {
        assert_eq!(
            prescan_spec(&args(&["oac", "--spec", "api.yaml", "users", "list"])),
            Some("api.yaml".to_string())
        );
        assert_eq!(
            prescan_spec(&args(&["oac", "users", "--spec=https://x/openapi.json"])),
            Some("https://x/openapi.json".to_string())
        );
        assert_eq!(prescan_spec(&args(&["oac", "users", "list"])), None);
    }

    #[test]
    fn body_input_passes_literals_through() {
        assert_eq!(read_body_input(r#"{"a":1}"#).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn body_input_reports_missing_files() {
        let err = read_body_input("@/definitely/not/a/file.json").unwrap_err();
        assert!(format!("{err:#}").contains("body file"));
    }
}
