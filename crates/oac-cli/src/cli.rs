//! Dynamic clap tree over the derived command model, and the argv →
//! invocation extraction for one matched action.

use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;

use oac_core::model::CommandAction;
use oac_core::naming::case::camel;
use oac_core::params::{ParamKind, ParamType};
use oac_core::request::{FlagValue, Invocation};
use oac_core::ApiContext;

/// Root subcommand names that are never API resources.
pub const RESERVED_COMMANDS: [&str; 5] = ["login", "logout", "whoami", "__schema", "completions"];

/// Build the full command tree: globals, builtins, then one subcommand
/// per resource with one nested subcommand per action.
pub fn build_cli(name: &str, version: &str, ctx: &ApiContext) -> Command {
    let about = if ctx.doc.info.title.is_empty() {
        "OpenAPI-derived command line".to_string()
    } else {
        format!("Command line for {}", ctx.doc.info.title)
    };

    let mut root = Command::new(name.to_string())
        .version(version.to_string())
        .about(about)
        .disable_version_flag(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version")
                .help_heading("Global"),
        );

    for arg in global_args() {
        root = root.arg(arg);
    }

    root = root
        .subcommand(
            Command::new("login")
                .about("Store a token for this spec under the default profile")
                .arg(Arg::new("token").value_name("TOKEN").help("Token to store")),
        )
        .subcommand(Command::new("logout").about("Remove the stored token for this spec"))
        .subcommand(Command::new("whoami").about("Show the active profile and token state"))
        .subcommand(
            Command::new("__schema")
                .about("Emit the machine-readable command schema")
                .arg(
                    Arg::new("minimal")
                        .long("minimal")
                        .action(ArgAction::SetTrue)
                        .help("Omit raw operations and the naming plan"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(clap::value_parser!(clap_complete::Shell)),
                ),
        );

    for resource in &ctx.model.resources {
        if RESERVED_COMMANDS.contains(&resource.name.as_str()) {
            log::warn!("resource '{}' collides with a built-in command; skipped", resource.name);
            continue;
        }
        let mut res_cmd = Command::new(resource.name.clone())
            .about(format!("Operations on {}", resource.name))
            .subcommand_required(true)
            .arg_required_else_help(true);
        for action in &resource.actions {
            res_cmd = res_cmd.subcommand(action_command(action));
        }
        root = root.subcommand(res_cmd);
    }

    root
}

fn global_args() -> Vec<Arg> {
    let global = |arg: Arg| arg.global(true).help_heading("Global");
    vec![
        global(
            Arg::new("spec")
                .long("spec")
                .value_name("URL|PATH")
                .help("OpenAPI document to drive the CLI (runtime mode)"),
        ),
        global(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Server URL override"),
        ),
        global(
            Arg::new("server-var")
                .long("server-var")
                .value_name("NAME=VALUE")
                .action(ArgAction::Append)
                .help("Server template variable (repeatable)"),
        ),
        global(
            Arg::new("auth")
                .long("auth")
                .value_name("SCHEME")
                .help("Security scheme key to authenticate with"),
        ),
        global(
            Arg::new("bearer-token")
                .long("bearer-token")
                .value_name("TOKEN")
                .help("Bearer token"),
        ),
        global(
            Arg::new("oauth-token")
                .long("oauth-token")
                .value_name("TOKEN")
                .help("Alias for --bearer-token"),
        ),
        global(
            Arg::new("username")
                .long("username")
                .value_name("USER")
                .help("Basic auth username"),
        ),
        global(
            Arg::new("password")
                .long("password")
                .value_name("PASS")
                .help("Basic auth password"),
        ),
        global(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key"),
        ),
        global(
            Arg::new("header")
                .long("header")
                .value_name("NAME: VALUE")
                .action(ArgAction::Append)
                .help("Extra request header (repeatable)"),
        ),
        global(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Machine-readable JSON output"),
        ),
    ]
}

fn action_command(action: &CommandAction) -> Command {
    let mut cmd = Command::new(action.action.clone())
        .about(action.summary.clone().unwrap_or_else(|| action.key.clone()));

    for (i, raw) in action.raw_path_args.iter().enumerate() {
        let spec = action.positionals().nth(i);
        let mut arg = Arg::new(positional_id(raw))
            .value_name(raw.clone())
            .required(true)
            .help_heading("Required");
        if let Some(spec) = spec {
            if let Some(desc) = &spec.description {
                arg = arg.help(desc.clone());
            }
        }
        cmd = cmd.arg(arg);
    }

    for spec in action.flags() {
        let id = spec.flag.trim_start_matches("--").to_string();
        let mut arg = Arg::new(id.clone())
            .long(id)
            .help_heading(if spec.required { "Required" } else { "Options" });
        if let Some(desc) = &spec.description {
            arg = arg.help(desc.clone());
        }
        arg = match spec.ty {
            ParamType::Boolean => arg.action(ArgAction::SetTrue),
            ParamType::Array => arg
                .action(ArgAction::Append)
                .value_name(spec.ty.as_str().to_uppercase()),
            _ => arg
                .action(ArgAction::Set)
                .value_name(spec.ty.as_str().to_uppercase()),
        };
        if !spec.enum_values.is_empty() {
            arg = arg.value_parser(clap::builder::PossibleValuesParser::new(
                spec.enum_values.clone(),
            ));
        }
        cmd = cmd.arg(arg);
    }

    for def in &action.body_flags {
        let id = def.flag.trim_start_matches("--").to_string();
        let mut arg = Arg::new(id.clone())
            .long(id)
            .help_heading(if def.required { "Required" } else { "Options" });
        if !def.description.is_empty() {
            arg = arg.help(def.description.clone());
        }
        arg = if def.ty == ParamType::Boolean {
            arg.action(ArgAction::SetTrue)
        } else {
            arg.action(ArgAction::Set)
                .value_name(def.ty.as_str().to_uppercase())
        };
        cmd = cmd.arg(arg);
    }

    if !claims_flag(action, "curl") {
        cmd = cmd.arg(
            Arg::new("curl")
                .long("curl")
                .action(ArgAction::SetTrue)
                .help("Print an equivalent curl command instead of executing")
                .help_heading("Options"),
        );
    }
    if action.request_body.is_some() && !claims_flag(action, "body") {
        cmd = cmd.arg(
            Arg::new("body")
                .long("body")
                .value_name("JSON|@file|@-")
                .help("Raw request body (inline JSON, @file, or @- for stdin)")
                .help_heading("Options"),
        );
    }

    cmd
}

fn claims_flag(action: &CommandAction, name: &str) -> bool {
    action
        .flags()
        .any(|spec| spec.flag.trim_start_matches("--") == name)
        || action
            .body_flags
            .iter()
            .any(|def| def.flag.trim_start_matches("--") == name)
}

fn positional_id(raw: &str) -> String {
    format!("pos:{raw}")
}

/// Pull the matched values of one action into the core invocation shape.
/// Flag keys become camelCase; body-flag keys keep their dots.
pub fn extract_invocation(action: &CommandAction, matches: &ArgMatches) -> Invocation {
    let mut positionals = Vec::new();
    for raw in &action.raw_path_args {
        if let Some(value) = matches.get_one::<String>(&positional_id(raw)) {
            positionals.push(value.clone());
        }
    }

    let mut flags: IndexMap<String, FlagValue> = IndexMap::new();
    for spec in action.params.iter().filter(|p| p.kind == ParamKind::Flag) {
        let id = spec.flag.trim_start_matches("--");
        let key = camel(id);
        match spec.ty {
            ParamType::Boolean => {
                if matches.get_flag(id) {
                    flags.insert(key, FlagValue::Bool(true));
                }
            }
            ParamType::Array => {
                if let Some(values) = matches.get_many::<String>(id) {
                    flags.insert(key, FlagValue::Many(values.cloned().collect()));
                }
            }
            _ => {
                if let Some(value) = matches.get_one::<String>(id) {
                    flags.insert(key, FlagValue::Str(value.clone()));
                }
            }
        }
    }

    for def in &action.body_flags {
        let id = def.flag.trim_start_matches("--");
        let key = def.path.join(".");
        if def.ty == ParamType::Boolean {
            if matches.get_flag(id) {
                flags.insert(key, FlagValue::Bool(true));
            }
        } else if let Some(value) = matches.get_one::<String>(id) {
            flags.insert(key, FlagValue::Str(value.clone()));
        }
    }

    let raw_body = if claims_flag(action, "body") {
        None
    } else {
        matches.try_get_one::<String>("body").ok().flatten().cloned()
    };
    let curl = !claims_flag(action, "curl")
        && matches.try_get_one::<bool>("curl").ok().flatten() == Some(&true);

    Invocation {
        positionals,
        flags,
        raw_body,
        curl,
    }
}
