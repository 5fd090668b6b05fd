//! Build-time embedding contract.
//!
//! Reads the OAC_* environment variables at compile time and emits a
//! generated module of `Option<&'static str>` defaults. The produced
//! binary never consults these variables at runtime; an unset variable
//! simply means "no default".

use std::env;
use std::fs;
use std::path::PathBuf;

const ENV_VARS: [&str; 6] = [
    "OAC_SPEC_PATH",
    "OAC_CLI_NAME",
    "OAC_SERVER",
    "OAC_SERVER_VARS",
    "OAC_AUTH_SCHEME",
    "OAC_CLI_VERSION",
];

fn main() {
    for var in ENV_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let mut code = String::from("// Generated by build.rs — do not edit.\n");

    match env::var("OAC_SPEC_PATH") {
        Ok(path) if !path.is_empty() => {
            println!("cargo:rerun-if-changed={path}");
            let text = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("OAC_SPEC_PATH ({path}) is unreadable: {e}"));
            fs::write(out_dir.join("embedded_spec.txt"), text)
                .expect("embedded spec copy is writable");
            code.push_str(
                "pub const SPEC_TEXT: Option<&str> = \
                 Some(include_str!(concat!(env!(\"OUT_DIR\"), \"/embedded_spec.txt\")));\n",
            );
        }
        _ => code.push_str("pub const SPEC_TEXT: Option<&str> = None;\n"),
    }

    push_const(&mut code, "CLI_NAME", "OAC_CLI_NAME");
    push_const(&mut code, "DEFAULT_SERVER", "OAC_SERVER");
    push_const(&mut code, "DEFAULT_SERVER_VARS", "OAC_SERVER_VARS");
    push_const(&mut code, "DEFAULT_AUTH_SCHEME", "OAC_AUTH_SCHEME");
    push_const(&mut code, "CLI_VERSION", "OAC_CLI_VERSION");

    fs::write(out_dir.join("embed.rs"), code).expect("embed.rs is writable");
}

fn push_const(code: &mut String, name: &str, var: &str) {
    let value = match env::var(var) {
        Ok(value) if !value.is_empty() => format!("Some({value:?})"),
        _ => "None".to_string(),
    };
    code.push_str(&format!("pub const {name}: Option<&str> = {value};\n"));
}
