//! Values baked in by `build.rs`, plus their parsed forms.

use indexmap::IndexMap;
use oac_core::request::EmbeddedDefaults;

include!(concat!(env!("OUT_DIR"), "/embed.rs"));

/// The embedded defaults in request-builder form.
pub fn defaults() -> EmbeddedDefaults {
    EmbeddedDefaults {
        server: DEFAULT_SERVER.map(str::to_string),
        server_vars: DEFAULT_SERVER_VARS
            .map(parse_server_vars)
            .unwrap_or_default(),
        auth_scheme: DEFAULT_AUTH_SCHEME.map(str::to_string),
    }
}

/// Comma-separated `k=v` pairs; malformed entries are dropped.
fn parse_server_vars(raw: &str) -> IndexMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

pub fn cli_name() -> &'static str {
    CLI_NAME.unwrap_or("oac")
}

pub fn cli_version() -> &'static str {
    CLI_VERSION.unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_vars_parse_comma_separated_pairs() {
        let vars = parse_server_vars("region=us, stage=prod,bad");
        assert_eq!(vars.get("region").map(String::as_str), Some("us"));
        assert_eq!(vars.get("stage").map(String::as_str), Some("prod"));
        assert_eq!(vars.len(), 2);
    }
}
