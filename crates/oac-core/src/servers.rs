//! Server enumeration across document, path-item, and operation levels.

use indexmap::IndexMap;

use crate::parse::server::Server;
use crate::parse::spec::Document;

/// One distinct server URL with its template variables.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub url: String,
    pub description: Option<String>,
    pub variables: IndexMap<String, ServerVariableInfo>,
    /// `{name}` placeholders in the order they appear in the URL.
    pub variable_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerVariableInfo {
    pub default: Option<String>,
    pub description: Option<String>,
    pub enum_values: Vec<String>,
}

/// Collect servers from all three levels, deduplicated by exact URL.
/// Variable metadata merges across duplicates, first occurrence winning.
pub fn collect_servers(doc: &Document) -> Vec<ServerInfo> {
    let mut by_url: IndexMap<String, ServerInfo> = IndexMap::new();

    let mut absorb = |server: &Server| {
        let entry = by_url.entry(server.url.clone()).or_insert_with(|| ServerInfo {
            url: server.url.clone(),
            description: server.description.clone(),
            variables: IndexMap::new(),
            variable_names: extract_placeholders(&server.url),
        });
        if entry.description.is_none() {
            entry.description = server.description.clone();
        }
        for (name, var) in &server.variables {
            entry
                .variables
                .entry(name.clone())
                .or_insert_with(|| ServerVariableInfo {
                    default: var.default.clone(),
                    description: var.description.clone(),
                    enum_values: var.enum_values.clone(),
                });
        }
    };

    for server in &doc.servers {
        absorb(server);
    }
    for item in doc.paths.values() {
        for server in &item.servers {
            absorb(server);
        }
        for op in [
            &item.get,
            &item.post,
            &item.put,
            &item.patch,
            &item.delete,
            &item.options,
            &item.head,
            &item.trace,
        ]
        .into_iter()
        .flatten()
        {
            for server in &op.servers {
                absorb(server);
            }
        }
    }

    by_url.into_values().collect()
}

/// Ordered `{name}` placeholders in a URL or path template.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + close];
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &rest[open + close + 1..];
    }
    names
}
