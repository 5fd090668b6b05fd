//! Turn an OpenAPI 3.x document into a non-interactive CLI surface.
//!
//! The pipeline loads and dereferences a spec, indexes its operations,
//! derives a deterministic `<resource> <action>` command tree, and
//! executes single invocations over HTTP with schema validation and auth
//! injection. Everything derived is built once and read-only afterwards;
//! per-invocation state lives only for that call.
//!
//! ```no_run
//! use oac_core::execute::{Executor, ReqwestFetcher};
//! use oac_core::load::{load, FsRead, LoadOptions};
//! use oac_core::profile::NoProfiles;
//! use oac_core::render::{render, OutputFormat};
//! use oac_core::request::{EmbeddedDefaults, Globals, Invocation};
//! use oac_core::ApiContext;
//!
//! let loaded = load(&LoadOptions {
//!     spec: Some("openapi.yaml"),
//!     embedded_text: None,
//!     reader: &FsRead,
//! })?;
//! let ctx = ApiContext::from_loaded(loaded)?;
//! let action = ctx.find_action("users", "get")?;
//!
//! let defaults = EmbeddedDefaults::default();
//! let store = NoProfiles;
//! let fetcher = ReqwestFetcher::default();
//! let executor = Executor::new(&fetcher);
//! let invocation = Invocation {
//!     positionals: vec!["123".to_string()],
//!     ..Default::default()
//! };
//! let result = executor.execute(
//!     &ctx.build_context(&defaults, &store),
//!     action,
//!     &invocation,
//!     &Globals::default(),
//! );
//! let rendered = render(&result, OutputFormat::Text);
//! println!("{}", rendered.text);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod auth;
pub mod error;
pub mod execute;
pub mod index;
pub mod introspect;
pub mod load;
pub mod model;
pub mod naming;
pub mod params;
pub mod parse;
pub mod profile;
pub mod render;
pub mod request;
pub mod result;
pub mod servers;

use auth::AuthScheme;
use error::{InvocationError, LoadError};
use load::LoadedSpec;
use model::{CommandAction, CommandModel};
use naming::PlannedOperation;
use parse::Document;
use profile::ProfileStore;
use request::{BuildContext, EmbeddedDefaults};
use servers::ServerInfo;

/// Everything derived from one spec, built once per process.
pub struct ApiContext {
    pub spec: LoadedSpec,
    pub doc: Document,
    pub servers: Vec<ServerInfo>,
    pub auth_schemes: Vec<AuthScheme>,
    pub planned: Vec<PlannedOperation>,
    pub model: CommandModel,
}

impl ApiContext {
    /// Run the derivation pipeline over a loaded spec.
    pub fn from_loaded(spec: LoadedSpec) -> Result<Self, LoadError> {
        let doc = parse::document(&spec.doc)?;
        let operations = index::index_operations(&doc);
        let planned = naming::plan(operations);
        let servers = servers::collect_servers(&doc);
        let auth_schemes = auth::scheme_registry(&doc);
        let model = model::build_model(&spec.spec_id, &planned);
        log::debug!(
            "derived {} resources / {} actions from {} operations",
            model.resources.len(),
            model.action_count(),
            planned.len(),
        );
        Ok(ApiContext {
            spec,
            doc,
            servers,
            auth_schemes,
            planned,
            model,
        })
    }

    pub fn find_action(&self, resource: &str, action: &str) -> Result<&CommandAction, InvocationError> {
        let Some(res) = self.model.resource(resource) else {
            return Err(InvocationError::UnknownResource(resource.to_string()));
        };
        res.actions
            .iter()
            .find(|a| a.action == action)
            .ok_or_else(|| InvocationError::UnknownAction {
                resource: resource.to_string(),
                action: action.to_string(),
            })
    }

    /// Borrow the pieces the request builder needs.
    pub fn build_context<'a>(
        &'a self,
        defaults: &'a EmbeddedDefaults,
        store: &'a dyn ProfileStore,
    ) -> BuildContext<'a> {
        BuildContext {
            spec_id: &self.spec.spec_id,
            servers: &self.servers,
            auth_schemes: &self.auth_schemes,
            defaults,
            store,
        }
    }
}
