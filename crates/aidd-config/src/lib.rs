// crates/aidd-config/src/lib.rs
// ============================================================================
// Module: AIDD Config Library
// Description: Host profile table, dispatch-spec/legacy-alias tables, and
//   config-file loading.
// Purpose: Single source of truth for the static tables and persisted
//   config files the dispatcher and CLI depend on.
// Dependencies: aidd-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `aidd-config` owns two kinds of data: small, closed tables compiled
//! directly into the binary (host profiles, the dispatch-spec/legacy-alias
//! tables), and strictly validated, fail-closed loaders for the persisted
//! `config/*.json` files described in the external interface contract.

pub mod dispatch_table;
pub mod gates_config;
pub mod profiles;

pub use dispatch_table::DispatchTableError;
pub use dispatch_table::normalize_command_name;
pub use dispatch_table::resolve_dispatch_target;
pub use gates_config::ConfigError;
pub use gates_config::ContextGcConfig;
pub use gates_config::ConventionsConfig;
pub use gates_config::GatesConfig;
pub use gates_config::load_context_gc_config;
pub use gates_config::load_conventions_config;
pub use gates_config::load_gates_config;
pub use profiles::discover_skills_dirs;
pub use profiles::resolve_profile;
pub use profiles::select_profile;
pub use profiles::strip_host_prefix;
