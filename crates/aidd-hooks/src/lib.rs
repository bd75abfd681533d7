// crates/aidd-hooks/src/lib.rs
// ============================================================================
// Module: AIDD Hooks
// Description: PreToolUse/UserPromptSubmit mediation of agent file and tool
//   access during loop-stage work.
// Purpose: Give the CLI's hook subcommands a typed policy to call into,
//   independent of whatever host process invokes them.
// Dependencies: aidd-core, regex, serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! `aidd-hooks` has no knowledge of dispatch or gates; it loads the
//! readmap/writemap/loop pack artifacts a scope has already produced and
//! decides, per tool call, whether to allow, ask, or deny it. `aidd-cli`
//! wires this crate's [`policy::decide_pre_tool_use`] and
//! [`policy::decide_user_prompt_submit`] to the hook subcommands a host
//! process actually invokes.

pub mod dangerous_bash;
pub mod policy;
pub mod readmap;
pub mod stamp;

pub use dangerous_bash::DangerousMatch;
pub use dangerous_bash::classify_dangerous;
pub use dangerous_bash::is_large_output_command;
pub use dangerous_bash::wrap_large_output_command;
pub use policy::ContextBudgetUsage;
pub use policy::Decision;
pub use policy::EffectiveBoundaries;
pub use policy::HooksMode;
pub use policy::PolicyConfig;
pub use policy::PolicyDecision;
pub use policy::PreToolUseRequest;
pub use policy::decide_pre_tool_use;
pub use policy::decide_user_prompt_submit;
pub use readmap::LOOP_PACK_SCHEMA;
pub use readmap::LoopPackBoundaries;
pub use readmap::LoopPackFrontMatter;
pub use readmap::MapEntry;
pub use readmap::MapLoadError;
pub use readmap::READMAP_SCHEMA;
pub use readmap::Readmap;
pub use readmap::WRITEMAP_SCHEMA;
pub use readmap::Writemap;
pub use readmap::load_loop_pack_front_matter;
pub use readmap::load_readmap;
pub use readmap::load_writemap;
pub use stamp::should_emit;
pub use stamp::stamp_path;
pub use stamp::write_stamp;
