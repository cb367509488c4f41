//! Two-phase command dispatch for a named group of plugins.
//!
//! `judge_trigger` inspects a message and, on a match, returns a [`Ready`]
//! value describing what to run; `execute_event` consumes that value. Nothing
//! about a pending dispatch is stored on the group itself, so any number of
//! messages may be in flight concurrently.
//!
//! Each group can be switched on or off per namespace with
//! `-grpcfg enable <group>` / `-grpcfg disable <group>` (admins only). The
//! toggle is checked before the enable gate and is never gated itself.

use crate::core::command::{Command, MessageContext, Outcome, PluginInfo};
use crate::core::error::FaqError;
use crate::core::interfaces::{AdminRoster, GlobalConfig, MessageChannel, Outbound};
use rustc_hash::FxHashMap;
use serde_json::json;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Plugin: Send + Sync {
    fn info(&self) -> PluginInfo;

    /// Returns the parsed command when this plugin wants the message.
    fn judge_trigger(&self, msg: &str, ctx: &MessageContext) -> Option<Command>;

    fn execute(&self, command: Command, ctx: &MessageContext) -> Result<Outcome, FaqError>;
}

/// A dispatch staged by [`PluginGroup::judge_trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ready {
    Toggle { enable: bool },
    Delegate { plugin: usize, command: Command },
}

/// Per-namespace enable flags, read through a [`GlobalConfig`] and cached.
///
/// A namespace seen for the first time gets the default written back so the
/// persisted state always reflects what the gate decided.
pub struct GroupGate {
    config: Arc<dyn GlobalConfig>,
    key: String,
    default_enabled: bool,
    cache: Mutex<FxHashMap<String, bool>>,
}

impl GroupGate {
    pub fn new(config: Arc<dyn GlobalConfig>, group: &str, default_enabled: bool) -> Self {
        Self {
            config,
            key: format!("{group}.enable"),
            default_enabled,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn is_enabled(&self, namespace: &str) -> bool {
        if let Some(enabled) = self.cached(namespace) {
            return enabled;
        }
        // Config I/O runs unlocked so a slow namespace never stalls the others.
        let enabled = match self.config.read(namespace, &self.key) {
            Ok(Some(v)) => v.as_bool().unwrap_or(self.default_enabled),
            Ok(None) => {
                if let Err(e) = self
                    .config
                    .write(namespace, &self.key, &json!(self.default_enabled))
                {
                    tracing::warn!(namespace, key = %self.key, error = %e, "failed to persist default gate");
                    return self.default_enabled;
                }
                self.default_enabled
            }
            Err(e) => {
                // Not cached, so the next message retries the read.
                tracing::warn!(namespace, key = %self.key, error = %e, "gate read failed, using default");
                return self.default_enabled;
            }
        };
        *self
            .lock_cache()
            .entry(namespace.to_string())
            .or_insert(enabled)
    }

    pub fn set_enabled(&self, namespace: &str, enabled: bool) -> Result<(), FaqError> {
        if self.cached(namespace) == Some(enabled) {
            return Ok(());
        }
        self.config.write(namespace, &self.key, &json!(enabled))?;
        self.lock_cache().insert(namespace.to_string(), enabled);
        Ok(())
    }

    fn cached(&self, namespace: &str) -> Option<bool> {
        self.lock_cache().get(namespace).copied()
    }

    fn lock_cache(&self) -> MutexGuard<'_, FxHashMap<String, bool>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub struct PluginGroup {
    name: String,
    plugins: Vec<Box<dyn Plugin>>,
    gate: GroupGate,
    roster: Arc<dyn AdminRoster>,
    channel: Arc<dyn MessageChannel>,
    info: PluginInfo,
}

impl PluginGroup {
    pub fn new(
        name: &str,
        plugins: Vec<Box<dyn Plugin>>,
        gate: GroupGate,
        roster: Arc<dyn AdminRoster>,
        channel: Arc<dyn MessageChannel>,
    ) -> Self {
        let info = derive_info(name, &plugins);
        Self {
            name: name.to_string(),
            plugins,
            gate,
            roster,
            channel,
            info,
        }
    }

    /// Replace the derived group description.
    pub fn with_info(mut self, info: PluginInfo) -> Self {
        self.info = info;
        self
    }

    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }

    pub fn is_enabled(&self, namespace: &str) -> bool {
        self.gate.is_enabled(namespace)
    }

    /// Private messages never reach the group, toggles included.
    pub fn judge_trigger(&self, msg: &str, ctx: &MessageContext) -> Option<Ready> {
        if !ctx.is_group() {
            return None;
        }
        if let Some(enable) = self.toggle_request(msg) {
            if self.roster.is_admin(&ctx.namespace, &ctx.user_id) {
                return Some(Ready::Toggle { enable });
            }
        }
        if !self.gate.is_enabled(&ctx.namespace) {
            return None;
        }
        self.plugins
            .iter()
            .enumerate()
            .find_map(|(idx, p)| {
                p.judge_trigger(msg, ctx)
                    .map(|command| Ready::Delegate { plugin: idx, command })
            })
    }

    /// Runs a dispatch staged by `judge_trigger` for the same message.
    ///
    /// Errors and panics from the delegated plugin are logged and reported as
    /// `None`; they never affect later dispatches.
    pub fn execute_event(&self, ctx: &MessageContext, ready: Ready) -> Option<Outcome> {
        match ready {
            Ready::Toggle { enable } => {
                if let Err(e) = self.gate.set_enabled(&ctx.namespace, enable) {
                    tracing::error!(group = %self.name, namespace = %ctx.namespace, error = %e, "failed to toggle group");
                    return None;
                }
                tracing::info!(group = %self.name, namespace = %ctx.namespace, enable, "group toggled");
                if let Err(e) = self.channel.send(&ctx.namespace, Outbound::text("OK")) {
                    tracing::warn!(group = %self.name, error = %e, "failed to acknowledge toggle");
                }
                Some(Outcome::Handled)
            }
            Ready::Delegate { plugin, command } => {
                let Some(target) = self.plugins.get(plugin) else {
                    tracing::error!(group = %self.name, plugin, "staged plugin index out of range");
                    return None;
                };
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| target.execute(command, ctx)));
                match result {
                    Ok(Ok(outcome)) => Some(outcome),
                    Ok(Err(e)) => {
                        tracing::error!(group = %self.name, plugin = %target.info().name, error = %e, "plugin execution failed");
                        None
                    }
                    Err(_) => {
                        tracing::error!(group = %self.name, plugin = %target.info().name, "plugin panicked");
                        None
                    }
                }
            }
        }
    }

    /// Trigger and execute in one call.
    pub fn dispatch(&self, msg: &str, ctx: &MessageContext) -> Option<Outcome> {
        let ready = self.judge_trigger(msg, ctx)?;
        self.execute_event(ctx, ready)
    }

    fn toggle_request(&self, msg: &str) -> Option<bool> {
        let rest = msg.strip_prefix("-grpcfg ")?;
        let (verb, group) = rest.split_once(' ')?;
        if group != self.name {
            return None;
        }
        match verb {
            "enable" => Some(true),
            "disable" => Some(false),
            _ => None,
        }
    }
}

fn derive_info(name: &str, plugins: &[Box<dyn Plugin>]) -> PluginInfo {
    let infos: Vec<PluginInfo> = plugins.iter().map(|p| p.info()).collect();
    PluginInfo {
        name: name.to_string(),
        description: infos
            .iter()
            .map(|i| i.description.as_str())
            .collect::<Vec<_>>()
            .join("/"),
        command_description: infos
            .iter()
            .map(|i| i.command_description.as_str())
            .collect::<Vec<_>>()
            .join("/"),
        version: env!("CARGO_PKG_VERSION").to_string(),
        author: String::new(),
    }
}
