//! faqledger: a versioned FAQ store for chat groups.
//!
//! Every chat group is a namespace with its own append-only ledger of answer
//! versions. A question key has at most one latest version; edits append,
//! deletes append a tombstone, and admins can roll back or inspect history.
//!
//! # Architecture
//!
//! - [`core::ledger`]: the versioned answer store (single-latest invariant,
//!   transactional flip-and-append, rollback, history)
//! - [`core::registry`]: lazy, race-safe namespace allocation
//! - [`core::router`]: trigger/execute dispatch with per-namespace enable gating
//! - [`plugins::faq`]: the FAQ command set (`问`, `faq add|edit|cp|del|...`)
//!
//! Chat transport, admin lookup, card rendering and romanization are
//! collaborators behind the traits in [`core::interfaces`]; simple defaults
//! live in [`core::adapters`].
//!
//! # Examples
//!
//! ```bash
//! faqledger init
//! faqledger send --group 100 --user 1 -- -grpcfg enable faq
//! faqledger send --group 100 --user 1 faq add wifi password is 123
//! faqledger send --group 100 --user 2 q wifi
//! ```

pub mod core;
pub mod plugins;

mod cli;
mod subsystems;

use crate::cli::{Cli, Command, SenderArgs};
use crate::core::adapters::{AsciiFoldKey, StaticAdminRoster, StdoutChannel, TextCardRenderer};
use crate::core::command::{MessageContext, MessageType};
use crate::core::config::{self, Settings};
use crate::core::error::FaqError;
use crate::core::router::PluginGroup;
use crate::core::store::Store;
use crate::core::{logging, time};
use crate::plugins::Collaborators;
use clap::Parser;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub fn run() -> Result<(), FaqError> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())?;
    logging::init(&settings)?;

    let store = Store::open(&settings.data_dir, settings.busy_timeout())?;

    match cli.command {
        Command::Init => {
            use colored::Colorize;
            println!(
                "{} {}",
                "initialized".green().bold(),
                store.root.display()
            );
        }
        Command::Send { sender, text } => {
            let group = build_group(&store, &settings);
            let msg = text.join(" ");
            dispatch_line(&group, &sender, &msg, &MessageIds::default());
        }
        Command::Repl { sender } => {
            let group = build_group(&store, &settings);
            let ids = MessageIds::default();
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                let line = line.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    continue;
                }
                dispatch_line(&group, &sender, line, &ids);
            }
        }
        Command::Namespaces { format } => {
            let namespaces = store.registry().list()?;
            if format == "json" {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&namespaces)
                        .map_err(|e| FaqError::ValidationError(e.to_string()))?
                );
            } else {
                for ns in namespaces {
                    println!("{}\tcreated={}\tnext_seq={}", ns.id, time::epoch_z(ns.created_at), ns.next_seq);
                }
            }
        }
    }
    Ok(())
}

fn build_group(store: &Store, settings: &Settings) -> PluginGroup {
    let collab = Collaborators {
        channel: Arc::new(StdoutChannel),
        roster: Arc::new(StaticAdminRoster::new(settings.admins.clone())),
        renderer: Arc::new(TextCardRenderer::new(settings.render_dir())),
        keys: Arc::new(AsciiFoldKey),
    };
    plugins::faq_group(store, settings, collab)
}

#[derive(Default)]
struct MessageIds(AtomicI64);

impl MessageIds {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn dispatch_line(group: &PluginGroup, sender: &SenderArgs, msg: &str, ids: &MessageIds) {
    let ctx = MessageContext {
        message_type: if sender.private {
            MessageType::Private
        } else {
            MessageType::Group
        },
        namespace: sender.group.clone(),
        user_id: sender.user.clone(),
        message_id: ids.next(),
        time: time::now_epoch(),
    };
    if group.dispatch(msg, &ctx).is_none() {
        tracing::debug!(namespace = %ctx.namespace, "message not handled");
    }
}
