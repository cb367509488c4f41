//! Chat plugins and the wiring that assembles them into a dispatchable group.
//!
//! - `faq`: the FAQ operation set plus its help, ask and maintain plugins
//! - `listing`: grouping of active questions for `faq show`

pub mod faq;
pub mod listing;

use crate::core::config::Settings;
use crate::core::interfaces::{AdminRoster, ImageRenderer, MessageChannel, PinyinKey};
use crate::core::router::{GroupGate, Plugin, PluginGroup};
use crate::core::store::Store;
use faq::{AskFaq, FaqBook, HelpFaq, MaintainFaq};
use std::sync::Arc;

/// External services the FAQ plugins talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub channel: Arc<dyn MessageChannel>,
    pub roster: Arc<dyn AdminRoster>,
    pub renderer: Arc<dyn ImageRenderer>,
    pub keys: Arc<dyn PinyinKey>,
}

/// The FAQ plugin group, gated per namespace under `settings.group_name`.
pub fn faq_group(store: &Store, settings: &Settings, collab: Collaborators) -> PluginGroup {
    let book = Arc::new(
        FaqBook::new(store.answers(), collab.roster.clone())
            .with_history_limit(settings.history_limit),
    );
    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(HelpFaq::new(collab.channel.clone())),
        Box::new(AskFaq::new(book.clone(), collab.channel.clone())),
        Box::new(MaintainFaq::new(
            book,
            collab.channel.clone(),
            collab.renderer,
            collab.keys,
        )),
    ];
    let gate = GroupGate::new(
        Arc::new(store.group_config()),
        &settings.group_name,
        settings.default_enabled,
    );
    PluginGroup::new(
        &settings.group_name,
        plugins,
        gate,
        collab.roster,
        collab.channel,
    )
}
