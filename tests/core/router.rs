use faqledger::core::adapters::{RecordingChannel, StaticAdminRoster};
use faqledger::core::command::{Command, MessageContext, MessageType, Outcome, PluginInfo};
use faqledger::core::error::FaqError;
use faqledger::core::interfaces::{GlobalConfig, MessageChannel, Outbound};
use faqledger::core::router::{GroupGate, Plugin, PluginGroup, Ready};
use faqledger::core::store::Store;
use std::sync::Arc;
use tempfile::tempdir;

/// Answers `echo <word>` by sending `<word>` back.
struct Echo {
    channel: Arc<dyn MessageChannel>,
}

impl Plugin for Echo {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "Echo".into(),
            description: "echo".into(),
            command_description: "echo <word>".into(),
            version: "0".into(),
            author: "test".into(),
        }
    }

    fn judge_trigger(&self, msg: &str, _ctx: &MessageContext) -> Option<Command> {
        msg.strip_prefix("echo ").map(|w| Command::Ask {
            question: w.to_string(),
        })
    }

    fn execute(&self, command: Command, ctx: &MessageContext) -> Result<Outcome, FaqError> {
        let Command::Ask { question } = command else {
            return Ok(Outcome::Pass);
        };
        self.channel.send(&ctx.namespace, Outbound::Text(question))?;
        Ok(Outcome::Handled)
    }
}

/// Fails or panics on demand.
struct Faulty;

impl Plugin for Faulty {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "Faulty".into(),
            description: "faulty".into(),
            command_description: "boom|panic".into(),
            version: "0".into(),
            author: "test".into(),
        }
    }

    fn judge_trigger(&self, msg: &str, _ctx: &MessageContext) -> Option<Command> {
        matches!(msg, "boom" | "panic").then(|| Command::Ask {
            question: msg.to_string(),
        })
    }

    fn execute(&self, command: Command, _ctx: &MessageContext) -> Result<Outcome, FaqError> {
        match command {
            Command::Ask { question } if question == "panic" => panic!("plugin blew up"),
            _ => Err(FaqError::StorageError("disk on fire".into())),
        }
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    store: Store,
    channel: Arc<RecordingChannel>,
    group: PluginGroup,
}

fn harness(default_enabled: bool) -> Harness {
    let tmp = tempdir().unwrap();
    let store = Store::open_default(tmp.path()).unwrap();
    let channel = Arc::new(RecordingChannel::new());
    let roster = Arc::new(StaticAdminRoster::default().with_admin("100", "admin"));
    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(Faulty),
        Box::new(Echo {
            channel: channel.clone(),
        }),
    ];
    let gate = GroupGate::new(Arc::new(store.group_config()), "faq", default_enabled);
    let group = PluginGroup::new("faq", plugins, gate, roster, channel.clone());
    Harness {
        _tmp: tmp,
        store,
        channel,
        group,
    }
}

fn ctx(user: &str) -> MessageContext {
    MessageContext::group("100", user)
}

#[test]
fn test_disabled_group_ignores_commands_but_accepts_toggle() {
    let h = harness(false);

    assert_eq!(h.group.judge_trigger("echo hi", &ctx("u1")), None);

    let ready = h.group.judge_trigger("-grpcfg enable faq", &ctx("admin"));
    assert_eq!(ready, Some(Ready::Toggle { enable: true }));
    assert_eq!(
        h.group.execute_event(&ctx("admin"), ready.unwrap()),
        Some(Outcome::Handled)
    );
    assert_eq!(h.channel.last_text().as_deref(), Some("OK"));

    assert_eq!(
        h.group.dispatch("echo hi", &ctx("u1")),
        Some(Outcome::Handled)
    );
    assert_eq!(h.channel.last_text().as_deref(), Some("hi"));

    assert_eq!(h.group.dispatch("-grpcfg disable faq", &ctx("admin")), Some(Outcome::Handled));
    assert_eq!(h.group.judge_trigger("echo hi", &ctx("u1")), None);
}

#[test]
fn test_toggle_requires_admin_and_matching_group() {
    let h = harness(false);
    assert_eq!(h.group.judge_trigger("-grpcfg enable faq", &ctx("u1")), None);
    assert_eq!(h.group.judge_trigger("-grpcfg enable other", &ctx("admin")), None);
    assert_eq!(h.group.judge_trigger("-grpcfg reboot faq", &ctx("admin")), None);
    assert!(!h.group.is_enabled("100"));
}

#[test]
fn test_gate_default_is_persisted_on_first_access() {
    let h = harness(true);
    let config = h.store.group_config();
    assert_eq!(config.read("100", "faq.enable").unwrap(), None);
    assert!(h.group.is_enabled("100"));
    assert_eq!(
        config.read("100", "faq.enable").unwrap(),
        Some(serde_json::json!(true))
    );
}

#[test]
fn test_toggle_survives_new_router_instance() {
    let h = harness(false);
    h.group.dispatch("-grpcfg enable faq", &ctx("admin"));

    let gate = GroupGate::new(Arc::new(h.store.group_config()), "faq", false);
    assert!(gate.is_enabled("100"));
    assert!(!gate.is_enabled("200"));
}

#[test]
fn test_failing_plugin_does_not_break_later_dispatch() {
    let h = harness(true);

    let ready = h.group.judge_trigger("boom", &ctx("u1")).unwrap();
    assert_eq!(h.group.execute_event(&ctx("u1"), ready), None);

    let ready = h.group.judge_trigger("panic", &ctx("u1")).unwrap();
    assert_eq!(h.group.execute_event(&ctx("u1"), ready), None);

    assert_eq!(h.group.dispatch("echo still-alive", &ctx("u1")), Some(Outcome::Handled));
    assert_eq!(h.channel.last_text().as_deref(), Some("still-alive"));
}

#[test]
fn test_first_matching_plugin_is_staged() {
    let h = harness(true);
    match h.group.judge_trigger("echo x", &ctx("u1")) {
        Some(Ready::Delegate { plugin, .. }) => assert_eq!(plugin, 1),
        other => panic!("unexpected staging: {other:?}"),
    }
    assert_eq!(h.group.judge_trigger("nothing here", &ctx("u1")), None);
}

#[test]
fn test_interleaved_dispatches_execute_what_they_triggered() {
    let h = harness(true);
    h.group.is_enabled("100");

    // Trigger two messages before executing either; each execute must run its own.
    let first = h.group.judge_trigger("echo one", &ctx("u1")).unwrap();
    let second = h.group.judge_trigger("echo two", &ctx("u2")).unwrap();
    h.group.execute_event(&ctx("u2"), second);
    h.group.execute_event(&ctx("u1"), first);

    let texts: Vec<String> = h
        .channel
        .take()
        .into_iter()
        .filter_map(|(_, m)| m.as_text().map(str::to_string))
        .collect();
    assert_eq!(texts, vec!["two".to_string(), "one".to_string()]);
}

#[test]
fn test_concurrent_dispatch_routes_every_message() {
    let h = harness(true);
    const N: usize = 32;
    std::thread::scope(|s| {
        for i in 0..N {
            let group = &h.group;
            s.spawn(move || {
                let msg = format!("echo m{i}");
                let ready = group.judge_trigger(&msg, &ctx("u")).unwrap();
                group.execute_event(&ctx("u"), ready);
            });
        }
    });
    let mut texts: Vec<String> = h
        .channel
        .take()
        .into_iter()
        .filter_map(|(_, m)| m.as_text().map(str::to_string))
        .collect();
    texts.sort();
    let mut expected: Vec<String> = (0..N).map(|i| format!("m{i}")).collect();
    expected.sort();
    assert_eq!(texts, expected);
}

#[test]
fn test_group_info_is_derived_from_children() {
    let h = harness(true);
    assert_eq!(h.group.info().name, "faq");
    assert_eq!(h.group.info().description, "faulty/echo");
    assert_eq!(h.group.info().command_description, "boom|panic/echo <word>");
    assert_eq!(h.group.plugins().len(), 2);
}

#[test]
fn test_group_info_can_be_overridden() {
    let h = harness(true);
    let custom = PluginInfo {
        name: "FaqGroup".into(),
        description: "问答库".into(),
        command_description: "faq [...]".into(),
        version: "1".into(),
        author: "ops".into(),
    };
    let group = h.group.with_info(custom.clone());
    assert_eq!(group.info(), &custom);
    assert_eq!(group.dispatch("echo still", &ctx("u1")), Some(Outcome::Handled));
    assert_eq!(h.channel.last_text().as_deref(), Some("still"));
}

#[test]
fn test_private_messages_bypass_group_and_gate() {
    let h = harness(true);
    let private = MessageContext {
        message_type: MessageType::Private,
        ..ctx("admin")
    };
    assert_eq!(h.group.judge_trigger("-grpcfg disable faq", &private), None);
    assert_eq!(h.group.dispatch("echo hi", &private), None);
    assert!(h.channel.take().is_empty());
    assert_eq!(h.store.group_config().read("100", "faq.enable").unwrap(), None);

    assert_eq!(h.group.dispatch("echo hi", &ctx("u1")), Some(Outcome::Handled));
}
