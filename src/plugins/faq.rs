//! The FAQ operation set and the chat plugins that expose it.
//!
//! [`FaqBook`] holds the state-transition rules (add only when absent, edit only
//! when present, admin-only rollback and history, ...) on top of the
//! [`AnswerStore`]. [`HelpFaq`], [`AskFaq`] and [`MaintainFaq`] parse chat text
//! into [`Command`]s and turn the outcomes into replies.

use crate::core::command::{Command, FaqOp, MessageContext, Outcome, PluginInfo, ShowMode};
use crate::core::error::FaqError;
use crate::core::interfaces::{AdminRoster, ImageRenderer, MessageChannel, Outbound, PinyinKey};
use crate::core::ledger::{AnswerRecord, AnswerStore, DEFAULT_HISTORY_LIMIT, Editor, Revision};
use crate::core::router::Plugin;
use crate::plugins::listing;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static ASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(问|q)\s+(\S+)$").expect("valid ask regex"));
static MAINTAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^faq\s+(\S+)\s*(.*)$").expect("valid faq regex"));
static KEY_AND_REST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\S+)\s*(.*)$").expect("valid key/rest regex"));
static KEY_SEP_REST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\S+)\s(.*)$").expect("valid append regex"));
static TWO_KEYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(\S+)$").expect("valid pair regex"));
static ONE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)$").expect("valid key regex"));

pub const HELP_TRIGGER: &str = "问答帮助";

pub const HELP_TEXT: &str = "查询关键字： 'q <key>' / '问 <key>'\n\
问答库按拼音排序： 'faq show' / 'faq show -1'\n\
问答库按分组排序： 'faq show -2'\n\
新建问题： 'faq (new/add) <key> (<original ans>)'\n\
更改答案： 'faq edit <key> <new ans>'\n\
复制问题： 'faq cp <key> <new key>'\n\
删除问题： 'faq del <key>'\n\
附加答案： 'faq append <key> <ans to append>'\n\
标记分组： 'faq tag <key> <tag>'\n\
回滚(需要权限)： 'faq rollback <key>'\n\
修改记录(需要权限)： 'faq history <key>'";

const USAGE_SHOW: &str = "语法有误，支持语句为: faq show(/ -1/ -2)";
const USAGE_ADD: &str = "语法有误，支持语句为: faq (new/add) <key> (<ans>)";
const USAGE_EDIT: &str = "语法有误，支持语句为: faq edit <key> <ans>";
const USAGE_COPY: &str = "语法有误，支持语句为: faq cp <name> <new name>";
const USAGE_DELETE: &str = "语法有误，支持语句为: faq del <key>";
const USAGE_APPEND: &str = "语法有误，支持语句为: faq append <key> <ans to append>";
const USAGE_TAG: &str = "语法有误，支持语句为: faq tag <key> <tag>";
const USAGE_ROLLBACK: &str = "语法有误，支持语句为: faq rollback <key>";
const USAGE_HISTORY: &str = "语法有误，支持语句为: faq history <key>";
const UNKNOWN_MODE: &str = "输入格式不对哦，请输入【问答帮助】获取操作指南";

/// FAQ state transitions over one [`AnswerStore`].
///
/// Every precondition is checked inside the same write transaction that
/// performs the append, so two racing `add`s cannot both succeed.
pub struct FaqBook {
    ledger: AnswerStore,
    roster: Arc<dyn AdminRoster>,
    history_limit: usize,
}

impl FaqBook {
    pub fn new(ledger: AnswerStore, roster: Arc<dyn AdminRoster>) -> Self {
        Self {
            ledger,
            roster,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn ask(&self, ns: &str, question: &str) -> Result<Option<String>, FaqError> {
        self.ledger.get(ns, question)
    }

    pub fn add(
        &self,
        ns: &str,
        question: &str,
        answer: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.revise(ns, question, editor, |current| match current {
            Some(_) => Err(FaqError::AlreadyExists(question.to_string())),
            None => Ok(Revision::answer(answer)),
        })
    }

    pub fn edit(
        &self,
        ns: &str,
        question: &str,
        answer: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.revise(ns, question, editor, |current| match current {
            Some(_) => Ok(Revision::answer(answer)),
            None => Err(FaqError::NotFound(question.to_string())),
        })
    }

    pub fn copy(
        &self,
        ns: &str,
        src: &str,
        dst: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.copy(ns, src, dst, editor)
    }

    pub fn delete(
        &self,
        ns: &str,
        question: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.revise(ns, question, editor, |current| match current {
            Some(_) => Ok(Revision::tombstone()),
            None => Err(FaqError::NotFound(question.to_string())),
        })
    }

    /// Raw concatenation, no separator inserted.
    pub fn append(
        &self,
        ns: &str,
        question: &str,
        text: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.revise(ns, question, editor, |current| match current {
            Some(prev) => Ok(Revision::answer(format!("{}{}", prev.answer, text))),
            None => Err(FaqError::NotFound(question.to_string())),
        })
    }

    pub fn tag(
        &self,
        ns: &str,
        question: &str,
        label: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.ledger.revise(ns, question, editor, |current| match current {
            Some(prev) => Ok(Revision::tagged(prev.answer.clone(), label)),
            None => Err(FaqError::NotFound(question.to_string())),
        })
    }

    pub fn rollback(&self, ns: &str, question: &str, user_id: &str) -> Result<(), FaqError> {
        self.require_admin(ns, user_id)?;
        if self.ledger.rollback(ns, question)? {
            Ok(())
        } else {
            Err(FaqError::NotFound(question.to_string()))
        }
    }

    pub fn history(
        &self,
        ns: &str,
        question: &str,
        user_id: &str,
    ) -> Result<Vec<AnswerRecord>, FaqError> {
        self.require_admin(ns, user_id)?;
        self.ledger.history(ns, question, self.history_limit)
    }

    pub fn list(
        &self,
        ns: &str,
        mode: ShowMode,
        keys: &dyn PinyinKey,
    ) -> Result<Vec<(String, Vec<String>)>, FaqError> {
        let active = self.ledger.list_active(ns)?;
        match mode {
            ShowMode::ByInitial => Ok(listing::group_by_initial(
                active.into_iter().map(|(q, _)| q).collect(),
                keys,
            )),
            ShowMode::ByTag => Ok(listing::group_by_tag(active)),
            ShowMode::Invalid => Err(FaqError::ValidationError(USAGE_SHOW.to_string())),
        }
    }

    fn require_admin(&self, ns: &str, user_id: &str) -> Result<(), FaqError> {
        if self.roster.is_admin(ns, user_id) {
            Ok(())
        } else {
            Err(FaqError::PermissionDenied(user_id.to_string()))
        }
    }
}

/// Parses the `<mode> <operand>` part of a `faq` command.
pub fn parse_op(mode: &str, operand: &str) -> FaqOp {
    let malformed = |usage: &'static str| FaqOp::Malformed { usage };
    match mode {
        "show" | "ls" => FaqOp::Show(match operand.trim() {
            "" | "-1" => ShowMode::ByInitial,
            "-2" => ShowMode::ByTag,
            _ => ShowMode::Invalid,
        }),
        "new" | "add" | "edit" => {
            let usage = if mode == "edit" { USAGE_EDIT } else { USAGE_ADD };
            let Some(caps) = KEY_AND_REST_RE.captures(operand) else {
                return malformed(usage);
            };
            let question = caps[1].to_string();
            let answer = caps[2].trim().to_string();
            if mode == "edit" {
                FaqOp::Edit { question, answer }
            } else {
                FaqOp::Add { question, answer }
            }
        }
        "cp" => match TWO_KEYS_RE.captures(operand.trim_end()) {
            Some(caps) => FaqOp::Copy {
                src: caps[1].to_string(),
                dst: caps[2].to_string(),
            },
            None => malformed(USAGE_COPY),
        },
        "del" => match ONE_KEY_RE.captures(operand.trim_end()) {
            Some(caps) => FaqOp::Delete {
                question: caps[1].to_string(),
            },
            None => malformed(USAGE_DELETE),
        },
        "append" => match KEY_SEP_REST_RE.captures(operand) {
            Some(caps) => FaqOp::Append {
                question: caps[1].to_string(),
                text: caps[2].to_string(),
            },
            None => malformed(USAGE_APPEND),
        },
        "tag" => match TWO_KEYS_RE.captures(operand.trim_end()) {
            Some(caps) => FaqOp::Tag {
                question: caps[1].to_string(),
                tag: caps[2].to_string(),
            },
            None => malformed(USAGE_TAG),
        },
        "rollback" => match ONE_KEY_RE.captures(operand.trim_end()) {
            Some(caps) => FaqOp::Rollback {
                question: caps[1].to_string(),
            },
            None => malformed(USAGE_ROLLBACK),
        },
        "history" => match ONE_KEY_RE.captures(operand.trim_end()) {
            Some(caps) => FaqOp::History {
                question: caps[1].to_string(),
            },
            None => malformed(USAGE_HISTORY),
        },
        other => FaqOp::Unknown {
            mode: other.to_string(),
        },
    }
}

fn echo(answer: &str, question: &str) -> String {
    format!("{answer}\n【{question}】")
}

/// Storage failures become `generic` (after logging), validation failures echo
/// their message, anything else propagates to the router.
fn soften(err: FaqError, op: &str, generic: &str) -> Result<String, FaqError> {
    if err.is_storage() {
        tracing::warn!(op, error = %err, "faq storage failure");
        return Ok(generic.to_string());
    }
    match err {
        FaqError::ValidationError(msg) => Ok(msg),
        other => Err(other),
    }
}

fn faq_plugin_info(name: &str, description: &str, command_description: &str) -> PluginInfo {
    PluginInfo {
        name: name.to_string(),
        description: description.to_string(),
        command_description: command_description.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        author: "faqledger".to_string(),
    }
}

pub struct HelpFaq {
    channel: Arc<dyn MessageChannel>,
}

impl HelpFaq {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self { channel }
    }
}

impl Plugin for HelpFaq {
    fn info(&self) -> PluginInfo {
        faq_plugin_info("HelpFaq", "问答帮助", HELP_TRIGGER)
    }

    fn judge_trigger(&self, msg: &str, ctx: &MessageContext) -> Option<Command> {
        (msg == HELP_TRIGGER && ctx.is_group()).then_some(Command::Help)
    }

    fn execute(&self, command: Command, ctx: &MessageContext) -> Result<Outcome, FaqError> {
        match command {
            Command::Help => {
                self.channel.send(&ctx.namespace, Outbound::text(HELP_TEXT))?;
                Ok(Outcome::Handled)
            }
            _ => Ok(Outcome::Pass),
        }
    }
}

pub struct AskFaq {
    book: Arc<FaqBook>,
    channel: Arc<dyn MessageChannel>,
}

impl AskFaq {
    pub fn new(book: Arc<FaqBook>, channel: Arc<dyn MessageChannel>) -> Self {
        Self { book, channel }
    }
}

impl Plugin for AskFaq {
    fn info(&self) -> PluginInfo {
        faq_plugin_info("AskFaq", "问答库", "问 [...]")
    }

    fn judge_trigger(&self, msg: &str, ctx: &MessageContext) -> Option<Command> {
        if !ctx.is_group() {
            return None;
        }
        let caps = ASK_RE.captures(msg)?;
        Some(Command::Ask {
            question: caps[2].to_string(),
        })
    }

    fn execute(&self, command: Command, ctx: &MessageContext) -> Result<Outcome, FaqError> {
        let Command::Ask { question } = command else {
            return Ok(Outcome::Pass);
        };
        let reply = match self.book.ask(&ctx.namespace, &question) {
            Ok(Some(answer)) => echo(&answer, &question),
            Ok(None) => "未查询到信息".to_string(),
            Err(e) => soften(e, "ask", "查询失败")?,
        };
        self.channel.send(&ctx.namespace, Outbound::Text(reply))?;
        Ok(Outcome::Handled)
    }
}

pub struct MaintainFaq {
    book: Arc<FaqBook>,
    channel: Arc<dyn MessageChannel>,
    renderer: Arc<dyn ImageRenderer>,
    keys: Arc<dyn PinyinKey>,
}

impl MaintainFaq {
    pub fn new(
        book: Arc<FaqBook>,
        channel: Arc<dyn MessageChannel>,
        renderer: Arc<dyn ImageRenderer>,
        keys: Arc<dyn PinyinKey>,
    ) -> Self {
        Self {
            book,
            channel,
            renderer,
            keys,
        }
    }

    fn run(&self, op: FaqOp, ctx: &MessageContext) -> Result<Outbound, FaqError> {
        let ns = ctx.namespace.as_str();
        let editor = Editor::new(&ctx.user_id, ctx.time);
        let text = match op {
            FaqOp::Show(mode) => match self.book.list(ns, mode, self.keys.as_ref()) {
                Ok(groups) => {
                    let title = format!("{ns} FAQ 问题列表");
                    match self.renderer.render_list(&title, &groups) {
                        Ok(path) => return Ok(Outbound::Image(path)),
                        Err(e) => soften(e, "show", "查询失败")?,
                    }
                }
                Err(e) => soften(e, "show", "查询失败")?,
            },
            FaqOp::Add { question, answer } => {
                match self.book.add(ns, &question, &answer, editor) {
                    Ok(_) => echo(&answer, &question),
                    Err(FaqError::AlreadyExists(_)) => format!("问题【{question}】已经存在"),
                    Err(e) => soften(e, "add", "更新失败")?,
                }
            }
            FaqOp::Edit { question, answer } => {
                match self.book.edit(ns, &question, &answer, editor) {
                    Ok(_) => echo(&answer, &question),
                    Err(FaqError::NotFound(_)) => {
                        "问题不存在，请先使用\"faq add\"语句创建该问题".to_string()
                    }
                    Err(e) => soften(e, "edit", "更新失败")?,
                }
            }
            FaqOp::Copy { src, dst } => match self.book.copy(ns, &src, &dst, editor) {
                Ok(record) => echo(&record.answer, &dst),
                Err(FaqError::NotFound(_)) => format!("【{src}】问题不存在"),
                Err(e) => soften(e, "cp", "问题复制失败")?,
            },
            FaqOp::Delete { question } => match self.book.delete(ns, &question, editor) {
                Ok(_) => "问题删除成功".to_string(),
                Err(FaqError::NotFound(_)) => "问题不存在".to_string(),
                Err(e) => soften(e, "del", "问题删除失败")?,
            },
            FaqOp::Append { question, text } => {
                match self.book.append(ns, &question, &text, editor) {
                    Ok(record) => echo(&record.answer, &question),
                    Err(FaqError::NotFound(_)) => format!("【{question}】问题不存在"),
                    Err(e) => soften(e, "append", "更新失败")?,
                }
            }
            FaqOp::Tag { question, tag } => match self.book.tag(ns, &question, &tag, editor) {
                Ok(_) => "OK".to_string(),
                Err(FaqError::NotFound(_)) => format!("【{question}】问题不存在"),
                Err(e) => soften(e, "tag", "更新失败")?,
            },
            FaqOp::Rollback { question } => {
                match self.book.rollback(ns, &question, &ctx.user_id) {
                    Ok(()) => "OK".to_string(),
                    Err(FaqError::PermissionDenied(_)) => "您没有回滚记录权限".to_string(),
                    Err(FaqError::NotFound(_)) => format!("记录【{question}】不存在"),
                    Err(e) => soften(e, "rollback", "回滚失败")?,
                }
            }
            FaqOp::History { question } => {
                match self.book.history(ns, &question, &ctx.user_id) {
                    Ok(records) => {
                        let title = format!("FAQ 【{question}】 历史记录");
                        match self.renderer.render_history(&title, &records) {
                            Ok(path) => return Ok(Outbound::Image(path)),
                            Err(e) => soften(e, "history", "查询失败")?,
                        }
                    }
                    Err(FaqError::PermissionDenied(_)) => "您没有查看记录权限".to_string(),
                    Err(e) => soften(e, "history", "查询失败")?,
                }
            }
            FaqOp::Malformed { usage } => usage.to_string(),
            FaqOp::Unknown { mode } => {
                tracing::debug!(mode, "unknown faq mode");
                UNKNOWN_MODE.to_string()
            }
        };
        Ok(Outbound::Text(text))
    }
}

impl Plugin for MaintainFaq {
    fn info(&self) -> PluginInfo {
        faq_plugin_info("MaintainFaq", "维护问答库", "faq <mod> [...]")
    }

    fn judge_trigger(&self, msg: &str, ctx: &MessageContext) -> Option<Command> {
        if !ctx.is_group() {
            return None;
        }
        let caps = MAINTAIN_RE.captures(msg)?;
        Some(Command::Maintain(parse_op(&caps[1], &caps[2])))
    }

    fn execute(&self, command: Command, ctx: &MessageContext) -> Result<Outcome, FaqError> {
        let Command::Maintain(op) = command else {
            return Ok(Outcome::Pass);
        };
        let reply = self.run(op, ctx)?;
        self.channel.send(&ctx.namespace, reply)?;
        Ok(Outcome::Handled)
    }
}
