//! Inbound event routing (§4.7, §6): a raw NapCat frame is parsed, the
//! observed `self_id` is recorded, and the event is handed to the command
//! grammar before falling through to whichever component owns "not a
//! command" — anti-recall ingest for group messages, agent interception
//! for private ones.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use qqbot_agent::RouterOutcome;
use qqbot_command::{self, AntiRecallArg, ParsedCommand, TestArg};
use qqbot_llm::{ChatMessage, Role};
use qqbot_message::normalize_content;
use qqbot_protocol::{GroupMessageEvent, GroupRecallNotice, PrivateMessageEvent};
use qqbot_recall::RecallContext;

use crate::app::AppState;

/// Where a command's reply (and a bare `recall`'s default context) goes.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Group(i64),
    Friend(i64),
}

pub async fn handle_frame(text: &str, state: &Arc<AppState>) {
    let raw: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "malformed inbound frame, ignoring");
            return;
        }
    };

    if let Some(id) = raw.get("self_id").and_then(Value::as_i64) {
        state.observe_self_id(id);
    }

    match raw.get("post_type").and_then(Value::as_str) {
        Some("message") => handle_message(raw, state).await,
        Some("notice") => handle_notice(raw, state).await,
        other => debug!(?other, "ignoring unhandled post_type"),
    }
}

async fn handle_message(raw: Value, state: &Arc<AppState>) {
    match raw.get("message_type").and_then(Value::as_str) {
        Some("group") => match serde_json::from_value::<GroupMessageEvent>(raw) {
            Ok(event) => handle_group_message(event, state).await,
            Err(e) => warn!(error = %e, "malformed message.group event"),
        },
        Some("private") => match serde_json::from_value::<PrivateMessageEvent>(raw) {
            Ok(event) => handle_private_message(event, state).await,
            Err(e) => warn!(error = %e, "malformed message.private event"),
        },
        other => debug!(?other, "ignoring unhandled message_type"),
    }
}

async fn handle_notice(raw: Value, state: &Arc<AppState>) {
    if raw.get("notice_type").and_then(Value::as_str) != Some("group_recall") {
        return;
    }
    match serde_json::from_value::<GroupRecallNotice>(raw) {
        Ok(notice) => state.antirecall.handle_group_recall(notice).await,
        Err(e) => warn!(error = %e, "malformed notice.group_recall event"),
    }
}

/// Commands are in scope in group chat; the `a` agent-opening command is
/// not (§4.7 restricts agent semantics to private chat).
async fn handle_group_message(event: GroupMessageEvent, state: &Arc<AppState>) {
    let text = normalize_content(event.message.clone()).plain_text();

    if let Some(command) = state.commands.try_parse(&text) {
        if matches!(command, ParsedCommand::Agent { .. }) {
            return;
        }
        if qqbot_command::authorize(event.user_id, &state.bot_config) {
            run_command(command, Origin::Group(event.group_id), event.user_id, state).await;
        }
        return;
    }

    if let Err(e) = state.antirecall.handle_group_message(event).await {
        warn!(error = %e, "anti-recall ingest failed");
    }
}

/// Every private-chat operation this bot exposes — command or agent turn
/// — is superuser-gated, so the check happens once up front.
async fn handle_private_message(event: PrivateMessageEvent, state: &Arc<AppState>) {
    if !qqbot_command::authorize(event.user_id, &state.bot_config) {
        return;
    }

    let message = normalize_content(event.message.clone());
    let text = message.plain_text();

    if let Some(command) = state.commands.try_parse(&text) {
        run_command(command, Origin::Friend(event.user_id), event.user_id, state).await;
        return;
    }

    let key = format!("{}:{}", state.self_id(), event.user_id);
    let turn = match state.adapters.resolve("onebot_v11") {
        Ok(adapter) => qqbot_agent::extract_turn(Role::User, message.segments(), adapter).await,
        Err(e) => {
            warn!(error = %e, "no adapter available for turn extraction, falling back to plain text");
            ChatMessage::user_text(&text)
        }
    };
    match state.agent.intercept(&key, turn).await {
        Ok(RouterOutcome::Clarify { text }) => send_reply(state, Origin::Friend(event.user_id), text).await,
        Ok(RouterOutcome::Dispatched) => {
            send_reply(state, Origin::Friend(event.user_id), "已收到需求，正在处理。".to_string()).await
        }
        Ok(RouterOutcome::DispatchFailed { message }) => {
            send_reply(state, Origin::Friend(event.user_id), format!("提交失败：{message}")).await
        }
        Ok(RouterOutcome::Opened) | Ok(RouterOutcome::NotIntercepted) => {}
        Err(e) => warn!(error = %e, "agent turn failed"),
    }
}

async fn run_command(command: ParsedCommand, origin: Origin, user_id: i64, state: &Arc<AppState>) {
    match command {
        ParsedCommand::AntiRecall(arg) => run_antirecall(arg, origin, state).await,
        ParsedCommand::Recall { count, group_id } => run_recall(count, group_id, origin, state).await,
        ParsedCommand::Agent { opening_text } => run_agent_open(opening_text, user_id, origin, state).await,
        ParsedCommand::Test(arg) => run_test(arg, origin, state).await,
    }
}

const ANTI_RECALL_ENABLED_KEY: &str = "plugins.anti_recall.enabled";

async fn run_antirecall(arg: AntiRecallArg, origin: Origin, state: &Arc<AppState>) {
    let current = state.config_store.get::<bool>(ANTI_RECALL_ENABLED_KEY, false);
    let new_value = match arg {
        AntiRecallArg::On => true,
        AntiRecallArg::Off => false,
        AntiRecallArg::Status => current,
        AntiRecallArg::Toggle | AntiRecallArg::None => !current,
    };

    if !matches!(arg, AntiRecallArg::Status) {
        state.config_store.set(ANTI_RECALL_ENABLED_KEY, new_value);
        if let Err(e) = state.config_store.save() {
            warn!(error = %e, "failed to persist anti-recall flag");
        }
    }

    let text = if new_value { "防撤回已开启" } else { "防撤回已关闭" };
    send_reply(state, origin, text.to_string()).await;
}

async fn run_recall(count: i64, group_id: Option<i64>, origin: Origin, state: &Arc<AppState>) {
    let count = count.max(0) as u32;
    let ctx = match (group_id, origin) {
        (Some(gid), _) => RecallContext::Group(gid),
        (None, Origin::Group(gid)) => RecallContext::Group(gid),
        (None, Origin::Friend(uid)) => RecallContext::Friend(uid),
    };

    match state.self_deleter.recall_own_messages(ctx, state.self_id(), count).await {
        Ok(report) => {
            let suffix = if report.hit_expiry { "（已到达可撤回时间上限）" } else { "" };
            send_reply(state, origin, format!("已撤回 {} 条消息{suffix}", report.deleted.len())).await;
        }
        Err(e) => warn!(error = %e, "self-delete failed"),
    }
}

/// Private-only per §4.7; the group dispatcher never routes an `a`
/// command here, but a defensive check keeps this function correct even
/// if that routing ever changes.
async fn run_agent_open(opening_text: Option<String>, user_id: i64, origin: Origin, state: &Arc<AppState>) {
    let Origin::Friend(_) = origin else { return };

    let key = format!("{}:{user_id}", state.self_id());
    match state.agent.open(&key, opening_text).await {
        Ok(RouterOutcome::Opened) => send_reply(state, origin, "会话已开启，请描述你的需求。".to_string()).await,
        Ok(RouterOutcome::Clarify { text }) => send_reply(state, origin, text).await,
        Ok(RouterOutcome::Dispatched) => {
            send_reply(state, origin, "已收到需求，正在处理。".to_string()).await
        }
        Ok(RouterOutcome::DispatchFailed { message }) => {
            send_reply(state, origin, format!("提交失败：{message}")).await
        }
        Ok(RouterOutcome::NotIntercepted) => {}
        Err(e) => warn!(error = %e, "agent open failed"),
    }
}

async fn run_test(arg: TestArg, origin: Origin, state: &Arc<AppState>) {
    let text = match arg {
        TestArg::Send => match state.client.last_sent() {
            Some(r) => format!(
                "time: {}\napi: {}\ntarget: {}\npayload: {}\nok: {}\nexception: {}",
                r.time,
                r.api_name,
                r.target,
                r.payload,
                r.ok,
                r.exception.as_deref().unwrap_or("none"),
            ),
            None => "尚无发送记录".to_string(),
        },
        TestArg::Alconna => "alconna probe ok".to_string(),
    };
    send_reply(state, origin, text).await;
}

async fn send_reply(state: &Arc<AppState>, origin: Origin, text: String) {
    let result = match origin {
        Origin::Group(group_id) => state.client.send_group_msg(group_id, text).await,
        Origin::Friend(user_id) => state.client.send_private_msg(user_id, text).await,
    };
    if let Err(e) = result {
        warn!(error = %e, "failed to send command reply");
    }
}
