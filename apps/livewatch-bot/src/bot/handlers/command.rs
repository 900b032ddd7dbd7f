use crate::AppState;
use crate::bot::keyboards::watch_keyboard;
use crate::bot::utils::{escape_html, kind_label, no_preview, status_icon};
use crate::services::poll_scheduler::CycleOutcome;
use crate::services::watch_service::{AddOutcome, AddRequest, CheckedTarget, WatchError};
use chrono::Local;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};
use tracing::{error, info};

const LIST_PACING: Duration = Duration::from_millis(400);
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

const HELP: &str = "👋 <b>LIVE/DIE watcher</b>\n\n\
    /add <code>link or id | note | owner | profile|group</code> - start watching\n\
    /addmany - one target per line: <code>link, note, owner, kind</code>\n\
    /list - re-check everything you watch\n\
    /remove <code>id</code> - stop watching\n\
    /id <code>link</code> - show the normalized id\n\
    /checknow - run a poll cycle now";

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some((command, args)) = split_command(text) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if !state.is_allowed(chat_id.0) {
        info!("Rejected {} from chat {}", command, chat_id);
        bot.send_message(chat_id, "⛔ This bot is private.").await?;
        return Ok(());
    }

    match command.as_str() {
        "/start" | "/help" => reply_html(&bot, chat_id, HELP.to_string(), None).await?,
        "/add" => {
            if args.is_empty() {
                let usage = "Usage: /add <code>link | note | owner | kind</code>";
                reply_html(&bot, chat_id, usage.to_string(), None).await?;
                return Ok(());
            }
            add_one(&bot, chat_id, &state, AddRequest::parse(args, '|')).await?;
        }
        "/addmany" => {
            let lines: Vec<&str> = args.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            if lines.is_empty() {
                let usage =
                    "Usage: /addmany then one <code>link, note, owner, kind</code> per line";
                reply_html(&bot, chat_id, usage.to_string(), None).await?;
                return Ok(());
            }
            for line in lines {
                add_one(&bot, chat_id, &state, AddRequest::parse(line, ',')).await?;
            }
        }
        "/list" => list(&bot, chat_id, &state).await?,
        "/remove" => {
            if args.is_empty() {
                bot.send_message(chat_id, "Usage: /remove <id>").await?;
                return Ok(());
            }
            let reply = match state.watch.remove(chat_id.0, args).await {
                Ok((id, true)) => format!("🗑️ Stopped watching {}", id),
                Ok((id, false)) => format!("ℹ️ {} is not on your list", id),
                Err(e) => {
                    error!("Failed to remove {} for {}: {:#}", args, chat_id, e);
                    "❌ Could not update your list, try again later".to_string()
                }
            };
            bot.send_message(chat_id, reply).await?;
        }
        "/id" => {
            let reply = match state.watch.identify(args) {
                Ok(target) => format!(
                    "🪪 <b>ID</b>: <code>{}</code>\n📂 <b>Kind</b>: {}\n🔗 {}",
                    escape_html(&target.id),
                    kind_label(target.kind),
                    escape_html(&target.canonical_url)
                ),
                Err(e) => format!("❌ {}", escape_html(&e.to_string())),
            };
            reply_html(&bot, chat_id, reply, None).await?;
        }
        "/checknow" => {
            if state.scheduler.is_running() {
                bot.send_message(chat_id, "⏳ A check is already running").await?;
                return Ok(());
            }
            bot.send_message(chat_id, "⏳ Checking all targets...").await?;
            let reply = match state.scheduler.try_run_cycle().await {
                Ok(CycleOutcome::Completed(report)) => format!(
                    "✅ Checked {}: {} changed, {} unresolved, {} failed",
                    report.checked, report.transitions, report.unresolved, report.failed
                ),
                Ok(CycleOutcome::Skipped) => "⏳ A check is already running".to_string(),
                Err(e) => {
                    error!("Manual poll cycle failed: {:#}", e);
                    "❌ Check failed, see logs".to_string()
                }
            };
            bot.send_message(chat_id, reply).await?;
        }
        _ => {}
    }

    Ok(())
}

async fn add_one(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    request: Result<AddRequest, WatchError>,
) -> Result<(), teloxide::RequestError> {
    let result = match request {
        Ok(request) => state.watch.add(chat_id.0, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            let keyboard = watch_keyboard(&outcome.target.id, &outcome.target.canonical_url);
            reply_html(bot, chat_id, added_card(&outcome), Some(keyboard)).await
        }
        Err(WatchError::Store(e)) => {
            error!("Failed to add target for {}: {:#}", chat_id, e);
            bot.send_message(chat_id, "❌ Could not save, try again later").await?;
            Ok(())
        }
        Err(e) => {
            let text = format!("❌ {}", escape_html(&e.to_string()));
            reply_html(bot, chat_id, text, None).await
        }
    }
}

async fn list(bot: &Bot, chat_id: ChatId, state: &AppState) -> Result<(), teloxide::RequestError> {
    let watched = match state.watch.list(chat_id.0).await {
        Ok(watched) => watched,
        Err(e) => {
            error!("Failed to list targets for {}: {:#}", chat_id, e);
            bot.send_message(chat_id, "❌ Could not load your list").await?;
            return Ok(());
        }
    };
    if watched.is_empty() {
        bot.send_message(chat_id, "📭 You are not watching anything yet").await?;
        return Ok(());
    }

    bot.send_message(chat_id, format!("🔄 Re-checking {} targets...", watched.len()))
        .await?;
    for (i, item) in watched.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(LIST_PACING).await;
        }
        let target_id = item.target_id.clone();
        match state.watch.check(item).await {
            Ok(checked) => {
                let keyboard = watch_keyboard(&checked.watched.target_id, &checked.watched.url);
                reply_html(bot, chat_id, list_card(&checked), Some(keyboard)).await?;
            }
            Err(e) => error!("Failed to re-check {} for {}: {:#}", target_id, chat_id, e),
        }
    }
    Ok(())
}

async fn reply_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<(), teloxide::RequestError> {
    let mut request = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .link_preview_options(no_preview());
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

fn added_card(outcome: &AddOutcome) -> String {
    let target = &outcome.target;
    format!(
        "✅ <b>Now watching</b>\n{RULE}\n\
         🪪 <b>ID</b>: <a href=\"{url}\">{id}</a>\n\
         {name}\
         📂 <b>Kind</b>: {kind}\n\
         📝 <b>Note</b>: {note}\n\
         🙍 <b>Owner</b>: {owner}\n\
         📌 <b>Added</b>: {added}\n\
         📟 <b>Status</b>: {status}\n{RULE}",
        url = escape_html(&target.canonical_url),
        id = escape_html(&target.id),
        name = name_line(outcome.display_name.as_deref()),
        kind = kind_label(target.kind),
        note = escape_html(outcome.annotation.as_deref().unwrap_or("—")),
        owner = escape_html(outcome.owner_label.as_deref().unwrap_or("—")),
        added = Local::now().format("%Y-%m-%d %H:%M:%S"),
        status = status_icon(outcome.status),
    )
}

fn list_card(checked: &CheckedTarget) -> String {
    let watched = &checked.watched;
    format!(
        "{RULE}\n\
         🪪 <b>ID</b>: <a href=\"{url}\">{id}</a>\n\
         {name}\
         📂 <b>Kind</b>: {kind}\n\
         📝 <b>Note</b>: {note}\n\
         🙍 <b>Owner</b>: {owner}\n\
         📟 <b>Status</b>: {status}\n{RULE}",
        url = escape_html(&watched.url),
        id = escape_html(&watched.target_id),
        name = name_line(checked.display_name.as_deref()),
        kind = kind_label(watched.target_kind()),
        note = escape_html(watched.annotation.as_deref().unwrap_or("—")),
        owner = escape_html(watched.owner_label.as_deref().unwrap_or("—")),
        status = status_icon(checked.status),
    )
}

fn name_line(name: Option<&str>) -> String {
    name.map(|n| format!("👤 <b>Name</b>: {}\n", escape_html(n)))
        .unwrap_or_default()
}

/// `/cmd@bot args` → (`/cmd`, `args`).
fn split_command(text: &str) -> Option<(String, &str)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (head, rest) = text
        .split_once(char::is_whitespace)
        .unwrap_or((text, ""));
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
    Some((name, rest.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use livewatch_core::{NormalizedTarget, TargetKind};
    use livewatch_db::models::TargetStatus;

    #[test]
    fn commands_are_split_from_arguments() {
        assert_eq!(
            split_command("/add 123456789 | note"),
            Some(("/add".to_string(), "123456789 | note"))
        );
        assert_eq!(
            split_command("/List@livewatch_bot"),
            Some(("/list".to_string(), ""))
        );
        assert_eq!(
            split_command("/addmany\njane.doe, a\n123456789, b"),
            Some(("/addmany".to_string(), "jane.doe, a\n123456789, b"))
        );
        assert_eq!(split_command("hello"), None);
    }

    #[test]
    fn added_card_shows_fields() {
        let outcome = AddOutcome {
            target: NormalizedTarget {
                id: "abc123".to_string(),
                canonical_url: "https://mbasic.facebook.com/groups/abc123".to_string(),
                kind: TargetKind::Group,
            },
            status: TargetStatus::Unknown,
            display_name: None,
            annotation: Some("a & b".to_string()),
            owner_label: None,
        };
        let card = added_card(&outcome);
        assert!(card.contains("📂 <b>Kind</b>: Group"));
        assert!(card.contains("a &amp; b"));
        assert!(card.contains("⚪ UNKNOWN"));
        assert!(!card.contains("<b>Name</b>"));
    }
}
