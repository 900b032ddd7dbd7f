use crate::AppState;
use crate::bot::keyboards::{KEEP_PREFIX, STOP_PREFIX};
use teloxide::prelude::*;
use tracing::{error, info};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    if !state.is_allowed(chat_id.0) {
        bot.answer_callback_query(q.id.clone()).text("⛔ Not allowed").await?;
        return Ok(());
    }
    info!("Callback {} from chat {}", data, chat_id);

    if let Some(target_id) = data.strip_prefix(KEEP_PREFIX) {
        bot.answer_callback_query(q.id.clone())
            .text(format!("✅ Still watching {}", target_id))
            .await?;
    } else if let Some(target_id) = data.strip_prefix(STOP_PREFIX) {
        let reply = match state.watch.remove(chat_id.0, target_id).await {
            Ok((id, true)) => format!("🛑 Stopped watching {}", id),
            Ok((id, false)) => format!("ℹ️ {} was not on your list", id),
            Err(e) => {
                error!("Failed to remove {} for {}: {:#}", target_id, chat_id, e);
                "❌ Could not update your list, try again later".to_string()
            }
        };
        bot.answer_callback_query(q.id.clone()).await?;
        bot.send_message(chat_id, reply).await?;
    } else {
        bot.answer_callback_query(q.id.clone()).await?;
    }

    Ok(())
}
