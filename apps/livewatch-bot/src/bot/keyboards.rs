use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

pub const KEEP_PREFIX: &str = "keep:";
pub const STOP_PREFIX: &str = "stop:";

/// Open link on top, keep/stop below. The link row is dropped if the URL does not parse.
pub fn watch_keyboard(target_id: &str, url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Ok(link) = Url::parse(url) {
        rows.push(vec![InlineKeyboardButton::url("🔗 Open", link)]);
    }
    rows.push(vec![
        InlineKeyboardButton::callback("✅ Keep watching", format!("{}{}", KEEP_PREFIX, target_id)),
        InlineKeyboardButton::callback("🛑 Stop watching", format!("{}{}", STOP_PREFIX, target_id)),
    ]);
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn keyboard_carries_target_in_callbacks() {
        let keyboard = watch_keyboard("jane.doe", "https://mbasic.facebook.com/jane.doe");
        assert_eq!(keyboard.inline_keyboard.len(), 2);

        let callbacks: Vec<String> = keyboard.inline_keyboard[1]
            .iter()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(callbacks, vec!["keep:jane.doe", "stop:jane.doe"]);
    }

    #[test]
    fn unparsable_url_drops_open_button() {
        let keyboard = watch_keyboard("x", "not a url");
        assert_eq!(keyboard.inline_keyboard.len(), 1);
    }
}
