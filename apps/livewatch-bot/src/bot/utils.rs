use livewatch_core::TargetKind;
use livewatch_db::models::TargetStatus;
use teloxide::types::LinkPreviewOptions;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn status_icon(status: TargetStatus) -> &'static str {
    match status {
        TargetStatus::Live => "🟢 LIVE",
        TargetStatus::Die => "🔴 DIE",
        TargetStatus::Unknown => "⚪ UNKNOWN",
    }
}

pub fn kind_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Profile => "Profile/Page",
        TargetKind::Group => "Group",
    }
}

pub fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Parses a comma-separated chat allow-list. Unparsable entries are ignored.
pub fn parse_chat_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|item| item.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("a & <b>\"c\""), "a &amp; &lt;b&gt;&quot;c&quot;");
    }

    #[test]
    fn chat_list_skips_garbage() {
        assert_eq!(parse_chat_list(" 12, -100345 ,abc,,7"), vec![12, -100345, 7]);
        assert!(parse_chat_list("").is_empty());
    }
}
