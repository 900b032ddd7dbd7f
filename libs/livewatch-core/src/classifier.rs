//! Response classification.
//!
//! The provider answers 200 both for real pages behind a login wall and for
//! soft-404 "content unavailable" pages, so the status code alone proves
//! little. Rules, in priority order:
//!
//! 1. 404 / 410 is `DIE`.
//! 2. A configured dead phrase anywhere in the body is `DIE`.
//! 3. Rate limiting and server errors are inconclusive. This step is an
//!    addition to the plain dead/positive/unknown ladder: an error page can
//!    carry a title or stray cue text and must not be read as `LIVE`.
//! 4. A usable name (`og:title` or `<title>` that is not the sign-in
//!    placeholder) or an existence cue in the visible text is `LIVE`.
//!    Cues match whole words only, so `ảnh` does not fire inside `Cảnh báo`.
//! 5. Everything else, including an auth wall without cues, is inconclusive.

use crate::config::EngineConfig;
use crate::{ProbeResult, ProbeStatus};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// The parts of an HTTP response the classifier looks at.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    dead_phrases: Vec<String>,
    existence_cues: Vec<String>,
    placeholder_titles: Vec<String>,
    auth_wall_markers: Vec<String>,
}

impl Classifier {
    pub fn new(config: &EngineConfig) -> Self {
        let cues = &config.cues;
        Self {
            dead_phrases: lowercase_all(cues.iter().flat_map(|c| c.dead_phrases.iter())),
            existence_cues: lowercase_all(cues.iter().flat_map(|c| c.existence_cues.iter())),
            placeholder_titles: lowercase_all(
                cues.iter().flat_map(|c| c.placeholder_titles.iter()),
            ),
            auth_wall_markers: lowercase_all(config.auth_wall_markers.iter()),
        }
    }

    pub fn classify(&self, page: &FetchedPage) -> ProbeResult {
        let final_url = page.final_url.clone();

        if matches!(page.status, 404 | 410) {
            return ProbeResult {
                status: ProbeStatus::Die,
                display_name: None,
                final_url,
            };
        }

        let body_lower = page.body.to_lowercase();
        if let Some(phrase) = self.dead_phrases.iter().find(|p| body_lower.contains(p.as_str())) {
            debug!("dead phrase '{}' on {}", phrase, page.final_url);
            return ProbeResult {
                status: ProbeStatus::Die,
                display_name: None,
                final_url,
            };
        }

        if page.status == 429 || page.status >= 500 {
            debug!("HTTP {} from {}, not judging", page.status, page.final_url);
            return ProbeResult::inconclusive(final_url);
        }

        let document = Html::parse_document(&page.body);
        let display_name = self.display_name(&document);
        let visible = visible_text(&document).to_lowercase();
        let has_cue = self.existence_cues.iter().any(|c| contains_term(&visible, c));

        if display_name.is_some() || has_cue {
            return ProbeResult {
                status: ProbeStatus::Live,
                display_name,
                final_url,
            };
        }

        if self.is_auth_wall(&page.final_url) {
            debug!("auth wall without existence cues at {}", page.final_url);
        }
        ProbeResult::inconclusive(final_url)
    }

    pub fn is_auth_wall(&self, final_url: &str) -> bool {
        let lower = final_url.to_lowercase();
        self.auth_wall_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    /// Best available human-readable name, `og:title` first.
    pub fn display_name(&self, document: &Html) -> Option<String> {
        meta_content(document, "meta[property='og:title']")
            .filter(|name| !self.is_placeholder(name))
            .or_else(|| title_text(document).filter(|name| !self.is_placeholder(name)))
    }

    fn is_placeholder(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        self.placeholder_titles.iter().any(|p| lower.contains(p.as_str()))
    }
}

fn lowercase_all<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    items
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `needle` occurs in `haystack` with no letter or digit directly on either side.
fn contains_term(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|title| !title.is_empty())
}

/// Text nodes of `<body>`, skipping script and style content.
fn visible_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .map(|el| matches!(el.value().name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false)
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&EngineConfig::builtin())
    }

    fn page(status: u16, final_url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            status,
            final_url: final_url.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn gone_status_outranks_positive_cues() {
        let body = r#"<html><head><meta property="og:title" content="Jane Doe"></head>
            <body>Add Friend · 1,234 followers</body></html>"#;
        let result = classifier().classify(&page(404, "https://m.facebook.com/jane", body));
        assert_eq!(result.status, ProbeStatus::Die);
        assert_eq!(result.display_name, None);

        let result = classifier().classify(&page(410, "https://m.facebook.com/jane", body));
        assert_eq!(result.status, ProbeStatus::Die);
    }

    #[test]
    fn dead_phrase_is_case_insensitive() {
        let body = "<html><body><h2>This Content Isn't Available Right Now</h2>\
                    <a>Photos</a></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/x", body));
        assert_eq!(result.status, ProbeStatus::Die);
    }

    #[test]
    fn vietnamese_dead_phrase_is_recognised() {
        let body = "<html><body>Rất tiếc, nội dung này hiện không khả dụng</body></html>";
        let result = classifier().classify(&page(200, "https://mbasic.facebook.com/x", body));
        assert_eq!(result.status, ProbeStatus::Die);
    }

    #[test]
    fn og_title_gives_live_with_name() {
        let body = r#"<html><head><meta property="og:title" content=" Jane Doe ">
            <title>Facebook</title></head><body></body></html>"#;
        let result = classifier().classify(&page(200, "https://m.facebook.com/jane", body));
        assert_eq!(result.status, ProbeStatus::Live);
        assert_eq!(result.display_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn page_title_used_when_not_placeholder() {
        let body = "<html><head><title>Cửa hàng ABC</title></head><body></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/abc", body));
        assert_eq!(result.status, ProbeStatus::Live);
        assert_eq!(result.display_name.as_deref(), Some("Cửa hàng ABC"));
    }

    #[test]
    fn placeholder_title_alone_is_inconclusive() {
        let body = "<html><head><title>Log in to Facebook</title></head><body></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/abc", body));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
    }

    #[test]
    fn existence_cue_without_name_is_live() {
        let body = "<html><head><title>Facebook</title></head>\
                    <body><div>Join Group</div></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/groups/1", body));
        assert_eq!(result.status, ProbeStatus::Live);
        assert_eq!(result.display_name, None);
    }

    #[test]
    fn cues_inside_scripts_do_not_count() {
        let body = "<html><head><title>Facebook</title></head>\
                    <body><script>var followers = 10; // add friend</script></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/x", body));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
    }

    #[test]
    fn auth_wall_without_cues_is_inconclusive() {
        let body = "<html><head><title>Log into Facebook</title></head>\
                    <body><form><input name='email'></form></body></html>";
        let c = classifier();
        let result = c.classify(&page(
            200,
            "https://m.facebook.com/login/?next=https%3A%2F%2Fm.facebook.com%2Fjane",
            body,
        ));
        assert!(c.is_auth_wall(&result.final_url));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
    }

    #[test]
    fn auth_wall_with_cue_is_live() {
        let body = "<html><head><title>Log into Facebook</title></head>\
                    <body><p>Jane Doe · 512 followers</p></body></html>";
        let result = classifier().classify(&page(200, "https://m.facebook.com/login.php", body));
        assert_eq!(result.status, ProbeStatus::Live);
    }

    const LOGIN_URL: &str = "https://m.facebook.com/login/?next=%2Fjane";

    #[test]
    fn english_login_page_with_footer_is_inconclusive() {
        let body = r#"<html><head><title>Log into Facebook</title>
            <meta property="og:title" content="Log into Facebook"></head>
            <body>
              <form><input name="email"><input name="pass"><button>Log In</button></form>
              <a>Forgot password?</a> <a>Create new account</a>
              <div>English (US) · Tiếng Việt · Español</div>
              <div>Sign Up · Log In · Messenger · Facebook Lite · Video · Places · Games ·
                Marketplace · Meta Pay · Meta Store · Instagram · Threads · Fundraisers ·
                Services · Voting Information Center · Privacy Policy · Privacy Center ·
                Groups · About · Create ad · Create Page · Developers · Careers · Cookies ·
                Ad choices · Terms · Help · Contact Uploading &amp; Non-Users</div>
              <div>Meta © 2025</div>
            </body></html>"#;
        let result = classifier().classify(&page(200, LOGIN_URL, body));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
        assert_eq!(result.display_name, None);
    }

    #[test]
    fn vietnamese_login_page_with_footer_is_inconclusive() {
        let body = r#"<html><head><title>Đăng nhập Facebook</title></head>
            <body>
              <form><input name="email"><button>Đăng nhập</button></form>
              <a>Quên mật khẩu?</a> <a>Tạo tài khoản mới</a>
              <div>Đăng ký · Đăng nhập · Messenger · Facebook Lite · Video · Địa điểm ·
                Trò chơi · Marketplace · Nhóm · Giới thiệu · Tạo quảng cáo · Tạo Trang ·
                Nhà phát triển · Tuyển dụng · Quyền riêng tư · Cookie · Điều khoản ·
                Trợ giúp</div>
            </body></html>"#;
        let result = classifier().classify(&page(200, LOGIN_URL, body));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
    }

    #[test]
    fn cue_inside_a_longer_word_does_not_count() {
        let body = "<html><head><title>Facebook</title></head>\
                    <body><h1>Cảnh báo bảo mật</h1><p>Quan tâm người theo dõiXYZ</p></body></html>";
        let result = classifier().classify(&page(200, LOGIN_URL, body));
        assert_eq!(result.status, ProbeStatus::Inconclusive);
    }

    #[test]
    fn whole_word_matching() {
        assert!(contains_term("jane doe · 512 followers", "followers"));
        assert!(contains_term("followers", "followers"));
        assert!(contains_term("nhấn tham gia nhóm.", "tham gia nhóm"));
        assert!(!contains_term("cảnh báo", "ảnh"));
        assert!(!contains_term("unfollowers2", "followers"));
    }

    #[test]
    fn server_errors_are_not_judged() {
        let body = "<html><head><title>Something went wrong</title></head>\
                    <body>About us</body></html>";
        for status in [429, 500, 503] {
            let result = classifier().classify(&page(status, "https://m.facebook.com/x", body));
            assert_eq!(result.status, ProbeStatus::Inconclusive, "status {}", status);
        }
    }
}
