//! Turns a change event into a destination-agnostic notification payload.
//!
//! Pure and deterministic: the same event, locale, and link template always
//! produce the same payload. The body keeps the
//! `{link} . . {size} . . {user}{comment}` shape that consumers of the
//! logged output already parse.

use std::cmp::Ordering;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use wikirelay_common::linking::LinkBuilder;
use wikirelay_common::locale::Locale;
use wikirelay_common::types::{ChangeEvent, ChangeType, NotificationPayload};

/// Embed accent for a positive size delta.
pub const COLOR_ADDED: u32 = 0x00af89;
/// Embed accent for a negative size delta.
pub const COLOR_REMOVED: u32 = 0xdd3333;
/// Embed accent for a zero size delta.
pub const COLOR_NEUTRAL: u32 = 0x72777d;

/// Size deltas past this magnitude render in bold.
const EMPHASIS_THRESHOLD: i64 = 500;

const ICON_BASE: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/";
const ICON_ADDED: &str =
    "a/ab/MobileFrontend_bytes-added.svg/512px-MobileFrontend_bytes-added.svg.png";
const ICON_REMOVED: &str =
    "7/7c/MobileFrontend_bytes-removed.svg/512px-MobileFrontend_bytes-removed.svg.png";
const ICON_NEUTRAL: &str =
    "2/25/MobileFrontend_bytes-neutral.svg/512px-MobileFrontend_bytes-neutral.svg.png";

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[{2}([^\[\]\|\n]+)\]{2}").unwrap());
static WIKI_LINK_PIPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[{2}([^\[\]\|\n]+)\|").unwrap());
static SECTION_CLOSE_EOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" \*/$").unwrap());

pub fn format(event: &ChangeEvent, locale: &Locale, links: &LinkBuilder) -> NotificationPayload {
    let (color, icon) = match event.delta().cmp(&0) {
        Ordering::Greater => (COLOR_ADDED, ICON_ADDED),
        Ordering::Less => (COLOR_REMOVED, ICON_REMOVED),
        Ordering::Equal => (COLOR_NEUTRAL, ICON_NEUTRAL),
    };

    let mut badges: Vec<&str> = Vec::new();
    if event.change_type == ChangeType::New {
        badges.push(locale.get("eventstreams-new"));
    }
    if event.minor {
        badges.push(locale.get("eventstreams-minor"));
    }

    NotificationPayload {
        title: event.title.clone(),
        title_url: links.page_url(&event.title),
        icon_url: format!("{ICON_BASE}{icon}"),
        color,
        footer: badges.join(", "),
        body: body_text(event, locale, links),
        timestamp: event.timestamp,
    }
}

fn body_text(event: &ChangeEvent, locale: &Locale, links: &LinkBuilder) -> String {
    let link = revision_link(event, locale, links);
    let size = size_token(event.delta());
    let user = user_block(event, locale, links);
    let comment = comment_text(&event.summary);
    format!("{link} . . {size} . . {user}{comment}")
}

/// `(+N)`, `(-N)` or `(0)`; bold past the emphasis threshold.
fn size_token(delta: i64) -> String {
    let signed = if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    };
    let token = format!("({signed})");
    if delta.abs() > EMPHASIS_THRESHOLD {
        format!("**{token}**")
    } else {
        token
    }
}

fn revision_link(event: &ChangeEvent, locale: &Locale, links: &LinkBuilder) -> String {
    let url = links.revision_url(event.revision_id, event.is_new_page());
    format!("([{}]({url}))", locale.get("eventstreams-diff"))
}

/// Anonymous editors (usernames that parse as IP addresses) link straight to
/// their contributions; registered editors get their user page plus talk and
/// contributions links.
fn user_block(event: &ChangeEvent, locale: &Locale, links: &LinkBuilder) -> String {
    let talk_url = links.page_url(&format!("User_talk:{}", event.user));
    let contribs_url = links.page_url(&format!("Special:Contributions/{}", event.user));
    let talk = format!("[{}]({talk_url})", locale.get("eventstreams-talk"));

    if event.user.parse::<IpAddr>().is_ok() {
        format!("[{}]({contribs_url}) ({talk})", event.user)
    } else {
        let user_url = links.page_url(&format!("User:{}", event.user));
        let contribs = format!("[{}]({contribs_url})", locale.get("eventstreams-contribs"));
        format!("[{}]({user_url}) ({talk} | {contribs})", event.user)
    }
}

/// Edit summary cleaned for chat: section markers become an arrow, wiki link
/// markup keeps its display text. Empty summaries produce no comment block.
fn comment_text(summary: &str) -> String {
    if summary.is_empty() {
        return String::new();
    }

    let comment = summary.replace("/* ", "→");
    let comment = SECTION_CLOSE_EOL_RE.replace(&comment, "").replace(" */", ":");
    let comment = WIKI_LINK_RE.replace_all(&comment, "$1");
    let comment = WIKI_LINK_PIPE_RE.replace_all(&comment, "").replace("]]", "");

    format!(" *({comment})*")
}
