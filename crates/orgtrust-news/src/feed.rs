//! RSS feed parsing for news mentions.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use orgtrust_core::NewsSignal;

use crate::error::NewsError;
use crate::scorer::lexicon_score;

/// Parse an RSS feed XML body into scored [`NewsSignal`]s.
///
/// Extracts `<item>` elements, pulling `<title>`, `<link>`, and `<pubDate>`.
/// Items without a parseable RFC 2822 `pubDate` are skipped — a signal with
/// no timestamp cannot participate in recency decay. Stops after
/// `max_signals` items.
///
/// # Errors
///
/// Returns [`NewsError::Xml`] if the XML itself is malformed.
pub fn parse_feed(xml: &str, max_signals: usize) -> Result<Vec<NewsSignal>, NewsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut signals: Vec<NewsSignal> = Vec::new();
    let mut in_item = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut link = String::new();
    let mut pub_date = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    title.clear();
                    link.clear();
                    pub_date.clear();
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if let Some(signal) = build_signal(&title, &link, &pub_date) {
                        signals.push(signal);
                        if signals.len() >= max_signals {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut pub_date);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut pub_date);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(NewsError::Xml(e)),
            _ => {}
        }
    }

    // Newest first, so capped consumers always see the most recent mentions.
    signals.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(signals)
}

fn assign_field(tag: &str, text: &str, title: &mut String, link: &mut String, date: &mut String) {
    match tag {
        "title" => *title = text.to_string(),
        "link" => *link = text.to_string(),
        "pubDate" => *date = text.to_string(),
        _ => {}
    }
}

fn build_signal(title: &str, link: &str, pub_date: &str) -> Option<NewsSignal> {
    if title.is_empty() || link.is_empty() {
        return None;
    }
    let published_at: DateTime<Utc> = DateTime::parse_from_rfc2822(pub_date.trim())
        .ok()?
        .with_timezone(&Utc);

    Some(NewsSignal {
        headline: title.to_string(),
        url: link.to_string(),
        sentiment: lexicon_score(title),
        published_at,
    })
}
