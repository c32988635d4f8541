//! Heuristic HTML extraction for business websites.
//!
//! Regex- and marker-based rather than a full DOM parse: business sites are
//! wildly inconsistent, and the goal is partial extraction that degrades
//! gracefully — a missing section never fails the page, only a page with no
//! extractable text at all does.

use regex::Regex;

use crate::types::PageExtract;

const MIN_PARAGRAPH_LEN: usize = 40;
const SECTION_MAX_CHARS: usize = 2000;
const MAX_LIST_ITEMS: usize = 10;

const ABOUT_MARKERS: &[&str] = &["about", "who we are", "om oss", "om os"];
const PRODUCT_MARKERS: &[&str] = &["products", "produkter", "product range"];
const SERVICE_MARKERS: &[&str] = &["services", "tjenester", "what we do", "ydelser"];

/// Extracts all structured signals from a fetched page.
#[must_use]
pub fn extract_page(html: &str) -> PageExtract {
    PageExtract {
        title: extract_title(html),
        description: extract_meta_content(html, "description")
            .or_else(|| extract_og_content(html, "og:description"))
            .or_else(|| extract_first_paragraph(html)),
        about_text: extract_section_text(html, ABOUT_MARKERS),
        products: extract_list_after_heading(html, PRODUCT_MARKERS),
        services: extract_list_after_heading(html, SERVICE_MARKERS),
        contact_email: extract_contact_email(html),
        contact_phone: extract_contact_phone(html),
    }
}

fn extract_title(html: &str) -> Option<String> {
    if let Some(og) = extract_og_content(html, "og:title") {
        return Some(og);
    }
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex");
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(&strip_tags(m.as_str())))
        .filter(|t| !t.is_empty())
}

/// Reads `<meta property="og:…" content="…">` in either attribute order.
fn extract_og_content(html: &str, property: &str) -> Option<String> {
    let escaped = regex::escape(property);
    let patterns = [
        format!(
            r#"(?is)<meta[^>]+property\s*=\s*["']{escaped}["'][^>]+content\s*=\s*["']([^"']+)["']"#
        ),
        format!(
            r#"(?is)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+property\s*=\s*["']{escaped}["']"#
        ),
    ];
    for pattern in &patterns {
        let re = Regex::new(pattern).expect("valid og regex");
        if let Some(cap) = re.captures(html) {
            let value = clean_text(cap.get(1).map_or("", |m| m.as_str()));
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Reads `<meta name="…" content="…">` in either attribute order.
fn extract_meta_content(html: &str, name: &str) -> Option<String> {
    let escaped = regex::escape(name);
    let patterns = [
        format!(
            r#"(?is)<meta[^>]+name\s*=\s*["']{escaped}["'][^>]+content\s*=\s*["']([^"']+)["']"#
        ),
        format!(
            r#"(?is)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+name\s*=\s*["']{escaped}["']"#
        ),
    ];
    for pattern in &patterns {
        let re = Regex::new(pattern).expect("valid meta regex");
        if let Some(cap) = re.captures(html) {
            let value = clean_text(cap.get(1).map_or("", |m| m.as_str()));
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn extract_first_paragraph(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex");
    let result = re
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_text(&strip_tags(m.as_str())))
        .find(|text| text.len() >= MIN_PARAGRAPH_LEN);
    result
}

/// Finds a section by heading text or container id/class and returns its
/// stripped text, capped at [`SECTION_MAX_CHARS`].
fn extract_section_text(html: &str, markers: &[&str]) -> Option<String> {
    if let Some(text) = section_after_heading(html, markers) {
        return Some(text);
    }
    section_in_marked_container(html, markers)
}

/// Text between a matching `<h1>`–`<h3>` heading and the next heading.
fn section_after_heading(html: &str, markers: &[&str]) -> Option<String> {
    let heading_re =
        Regex::new(r"(?is)<h[1-3][^>]*>(.*?)</h[1-3]>").expect("valid heading regex");

    let mut matches = heading_re.find_iter(html).peekable();
    while let Some(m) = matches.next() {
        let heading_text = clean_text(&strip_tags(m.as_str())).to_lowercase();
        if !markers.iter().any(|k| heading_text.contains(k)) {
            continue;
        }
        let start = m.end();
        let end = matches
            .peek()
            .map_or_else(|| html.len(), |next| next.start());
        let text = clean_text(&strip_tags(&html[start..end]));
        if !text.is_empty() {
            return Some(truncate_chars(&text, SECTION_MAX_CHARS));
        }
    }
    None
}

/// Text of a `<section>`/`<div>` whose id or class names the section.
fn section_in_marked_container(html: &str, markers: &[&str]) -> Option<String> {
    for marker in markers {
        let escaped = regex::escape(&marker.replace(' ', "-"));
        let pattern = format!(
            r#"(?is)<(?:section|div)[^>]+(?:id|class)\s*=\s*["'][^"']*{escaped}[^"']*["'][^>]*>(.*?)</(?:section|div)>"#
        );
        let re = Regex::new(&pattern).expect("valid container regex");
        if let Some(cap) = re.captures(html) {
            let text = clean_text(&strip_tags(cap.get(1).map_or("", |m| m.as_str())));
            if !text.is_empty() {
                return Some(truncate_chars(&text, SECTION_MAX_CHARS));
            }
        }
    }
    None
}

/// `<li>` items following a matching heading, up to the next heading.
fn extract_list_after_heading(html: &str, markers: &[&str]) -> Vec<String> {
    let heading_re =
        Regex::new(r"(?is)<h[1-4][^>]*>(.*?)</h[1-4]>").expect("valid heading regex");
    let item_re = Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("valid list item regex");

    let mut matches = heading_re.find_iter(html).peekable();
    while let Some(m) = matches.next() {
        let heading_text = clean_text(&strip_tags(m.as_str())).to_lowercase();
        if !markers.iter().any(|k| heading_text.contains(k)) {
            continue;
        }
        let start = m.end();
        let end = matches
            .peek()
            .map_or_else(|| html.len(), |next| next.start());
        let items: Vec<String> = item_re
            .captures_iter(&html[start..end])
            .filter_map(|cap| cap.get(1))
            .map(|i| clean_text(&strip_tags(i.as_str())))
            .filter(|i| (2..=120).contains(&i.len()))
            .take(MAX_LIST_ITEMS)
            .collect();
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

fn extract_contact_email(html: &str) -> Option<String> {
    let mailto_re = Regex::new(r#"(?i)mailto:([^"'?\s>]+)"#).expect("valid mailto regex");
    if let Some(cap) = mailto_re.captures(html) {
        return cap.get(1).map(|m| m.as_str().trim().to_lowercase());
    }
    let bare_re = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("valid email regex");
    bare_re
        .find(&strip_tags(html))
        .map(|m| m.as_str().to_lowercase())
}

fn extract_contact_phone(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)tel:([+0-9][0-9 ().\-]{5,})"#).expect("valid tel regex");
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Drops script/style/comment blocks and tags, decodes common entities.
fn strip_tags(html: &str) -> String {
    let script_re =
        Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
            .expect("valid script regex");
    let comment_re = Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex");
    let tag_re = Regex::new(r"<[^>]+>").expect("valid tag regex");

    let without_blocks = script_re.replace_all(html, " ");
    let without_comments = comment_re.replace_all(&without_blocks, " ");
    let text = tag_re.replace_all(&without_comments, " ");

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<!doctype html>
<html>
<head>
  <title>Example Plumbing AS - Oslo</title>
  <meta name="description" content="Family-run plumbing company serving Oslo since 1987.">
  <meta property="og:title" content="Example Plumbing AS">
</head>
<body>
  <script>window.analytics = {};</script>
  <h1>Welcome</h1>
  <p>Example Plumbing is a family-run company serving the greater Oslo region.</p>
  <h2>About us</h2>
  <p>Founded in 1987, we employ twelve certified plumbers and serve both
  private and commercial customers.</p>
  <h2>Our products</h2>
  <ul>
    <li>Bathroom fittings</li>
    <li>Heat pumps</li>
    <li><a href="/pipes">Pipes &amp; fittings</a></li>
  </ul>
  <h2>Services</h2>
  <ul>
    <li>Emergency callout</li>
    <li>Bathroom renovation</li>
  </ul>
  <footer>
    <a href="mailto:POST@example.no?subject=hi">Contact</a>
    <a href="tel:+47 22 33 44 55">Call us</a>
  </footer>
</body>
</html>
"#;

    #[test]
    fn title_prefers_og_title() {
        assert_eq!(
            extract_title(FIXTURE).as_deref(),
            Some("Example Plumbing AS")
        );
    }

    #[test]
    fn description_comes_from_meta_tag() {
        let extract = extract_page(FIXTURE);
        assert_eq!(
            extract.description.as_deref(),
            Some("Family-run plumbing company serving Oslo since 1987.")
        );
    }

    #[test]
    fn about_section_follows_its_heading() {
        let extract = extract_page(FIXTURE);
        let about = extract.about_text.expect("should find about section");
        assert!(about.starts_with("Founded in 1987"));
        assert!(!about.contains("Our products"), "should stop at next heading");
    }

    #[test]
    fn product_list_items_are_extracted_and_entities_decoded() {
        let extract = extract_page(FIXTURE);
        assert_eq!(
            extract.products,
            vec![
                "Bathroom fittings".to_string(),
                "Heat pumps".to_string(),
                "Pipes & fittings".to_string(),
            ]
        );
    }

    #[test]
    fn service_list_is_separate_from_products() {
        let extract = extract_page(FIXTURE);
        assert_eq!(
            extract.services,
            vec![
                "Emergency callout".to_string(),
                "Bathroom renovation".to_string(),
            ]
        );
    }

    #[test]
    fn contact_details_come_from_link_schemes() {
        let extract = extract_page(FIXTURE);
        assert_eq!(extract.contact_email.as_deref(), Some("post@example.no"));
        assert_eq!(extract.contact_phone.as_deref(), Some("+47 22 33 44 55"));
    }

    #[test]
    fn script_content_never_leaks_into_text() {
        let extract = extract_page(FIXTURE);
        assert!(!extract.combined_text().contains("analytics"));
    }

    #[test]
    fn missing_sections_degrade_to_empty_not_failure() {
        let html = "<html><head><title>Bare</title></head><body></body></html>";
        let extract = extract_page(html);
        assert_eq!(extract.title.as_deref(), Some("Bare"));
        assert!(extract.about_text.is_none());
        assert!(extract.products.is_empty());
        assert!(!extract.is_empty(), "title alone is still usable");
    }

    #[test]
    fn empty_page_is_empty() {
        assert!(extract_page("<html><body></body></html>").is_empty());
    }

    #[test]
    fn marked_container_is_a_fallback_for_missing_heading() {
        let html = r#"<div class="about-us">We make industrial valves for the
        North Sea oil sector.</div>"#;
        let about = extract_section_text(html, ABOUT_MARKERS).expect("should find container");
        assert!(about.contains("industrial valves"));
    }

    #[test]
    fn first_paragraph_backfills_missing_meta_description() {
        let html = "<html><body><p>Tiny.</p><p>A long enough paragraph describing \
                    what this company actually does for its customers.</p></body></html>";
        let extract = extract_page(html);
        assert!(extract
            .description
            .as_deref()
            .unwrap()
            .starts_with("A long enough paragraph"));
    }
}
