//! # HTML
//!
//! Pulls the page title and first heading out of an HTTP body.

use scraper::{Html, Selector};

/// Text of the first `<title>` in the document head, else the first one
/// anywhere in the document.
pub fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    first_text(&document, "head > title").or_else(|| first_text(&document, "title"))
}

/// Text of the first `<h1>`.
pub fn first_heading(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    first_text(&document, "h1")
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_head_title() {
        let body = "<html><head><title> RouterOS router configuration page </title></head><body><h1>RouterOS v6.45.9</h1></body></html>";
        assert_eq!(extract_title(body).as_deref(), Some("RouterOS router configuration page"));
        assert_eq!(first_heading(body).as_deref(), Some("RouterOS v6.45.9"));
    }

    #[test]
    fn missing_or_empty_title_is_none() {
        assert_eq!(extract_title("<html><body>nothing here</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
        assert_eq!(extract_title(""), None);
    }

    #[test]
    fn tolerates_broken_markup() {
        let body = "<HTML><TITLE>WEB SERVICE</TITLE><BODY><p>unclosed <b>tags";
        assert_eq!(extract_title(body).as_deref(), Some("WEB SERVICE"));
    }
}
