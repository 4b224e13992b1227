//! Entry → chapter rendering.

use wallabook_shared::{Entry, Section};

/// Render an accepted entry as `<h1>{title}</h1>\n{content}`.
///
/// Nothing is escaped or sanitized: the store hands out XHTML and a
/// malformed entry simply yields a malformed chapter.
pub fn render_section(entry: &Entry) -> Section {
    Section {
        heading: entry.title.clone(),
        body: format!("<h1>{}</h1>\n{}", entry.title, entry.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry {
            id: 42,
            title: "Long".into(),
            content: "<p>body</p>".into(),
        }
    }

    #[test]
    fn heading_then_content() {
        let section = render_section(&entry());
        assert_eq!(section.heading, "Long");
        assert_eq!(section.body, "<h1>Long</h1>\n<p>body</p>");
    }

    #[test]
    fn rendering_is_deterministic() {
        let entry = entry();
        assert_eq!(render_section(&entry), render_section(&entry));
    }

    #[test]
    fn markup_passes_through_unescaped() {
        let mut entry = entry();
        entry.title = "A <b>bold</b> & brave title".into();
        entry.content = "<p>unclosed".into();
        let section = render_section(&entry);
        assert_eq!(section.body, "<h1>A <b>bold</b> & brave title</h1>\n<p>unclosed");
    }
}
