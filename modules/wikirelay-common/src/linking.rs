/// Builds fully qualified wiki URLs from page titles and revision ids.
///
/// Construction takes the MediaWiki article-path template (the `$1` form,
/// e.g. `https://en.wikipedia.org/wiki/$1`); every URL this emits is derived
/// from that one template.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    article_path: String,
}

impl LinkBuilder {
    pub fn new(article_path: impl Into<String>) -> Self {
        Self {
            article_path: article_path.into(),
        }
    }

    /// URL of a page. Titles use MediaWiki canonical form: spaces become
    /// underscores, characters that would break markdown links are
    /// percent-encoded.
    pub fn page_url(&self, title: &str) -> String {
        self.article_path.replace("$1", &encode_title(title))
    }

    /// Diff or permalink URL for a revision. Brand-new pages have no parent
    /// revision to diff against, so they get the `oldid` form.
    pub fn revision_url(&self, revision_id: i64, new_page: bool) -> String {
        let query = if new_page {
            format!("oldid={revision_id}")
        } else {
            format!("diff={revision_id}")
        };
        self.article_path.replace("/wiki/$1", &format!("/?{query}"))
    }
}

fn encode_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        match ch {
            ' ' => out.push('_'),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '|' => out.push_str("%7C"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> LinkBuilder {
        LinkBuilder::new("https://en.wikipedia.org/wiki/$1")
    }

    #[test]
    fn page_url_substitutes_title() {
        assert_eq!(
            links().page_url("Earth"),
            "https://en.wikipedia.org/wiki/Earth"
        );
    }

    #[test]
    fn page_url_encodes_spaces_and_parens() {
        assert_eq!(
            links().page_url("Mercury (planet)"),
            "https://en.wikipedia.org/wiki/Mercury_%28planet%29"
        );
    }

    #[test]
    fn revision_url_uses_diff_for_edits() {
        assert_eq!(
            links().revision_url(56, false),
            "https://en.wikipedia.org/?diff=56"
        );
    }

    #[test]
    fn revision_url_uses_oldid_for_new_pages() {
        assert_eq!(
            links().revision_url(99, true),
            "https://en.wikipedia.org/?oldid=99"
        );
    }
}
