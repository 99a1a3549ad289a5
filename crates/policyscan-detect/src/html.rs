//! Regex-based HTML inspection: candidate element texts and visible page text.

use std::sync::LazyLock;

use policyscan_core::{CandidateElement, DetectionStrategy, ElementTag, PageSignal};
use regex::{Captures, Regex};

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));
static NOSCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").expect("valid regex")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b.*?</head\s*>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});").expect("valid regex")
});
static POLICY_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:class|id)\s*=\s*["'][^"']*policy[^"']*["']"#).expect("valid regex")
});

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("a"));
static H1_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("h1"));
static H2_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("h2"));
static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("span"));
static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("p"));
static DIV_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("div"));
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("section"));
static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("footer"));

/// Matches opening and closing `name` tags; group 1 is the `/` of a closing
/// tag, group 2 the attribute text.
fn tag_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?i)<(/)?{name}\b([^>]*)>")).expect("valid tag regex")
}

/// Which elements to collect, how to tag them, and whether their attributes
/// must mention "policy" to be kept.
struct ElementQuery {
    regex: &'static LazyLock<Regex>,
    tag: ElementTag,
    policy_attr_only: bool,
}

/// One element of a single tag name, with its inner HTML.
struct Element<'a> {
    start: usize,
    attrs: &'a str,
    inner: &'a str,
}

/// Pairs opening and closing tags by nesting depth, so an element's inner
/// HTML runs to its own closing tag rather than that of a nested child with
/// the same name. Unclosed elements and stray closing tags are dropped.
fn elements<'a>(regex: &Regex, html: &'a str) -> Vec<Element<'a>> {
    let mut open: Vec<(usize, usize, &'a str)> = Vec::new();
    let mut out = Vec::new();
    for cap in regex.captures_iter(html) {
        let Some(whole) = cap.get(0) else { continue };
        let attrs = cap.get(2).map_or("", |m| m.as_str());
        if cap.get(1).is_some() {
            if let Some((start, inner_start, attrs)) = open.pop() {
                out.push(Element {
                    start,
                    attrs,
                    inner: &html[inner_start..whole.start()],
                });
            }
        } else if !attrs.trim_end().ends_with('/') {
            open.push((whole.start(), whole.end(), attrs));
        }
    }
    out
}

static ELEMENT_QUERIES: &[ElementQuery] = &[
    ElementQuery { regex: &ANCHOR_RE, tag: ElementTag::Link, policy_attr_only: false },
    ElementQuery { regex: &H1_RE, tag: ElementTag::Heading, policy_attr_only: false },
    ElementQuery { regex: &H2_RE, tag: ElementTag::Heading, policy_attr_only: false },
    ElementQuery { regex: &SPAN_RE, tag: ElementTag::Span, policy_attr_only: false },
];

static ATTRIBUTE_QUERIES: &[ElementQuery] = &[
    ElementQuery { regex: &PARAGRAPH_RE, tag: ElementTag::Paragraph, policy_attr_only: false },
    ElementQuery { regex: &DIV_RE, tag: ElementTag::Paragraph, policy_attr_only: true },
    ElementQuery { regex: &SECTION_RE, tag: ElementTag::Paragraph, policy_attr_only: true },
    ElementQuery { regex: &FOOTER_RE, tag: ElementTag::Paragraph, policy_attr_only: true },
];

/// Builds a [`PageSignal`] from raw HTML.
///
/// Scripts, styles and comments are removed first so their contents never
/// count as visible text. Candidates are returned in document order.
#[must_use]
pub fn page_signal(source_url: &str, html: &str, strategy: DetectionStrategy) -> PageSignal {
    let visible = strip_invisible(html);
    PageSignal {
        source_url: source_url.to_string(),
        candidate_elements: candidate_elements(&visible, strategy),
        page_text: page_text(&visible),
    }
}

fn strip_invisible(html: &str) -> String {
    let html = COMMENT_RE.replace_all(html, " ");
    let html = SCRIPT_RE.replace_all(&html, " ");
    let html = STYLE_RE.replace_all(&html, " ");
    NOSCRIPT_RE.replace_all(&html, " ").into_owned()
}

fn candidate_elements(html: &str, strategy: DetectionStrategy) -> Vec<CandidateElement> {
    let extra: &[ElementQuery] = match strategy {
        DetectionStrategy::Elements => &[],
        DetectionStrategy::Attributes => ATTRIBUTE_QUERIES,
    };

    let mut found: Vec<(usize, CandidateElement)> = Vec::new();
    for query in ELEMENT_QUERIES.iter().chain(extra) {
        for element in elements(query.regex, html) {
            if query.policy_attr_only && !POLICY_ATTR_RE.is_match(element.attrs) {
                continue;
            }
            let text = clean_text(element.inner);
            if text.is_empty() {
                continue;
            }
            found.push((element.start, CandidateElement::new(query.tag, text)));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, element)| element).collect()
}

fn page_text(html: &str) -> String {
    let without_head = HEAD_RE.replace_all(html, " ");
    clean_text(&without_head)
}

/// Strips tags, decodes entities and collapses whitespace.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let no_tags = TAG_RE.replace_all(input, " ");
    let decoded = decode_entities(&no_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(input: &str) -> String {
    ENTITY_RE
        .replace_all(input, |cap: &Captures<'_>| {
            let raw = &cap[1];
            decode_entity(raw).map_or_else(|| cap[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(raw: &str) -> Option<char> {
    if let Some(hex) = raw.strip_prefix("#x").or_else(|| raw.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = raw.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match raw {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "rsquo" => Some('\u{2019}'),
        "lsquo" => Some('\u{2018}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
<head><title>Acme Privacy Policy</title><style>.privacy-policy{color:red}</style></head>
<body>
  <h1>Welcome to Acme</h1>
  <script>var label = "privacy policy";</script>
  <p class="intro">We care about your personal information.</p>
  <div id="legal-policy-links"><strong>Cookie notice</strong></div>
  <footer>
    <span>&copy; Acme &amp; Co</span>
    <a href="/privacy">Privacy&nbsp;Policy</a>
  </footer>
  <!-- <a href="/old">Old privacy statement</a> -->
</body>
</html>"#;

    fn texts(signal: &PageSignal) -> Vec<&str> {
        signal
            .candidate_elements
            .iter()
            .map(|c| c.text.as_str())
            .collect()
    }

    #[test]
    fn elements_strategy_collects_anchors_headings_and_spans_in_order() {
        let signal = page_signal("https://acme.test/", PAGE, DetectionStrategy::Elements);
        assert_eq!(
            texts(&signal),
            vec!["Welcome to Acme", "© Acme & Co", "Privacy Policy"]
        );
        assert_eq!(signal.candidate_elements[0].tag, ElementTag::Heading);
        assert_eq!(signal.candidate_elements[2].tag, ElementTag::Link);
    }

    #[test]
    fn attributes_strategy_adds_paragraphs_and_policy_containers() {
        let signal = page_signal("https://acme.test/", PAGE, DetectionStrategy::Attributes);
        let collected = texts(&signal);
        assert!(collected.contains(&"We care about your personal information."));
        assert!(collected.contains(&"Cookie notice"));
        assert_eq!(collected.len(), 5);
    }

    #[test]
    fn scripts_styles_and_comments_are_invisible() {
        let signal = page_signal("https://acme.test/", PAGE, DetectionStrategy::Attributes);
        assert!(!signal.page_text.contains("var label"));
        assert!(!signal.page_text.contains("color:red"));
        assert!(!signal.page_text.contains("Old privacy statement"));
    }

    #[test]
    fn page_text_excludes_head_and_collapses_whitespace() {
        let signal = page_signal("https://acme.test/", PAGE, DetectionStrategy::Elements);
        assert!(!signal.page_text.contains("Acme Privacy Policy"));
        assert!(signal.page_text.starts_with("Welcome to Acme We care"));
        assert!(!signal.page_text.contains("  "));
    }

    #[test]
    fn nested_markup_inside_anchor_is_flattened() {
        let html = r#"<a href="/p"><span>Data</span> <b>Protection</b></a>"#;
        let signal = page_signal("u", html, DetectionStrategy::Elements);
        assert_eq!(signal.candidate_elements[0].text, "Data Protection");
    }

    #[test]
    fn empty_elements_are_skipped() {
        let html = r#"<a href="/"><img src="logo.png"></a><span>  </span>"#;
        let signal = page_signal("u", html, DetectionStrategy::Elements);
        assert!(signal.candidate_elements.is_empty());
    }

    #[test]
    fn numeric_entities_are_decoded() {
        assert_eq!(clean_text("Data&#32;Privacy &#x26; you"), "Data Privacy & you");
    }

    #[test]
    fn unknown_entities_are_left_alone() {
        assert_eq!(clean_text("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn nested_same_name_child_does_not_cut_outer_text() {
        let html = "<footer><span><span>Read our</span> privacy policy</span></footer>";
        let signal = page_signal("https://x.test/", html, DetectionStrategy::Elements);
        assert_eq!(texts(&signal), vec!["Read our privacy policy", "Read our"]);
    }

    #[test]
    fn nested_policy_containers_keep_full_text() {
        let html = concat!(
            r#"<div class="privacy-policy"><div>Intro</div>"#,
            "<p>x</p> Data protection notice</div>"
        );
        let signal = page_signal("u", html, DetectionStrategy::Attributes);
        assert_eq!(signal.candidate_elements[0].text, "Intro x Data protection notice");
    }

    #[test]
    fn unclosed_and_self_closing_tags_are_skipped() {
        let html = "<span/><span>privacy policy</span><span>dangling";
        let signal = page_signal("u", html, DetectionStrategy::Elements);
        assert_eq!(texts(&signal), vec!["privacy policy"]);
    }

    #[test]
    fn tag_regex_does_not_match_longer_tag_names() {
        let html = "<abbr>privacy policy</abbr><address>x</address>";
        let signal = page_signal("u", html, DetectionStrategy::Elements);
        assert!(signal.candidate_elements.is_empty());
    }
}
