/// Just enough HTML handling for directory listings and info tables
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new("(?s)<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new("&(amp|lt|gt|quot|#39|nbsp);").unwrap();
}

/// A direct child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element { href: Option<String>, text: String },
    Text(String),
}

impl Node {
    pub fn text(&self) -> &str {
        match self {
            Node::Element { text, .. } => text,
            Node::Text(text) => text,
        }
    }
}

/// Inner HTML of every `<name>` element, in document order
pub fn find_blocks<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let block = Regex::new(&format!(r"(?is)<{name}\b[^>]*>(.*?)</{name}\s*>"))
        .expect("element name should be a plain tag name");
    block
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Split an element body into its child nodes. Only paired `<a>` elements are
/// kept as elements, other markup is dropped
pub fn children(inner: &str) -> Vec<Node> {
    lazy_static! {
        static ref CHILD: Regex = Regex::new(
            r#"(?is)<a\b(?P<attrs>[^>]*)>(?P<text>.*?)</a\s*>|<[^>]*>|(?P<plain>[^<]+)"#
        )
        .unwrap();
        static ref HREF: Regex = Regex::new(r#"(?i)href\s*=\s*"([^"]*)""#).unwrap();
    }

    let mut res = Vec::new();
    for c in CHILD.captures_iter(inner) {
        if let Some(plain) = c.name("plain") {
            res.push(Node::Text(decode_entities(plain.as_str())));
        } else if let Some(text) = c.name("text") {
            let href = c
                .name("attrs")
                .and_then(|attrs| HREF.captures(attrs.as_str()))
                .and_then(|h| h.get(1))
                .map(|h| decode_entities(h.as_str()));
            res.push(Node::Element {
                href,
                text: text_content(text.as_str()),
            });
        }
    }
    res
}

/// Text of an HTML fragment with all tags removed
pub fn text_content(fragment: &str) -> String {
    decode_entities(&TAG.replace_all(fragment, ""))
}

pub fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |c: &regex::Captures| match &c[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "#39" => "'",
            _ => " ",
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_blocks() {
        let html = "<html><PRE class=\"x\">one</PRE><p>no</p><pre>two\nlines</pre></html>";
        assert_eq!(find_blocks(html, "pre"), vec!["one", "two\nlines"]);
        assert!(find_blocks(html, "table").is_empty());
    }

    #[test]
    fn test_children() {
        let inner = "<a href=\"../\">../</a>\n<a href=\"a&amp;b.tar.xz\">a&amp;b.tar.xz</a>   27-Feb-2023 21:32   1234\n<hr>";
        let nodes = children(inner);
        assert_eq!(
            nodes,
            vec![
                Node::Element {
                    href: Some("../".to_owned()),
                    text: "../".to_owned()
                },
                Node::Text("\n".to_owned()),
                Node::Element {
                    href: Some("a&b.tar.xz".to_owned()),
                    text: "a&b.tar.xz".to_owned()
                },
                Node::Text("   27-Feb-2023 21:32   1234\n".to_owned()),
            ]
        );
    }

    #[test]
    fn test_text_content() {
        assert_eq!(text_content("<b>Version</b>&nbsp;"), "Version ");
        assert_eq!(text_content("plain"), "plain");
    }
}
