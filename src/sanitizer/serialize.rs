//! Re-serialization of a parsed fragment, driven by a per-element decision.

use ego_tree::NodeRef;
use scraper::Html;
use scraper::node::{Element, Node};

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style",
    "script",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

/// Elements whose first leading newline is swallowed by the parser.
const NEWLINE_SENSITIVE: &[&str] = &["pre", "textarea", "listing"];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// What to do with one element of the parsed tree.
pub(super) enum Disposition<'a> {
    /// Emit the element with exactly these attributes.
    Keep(Vec<(&'a str, &'a str)>),
    /// Drop the element's tags but emit its children in its place.
    Unwrap,
    /// Drop the element and its whole subtree.
    Remove,
}

/// Where in the output the next node lands, as the parser will see it on
/// re-reading that output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    Flow,
    /// Direct child of a heading; a nested heading would close it.
    Heading,
    /// Text is emitted verbatim.
    RawText,
    Table,
    /// Inside `thead`, `tbody` or `tfoot`.
    Section,
    Row,
    Colgroup,
}

impl Context {
    /// Context the children of `tag` are written in.
    fn inside(tag: &str) -> Self {
        match tag {
            "table" => Context::Table,
            "thead" | "tbody" | "tfoot" => Context::Section,
            "tr" => Context::Row,
            "colgroup" => Context::Colgroup,
            t if HEADINGS.contains(&t) => Context::Heading,
            t if RAW_TEXT_ELEMENTS.contains(&t) => Context::RawText,
            _ => Context::Flow,
        }
    }

    /// Whether `tag` written here re-parses as a child of the same parent.
    fn admits(self, tag: &str) -> bool {
        let required = match tag {
            "caption" | "colgroup" | "thead" | "tbody" | "tfoot" => Context::Table,
            "tr" => Context::Section,
            "td" | "th" => Context::Row,
            "col" => Context::Colgroup,
            _ => Context::Flow,
        };
        match self {
            Context::Heading => required == Context::Flow && !HEADINGS.contains(&tag),
            Context::RawText => required == Context::Flow,
            ctx => ctx == required,
        }
    }

    /// Table contexts hold only table parts and whitespace; anything else
    /// is moved in front of the table by the parser.
    fn is_tabular(self) -> bool {
        matches!(
            self,
            Context::Table | Context::Section | Context::Row | Context::Colgroup
        )
    }
}

/// Serialize the contents of a fragment parsed with [`Html::parse_fragment`].
///
/// The synthetic `<html>` wrapper the parser adds is never emitted. Comments,
/// doctypes and processing instructions are dropped. The output re-parses to
/// the tree it was written from: content the parser would relocate is
/// relocated here first.
pub(super) fn serialize_fragment<'a, F>(html: &'a Html, decide: F) -> String
where
    F: Fn(&'a Element) -> Disposition<'a>,
{
    let mut out = String::new();
    for child in html.tree.root().children() {
        match child.value() {
            Node::Element(el) if el.name() == "html" => {
                for inner in child.children() {
                    serialize_node(inner, &decide, Context::Flow, &mut out, &mut String::new());
                }
            }
            _ => serialize_node(child, &decide, Context::Flow, &mut out, &mut String::new()),
        }
    }
    out
}

/// Write `node` into `out`. Flow content met in a table context goes to
/// `foster`, which the enclosing table emits ahead of itself.
fn serialize_node<'a, F>(
    node: NodeRef<'a, Node>,
    decide: &F,
    ctx: Context,
    out: &mut String,
    foster: &mut String,
) where
    F: Fn(&'a Element) -> Disposition<'a>,
{
    match node.value() {
        Node::Element(el) => match decide(el) {
            Disposition::Remove => {}
            Disposition::Keep(attrs) if ctx.admits(el.name()) => {
                serialize_element(node, el.name(), attrs, decide, out, foster);
            }
            Disposition::Keep(_) | Disposition::Unwrap if ctx.is_tabular() => {
                for child in node.children() {
                    serialize_node(child, decide, Context::Flow, foster, &mut String::new());
                }
            }
            Disposition::Keep(_) | Disposition::Unwrap => {
                for child in node.children() {
                    serialize_node(child, decide, ctx, out, foster);
                }
            }
        },
        Node::Text(text) => match ctx {
            Context::RawText => out.push_str(text),
            ctx if ctx.is_tabular() && !is_html_whitespace(text) => escape_text(text, foster),
            _ => escape_text(text, out),
        },
        _ => {}
    }
}

fn serialize_element<'a, F>(
    node: NodeRef<'a, Node>,
    tag: &str,
    mut attrs: Vec<(&'a str, &'a str)>,
    decide: &F,
    out: &mut String,
    foster: &mut String,
) where
    F: Fn(&'a Element) -> Disposition<'a>,
{
    attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut start = String::new();
    start.push('<');
    start.push_str(tag);
    for (k, v) in attrs {
        start.push(' ');
        start.push_str(k);
        start.push_str("=\"");
        escape_attribute(v, &mut start);
        start.push('"');
    }
    start.push('>');

    if VOID_ELEMENTS.contains(&tag) {
        out.push_str(&start);
        return;
    }

    let ctx = Context::inside(tag);
    let mut fostered = String::new();
    let foster = if tag == "table" { &mut fostered } else { foster };
    let mut inner = String::new();
    for child in node.children() {
        serialize_node(child, decide, ctx, &mut inner, foster);
    }

    out.push_str(&fostered);
    out.push_str(&start);
    if NEWLINE_SENSITIVE.contains(&tag) && inner.starts_with('\n') {
        out.push('\n');
    }
    out.push_str(&inner);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn is_html_whitespace(text: &str) -> bool {
    text.chars()
        .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}'))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
