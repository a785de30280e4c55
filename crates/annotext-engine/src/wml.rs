//! Small helpers for navigating WordprocessingML nodes.

use roxmltree::Node;

/// Main WordprocessingML namespace.
pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// True if `node` is a WML element with the given local name.
pub fn is_wml(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(WML_NS)
}

/// First direct WML child with the given local name.
pub fn wml_child<'a>(node: Node<'a, 'a>, name: &str) -> Option<Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

/// A WML-namespaced attribute value.
pub fn wml_attr<'a>(node: Node<'a, 'a>, name: &str) -> Option<&'a str> {
    node.attribute((WML_NS, name))
}

/// Parsed WML `w:id` attribute.
pub fn wml_id(node: Node) -> Option<i64> {
    wml_attr(node, "id").and_then(|v| v.parse().ok())
}

/// Concatenated text of all `w:t` descendants.
pub fn gather_text(node: Node) -> String {
    let mut out = String::new();
    for t in node.descendants().filter(|n| is_wml(*n, "t")) {
        if let Some(text) = t.text() {
            out.push_str(text);
        }
    }
    out
}

pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{FEFF}').unwrap_or(s)
}
