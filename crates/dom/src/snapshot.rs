use crate::document::OffscreenDocument;
use crate::sink::OperationSink;
use crate::store::ElementStore;
use crate::style::css_text;
use core_types::UniqueId;
use std::fmt;

/// Deterministic tree serialization for comparisons in tests.
/// Not a stable format.
///
/// Equivalence rules:
/// - Tags must match; the root (empty tag) renders as `#root`.
/// - Attribute order is significant; names and values must match.
/// - Inline style compares by serialized css text.
/// - Raw inner-HTML text must match exactly.
/// - Element identities are not part of the snapshot.
pub trait SnapshotTree {
    type Node: Copy;

    fn snapshot_root(&self) -> Self::Node;

    fn snapshot_node(&self, node: Self::Node) -> SnapshotNode<Self::Node>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotNode<N> {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub css_text: String,
    pub inner_html: Option<String>,
    pub children: Vec<N>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeSnapshot {
    lines: Vec<String>,
}

impl TreeSnapshot {
    pub fn of<T: SnapshotTree>(tree: &T) -> Self {
        let mut lines = Vec::new();
        walk(tree, tree.snapshot_root(), 0, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn walk<T: SnapshotTree>(tree: &T, node: T::Node, depth: usize, lines: &mut Vec<String>) {
    let snap = tree.snapshot_node(node);
    let indent = "  ".repeat(depth);
    let mut line = format!("{indent}<");
    line.push_str(if snap.tag.is_empty() { "#root" } else { snap.tag.as_str() });
    for (key, value) in &snap.attributes {
        line.push_str(&format!(" {key}=\"{value}\""));
    }
    if !snap.css_text.is_empty() {
        line.push_str(&format!(" style=\"{}\"", snap.css_text));
    }
    line.push('>');
    lines.push(line);
    if let Some(text) = &snap.inner_html {
        lines.push(format!("{indent}  #html {text:?}"));
    }
    for child in snap.children {
        walk(tree, child, depth + 1, lines);
    }
}

impl<S: OperationSink, E: ElementStore> SnapshotTree for OffscreenDocument<S, E> {
    type Node = UniqueId;

    fn snapshot_root(&self) -> UniqueId {
        UniqueId::ROOT
    }

    fn snapshot_node(&self, node: UniqueId) -> SnapshotNode<UniqueId> {
        let store = self.store();
        SnapshotNode {
            tag: store.tag(node).unwrap_or_default().to_owned(),
            attributes: store
                .attributes(node)
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            css_text: css_text(store.style_properties(node)),
            inner_html: store.inner_html(node).map(str::to_owned),
            children: store.children(node).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ObjectLog;

    #[test]
    fn renders_nested_elements() {
        let mut doc = OffscreenDocument::new(ObjectLog::new());
        let view = doc.create_element("view");
        let text = doc.create_element("text");
        doc.set_attribute(view, "id", "x").unwrap();
        doc.set_style_property(view, "color", "red", false).unwrap();
        doc.set_inner_html(text, "hi").unwrap();
        doc.append(view, &[text]).unwrap();
        doc.append(UniqueId::ROOT, &[view]).unwrap();

        let snapshot = TreeSnapshot::of(&doc);
        assert_eq!(
            snapshot.as_lines(),
            &[
                "<#root>".to_string(),
                "  <view id=\"x\" style=\"color:red;\">".to_string(),
                "    <text>".to_string(),
                "      #html \"hi\"".to_string(),
            ]
        );
    }
}
