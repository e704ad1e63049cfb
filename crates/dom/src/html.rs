use crate::store::ElementStore;
use crate::style::css_text;
use core_types::UniqueId;

/// Serialize `uid` and its subtree as markup.
///
/// An element with an empty tag is a bare node: only its content is written.
/// Stored inner-HTML text is emitted verbatim in place of children.
pub(crate) fn write_outer_html<E: ElementStore>(store: &E, uid: UniqueId, out: &mut String) {
    let Some(tag) = store.tag(uid) else {
        return;
    };
    let is_node = tag.is_empty();
    if !is_node {
        out.push('<');
        out.push_str(tag);
        for (key, value) in store.attributes(uid) {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
        let style = store.style_properties(uid);
        if !style.is_empty() {
            out.push_str(" style=\"");
            escape_attribute(&css_text(style), out);
            out.push('"');
        }
        out.push('>');
    }
    write_inner_html(store, uid, out);
    if !is_node {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

pub(crate) fn write_inner_html<E: ElementStore>(store: &E, uid: UniqueId, out: &mut String) {
    if let Some(text) = store.inner_html(uid) {
        out.push_str(text);
        return;
    }
    for child in store.children(uid) {
        write_outer_html(store, *child, out);
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}
