use std::fmt::Write;

/// One inline style declaration, borrowed from its store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleProperty<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub important: bool,
}

/// Ordered inline style declarations of one element.
///
/// Setting an existing property updates it in place, so the first-set order
/// is kept for serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    entries: Vec<(String, String, bool)>,
}

impl StyleDeclaration {
    pub fn get(&self, name: &str) -> Option<StyleProperty<'_>> {
        self.entries
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(name, value, important)| StyleProperty {
                name,
                value,
                important: *important,
            })
    }

    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _, _)| n == name) {
            entry.1.clear();
            entry.1.push_str(value);
            entry.2 = important;
            return;
        }
        self.entries.push((name.to_owned(), value.to_owned(), important));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _, _)| n != name);
        before != self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = StyleProperty<'_>> {
        self.entries.iter().map(|(name, value, important)| StyleProperty {
            name,
            value,
            important: *important,
        })
    }
}

/// Serialize declarations as `name:value;` pairs, with ` !important` kept.
pub fn css_text<'a>(properties: impl IntoIterator<Item = StyleProperty<'a>>) -> String {
    let mut out = String::new();
    for prop in properties {
        if prop.important {
            let _ = write!(out, "{}:{} !important;", prop.name, prop.value);
        } else {
            let _ = write!(out, "{}:{};", prop.name, prop.value);
        }
    }
    out
}
