//! Mutable page document: an explicit arena tree with stable node ids.
//!
//! The analyzer needs two things the raw parser output does not give it:
//! pure query reads for the rule engine, and a small set of explicit,
//! auditable mutations for the patch applier. `PageDocument` converts
//! scraper's best-effort HTML5 parse into its own `ego_tree` arena of
//! [`PageNode`] values and exposes exactly those operations.
//!
//! Comments, doctypes, and processing instructions are not round-tripped;
//! serialization produces a structurally-equivalent document, not a
//! byte-identical one.

use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use scraper::node::Node;
use scraper::Html;

/// One node of the page tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageNode {
    /// Synthetic root; children are the document's top-level nodes.
    Root,
    Element {
        name: String,
        /// Attributes in source order; serialization preserves it.
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

/// A parsed HTML document owned by a single analysis request.
#[derive(Debug, Clone)]
pub struct PageDocument {
    tree: Tree<PageNode>,
}

impl PageDocument {
    /// Parse raw HTML, best-effort. Malformed input yields whatever tree the
    /// HTML5 recovery algorithm produces, never an error.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut tree = Tree::new(PageNode::Root);
        copy_children(parsed.tree.root(), &mut tree.root_mut());
        Self { tree }
    }

    // --- pure reads -------------------------------------------------------

    /// First element with the given tag name, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.elements()
            .find(|&(_, name, _)| name == tag)
            .map(|(id, _, _)| id)
    }

    /// All elements with the given tag name, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|&(_, name, _)| name == tag)
            .map(|(id, _, _)| id)
            .collect()
    }

    /// All elements whose tag name is in `tags`, in document order.
    pub fn find_all_of(&self, tags: &[&str]) -> Vec<NodeId> {
        self.elements()
            .filter(|&(_, name, _)| tags.contains(&name))
            .map(|(id, _, _)| id)
            .collect()
    }

    /// First element with the given tag carrying `attr=value`.
    pub fn find_first_with_attr(&self, tag: &str, attr: &str, value: &str) -> Option<NodeId> {
        self.elements()
            .find(|&(_, name, attrs)| {
                name == tag
                    && attrs
                        .iter()
                        .any(|(k, v)| k.as_str() == attr && v.as_str() == value)
            })
            .map(|(id, _, _)| id)
    }

    /// Tag name of an element node.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.tree.get(id)?.value() {
            PageNode::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Attribute value on an element node.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.tree.get(id)?.value() {
            PageNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.as_str() == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes, unnormalized.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        for n in node.descendants() {
            if let PageNode::Text(t) = n.value() {
                out.push_str(t);
            }
        }
        out
    }

    /// Every text node in document order, paired with its id.
    ///
    /// The patch applier uses this to locate anchor-text occurrences.
    pub(crate) fn text_nodes(&self) -> Vec<(NodeId, String)> {
        self.tree
            .root()
            .descendants()
            .filter_map(|n| match n.value() {
                PageNode::Text(t) => Some((n.id(), t.clone())),
                _ => None,
            })
            .collect()
    }

    /// Tag name of the node's parent element, if any.
    pub(crate) fn parent_tag(&self, id: NodeId) -> Option<&str> {
        let parent = self.tree.get(id)?.parent()?;
        match parent.value() {
            PageNode::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    // --- explicit mutations (text extractor + patch applier only) ---------

    /// Set (or add) an attribute on an element. Returns false if `id` is not
    /// an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        match node.value() {
            PageNode::Element { attrs, .. } => {
                if let Some(slot) = attrs.iter_mut().find(|(k, _)| k.as_str() == name) {
                    slot.1 = value.to_string();
                } else {
                    attrs.push((name.to_string(), value.to_string()));
                }
                true
            }
            _ => false,
        }
    }

    /// Replace an element's children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        let child_ids: Vec<NodeId> = match self.tree.get(id) {
            Some(node) if matches!(node.value(), PageNode::Element { .. }) => {
                node.children().map(|c| c.id()).collect()
            }
            _ => return false,
        };
        for child in child_ids {
            if let Some(mut m) = self.tree.get_mut(child) {
                m.detach();
            }
        }
        if let Some(mut node) = self.tree.get_mut(id) {
            node.append(PageNode::Text(text.to_string()));
            true
        } else {
            false
        }
    }

    /// Append a new element as the last child of `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Option<NodeId> {
        let mut node = self.tree.get_mut(parent)?;
        let value = PageNode::Element {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        Some(node.append(value).id())
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Option<NodeId> {
        let mut node = self.tree.get_mut(parent)?;
        Some(node.append(PageNode::Text(text.to_string())).id())
    }

    /// Overwrite the content of an existing text node.
    pub(crate) fn set_text_value(&mut self, id: NodeId, text: &str) -> bool {
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        match node.value() {
            PageNode::Text(t) => {
                *t = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Insert a new element as the next sibling of `id`. `id` must not be
    /// the root.
    pub(crate) fn insert_element_after(
        &mut self,
        id: NodeId,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Option<NodeId> {
        if self.tree.get(id)?.parent().is_none() {
            return None;
        }
        let mut node = self.tree.get_mut(id)?;
        let value = PageNode::Element {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        Some(node.insert_after(value).id())
    }

    /// Insert a new text node as the next sibling of `id`.
    pub(crate) fn insert_text_after(&mut self, id: NodeId, text: &str) -> Option<NodeId> {
        if self.tree.get(id)?.parent().is_none() {
            return None;
        }
        let mut node = self.tree.get_mut(id)?;
        Some(node.insert_after(PageNode::Text(text.to_string())).id())
    }

    /// Detach every subtree rooted at an element whose tag name is in `tags`.
    pub fn remove_subtrees(&mut self, tags: &[&str]) {
        let doomed: Vec<NodeId> = self
            .elements()
            .filter(|&(_, name, _)| tags.contains(&name))
            .map(|(id, _, _)| id)
            .collect();
        for id in doomed {
            if let Some(mut m) = self.tree.get_mut(id) {
                m.detach();
            }
        }
    }

    // --- serialization ----------------------------------------------------

    /// Serialize back to HTML with escaped text/attributes and self-closed
    /// void elements.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serialize_node(self.tree.root(), &mut out);
        out
    }

    /// Document-order iterator over element nodes as `(id, name, attrs)`.
    fn elements(&self) -> impl Iterator<Item = (NodeId, &str, &[(String, String)])> + '_ {
        self.tree.root().descendants().filter_map(|n| match n.value() {
            PageNode::Element { name, attrs } => Some((n.id(), name.as_str(), attrs.as_slice())),
            _ => None,
        })
    }
}

/// Recursively copy scraper's parse tree into our arena, dropping comments,
/// doctypes, and processing instructions.
fn copy_children(src: ego_tree::NodeRef<'_, Node>, dst: &mut NodeMut<'_, PageNode>) {
    for child in src.children() {
        match child.value() {
            Node::Element(el) => {
                let value = PageNode::Element {
                    name: el.name().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                };
                let mut node = dst.append(value);
                copy_children(child, &mut node);
            }
            Node::Text(t) => {
                dst.append(PageNode::Text(t.text.to_string()));
            }
            Node::Document | Node::Fragment => copy_children(child, dst),
            _ => {}
        }
    }
}

fn serialize_node(node: NodeRef<'_, PageNode>, out: &mut String) {
    match node.value() {
        PageNode::Root => {
            for child in node.children() {
                serialize_node(child, out);
            }
        }
        PageNode::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for (attr, val) in attrs {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                escape_attr(val, out);
                out.push('"');
            }
            if is_void_element(name) {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in node.children() {
                    serialize_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        PageNode::Text(text) => {
            // Re-escape so decoded entities are not re-interpreted as markup
            // if the output is parsed again.
            for ch in text.chars() {
                match ch {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    _ => out.push(ch),
                }
            }
        }
    }
}

/// Write an HTML-escaped attribute value into `out`.
///
/// Bare `&` is common in URL query strings (e.g. `href="/?a=1&b=2"`) and must
/// be re-encoded as `&amp;` to round-trip through a re-parse.
fn escape_attr(val: &str, out: &mut String) {
    for ch in val.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// HTML void elements that must not have a closing tag.
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
