//! Minimal element tree for running the behavior binder outside a browser.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Only what the
//! binder needs is modelled: tags, attributes, and parent/child links. Text
//! content is not represented.

use std::collections::BTreeMap;

/// Handle to an element of one [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Element>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Empty document with a single `html` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element {
                tag: "html".to_string(),
                attrs: BTreeMap::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new `tag` element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an element carrying the given attributes.
    pub fn append_with(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.append(parent, tag);
        for (name, value) in attrs {
            self.set_attr(id, name, value);
        }
        id
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.nodes[node.0].attrs.contains_key(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id")
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// `node` and everything below it, in document order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// All elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.subtree(self.root())
            .into_iter()
            .filter(|&n| self.tag(n).eq_ignore_ascii_case(tag))
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.subtree(self.root())
            .into_iter()
            .find(|&n| self.id(n) == Some(id))
    }
}
