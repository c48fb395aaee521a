//! Arena-allocated HTML tree.

use html5ever::QualName;

/// Index of a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element { name: QualName, attrs: Vec<Attribute> },
    Text(String),
    Comment,
    Doctype,
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed document. Nodes are never freed; detached nodes simply lose
/// their parent link.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub const DOCUMENT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub(crate) fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    pub(crate) fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(NodeData::Text(text))
    }

    pub(crate) fn create_comment(&mut self) -> NodeId {
        self.alloc(NodeData::Comment)
    }

    pub(crate) fn create_doctype(&mut self) -> NodeId {
        self.alloc(NodeData::Doctype)
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Append text, merging with a trailing text node.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.get(parent).and_then(|n| n.children.last().copied());
        if let Some(last) = last
            && let Some(Node {
                data: NodeData::Text(existing),
                ..
            }) = self.get_mut(last)
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text.to_string());
        self.append(parent, node);
    }

    pub(crate) fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let Some(parent) = self.get(sibling).and_then(|n| n.parent) else {
            return;
        };
        self.detach(new_node);
        if let Some(node) = self.get_mut(new_node) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            let index = node
                .children
                .iter()
                .position(|&c| c == sibling)
                .unwrap_or(node.children.len());
            node.children.insert(index, new_node);
        }
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Local tag name for element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// All nodes below `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First element with the given tag, in document order.
    pub fn find_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(Self::DOCUMENT)
            .into_iter()
            .find(|&id| self.tag(id) == Some(tag))
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use html5ever::{LocalName, ns};

    use super::*;

    fn qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    #[test]
    fn test_append_and_reparent() {
        let mut dom = Dom::new();
        let div = dom.create_element(qname("div"), vec![]);
        let p = dom.create_element(qname("p"), vec![]);
        dom.append(Dom::DOCUMENT, div);
        dom.append(Dom::DOCUMENT, p);
        dom.append(div, p);

        assert_eq!(dom.children(Dom::DOCUMENT), &[div]);
        assert_eq!(dom.children(div), &[p]);
        assert_eq!(dom.get(p).unwrap().parent, Some(div));
    }

    #[test]
    fn test_text_merging() {
        let mut dom = Dom::new();
        let p = dom.create_element(qname("p"), vec![]);
        dom.append(Dom::DOCUMENT, p);
        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children = dom.children(p);
        assert_eq!(children.len(), 1);
        assert!(matches!(
            &dom.get(children[0]).unwrap().data,
            NodeData::Text(t) if t == "Hello, World!"
        ));
    }

    #[test]
    fn test_insert_before() {
        let mut dom = Dom::new();
        let ul = dom.create_element(qname("ul"), vec![]);
        let b = dom.create_element(qname("li"), vec![]);
        let a = dom.create_element(qname("li"), vec![]);
        dom.append(Dom::DOCUMENT, ul);
        dom.append(ul, b);
        dom.insert_before(b, a);
        assert_eq!(dom.children(ul), &[a, b]);
    }
}
