/// In-memory [`Document`] used by the command-line host and the tests.
///
/// Slots hold their current content as a string; generic elements form a flat arena with
/// optional parent links, which is all the bootstrap queries need.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::document::{Document, Field, NodeId, ScrollBehavior, Selector, Slot, WidgetKind};
use crate::markup::{escape, Markup};

/// Builder for a generic element added with [`MemoryDocument::add_element`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    offset_top: f64,
    parent: Option<NodeId>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn offset_top(mut self, top: f64) -> Self {
        self.offset_top = top;
        self
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => self.classes.iter().any(|c| c == class),
            Selector::Attr { name, value } => self.attributes.get(name) == Some(value),
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    element: Element,
    styles: BTreeMap<String, String>,
    widgets: Vec<WidgetKind>,
}

#[derive(Debug, Default, Clone)]
struct SlotState {
    content: String,
    hidden: bool,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<Slot, SlotState>,
    fields: HashMap<Field, String>,
    radios: HashMap<String, String>,
    nodes: Vec<Node>,
    scrolls: Vec<(f64, ScrollBehavior)>,
    resets: Vec<Slot>,
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    inner: Mutex<Inner>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page with every slot present, the loading and error panels hidden.
    pub fn dashboard() -> Self {
        let doc = Self::with_slots(Slot::ALL);
        doc.set_hidden(Slot::LoadingIndicator, true);
        doc.set_hidden(Slot::ErrorMessage, true);
        doc.set_hidden(Slot::ResultsContainer, true);
        doc
    }

    pub fn with_slots(slots: impl IntoIterator<Item = Slot>) -> Self {
        let doc = Self::new();
        {
            let mut inner = doc.lock();
            for slot in slots {
                inner.slots.insert(slot, SlotState::default());
            }
        }
        doc
    }

    pub fn add_element(&self, element: Element) -> NodeId {
        let mut inner = self.lock();
        inner.nodes.push(Node {
            element,
            ..Node::default()
        });
        inner.nodes.len() - 1
    }

    pub fn set_field(&self, field: Field, value: &str) {
        self.lock().fields.insert(field, value.to_string());
    }

    pub fn set_radio(&self, group: &str, value: &str) {
        self.lock()
            .radios
            .insert(group.to_string(), value.to_string());
    }

    pub fn content(&self, slot: Slot) -> Option<String> {
        self.lock().slots.get(&slot).map(|s| s.content.clone())
    }

    pub fn is_hidden(&self, slot: Slot) -> Option<bool> {
        self.lock().slots.get(&slot).map(|s| s.hidden)
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(node)
            .and_then(|n| n.styles.get(property).cloned())
    }

    pub fn widgets(&self, node: NodeId) -> Vec<WidgetKind> {
        self.lock()
            .nodes
            .get(node)
            .map(|n| n.widgets.clone())
            .unwrap_or_default()
    }

    pub fn scrolls(&self) -> Vec<(f64, ScrollBehavior)> {
        self.lock().scrolls.clone()
    }

    pub fn resets(&self) -> Vec<Slot> {
        self.lock().resets.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Document for MemoryDocument {
    fn has_slot(&self, slot: Slot) -> bool {
        self.lock().slots.contains_key(&slot)
    }

    fn replace_html(&self, slot: Slot, html: &Markup) {
        if let Some(state) = self.lock().slots.get_mut(&slot) {
            state.content = html.as_str().to_string();
        }
    }

    fn set_text(&self, slot: Slot, text: &str) {
        if let Some(state) = self.lock().slots.get_mut(&slot) {
            state.content = escape(text);
        }
    }

    fn set_hidden(&self, slot: Slot, hidden: bool) {
        if let Some(state) = self.lock().slots.get_mut(&slot) {
            state.hidden = hidden;
        }
    }

    fn reset_form(&self, form: Slot) {
        let mut inner = self.lock();
        if !inner.slots.contains_key(&form) {
            return;
        }
        for field in Field::of_form(form) {
            inner.fields.remove(field);
        }
        inner.resets.push(form);
    }

    fn field_value(&self, field: Field) -> Option<String> {
        self.lock().fields.get(&field).cloned()
    }

    fn checked_value(&self, group: &str) -> Option<String> {
        self.lock().radios.get(group).cloned()
    }

    fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.lock()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.element.matches(selector))
            .map(|(id, _)| id)
            .collect()
    }

    fn first_descendant(&self, parent: NodeId, selector: &Selector) -> Option<NodeId> {
        let inner = self.lock();
        inner.nodes.iter().enumerate().find_map(|(id, node)| {
            if !node.element.matches(selector) {
                return None;
            }
            let mut seen = HashSet::new();
            let mut cursor = node.element.parent;
            while let Some(p) = cursor {
                if p == parent {
                    return Some(id);
                }
                if !seen.insert(p) {
                    break;
                }
                cursor = inner.nodes.get(p).and_then(|n| n.element.parent);
            }
            None
        })
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(node)
            .and_then(|n| n.element.attributes.get(name).cloned())
    }

    fn text_content(&self, node: NodeId) -> String {
        self.lock()
            .nodes
            .get(node)
            .map(|n| n.element.text.clone())
            .unwrap_or_default()
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        if let Some(n) = self.lock().nodes.get_mut(node) {
            n.element.text = text.to_string();
        }
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        if let Some(n) = self.lock().nodes.get_mut(node) {
            n.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn offset_top(&self, node: NodeId) -> Option<f64> {
        self.lock().nodes.get(node).map(|n| n.element.offset_top)
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        self.lock().scrolls.push((top, behavior));
    }

    fn attach_widget(&self, node: NodeId, kind: WidgetKind) {
        if let Some(n) = self.lock().nodes.get_mut(node) {
            n.widgets.push(kind);
        }
    }
}
