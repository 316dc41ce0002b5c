// src/page/dom.rs
//! A parsed host page plus the mutations the adapter performs on it:
//! form-control values, synthetic events with bubbling, listeners and
//! inserted fragments.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::page::selectors::SelectorChain;
use crate::utils;

pub type Listener = Arc<dyn Fn(&HtmlPage, &DomEvent) + Send + Sync>;

#[derive(Debug, Error, PartialEq)]
pub enum DomError {
    #[error("element is no longer attached to the document")]
    Detached,

    #[error("<{0}> is not a form control")]
    NotAFormControl(String),

    #[error("no <option> carries the value {0:?}")]
    NoSuchOption(String),

    #[error("fragment contains no element")]
    EmptyFragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub kind: String,
    pub target: NodeId,
    /// Node whose listener is being invoked; differs from `target` while bubbling.
    pub current_target: NodeId,
    pub bubbles: bool,
}

pub struct HtmlPage {
    url: String,
    html: Html,
    values: HashMap<NodeId, String>,
    listeners: Vec<(NodeId, String, Listener)>,
    dispatched: Vec<DomEvent>,
    mutations: u64,
}

impl HtmlPage {
    pub fn parse(url: impl Into<String>, source: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(source),
            values: HashMap::new(),
            listeners: Vec::new(),
            dispatched: Vec::new(),
            mutations: 0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client-side navigation: the URL changes, the document stays.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.mutations += 1;
    }

    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.node(id).and_then(ElementRef::wrap)
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.node(id) {
            Some(node) if node.id() == root => true,
            Some(node) => node.ancestors().any(|ancestor| ancestor.id() == root),
            None => false,
        }
    }

    /// First match of the first selector in the chain that matches anything.
    pub fn query(&self, chain: &SelectorChain) -> Option<NodeId> {
        chain
            .selectors()
            .find_map(|selector| self.html.select(selector).next().map(|el| el.id()))
    }

    pub fn query_within(&self, scope: NodeId, chain: &SelectorChain) -> Option<NodeId> {
        let scope_element = self.element(scope)?;
        chain.selectors().find_map(|selector| {
            scope_element
                .select(selector)
                .find(|el| el.id() != scope)
                .map(|el| el.id())
        })
    }

    /// All matches of the first selector in the chain that matches anything,
    /// nested matches collapsed to the outermost.
    pub fn query_all(&self, chain: &SelectorChain) -> Vec<NodeId> {
        for selector in chain.selectors() {
            let ids: Vec<NodeId> = self.html.select(selector).map(|el| el.id()).collect();
            if !ids.is_empty() {
                return self.outermost(ids);
            }
        }
        Vec::new()
    }

    pub fn query_all_within(&self, scope: NodeId, chain: &SelectorChain) -> Vec<NodeId> {
        let Some(scope_element) = self.element(scope) else {
            return Vec::new();
        };

        for selector in chain.selectors() {
            let ids: Vec<NodeId> = scope_element
                .select(selector)
                .filter(|el| el.id() != scope)
                .map(|el| el.id())
                .collect();
            if !ids.is_empty() {
                return self.outermost(ids);
            }
        }
        Vec::new()
    }

    fn outermost(&self, ids: Vec<NodeId>) -> Vec<NodeId> {
        let matched: HashSet<NodeId> = ids.iter().copied().collect();
        ids.into_iter()
            .filter(|id| {
                self.node(*id)
                    .map(|node| !node.ancestors().any(|a| matched.contains(&a.id())))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .find(|el| el.value().id() == Some(id))
            .map(|el| el.id())
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.value().name())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.value().attr(name))
    }

    /// Text content with whitespace collapsed; empty for unknown nodes.
    pub fn text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| utils::clean_text(&el.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default()
    }

    pub fn value(&self, node: NodeId) -> Option<String> {
        if let Some(value) = self.values.get(&node) {
            return Some(value.clone());
        }

        let element = self.element(node)?;
        match element.value().name() {
            "select" => {
                let options: Vec<ElementRef<'_>> = option_elements(element).collect();
                options
                    .iter()
                    .find(|opt| opt.value().attr("selected").is_some())
                    .or_else(|| options.first())
                    .map(|opt| option_value(*opt))
            }
            "textarea" => Some(element.text().collect::<String>()),
            _ => element.value().attr("value").map(str::to_string),
        }
    }

    /// Set a form control's value without notifying anyone.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        if !self.is_attached(node) {
            return Err(DomError::Detached);
        }
        let element = self.element(node).ok_or(DomError::Detached)?;

        match element.value().name() {
            "input" | "textarea" => {}
            "select" => {
                if !option_elements(element).any(|opt| option_value(opt) == value) {
                    return Err(DomError::NoSuchOption(value.to_string()));
                }
            }
            other => return Err(DomError::NotAFormControl(other.to_string())),
        }

        self.values.insert(node, value.to_string());
        self.mutations += 1;
        Ok(())
    }

    pub fn add_event_listener(&mut self, node: NodeId, kind: &str, listener: Listener) {
        self.listeners.push((node, kind.to_string(), listener));
    }

    /// Record the event and run listeners on the target, then on each
    /// ancestor when the event bubbles.
    pub fn dispatch_event(&mut self, target: NodeId, kind: &str, bubbles: bool) {
        self.dispatched.push(DomEvent {
            kind: kind.to_string(),
            target,
            current_target: target,
            bubbles,
        });

        let mut path = vec![target];
        if bubbles {
            if let Some(node) = self.node(target) {
                path.extend(node.ancestors().map(|ancestor| ancestor.id()));
            }
        }

        let mut calls: Vec<(Listener, DomEvent)> = Vec::new();
        for current in path {
            for (node, listener_kind, listener) in &self.listeners {
                if *node == current && listener_kind == kind {
                    calls.push((
                        Arc::clone(listener),
                        DomEvent {
                            kind: kind.to_string(),
                            target,
                            current_target: current,
                            bubbles,
                        },
                    ));
                }
            }
        }

        let page: &HtmlPage = self;
        for (listener, event) in calls {
            listener(page, &event);
        }
    }

    pub fn click(&mut self, node: NodeId) {
        self.dispatch_event(node, "click", true);
    }

    pub fn dispatched_events(&self) -> &[DomEvent] {
        &self.dispatched
    }

    pub fn events_on(&self, node: NodeId) -> Vec<&str> {
        self.dispatched
            .iter()
            .filter(|event| event.target == node)
            .map(|event| event.kind.as_str())
            .collect()
    }

    /// Parse `fragment` and append its nodes at the end of `<body>`.
    /// Returns the first inserted element.
    pub fn append_to_body(&mut self, fragment: &str) -> Result<NodeId, DomError> {
        let parent = self
            .elements()
            .find(|el| el.value().name() == "body")
            .map(|el| el.id())
            .unwrap_or_else(|| self.html.root_element().id());

        let parsed = Html::parse_fragment(fragment);
        let mut first_element = None;
        for child in parsed.root_element().children() {
            if let Some(new_id) = self.graft(parent, child) {
                if first_element.is_none() && child.value().is_element() {
                    first_element = Some(new_id);
                }
            }
        }

        self.mutations += 1;
        first_element.ok_or(DomError::EmptyFragment)
    }

    fn graft(&mut self, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
        let new_id = self
            .html
            .tree
            .get_mut(parent)?
            .append(source.value().clone())
            .id();
        for child in source.children() {
            self.graft(new_id, child);
        }
        Some(new_id)
    }

    /// Detach `node` and its subtree; values and listeners on it are dropped.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.is_attached(node) {
            return false;
        }

        let subtree: HashSet<NodeId> = match self.node(node) {
            Some(n) => n.descendants().map(|d| d.id()).collect(),
            None => return false,
        };

        match self.html.tree.get_mut(node) {
            Some(mut n) => n.detach(),
            None => return false,
        }

        self.values.retain(|id, _| !subtree.contains(id));
        self.listeners.retain(|(id, _, _)| !subtree.contains(id));
        self.mutations += 1;
        true
    }

    pub fn to_html(&self) -> String {
        self.html.html()
    }
}

fn option_elements(select: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    select
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "option")
}

fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| utils::clean_text(&option.text().collect::<String>()))
}
