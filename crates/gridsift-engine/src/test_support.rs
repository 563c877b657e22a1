//! Shared test fixture: a scripted in-memory page.
//!
//! `FakePage` models the behaviors the engine is built to survive, lazy
//! row reveal on scroll, handles that go stale, captions, dialogs, and a
//! session that can drop mid-run, without any browser. Selector strings
//! from `targets` are mapped onto node kinds; if a target table gains a
//! selector the fake does not know, queries for it return nothing and the
//! affected test fails loudly.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use gridsift_page::{ElementHandle, PageError, PageHandle, Query, ScrollTarget};

/// What a fake node is, for selector matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Row,
    HeaderRow,
    HeaderCell,
    Cell,
    ShowMore,
    NextPage,
    Container,
    Caption,
    CountBadge,
    Tab,
    SettingsButton,
    DialogButton,
    DialogCheckbox,
    Badge,
}

#[derive(Debug, Clone)]
struct FakeNode {
    id: u64,
    kind: Kind,
    parent: Option<u64>,
    text: String,
    attrs: HashMap<String, String>,
    visible: bool,
    interactable: bool,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<u64, FakeNode>,
    order: Vec<u64>,
    rows: Vec<u64>,
    next_id: u64,
    revealed: usize,
    scroll_step: usize,
    show_more_step: usize,
    next_page_step: usize,
    recovery_step: usize,
    clicks: Vec<u64>,
    keys: Vec<String>,
    stale_budget: HashMap<u64, u32>,
    session_lost: bool,
}

impl Inner {
    fn add(&mut self, kind: Kind, parent: Option<u64>, text: &str, visible: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            FakeNode {
                id,
                kind,
                parent,
                text: text.to_string(),
                attrs: HashMap::new(),
                visible,
                interactable: visible,
            },
        );
        self.order.push(id);
        if kind == Kind::Row {
            self.rows.push(id);
        }
        id
    }

    fn row_index(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|&r| r == id)
    }

    /// Rows past the reveal point do not exist as far as queries go.
    fn rendered(&self, node: &FakeNode) -> bool {
        let row_id = match node.kind {
            Kind::Row => Some(node.id),
            _ => self.enclosing_row(node.id),
        };
        match row_id {
            Some(row) => self
                .row_index(row)
                .map(|idx| idx < self.revealed)
                .unwrap_or(true),
            None => true,
        }
    }

    fn enclosing_row(&self, mut id: u64) -> Option<u64> {
        while let Some(node) = self.nodes.get(&id) {
            if node.kind == Kind::Row {
                return Some(node.id);
            }
            id = node.parent?;
        }
        None
    }

    fn reveal(&mut self, step: usize) {
        self.revealed = (self.revealed + step).min(self.rows.len());
    }

    fn is_descendant_of(&self, mut id: u64, ancestor: u64) -> bool {
        while let Some(node) = self.nodes.get(&id) {
            match node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => id = parent,
                None => return false,
            }
        }
        false
    }

    fn effective_text(&self, node: &FakeNode) -> String {
        if !node.text.is_empty() {
            return node.text.clone();
        }
        let mut lines = Vec::new();
        for id in &self.order {
            let child = &self.nodes[id];
            if child.parent == Some(node.id) && !child.text.is_empty() {
                lines.push(child.text.clone());
            }
        }
        lines.join("\n")
    }

    fn check_session(&self) -> Result<(), PageError> {
        if self.session_lost {
            Err(PageError::SessionLost("fake session closed".into()))
        } else {
            Ok(())
        }
    }

    fn check_stale(&mut self, id: u64) -> Result<(), PageError> {
        if let Some(budget) = self.stale_budget.get_mut(&id) {
            if *budget > 0 {
                *budget -= 1;
                return Err(PageError::Stale);
            }
        }
        Ok(())
    }
}

/// Selector-string → node-kind mapping for the selectors the engine uses.
fn kinds_for_css(selector: &str) -> &'static [Kind] {
    match selector {
        "table[role='grid'] tbody tr:not(.header-row)"
        | "[role='row']:not([data-header]):not(.header-row)"
        | "ul.item-list > li.list-item"
        | "[class*='ListItem']:not([class*='Header'])"
        | "[role='row'], tr, li.list-item" => &[Kind::Row],
        "table[role='grid'] thead tr"
        | "[role='row'][data-header], tr.header-row"
        | "[class*='HeaderRow']" => &[Kind::HeaderRow],
        "th" | "[role='columnheader']" | "[class*='HeaderCell']" => &[Kind::HeaderCell],
        "td, [role='gridcell']"
        | "[class*='cell'], [class*='Cell']"
        | ":scope > div, :scope > span" => &[Kind::Cell],
        "[class*='ShowMore'], [class*='LoadMore']" => &[Kind::ShowMore],
        "[class*='Paginator'] button[aria-label*='Next']"
        | "button[aria-label*='Next'], a[aria-label*='Next']" => &[Kind::NextPage],
        "button, a" => &[Kind::ShowMore, Kind::NextPage, Kind::DialogButton],
        "[class*='ScrollContainer'], [class*='scroll-container']" => &[Kind::Container],
        "[role='heading'], h1, h2, h3, div[class*='Title']" => &[Kind::Caption],
        "[class*='TabCount'], [class*='ItemCount']" => &[Kind::CountBadge],
        "[role='tab']" | "a, li, div[class*='Tab']" => &[Kind::Tab],
        "button[aria-label*='Settings'], button[title*='Settings']"
        | "[class*='settings'] button, button[class*='Settings']" => &[Kind::SettingsButton],
        "[role='dialog'] [role='tab'], [role='dialog'] button" | "[role='dialog'] button" => {
            &[Kind::DialogButton]
        }
        "[role='dialog'] [aria-label*='Column']" => &[Kind::DialogButton],
        "[role='dialog'] thead [role='checkbox'], [role='dialog'] th input[type='checkbox']"
        | "[role='dialog'] [aria-label*='Select All']" => &[Kind::DialogCheckbox],
        "[class*='Badge'], [class*='Indicator'], [class*='Icon']" => &[Kind::Badge],
        _ => &[],
    }
}

/// In-memory [`PageHandle`] implementation for tests.
pub struct FakePage {
    inner: Mutex<Inner>,
}

impl FakePage {
    pub fn builder() -> FakePageBuilder {
        FakePageBuilder::default()
    }

    /// Low-level node insertion for locator-focused tests.
    pub fn add_node(&self, kind: Kind, text: &str, visible: bool) -> ElementHandle {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.add(kind, None, text, visible);
        ElementHandle::new(id)
    }

    /// Add a child under an existing node (e.g. an in-row control).
    pub fn add_child(&self, parent: &ElementHandle, kind: Kind, text: &str) -> ElementHandle {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.add(kind, Some(parent.id()), text, true);
        ElementHandle::new(id)
    }

    pub fn set_attr(&self, handle: &ElementHandle, name: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(node) = inner.nodes.get_mut(&handle.id()) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_interactable(&self, handle: &ElementHandle, interactable: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(node) = inner.nodes.get_mut(&handle.id()) {
            node.interactable = interactable;
        }
    }

    /// Make the next `times` operations on this node fail with `Stale`.
    pub fn make_stale(&self, handle: &ElementHandle, times: u32) {
        self.inner
            .lock()
            .unwrap()
            .stale_budget
            .insert(handle.id(), times);
    }

    pub fn drop_session(&self) {
        self.inner.lock().unwrap().session_lost = true;
    }

    pub fn clicks(&self) -> Vec<u64> {
        self.inner.lock().unwrap().clicks.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().unwrap().keys.clone()
    }

    pub fn revealed_rows(&self) -> usize {
        self.inner.lock().unwrap().revealed
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn query(
        &self,
        query: &Query,
        scope: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>, PageError> {
        let inner = self.inner.lock().unwrap();
        inner.check_session()?;

        let matches_kind = |node: &FakeNode| match query {
            Query::Css("*") => true,
            Query::Css(selector) => kinds_for_css(selector).contains(&node.kind),
            Query::TextContains { selector, needle } => {
                kinds_for_css(selector).contains(&node.kind)
                    && inner.effective_text(node).contains(needle)
            }
            // The fake has no script engine; scripted strategies find
            // nothing, forcing tests through the structural paths unless a
            // test wires nodes that structural strategies also match.
            Query::Script(_) => false,
        };

        let mut found = Vec::new();
        for id in &inner.order {
            let node = &inner.nodes[id];
            if !inner.rendered(node) || !matches_kind(node) {
                continue;
            }
            if let Some(scope) = scope {
                if !inner.is_descendant_of(node.id, scope.id()) {
                    continue;
                }
            }
            found.push(ElementHandle::new(node.id));
        }
        Ok(found)
    }

    async fn evaluate(&self, script: &str, _args: &[Value]) -> Result<Value, PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        if script == crate::targets::FORCE_RERENDER {
            let step = inner.recovery_step;
            inner.reveal(step);
        }
        Ok(Value::Null)
    }

    async fn evaluate_on(
        &self,
        handle: &ElementHandle,
        _script: &str,
    ) -> Result<Value, PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.check_stale(handle.id())?;
        let text = inner
            .nodes
            .get(&handle.id())
            .map(|node| inner.effective_text(node))
            .unwrap_or_default();
        Ok(Value::String(text))
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.check_stale(handle.id())?;
        Ok(inner
            .nodes
            .get(&handle.id())
            .map(|node| inner.effective_text(node))
            .unwrap_or_default())
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.check_stale(handle.id())?;
        Ok(inner
            .nodes
            .get(&handle.id())
            .and_then(|node| node.attrs.get(name).cloned()))
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, PageError> {
        let inner = self.inner.lock().unwrap();
        inner.check_session()?;
        Ok(inner
            .nodes
            .get(&handle.id())
            .map(|node| node.visible && inner.rendered(node))
            .unwrap_or(false))
    }

    async fn is_interactable(&self, handle: &ElementHandle) -> Result<bool, PageError> {
        let inner = self.inner.lock().unwrap();
        inner.check_session()?;
        Ok(inner
            .nodes
            .get(&handle.id())
            .map(|node| node.interactable && node.visible && inner.rendered(node))
            .unwrap_or(false))
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.check_stale(handle.id())?;
        inner.clicks.push(handle.id());
        let kind = inner.nodes.get(&handle.id()).map(|n| n.kind);
        match kind {
            Some(Kind::ShowMore) => {
                let step = inner.show_more_step;
                inner.reveal(step);
            }
            Some(Kind::NextPage) => {
                let step = inner.next_page_step;
                inner.reveal(step);
            }
            _ => {}
        }
        Ok(())
    }

    async fn type_text(&self, handle: &ElementHandle, _text: &str) -> Result<(), PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.check_stale(handle.id())?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        inner.keys.push(key.to_string());
        Ok(())
    }

    async fn scroll_to(&self, target: ScrollTarget) -> Result<(), PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_session()?;
        match target {
            ScrollTarget::PageBottom | ScrollTarget::ContainerBottom(_) => {
                let step = inner.scroll_step;
                inner.reveal(step);
            }
            ScrollTarget::IntoView(_) => {}
        }
        Ok(())
    }

    async fn closest(
        &self,
        handle: &ElementHandle,
        query: &Query,
    ) -> Result<Option<ElementHandle>, PageError> {
        let inner = self.inner.lock().unwrap();
        inner.check_session()?;
        let kinds = match query {
            Query::Css(selector) => kinds_for_css(selector),
            _ => &[],
        };
        let mut current = inner
            .nodes
            .get(&handle.id())
            .and_then(|node| node.parent);
        while let Some(id) = current {
            let node = match inner.nodes.get(&id) {
                Some(node) => node,
                None => break,
            };
            if kinds.contains(&node.kind) {
                return Ok(Some(ElementHandle::new(node.id)));
            }
            current = node.parent;
        }
        Ok(None)
    }

    async fn ready(&self) -> Result<bool, PageError> {
        let inner = self.inner.lock().unwrap();
        inner.check_session()?;
        Ok(true)
    }
}

/// Builder assembling a fake table page.
#[derive(Default)]
pub struct FakePageBuilder {
    headers: Option<Vec<String>>,
    rows: Vec<RowSpec>,
    caption: Option<String>,
    count_badge: Option<String>,
    tab: Option<String>,
    with_settings: bool,
    table_show_more: bool,
    next_page: bool,
    initial_revealed: Option<usize>,
    scroll_step: usize,
    show_more_step: usize,
    next_page_step: usize,
    recovery_step: usize,
}

struct RowSpec {
    cells: Vec<String>,
    full_text: Option<String>,
    badge_class: Option<String>,
}

impl FakePageBuilder {
    pub fn headers(mut self, headers: &[&str]) -> Self {
        self.headers = Some(headers.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(RowSpec {
            cells: cells.iter().map(|s| s.to_string()).collect(),
            full_text: None,
            badge_class: None,
        });
        self
    }

    /// Row with no cell structure at all, only flat text. Exercises the
    /// pseudo-cell fallback.
    pub fn raw_row(mut self, text: &str) -> Self {
        self.rows.push(RowSpec {
            cells: Vec::new(),
            full_text: Some(text.to_string()),
            badge_class: None,
        });
        self
    }

    /// Row carrying a colored priority badge instead of priority text.
    pub fn row_with_badge(mut self, cells: &[&str], badge_class: &str) -> Self {
        self.rows.push(RowSpec {
            cells: cells.iter().map(|s| s.to_string()).collect(),
            full_text: None,
            badge_class: Some(badge_class.to_string()),
        });
        self
    }

    /// Identical rows, for bulk scenarios.
    pub fn repeated_rows(mut self, count: usize, cells: &[&str]) -> Self {
        for _ in 0..count {
            self = self.row(cells);
        }
        self
    }

    pub fn caption(mut self, text: &str) -> Self {
        self.caption = Some(text.to_string());
        self
    }

    pub fn count_badge(mut self, text: &str) -> Self {
        self.count_badge = Some(text.to_string());
        self
    }

    pub fn tab(mut self, label: &str) -> Self {
        self.tab = Some(label.to_string());
        self
    }

    pub fn settings_dialog(mut self) -> Self {
        self.with_settings = true;
        self
    }

    pub fn table_show_more(mut self) -> Self {
        self.table_show_more = true;
        self
    }

    pub fn next_page(mut self, step: usize) -> Self {
        self.next_page = true;
        self.next_page_step = step;
        self
    }

    /// Rows visible before any load trigger fires.
    pub fn initially_revealed(mut self, count: usize) -> Self {
        self.initial_revealed = Some(count);
        self
    }

    /// Rows revealed per scroll trigger.
    pub fn scroll_step(mut self, step: usize) -> Self {
        self.scroll_step = step;
        self
    }

    pub fn show_more_step(mut self, step: usize) -> Self {
        self.show_more_step = step;
        self
    }

    /// Rows revealed by the forced re-render recovery script.
    pub fn recovery_step(mut self, step: usize) -> Self {
        self.recovery_step = step;
        self
    }

    pub fn build(self) -> FakePage {
        let mut inner = Inner {
            scroll_step: self.scroll_step,
            show_more_step: self.show_more_step,
            next_page_step: self.next_page_step,
            recovery_step: self.recovery_step,
            ..Inner::default()
        };

        if let Some(label) = self.tab {
            inner.add(Kind::Tab, None, &label, true);
        }
        if let Some(text) = self.caption {
            inner.add(Kind::Caption, None, &text, true);
        }
        if let Some(text) = self.count_badge {
            inner.add(Kind::CountBadge, None, &text, true);
        }
        if self.with_settings {
            inner.add(Kind::SettingsButton, None, "Settings", true);
            inner.add(Kind::DialogButton, None, "Select Columns", true);
            inner.add(Kind::DialogCheckbox, None, "Select All", true);
            inner.add(Kind::DialogButton, None, "OK", true);
        }
        if self.table_show_more {
            inner.add(Kind::ShowMore, None, "Show More", true);
        }
        if self.next_page {
            inner.add(Kind::NextPage, None, "Next", true);
        }

        if let Some(headers) = self.headers {
            let header_row = inner.add(Kind::HeaderRow, None, "", true);
            for header in headers {
                inner.add(Kind::HeaderCell, Some(header_row), &header, true);
            }
        }

        let row_count = self.rows.len();
        for spec in self.rows {
            let text = spec.full_text.as_deref().unwrap_or("");
            let row = inner.add(Kind::Row, None, text, true);
            for cell in &spec.cells {
                inner.add(Kind::Cell, Some(row), cell, true);
            }
            if let Some(class) = spec.badge_class {
                let badge = inner.add(Kind::Badge, Some(row), "", true);
                inner
                    .nodes
                    .get_mut(&badge)
                    .unwrap()
                    .attrs
                    .insert("class".to_string(), class);
            }
        }

        inner.revealed = self.initial_revealed.unwrap_or(row_count);

        FakePage {
            inner: Mutex::new(inner),
        }
    }
}
