//! In-memory [`Driver`] with a scripted DOM.
//!
//! Nodes live in a scope, answer to a fixed set of locators and react to
//! clicks with [`Effect`]s. Every driver call that matters to the discovery
//! engine is recorded as a [`MockEvent`] so tests can assert on what was
//! (and was not) touched.
//!
//! ```rust
//! use signup_core::Scope;
//! use signup_driver::mock::{MockDriver, MockNode};
//! use signup_driver::{Driver, Locator};
//!
//! # tokio_test::block_on(async {
//! let driver = MockDriver::new("http://localhost/#/SignUp");
//! driver.add(MockNode::new(Scope::Top).matching(Locator::css("button")).text("Sign Up"));
//!
//! let found = driver.find_all(&Locator::css("button")).await.unwrap();
//! assert_eq!(driver.text(&found[0]).await.unwrap(), "Sign Up");
//! # });
//! ```

use crate::driver::{keys, Driver, ElementRef, Rect};
use crate::error::{DriverError, Result};
use crate::locator::Locator;
use serde_json::Value;
use signup_core::Scope;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Locator every frame node answers to.
pub fn frame_locator() -> Locator {
    Locator::css("iframe, frame")
}

/// Index of a node in the mock document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    fn element_ref(self) -> ElementRef {
        ElementRef::new(format!("mock-{}", self.0))
    }

    fn parse(element: &ElementRef) -> Option<Self> {
        element
            .id()
            .strip_prefix("mock-")
            .and_then(|n| n.parse().ok())
            .map(NodeId)
    }
}

/// DOM change applied when a node is activated.
#[derive(Debug, Clone)]
pub enum Effect {
    Show(NodeId),
    /// Becomes visible once the delay has elapsed.
    ShowAfter(NodeId, Duration),
    Hide(NodeId),
    Check(NodeId, bool),
    ToggleChecked(NodeId),
    Navigate(String),
    SetBodyText(Scope, String),
    Detach(NodeId),
}

/// Recorded driver interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Query { scope: Scope, locator: Locator },
    NativeClick(NodeId),
    ScriptClick(NodeId),
    OffsetClick { node: NodeId, x: i64, y: i64 },
    LinkFollowed(NodeId),
    Keys { node: NodeId, text: String },
    Cleared(NodeId),
    ScriptSetChecked { node: NodeId, value: bool },
    SwitchTop,
    SwitchFrame(usize),
    Navigate(String),
    Scrolled(NodeId),
    ScrolledTop,
}

/// Builder for a mock element.
#[derive(Debug, Clone)]
pub struct MockNode {
    scope: Scope,
    locators: Vec<Locator>,
    parent: Option<NodeId>,
    text: String,
    displayed: bool,
    shown_at: Option<Instant>,
    enabled: bool,
    checked: Option<bool>,
    intercepts_clicks: bool,
    rejects_clear: bool,
    ignores_scripted_check: bool,
    script_click_fails: bool,
    link_from_x: Option<i64>,
    rect: Rect,
    on_click: Vec<Effect>,
    on_escape: Vec<Effect>,
    value: String,
    selected_all: bool,
    detached: bool,
    stale_on_check: bool,
}

impl MockNode {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            locators: Vec::new(),
            parent: None,
            text: String::new(),
            displayed: true,
            shown_at: None,
            enabled: true,
            checked: None,
            intercepts_clicks: false,
            rejects_clear: false,
            ignores_scripted_check: false,
            script_click_fails: false,
            link_from_x: None,
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 20.0,
            },
            on_click: Vec::new(),
            on_escape: Vec::new(),
            value: String::new(),
            selected_all: false,
            detached: false,
            stale_on_check: false,
        }
    }

    #[must_use]
    pub fn matching(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn checkbox(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    #[must_use]
    pub fn intercepts_clicks(mut self) -> Self {
        self.intercepts_clicks = true;
        self
    }

    #[must_use]
    pub fn rejects_clear(mut self) -> Self {
        self.rejects_clear = true;
        self
    }

    /// Scripted `checked` assignments have no effect (framework-managed state).
    #[must_use]
    pub fn ignores_scripted_check(mut self) -> Self {
        self.ignores_scripted_check = true;
        self
    }

    /// Re-rendered by the page right after being queried: the first
    /// visibility check finds the handle already detached.
    #[must_use]
    pub fn stale_on_check(mut self) -> Self {
        self.stale_on_check = true;
        self
    }

    #[must_use]
    pub fn script_click_fails(mut self) -> Self {
        self.script_click_fails = true;
        self
    }

    /// Pointer clicks at x offsets (from center) `>= x` land on an embedded link.
    #[must_use]
    pub fn link_from(mut self, x: i64) -> Self {
        self.link_from_x = Some(x);
        self
    }

    #[must_use]
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.rect.width = width;
        self.rect.height = height;
        self
    }

    #[must_use]
    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }

    #[must_use]
    pub fn on_escape(mut self, effect: Effect) -> Self {
        self.on_escape.push(effect);
        self
    }

    fn answers(&self, locator: &Locator) -> bool {
        if self.locators.contains(locator) {
            return true;
        }
        let own = self.text.trim();
        !own.is_empty() && *locator == Locator::exact_text(own)
    }

    fn visible(&self, now: Instant) -> bool {
        self.displayed && self.shown_at.map_or(true, |at| now >= at)
    }
}

#[derive(Debug)]
struct State {
    nodes: Vec<MockNode>,
    active: Scope,
    url: String,
    body_text: HashMap<Scope, String>,
    ready_state: String,
    angular_idle: bool,
    events: Vec<MockEvent>,
}

/// Scripted in-memory browser.
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(State {
                nodes: Vec::new(),
                active: Scope::Top,
                url: url.to_string(),
                body_text: HashMap::new(),
                ready_state: "complete".to_string(),
                angular_idle: true,
                events: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, node: MockNode) -> NodeId {
        let mut state = self.lock();
        state.nodes.push(node);
        NodeId(state.nodes.len() - 1)
    }

    /// Append an `<iframe>` to the top document and return its frame index.
    pub fn add_frame(&self) -> usize {
        let index = self.frame_count();
        self.add(MockNode::new(Scope::Top).matching(frame_locator()));
        index
    }

    pub fn frame_count(&self) -> usize {
        let locator = frame_locator();
        self.lock()
            .nodes
            .iter()
            .filter(|n| n.scope == Scope::Top && !n.detached && n.answers(&locator))
            .count()
    }

    pub fn set_body_text(&self, scope: Scope, text: &str) {
        self.lock().body_text.insert(scope, text.to_string());
    }

    pub fn set_ready_state(&self, ready_state: &str) {
        self.lock().ready_state = ready_state.to_string();
    }

    pub fn set_angular_idle(&self, idle: bool) {
        self.lock().angular_idle = idle;
    }

    pub fn set_displayed(&self, node: NodeId, displayed: bool) {
        if let Some(n) = self.lock().nodes.get_mut(node.0) {
            n.displayed = displayed;
            n.shown_at = None;
        }
    }

    /// Apply an effect as if some page script had run.
    pub fn apply(&self, effect: Effect) {
        let mut state = self.lock();
        apply_effects(&mut state, &[effect]);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn active_scope(&self) -> Scope {
        self.lock().active
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    /// Text typed into a node so far.
    pub fn value_of(&self, node: NodeId) -> String {
        self.lock()
            .nodes
            .get(node.0)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.lock()
            .nodes
            .get(node.0)
            .and_then(|n| n.checked)
            .unwrap_or(false)
    }

    /// Native, scripted and pointer clicks that reached `node`.
    pub fn clicks_on(&self, node: NodeId) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| match e {
                MockEvent::NativeClick(n) | MockEvent::ScriptClick(n) => *n == node,
                MockEvent::OffsetClick { node: n, .. } => *n == node,
                _ => false,
            })
            .count()
    }

    /// Whether any query used `locator`.
    pub fn was_queried(&self, locator: &Locator) -> bool {
        self.lock()
            .events
            .iter()
            .any(|e| matches!(e, MockEvent::Query { locator: l, .. } if l == locator))
    }
}

fn resolve<'a>(state: &'a mut State, element: &ElementRef) -> Result<(NodeId, &'a mut MockNode)> {
    let id = NodeId::parse(element)
        .ok_or_else(|| DriverError::NoSuchElement(format!("unknown element {}", element.id())))?;
    let active = state.active;
    let node = state
        .nodes
        .get_mut(id.0)
        .ok_or_else(|| DriverError::NoSuchElement(format!("unknown element {}", element.id())))?;
    if node.detached {
        return Err(DriverError::StaleElement(format!(
            "{} is not attached to the page document",
            element.id()
        )));
    }
    if node.scope != active {
        return Err(DriverError::NoSuchElement(format!(
            "{} does not belong to {active}",
            element.id()
        )));
    }
    Ok((id, node))
}

fn apply_effects(state: &mut State, effects: &[Effect]) {
    let now = Instant::now();
    for effect in effects {
        match effect {
            Effect::Show(id) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.displayed = true;
                    n.shown_at = None;
                }
            }
            Effect::ShowAfter(id, delay) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.displayed = true;
                    n.shown_at = Some(now + *delay);
                }
            }
            Effect::Hide(id) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.displayed = false;
                }
            }
            Effect::Check(id, value) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.checked = Some(*value);
                }
            }
            Effect::ToggleChecked(id) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.checked = Some(!n.checked.unwrap_or(false));
                }
            }
            Effect::Navigate(url) => state.url.clone_from(url),
            Effect::SetBodyText(scope, text) => {
                state.body_text.insert(*scope, text.clone());
            }
            Effect::Detach(id) => {
                if let Some(n) = state.nodes.get_mut(id.0) {
                    n.detached = true;
                }
            }
        }
    }
}

/// A node's own activation: checkbox toggling plus scripted effects.
fn activate(state: &mut State, id: NodeId) {
    let (effects, is_checkbox) = {
        let node = &state.nodes[id.0];
        (node.on_click.clone(), node.checked.is_some())
    };
    if is_checkbox {
        apply_effects(state, &[Effect::ToggleChecked(id)]);
    }
    apply_effects(state, &effects);
}

fn element_arg(args: &[Value], index: usize) -> Result<ElementRef> {
    args.get(index)
        .and_then(ElementRef::from_value)
        .ok_or_else(|| DriverError::Javascript(format!("arguments[{index}] is not an element")))
}

#[async_trait::async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.url = url.to_string();
        state.active = Scope::Top;
        state.events.push(MockEvent::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let mut state = self.lock();

        if script.contains("readyState") {
            return Ok(Value::String(state.ready_state.clone()));
        }
        if script.contains("angular") {
            return Ok(Value::Bool(state.angular_idle));
        }
        if script.contains("innerText") {
            let text = state.body_text.get(&state.active).cloned().unwrap_or_default();
            return Ok(Value::String(text));
        }
        if script.contains("scrollIntoView") {
            let element = element_arg(&args, 0)?;
            let (id, _) = resolve(&mut state, &element)?;
            state.events.push(MockEvent::Scrolled(id));
            return Ok(Value::Null);
        }
        if script.contains("scrollTo") {
            state.events.push(MockEvent::ScrolledTop);
            return Ok(Value::Null);
        }
        if script.contains(".checked =") {
            let element = element_arg(&args, 0)?;
            let value = args.get(1).and_then(Value::as_bool).unwrap_or(true);
            let (id, node) = resolve(&mut state, &element)?;
            if !node.ignores_scripted_check {
                node.checked = Some(value);
            }
            state.events.push(MockEvent::ScriptSetChecked { node: id, value });
            return Ok(Value::Null);
        }
        if script.contains(".click()") {
            let element = element_arg(&args, 0)?;
            let (id, node) = resolve(&mut state, &element)?;
            if node.script_click_fails {
                return Err(DriverError::Javascript("click() threw".to_string()));
            }
            state.events.push(MockEvent::ScriptClick(id));
            activate(&mut state, id);
            return Ok(Value::Null);
        }

        Ok(Value::Null)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let mut state = self.lock();
        let scope = state.active;
        state.events.push(MockEvent::Query {
            scope,
            locator: locator.clone(),
        });
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.scope == scope && !n.detached && n.answers(locator))
            .map(|(i, _)| NodeId(i).element_ref())
            .collect())
    }

    async fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>> {
        let mut state = self.lock();
        let (parent_id, _) = resolve(&mut state, parent)?;
        let scope = state.active;
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                n.scope == scope && !n.detached && n.parent == Some(parent_id) && n.answers(locator)
            })
            .map(|(i, _)| NodeId(i).element_ref())
            .collect())
    }

    async fn switch_to_top(&self) -> Result<()> {
        let mut state = self.lock();
        state.active = Scope::Top;
        state.events.push(MockEvent::SwitchTop);
        Ok(())
    }

    async fn switch_to_frame(&self, index: usize) -> Result<()> {
        let frames = self.frame_count();
        let mut state = self.lock();
        if state.active != Scope::Top {
            return Err(DriverError::NoSuchFrame(format!(
                "nested frame {index} not available from {}",
                state.active
            )));
        }
        if index >= frames {
            return Err(DriverError::NoSuchFrame(format!("frame {index} does not exist")));
        }
        state.active = Scope::Frame(index);
        state.events.push(MockEvent::SwitchFrame(index));
        Ok(())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        let mut state = self.lock();
        let (id, node) = resolve(&mut state, element)?;
        if node.stale_on_check {
            apply_effects(&mut state, &[Effect::Detach(id)]);
            return resolve(&mut state, element).map(|_| false);
        }
        Ok(node.visible(Instant::now()))
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        let mut state = self.lock();
        let (_, node) = resolve(&mut state, element)?;
        Ok(node.enabled)
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        let mut state = self.lock();
        let (_, node) = resolve(&mut state, element)?;
        Ok(node.checked.unwrap_or(false))
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        let mut state = self.lock();
        let (_, node) = resolve(&mut state, element)?;
        if node.visible(Instant::now()) {
            Ok(node.text.clone())
        } else {
            Ok(String::new())
        }
    }

    async fn rect(&self, element: &ElementRef) -> Result<Rect> {
        let mut state = self.lock();
        let (_, node) = resolve(&mut state, element)?;
        Ok(node.rect)
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let mut state = self.lock();
        let (id, node) = resolve(&mut state, element)?;
        if !node.visible(Instant::now()) || !node.enabled {
            return Err(DriverError::NotInteractable(format!("{} cannot be clicked", element.id())));
        }
        if node.intercepts_clicks {
            return Err(DriverError::ClickIntercepted(format!(
                "{} is covered by another element",
                element.id()
            )));
        }
        state.events.push(MockEvent::NativeClick(id));
        activate(&mut state, id);
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        let mut state = self.lock();
        let (id, node) = resolve(&mut state, element)?;
        if node.rejects_clear {
            return Err(DriverError::InvalidElementState(format!(
                "{} is not user-editable",
                element.id()
            )));
        }
        node.value.clear();
        state.events.push(MockEvent::Cleared(id));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let mut state = self.lock();
        let (id, node) = resolve(&mut state, element)?;
        let mut escape = Vec::new();

        if text == keys::select_all() {
            node.selected_all = true;
        } else if text == keys::DELETE {
            if node.selected_all {
                node.value.clear();
                node.selected_all = false;
            }
        } else if text == keys::ESCAPE {
            escape = node.on_escape.clone();
        } else {
            node.value.push_str(text);
        }

        state.events.push(MockEvent::Keys {
            node: id,
            text: text.to_string(),
        });
        apply_effects(&mut state, &escape);
        Ok(())
    }

    async fn click_at_offset(&self, element: &ElementRef, x: i64, y: i64) -> Result<()> {
        let mut state = self.lock();
        let (id, node) = resolve(&mut state, element)?;
        if node.intercepts_clicks {
            return Err(DriverError::ClickIntercepted(format!(
                "{} is covered by another element",
                element.id()
            )));
        }
        let hits_link = node.link_from_x.is_some_and(|from| x >= from);
        state.events.push(MockEvent::OffsetClick { node: id, x, y });
        if hits_link {
            state.events.push(MockEvent::LinkFollowed(id));
        } else {
            activate(&mut state, id);
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        // PNG signature only; enough for callers that write the bytes out.
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }
}
