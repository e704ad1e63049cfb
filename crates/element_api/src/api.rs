use crate::attributes::*;
use crate::config::ElementApiConfig;
use crate::events::{EventInfo, EventKind, HandlerPair, HandlerSlot, Invocation, PublishedEvent};
use crate::inline_style::{hyphenate, parse_declarations, split_important};
use crate::list::{ListCallbacks, UpdateListInfo};
use core_types::UniqueId;
use dom::{CrossThreadEvent, DomError, ListenerOptions, OffscreenDocument, OperationSink};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("invalid list update for element {uid}")]
    InvalidListInfo {
        uid: UniqueId,
        #[source]
        source: serde_json::Error,
    },
    #[error("element {0} has no parent")]
    Detached(UniqueId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushOptions {
    pub pipeline_id: Option<String>,
}

/// What one flush hands to the transport.
#[derive(Debug)]
pub struct FlushedBatch<B> {
    pub batch: B,
    pub options: FlushOptions,
    /// Timing flag values set since the previous flush.
    pub timing_flags: Vec<String>,
    /// Elements whose exposure attributes changed since the previous flush.
    pub exposure_changed: Vec<UniqueId>,
}

/// Inline styles given either as declaration text or as name/value pairs.
/// Pair names may be camel case.
#[derive(Clone, Copy, Debug)]
pub enum InlineStyles<'a> {
    Text(&'a str),
    Pairs(&'a [(&'a str, &'a str)]),
}

#[derive(Debug, Default)]
struct RuntimeInfo {
    dataset: Map<String, Value>,
    config: Map<String, Value>,
    handlers: BTreeMap<String, HandlerPair>,
}

/// Main-thread element functions bound to one offscreen document.
///
/// Every mutation is recorded synchronously; nothing reaches the UI thread
/// before [`ElementApi::flush`].
pub struct ElementApi<S> {
    doc: OffscreenDocument<S>,
    config: ElementApiConfig,
    page: Option<UniqueId>,
    info: HashMap<UniqueId, RuntimeInfo>,
    lists: HashMap<UniqueId, ListCallbacks<S>>,
    pending_list_updates: Vec<(UniqueId, UpdateListInfo)>,
    timing_flags: Vec<String>,
    exposure_changed: Vec<UniqueId>,
    invocations: Rc<RefCell<Vec<Invocation>>>,
}

fn is_exposure_event(name: &str) -> bool {
    name == "uiappear" || name == "uidisappear"
}

impl<S: OperationSink> ElementApi<S> {
    pub fn new(sink: S, config: ElementApiConfig) -> Self {
        Self {
            doc: OffscreenDocument::new(sink),
            config,
            page: None,
            info: HashMap::new(),
            lists: HashMap::new(),
            pending_list_updates: Vec::new(),
            timing_flags: Vec::new(),
            exposure_changed: Vec::new(),
            invocations: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn document(&self) -> &OffscreenDocument<S> {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut OffscreenDocument<S> {
        &mut self.doc
    }

    pub fn config(&self) -> &ElementApiConfig {
        &self.config
    }

    fn ensure_live(&self, uid: UniqueId) -> Result<(), ApiError> {
        if self.doc.contains(uid) {
            Ok(())
        } else {
            Err(DomError::UnknownElement(uid).into())
        }
    }

    fn info_mut(&mut self, uid: UniqueId) -> Result<&mut RuntimeInfo, ApiError> {
        self.ensure_live(uid)?;
        Ok(self.info.entry(uid).or_default())
    }

    fn owned_attribute(&self, uid: UniqueId, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.doc.attribute(uid, key)?.map(str::to_owned))
    }

    // Creation

    pub fn create_element(
        &mut self,
        tag: &str,
        parent_component: UniqueId,
    ) -> Result<UniqueId, ApiError> {
        let uid = self.doc.try_create_element(self.config.map_tag(tag))?;
        let parent_css_id = if self.doc.contains(parent_component) {
            self.owned_attribute(parent_component, CSS_ID_ATTRIBUTE)?
        } else {
            None
        };
        if let Some(css_id) = parent_css_id.filter(|id| id != "0") {
            self.doc.set_attribute(uid, CSS_ID_ATTRIBUTE, &css_id)?;
        }
        self.doc.set_attribute(uid, TAG_ATTRIBUTE, tag)?;
        self.doc
            .set_attribute(uid, UNIQUE_ID_ATTRIBUTE, &uid.to_string())?;
        self.doc.set_attribute(
            uid,
            PARENT_COMPONENT_UNIQUE_ID_ATTRIBUTE,
            &parent_component.to_string(),
        )?;
        Ok(uid)
    }

    pub fn create_view(&mut self, parent_component: UniqueId) -> Result<UniqueId, ApiError> {
        self.create_element("view", parent_component)
    }

    pub fn create_text(&mut self, parent_component: UniqueId) -> Result<UniqueId, ApiError> {
        self.create_element("text", parent_component)
    }

    pub fn create_raw_text(&mut self, text: &str) -> Result<UniqueId, ApiError> {
        let uid = self.create_element("raw-text", UniqueId::INVALID)?;
        self.doc.set_attribute(uid, "text", text)?;
        Ok(uid)
    }

    pub fn create_image(&mut self, parent_component: UniqueId) -> Result<UniqueId, ApiError> {
        self.create_element("image", parent_component)
    }

    pub fn create_scroll_view(&mut self, parent_component: UniqueId) -> Result<UniqueId, ApiError> {
        self.create_element("scroll-view", parent_component)
    }

    pub fn create_wrapper_element(
        &mut self,
        parent_component: UniqueId,
    ) -> Result<UniqueId, ApiError> {
        self.create_element("wrapper", parent_component)
    }

    pub fn create_component(
        &mut self,
        parent_component: UniqueId,
        component_id: &str,
        css_id: u32,
        name: &str,
    ) -> Result<UniqueId, ApiError> {
        let uid = self.create_element("view", parent_component)?;
        self.doc
            .set_attribute(uid, CSS_ID_ATTRIBUTE, &css_id.to_string())?;
        self.doc
            .set_attribute(uid, COMPONENT_ID_ATTRIBUTE, component_id)?;
        self.doc.set_attribute(uid, "name", name)?;
        Ok(uid)
    }

    /// Create the page element. It becomes the element `flush` attaches to
    /// the root.
    pub fn create_page(&mut self, component_id: &str, css_id: u32) -> Result<UniqueId, ApiError> {
        let page = self.create_element("page", UniqueId::INVALID)?;
        self.doc.set_attribute(page, "part", "page")?;
        self.doc
            .set_attribute(page, CSS_ID_ATTRIBUTE, &css_id.to_string())?;
        self.doc
            .set_attribute(page, COMPONENT_ID_ATTRIBUTE, component_id)?;
        self.mark_template_element(page)?;
        if !self.config.default_display_linear {
            self.doc
                .set_attribute(page, DEFAULT_DISPLAY_LINEAR_ATTRIBUTE, "false")?;
        }
        if self.config.default_overflow_visible {
            self.doc
                .set_attribute(page, DEFAULT_OVERFLOW_VISIBLE_ATTRIBUTE, "true")?;
        }
        self.page = Some(page);
        Ok(page)
    }

    pub fn create_list(
        &mut self,
        parent_component: UniqueId,
        callbacks: ListCallbacks<S>,
    ) -> Result<UniqueId, ApiError> {
        let list = self.create_element("list", parent_component)?;
        self.lists.insert(list, callbacks);
        Ok(list)
    }

    pub fn update_list_callbacks(
        &mut self,
        list: UniqueId,
        callbacks: ListCallbacks<S>,
    ) -> Result<(), ApiError> {
        self.ensure_live(list)?;
        self.lists.insert(list, callbacks);
        Ok(())
    }

    // Tree

    pub fn append_element(&mut self, parent: UniqueId, child: UniqueId) -> Result<(), ApiError> {
        Ok(self.doc.append(parent, &[child])?)
    }

    pub fn insert_element_before(
        &mut self,
        parent: UniqueId,
        child: UniqueId,
        reference: Option<UniqueId>,
    ) -> Result<(), ApiError> {
        Ok(self.doc.insert_before(parent, child, reference)?)
    }

    pub fn remove_element(&mut self, parent: UniqueId, child: UniqueId) -> Result<UniqueId, ApiError> {
        self.doc.remove_child(parent, child)?;
        Ok(child)
    }

    pub fn replace_element(&mut self, new: UniqueId, old: UniqueId) -> Result<(), ApiError> {
        Ok(self.doc.replace_with(old, &[new])?)
    }

    /// Replace `old` children of `parent` with `new`. With no old children the
    /// new ones are appended; otherwise they take the first old child's place
    /// and the remaining old children are removed.
    pub fn replace_elements(
        &mut self,
        parent: UniqueId,
        new: &[UniqueId],
        old: &[UniqueId],
    ) -> Result<(), ApiError> {
        let Some((first, rest)) = old.split_first() else {
            return Ok(self.doc.append(parent, new)?);
        };
        for child in rest {
            self.doc.remove_child(parent, *child)?;
        }
        Ok(self.doc.replace_with(*first, new)?)
    }

    /// Exchange the tree positions of two attached elements.
    ///
    /// Neither may contain the other; that case is rejected before anything
    /// moves.
    pub fn swap_element(&mut self, a: UniqueId, b: UniqueId) -> Result<(), ApiError> {
        if a == b {
            return Ok(());
        }
        let parent_a = self.doc.parent(a)?.ok_or(ApiError::Detached(a))?;
        let parent_b = self.doc.parent(b)?.ok_or(ApiError::Detached(b))?;
        for (outer, inner, parent) in [(a, b, parent_b), (b, a, parent_a)] {
            if self.contains(outer, inner)? {
                return Err(DomError::HierarchyRequest {
                    parent,
                    child: outer,
                }
                .into());
            }
        }
        let next_a = self.doc.next_sibling(a)?;
        let next_b = self.doc.next_sibling(b)?;
        if next_b == Some(a) {
            self.doc.insert_before(parent_a, a, Some(b))?;
        } else if next_a == Some(b) {
            self.doc.insert_before(parent_b, b, Some(a))?;
        } else {
            self.doc.insert_before(parent_b, a, next_b)?;
            self.doc.insert_before(parent_a, b, next_a)?;
        }
        Ok(())
    }

    fn contains(&self, ancestor: UniqueId, node: UniqueId) -> Result<bool, ApiError> {
        let mut current = self.doc.parent(node)?;
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.doc.parent(id)?;
        }
        Ok(false)
    }

    pub fn first_element(&self, uid: UniqueId) -> Result<Option<UniqueId>, ApiError> {
        Ok(self.doc.first_child(uid)?)
    }

    pub fn last_element(&self, uid: UniqueId) -> Result<Option<UniqueId>, ApiError> {
        Ok(self.doc.last_child(uid)?)
    }

    pub fn next_element(&self, uid: UniqueId) -> Result<Option<UniqueId>, ApiError> {
        Ok(self.doc.next_sibling(uid)?)
    }

    pub fn get_children(&self, uid: UniqueId) -> Result<Vec<UniqueId>, ApiError> {
        Ok(self.doc.children(uid)?.to_vec())
    }

    pub fn get_parent(&self, uid: UniqueId) -> Result<Option<UniqueId>, ApiError> {
        Ok(self.doc.parent(uid)?)
    }

    pub fn element_is_equal(&self, left: UniqueId, right: UniqueId) -> bool {
        left == right
    }

    // Attributes

    /// Set or, with `None`, remove an attribute.
    ///
    /// On a list, `update-list-info` is not stored: its JSON value queues
    /// calls to the list callbacks, which run at the next flush.
    pub fn set_attribute(
        &mut self,
        uid: UniqueId,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), ApiError> {
        if key == UPDATE_LIST_INFO_ATTRIBUTE && self.get_tag(uid)? == "list" {
            let info = serde_json::from_str(value.unwrap_or("{}"))
                .map_err(|source| ApiError::InvalidListInfo { uid, source })?;
            self.pending_list_updates.push((uid, info));
            return Ok(());
        }
        match value {
            Some(value) => self.doc.set_attribute(uid, key, value)?,
            None => self.doc.remove_attribute(uid, key)?,
        }
        if key == TIMING_FLAG_ATTRIBUTE
            && let Some(flag) = value.filter(|v| !v.is_empty())
        {
            self.timing_flags.push(flag.to_owned());
        }
        if is_exposure_related(key) && !self.exposure_changed.contains(&uid) {
            self.exposure_changed.push(uid);
        }
        Ok(())
    }

    pub fn get_attribute_by_name(
        &self,
        uid: UniqueId,
        name: &str,
    ) -> Result<Option<String>, ApiError> {
        self.owned_attribute(uid, name)
    }

    pub fn get_attributes(&self, uid: UniqueId) -> Result<Vec<(String, String)>, ApiError> {
        Ok(self
            .doc
            .attributes(uid)?
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect())
    }

    pub fn set_id(&mut self, uid: UniqueId, id: Option<&str>) -> Result<(), ApiError> {
        self.set_attribute(uid, "id", id)
    }

    pub fn get_id(&self, uid: UniqueId) -> Result<Option<String>, ApiError> {
        self.owned_attribute(uid, "id")
    }

    /// The logical tag the element was created with.
    pub fn get_tag(&self, uid: UniqueId) -> Result<String, ApiError> {
        match self.doc.attribute(uid, TAG_ATTRIBUTE)? {
            Some(tag) => Ok(tag.to_owned()),
            None => Ok(self.doc.tag(uid)?.to_owned()),
        }
    }

    pub fn get_component_id(&self, uid: UniqueId) -> Result<Option<String>, ApiError> {
        self.owned_attribute(uid, COMPONENT_ID_ATTRIBUTE)
    }

    pub fn update_component_id(&mut self, uid: UniqueId, component_id: &str) -> Result<(), ApiError> {
        Ok(self
            .doc
            .set_attribute(uid, COMPONENT_ID_ATTRIBUTE, component_id)?)
    }

    pub fn set_classes(&mut self, uid: UniqueId, classes: Option<&str>) -> Result<(), ApiError> {
        match classes.filter(|c| !c.is_empty()) {
            Some(classes) => self.doc.set_attribute(uid, "class", classes)?,
            None => self.doc.remove_attribute(uid, "class")?,
        }
        Ok(())
    }

    pub fn add_class(&mut self, uid: UniqueId, class: &str) -> Result<(), ApiError> {
        let current = self.owned_attribute(uid, "class")?.unwrap_or_default();
        let joined = format!("{current} {class}");
        Ok(self.doc.set_attribute(uid, "class", joined.trim())?)
    }

    pub fn get_classes(&self, uid: UniqueId) -> Result<Vec<String>, ApiError> {
        Ok(self
            .doc
            .attribute(uid, "class")?
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_owned)
            .collect())
    }

    pub fn set_css_id(
        &mut self,
        elements: &[UniqueId],
        css_id: u32,
        entry_name: Option<&str>,
    ) -> Result<(), ApiError> {
        let css_id = css_id.to_string();
        for uid in elements {
            self.doc.set_attribute(*uid, CSS_ID_ATTRIBUTE, &css_id)?;
            if let Some(entry_name) = entry_name.filter(|n| !n.is_empty()) {
                self.doc
                    .set_attribute(*uid, ENTRY_NAME_ATTRIBUTE, entry_name)?;
            }
        }
        Ok(())
    }

    // Inline styles

    /// Set one inline style; `None` or an empty value removes it.
    pub fn add_inline_style(
        &mut self,
        uid: UniqueId,
        property: &str,
        value: Option<&str>,
    ) -> Result<(), ApiError> {
        let property = hyphenate(property);
        match value.filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                let (value, important) = split_important(value);
                self.doc
                    .set_style_property(uid, &property, value, important)?;
            }
            None => self.doc.remove_style_property(uid, &property)?,
        }
        Ok(())
    }

    /// Replace every inline style of the element. Empty input is ignored.
    pub fn set_inline_styles(&mut self, uid: UniqueId, styles: InlineStyles<'_>) -> Result<(), ApiError> {
        let declarations = match styles {
            InlineStyles::Text(text) => parse_declarations(text),
            InlineStyles::Pairs(pairs) => pairs
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(name, value)| {
                    let (value, important) = split_important(value);
                    (hyphenate(name), value.to_owned(), important)
                })
                .collect(),
        };
        if declarations.is_empty() {
            return Ok(());
        }
        let existing: Vec<String> = self
            .doc
            .style_properties(uid)?
            .iter()
            .map(|p| p.name.to_owned())
            .collect();
        for name in existing {
            self.doc.remove_style_property(uid, &name)?;
        }
        for (name, value, important) in declarations {
            self.doc.set_style_property(uid, &name, &value, important)?;
        }
        Ok(())
    }

    pub fn get_inline_styles(&self, uid: UniqueId) -> Result<Vec<(String, String)>, ApiError> {
        Ok(self
            .doc
            .style_properties(uid)?
            .iter()
            .map(|p| (p.name.to_owned(), p.value.to_owned()))
            .collect())
    }

    // Dataset and config live on the main thread only.

    pub fn set_dataset(&mut self, uid: UniqueId, dataset: Map<String, Value>) -> Result<(), ApiError> {
        self.info_mut(uid)?.dataset = dataset;
        Ok(())
    }

    pub fn add_dataset(&mut self, uid: UniqueId, key: &str, value: Value) -> Result<(), ApiError> {
        self.info_mut(uid)?.dataset.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn get_dataset(&self, uid: UniqueId) -> Result<Map<String, Value>, ApiError> {
        self.ensure_live(uid)?;
        Ok(self
            .info
            .get(&uid)
            .map(|info| info.dataset.clone())
            .unwrap_or_default())
    }

    pub fn get_data_by_key(&self, uid: UniqueId, key: &str) -> Result<Option<Value>, ApiError> {
        self.ensure_live(uid)?;
        Ok(self
            .info
            .get(&uid)
            .and_then(|info| info.dataset.get(key))
            .cloned())
    }

    pub fn add_config(&mut self, uid: UniqueId, key: &str, value: Value) -> Result<(), ApiError> {
        self.info_mut(uid)?.config.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn set_config(&mut self, uid: UniqueId, config: Map<String, Value>) -> Result<(), ApiError> {
        self.info_mut(uid)?.config = config;
        Ok(())
    }

    pub fn get_config(&self, uid: UniqueId) -> Result<Map<String, Value>, ApiError> {
        self.ensure_live(uid)?;
        Ok(self
            .info
            .get(&uid)
            .map(|info| info.config.clone())
            .unwrap_or_default())
    }

    // Templates

    pub fn mark_template_element(&mut self, uid: UniqueId) -> Result<(), ApiError> {
        Ok(self.doc.set_attribute(uid, TEMPLATE_MARKER_ATTRIBUTE, "")?)
    }

    pub fn mark_part_element(&mut self, uid: UniqueId, part_id: &str) -> Result<(), ApiError> {
        Ok(self.doc.set_attribute(uid, PART_ID_ATTRIBUTE, part_id)?)
    }

    /// Part elements under `template`, by part id. Parts inside a nested
    /// template belong to that template and are skipped.
    pub fn get_template_parts(
        &self,
        template: UniqueId,
    ) -> Result<BTreeMap<String, UniqueId>, ApiError> {
        let mut parts = BTreeMap::new();
        let mut stack: Vec<UniqueId> = self.doc.children(template)?.iter().rev().copied().collect();
        while let Some(uid) = stack.pop() {
            if let Some(part) = self.doc.attribute(uid, PART_ID_ATTRIBUTE)? {
                parts.entry(part.to_owned()).or_insert(uid);
            }
            if self.doc.attribute(uid, TEMPLATE_MARKER_ATTRIBUTE)?.is_some() {
                continue;
            }
            stack.extend(self.doc.children(uid)?.iter().rev());
        }
        Ok(parts)
    }

    // Events

    /// Bind `handler` to `name` events on the element, or unbind with `None`.
    ///
    /// Each element holds at most one bind-phase and one capture-phase
    /// handler per event name; binding again replaces the previous one.
    pub fn add_event(
        &mut self,
        uid: UniqueId,
        kind: EventKind,
        name: &str,
        handler: Option<&str>,
    ) -> Result<(), ApiError> {
        let name = name.to_lowercase();
        let capture = kind.is_capture();
        let previous = self
            .info_mut(uid)?
            .handlers
            .get_mut(&name)
            .and_then(|pair| pair.slot_mut(capture).take());
        if let Some(slot) = &previous {
            self.doc.remove_event_listener(uid, slot.listener);
        }

        let Some(handler) = handler else {
            if previous.is_some()
                && is_exposure_event(&name)
                && self.doc.attribute(uid, EXPOSURE_ID_ATTRIBUTE)? == Some("-1")
            {
                self.set_attribute(uid, EXPOSURE_ID_ATTRIBUTE, None)?;
            }
            return Ok(());
        };
        if previous.is_none()
            && is_exposure_event(&name)
            && self.doc.attribute(uid, EXPOSURE_ID_ATTRIBUTE)?.is_none()
        {
            self.set_attribute(uid, EXPOSURE_ID_ATTRIBUTE, Some("-1"))?;
        }

        let invocations = Rc::clone(&self.invocations);
        let handler_name = handler.to_owned();
        let catch = kind.is_catch();
        let options = if capture {
            ListenerOptions::CAPTURE
        } else {
            ListenerOptions::BUBBLE
        };
        let listener = self.doc.add_event_listener(uid, &name, options, move |event| {
            invocations.borrow_mut().push(Invocation {
                handler: handler_name.clone(),
                current_target: event.current_target(),
                event: CrossThreadEvent {
                    event_type: event.event_type().to_owned(),
                    target: event.target(),
                    bubbles: event.bubbles(),
                    properties: event.properties().clone(),
                },
            });
            if catch {
                event.stop_propagation();
            }
        })?;
        let slot = HandlerSlot {
            kind,
            handler: handler.to_owned(),
            listener,
        };
        *self
            .info_mut(uid)?
            .handlers
            .entry(name)
            .or_default()
            .slot_mut(capture) = Some(slot);
        Ok(())
    }

    pub fn get_event(
        &self,
        uid: UniqueId,
        name: &str,
        kind: EventKind,
    ) -> Result<Option<String>, ApiError> {
        self.ensure_live(uid)?;
        let name = name.to_lowercase();
        Ok(self
            .info
            .get(&uid)
            .and_then(|info| info.handlers.get(&name))
            .and_then(|pair| pair.slot(kind.is_capture()))
            .map(|slot| slot.handler.clone()))
    }

    /// Registered handlers, by event name, bind phase before capture phase.
    pub fn get_events(&self, uid: UniqueId) -> Result<Vec<EventInfo>, ApiError> {
        self.ensure_live(uid)?;
        let Some(info) = self.info.get(&uid) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (name, pair) in &info.handlers {
            for slot in [pair.bind.as_ref(), pair.capture.as_ref()].into_iter().flatten() {
                out.push(EventInfo {
                    kind: slot.kind,
                    name: name.clone(),
                    handler: slot.handler.clone(),
                });
            }
        }
        Ok(out)
    }

    pub fn set_events(&mut self, uid: UniqueId, events: &[EventInfo]) -> Result<(), ApiError> {
        for event in events {
            self.add_event(uid, event.kind, &event.name, Some(&event.handler))?;
        }
        Ok(())
    }

    /// Deliver an event from the UI thread and collect the handler calls it
    /// produced, in invocation order.
    pub fn dispatch_event(&mut self, event: &CrossThreadEvent) -> Vec<PublishedEvent> {
        let outcome = self.doc.dispatch_event(event);
        log::trace!(
            target: "element_api",
            "{} on {}: {} listeners",
            event.event_type,
            event.target,
            outcome.delivered
        );
        let invocations = std::mem::take(&mut *self.invocations.borrow_mut());
        invocations
            .into_iter()
            .map(|inv| PublishedEvent {
                component_id: self.owning_component_id(inv.current_target),
                handler: inv.handler,
                current_target: inv.current_target,
                event: inv.event,
            })
            .collect()
    }

    /// Component id of the component that created `uid`, unless that is the
    /// page.
    fn owning_component_id(&self, uid: UniqueId) -> Option<String> {
        let parent = self
            .doc
            .attribute(uid, PARENT_COMPONENT_UNIQUE_ID_ATTRIBUTE)
            .ok()
            .flatten()?
            .parse::<u32>()
            .ok()
            .map(UniqueId)?;
        if self.doc.attribute(parent, TAG_ATTRIBUTE).ok().flatten() == Some("page") {
            return None;
        }
        self.doc
            .attribute(parent, COMPONENT_ID_ATTRIBUTE)
            .ok()
            .flatten()
            .map(str::to_owned)
    }

    // Identity and lifetime

    pub fn get_element_unique_id(&self, uid: UniqueId) -> Result<UniqueId, ApiError> {
        self.ensure_live(uid)?;
        Ok(uid)
    }

    pub fn get_page_element(&self) -> Option<UniqueId> {
        self.page
    }

    /// Drop the caller's handle on the element; see
    /// [`OffscreenDocument::release`].
    pub fn release_element(&mut self, uid: UniqueId) -> Result<(), ApiError> {
        self.doc.release(uid)?;
        if !self.doc.contains(uid) {
            self.info.remove(&uid);
            self.lists.remove(&uid);
        }
        Ok(())
    }

    /// Run list callbacks queued by `update-list-info` updates.
    pub fn run_list_updates(&mut self) {
        let pending = std::mem::take(&mut self.pending_list_updates);
        for (list, info) in pending {
            let Some(mut callbacks) = self.lists.remove(&list) else {
                continue;
            };
            for action in &info.insert_action {
                (callbacks.component_at_index)(self, list, action.position);
            }
            for action in &info.remove_action {
                (callbacks.enqueue_component)(self, list, action.position);
            }
            // Callbacks may have been replaced while they ran.
            self.lists.entry(list).or_insert(callbacks);
        }
    }

    /// End the render pass: attach the page if it is detached and not
    /// disposed, then commit everything recorded since the last flush.
    pub fn flush(&mut self, options: FlushOptions) -> Result<FlushedBatch<S::Batch>, ApiError> {
        self.run_list_updates();
        if let Some(page) = self.page
            && self.doc.contains(page)
            && self.doc.parent(page)?.is_none()
            && self.doc.attribute(page, DISPOSED_ATTRIBUTE)?.is_none()
        {
            self.doc.append(UniqueId::ROOT, &[page])?;
        }
        let timing_flags = std::mem::take(&mut self.timing_flags);
        let exposure_changed = std::mem::take(&mut self.exposure_changed);
        let batch = self.doc.commit();
        log::debug!(
            target: "element_api",
            "flush: {} timing flags, {} exposure changes",
            timing_flags.len(),
            exposure_changed.len()
        );
        Ok(FlushedBatch {
            batch,
            options,
            timing_flags,
            exposure_changed,
        })
    }
}
