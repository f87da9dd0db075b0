use crate::CONFIG_GLOBAL;
use crate::CONVERTED_MARKER;
use crate::ORIGINAL_SLOT;
use crate::anchor_selector;
use crate::resolve_config;
use crate::stats_json;
use gloo_timers::callback::Timeout;
use js_sys::Function;
use js_sys::Object;
use js_sys::Reflect;
use lf_core::RedirectError;
use lf_core::RedirectResult;
use lf_dom::AddedNode;
use lf_dom::AnchorHandle;
use lf_dom::Callback;
use lf_dom::Disposition;
use lf_dom::HistoryApi;
use lf_dom::HistoryMethod;
use lf_dom::HistoryWrapper;
use lf_dom::HrefContract;
use lf_dom::InteractionEvent;
use lf_dom::InteractionHandler;
use lf_dom::InteractionKind;
use lf_dom::Modifiers;
use lf_dom::MutationCallback;
use lf_dom::MutationRecord;
use lf_dom::PageHost;
use lf_dom::PointerButton;
use lf_dom::ReadyState;
use lf_engine::Bootstrap;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::AddEventListenerOptions;
use web_sys::Document;
use web_sys::Element;
use web_sys::Event;
use web_sys::EventTarget;
use web_sys::History;
use web_sys::HtmlAnchorElement;
use web_sys::MouseEvent;
use web_sys::MutationObserver;
use web_sys::MutationObserverInit;
use web_sys::Node;
use web_sys::Window;

const HREF: &str = "href";
const READY_EVENT: &str = "DOMContentLoaded";
const WINDOW_EVENTS: &[&str] = &["popstate"];

type WebBootstrap = Bootstrap<WebPage, WebHistory>;

thread_local! {
    static BOOTSTRAP: RefCell<Option<Rc<WebBootstrap>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    if let Err(error) = boot() {
        log::debug!("redirect engine not started: {error}");
    }
}

/// Devtools hook: counters of the running engine as JSON, `null` before start.
#[wasm_bindgen]
pub fn longform_stats_json() -> String {
    BOOTSTRAP.with(|slot| match slot.borrow().as_ref() {
        Some(bootstrap) => stats_json(&bootstrap.stats().snapshot()),
        None => String::from("null"),
    })
}

fn boot() -> RedirectResult<()> {
    if BOOTSTRAP.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }

    let page = WebPage::from_global()?;
    let history = WebHistory::new(&page.window)?;
    let raw_config = Reflect::get(&page.window, &JsValue::from_str(CONFIG_GLOBAL))
        .ok()
        .and_then(|value| value.as_string());
    let config = resolve_config(raw_config.as_deref());

    let bootstrap = Bootstrap::new(Rc::new(page), Rc::new(history), config)?;
    let outcome = bootstrap.start();
    log::debug!("bootstrap outcome: {outcome:?}");
    BOOTSTRAP.with(|slot| *slot.borrow_mut() = Some(bootstrap));
    Ok(())
}

fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

fn platform(code: &'static str) -> impl FnOnce(JsValue) -> RedirectError {
    move |value| RedirectError::platform(code, describe(&value))
}

/// The live document and window.
#[derive(Clone)]
pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    pub fn from_global() -> RedirectResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| RedirectError::new("page.window_missing", "no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| RedirectError::new("page.document_missing", "window has no document"))?;
        Ok(Self { window, document })
    }

    fn event_target(&self, name: &str) -> &EventTarget {
        if WINDOW_EVENTS.contains(&name) {
            self.window.as_ref()
        } else {
            self.document.as_ref()
        }
    }
}

impl PageHost for WebPage {
    type Anchor = WebAnchor;
    type Timer = Timeout;

    fn ready_state(&self) -> ReadyState {
        let state = Reflect::get(&self.document, &JsValue::from_str("readyState"))
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default();
        ReadyState::from_document_state(&state)
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) -> RedirectResult<()> {
        let pending = RefCell::new(Some(callback));
        let listener = Closure::wrap(Box::new(move || {
            if let Some(callback) = pending.borrow_mut().take() {
                callback();
            }
        }) as Box<dyn FnMut()>)
        .into_js_value();

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        self.document
            .add_event_listener_with_callback_and_add_event_listener_options(
                READY_EVENT,
                listener.unchecked_ref(),
                &options,
            )
            .map_err(platform("page.ready_listener_failed"))
    }

    fn location_href(&self) -> RedirectResult<String> {
        self.window
            .location()
            .href()
            .map_err(platform("page.location_unavailable"))
    }

    fn replace_location(&self, href: &str) -> RedirectResult<()> {
        self.window
            .location()
            .replace(href)
            .map_err(platform("page.location_replace_failed"))
    }

    fn assign_location(&self, href: &str) -> RedirectResult<()> {
        self.window
            .location()
            .assign(href)
            .map_err(platform("page.location_assign_failed"))
    }

    fn open_new_context(&self, href: &str, disposition: Disposition) -> RedirectResult<()> {
        let opened = self
            .window
            .open_with_url_and_target(href, "_blank")
            .map_err(platform("page.open_failed"))?;

        // Scripts can only hint focus; the browser has the final say.
        let focused = match (disposition, opened) {
            (Disposition::ForegroundTab, Some(opened)) => opened.focus(),
            (Disposition::BackgroundTab, _) => self.window.focus(),
            (Disposition::ForegroundTab, None) => Ok(()),
        };
        if let Err(error) = focused {
            log::debug!("focus hint ignored: {}", describe(&error));
        }
        Ok(())
    }

    fn anchors_mentioning(&self, needle: &str) -> RedirectResult<Vec<WebAnchor>> {
        let nodes = self
            .document
            .query_selector_all(&anchor_selector(needle))
            .map_err(platform("page.query_failed"))?;

        Ok((0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<HtmlAnchorElement>().ok())
            .map(WebAnchor::new)
            .collect())
    }

    fn listen_host_event(&self, name: &str, callback: Callback) -> RedirectResult<()> {
        let listener =
            Closure::wrap(Box::new(move |_event: Event| callback()) as Box<dyn FnMut(Event)>)
                .into_js_value();
        self.event_target(name)
            .add_event_listener_with_callback(name, listener.unchecked_ref())
            .map_err(platform("page.listener_failed"))
    }

    fn observe_body(&self, needle: &str, callback: MutationCallback) -> RedirectResult<()> {
        let needle = needle.to_ascii_lowercase();
        let listener = Closure::wrap(Box::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch: Vec<MutationRecord> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(|record| summarize(&record, &needle))
                    .collect();
                if !batch.is_empty() {
                    callback(&batch);
                }
            },
        )
            as Box<dyn FnMut(js_sys::Array, MutationObserver)>)
        .into_js_value();

        let observer = MutationObserver::new(listener.unchecked_ref())
            .map_err(platform("page.observer_failed"))?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        options.set_attributes(true);
        options.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str(HREF)));

        let target: Node = match self.document.body() {
            Some(body) => body.into(),
            None => self
                .document
                .document_element()
                .ok_or_else(|| RedirectError::new("page.body_missing", "document has no root"))?
                .into(),
        };
        observer
            .observe_with_options(&target, &options)
            .map_err(platform("page.observer_failed"))
    }

    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> RedirectResult<Timeout> {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Ok(Timeout::new(millis, task))
    }

    fn clear_timeout(&self, timer: Timeout) {
        let _ = timer.cancel();
    }
}

fn summarize(record: &web_sys::MutationRecord, needle: &str) -> Option<MutationRecord> {
    match record.type_().as_str() {
        "childList" => {
            let nodes = record.added_nodes();
            let added = (0..nodes.length())
                .filter_map(|index| nodes.item(index))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .map(|element| added_node(&element, needle))
                .collect::<Vec<_>>();
            (!added.is_empty()).then_some(MutationRecord::ChildList { added })
        }
        "attributes" => {
            let name = record.attribute_name()?;
            let value = record
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|element| element.get_attribute(&name));
            Some(MutationRecord::Attribute { name, value })
        }
        _ => None,
    }
}

fn added_node(element: &Element, needle: &str) -> AddedNode {
    let anchor_href = element
        .dyn_ref::<HtmlAnchorElement>()
        .and_then(|anchor| anchor.get_attribute(HREF));
    // Shallow markup check; the debounced scan does the real matching.
    let subtree_mentions_marker = element.inner_html().to_ascii_lowercase().contains(needle);
    AddedNode {
        anchor_href,
        subtree_mentions_marker,
    }
}

/// One `<a>` element of the live document.
#[derive(Clone)]
pub struct WebAnchor {
    element: HtmlAnchorElement,
}

impl WebAnchor {
    pub fn new(element: HtmlAnchorElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlAnchorElement {
        &self.element
    }

    fn object(&self) -> &Object {
        self.element.as_ref()
    }

    /// The prototype's `href` getter, which resolves the attribute against the
    /// document base without going through an instance accessor.
    fn native_href_getter(&self) -> RedirectResult<Function> {
        let prototype = Object::get_prototype_of(self.object());
        let descriptor = Reflect::get_own_property_descriptor(&prototype, &JsValue::from_str(HREF))
            .map_err(platform("anchor.accessor_missing"))?;
        Reflect::get(&descriptor, &JsValue::from_str("get"))
            .map_err(platform("anchor.accessor_missing"))?
            .dyn_into::<Function>()
            .map_err(|_| RedirectError::new("anchor.accessor_missing", "href has no native getter"))
    }
}

impl AnchorHandle for WebAnchor {
    fn href(&self) -> RedirectResult<Option<String>> {
        if !self.element.has_attribute(HREF) {
            return Ok(None);
        }
        let value = Reflect::get(&self.element, &JsValue::from_str(HREF))
            .map_err(platform("anchor.read_failed"))?;
        Ok(value.as_string())
    }

    fn set_href_attribute(&self, href: &str) -> RedirectResult<()> {
        self.element
            .set_attribute(HREF, href)
            .map_err(platform("anchor.write_failed"))
    }

    fn is_converted(&self) -> bool {
        Reflect::get(&self.element, &JsValue::from_str(CONVERTED_MARKER))
            .map(|value| value.is_truthy())
            .unwrap_or(false)
    }

    fn mark_converted(&self) -> RedirectResult<()> {
        Reflect::set(
            &self.element,
            &JsValue::from_str(CONVERTED_MARKER),
            &JsValue::TRUE,
        )
        .map(drop)
        .map_err(platform("anchor.mark_failed"))
    }

    fn install_href_contract(&self, contract: HrefContract) -> RedirectResult<()> {
        let native = self.native_href_getter()?;

        let reader = contract.clone();
        let element = self.element.clone();
        let getter = Closure::wrap(Box::new(move || {
            let resolved = native
                .call0(&element)
                .ok()
                .and_then(|value| value.as_string())
                .unwrap_or_default();
            JsValue::from_str(&reader.read(&resolved))
        }) as Box<dyn Fn() -> JsValue>)
        .into_js_value();

        let element = self.element.clone();
        let setter = Closure::wrap(Box::new(move |assigned: JsValue| {
            let assigned = assigned.as_string().unwrap_or_else(|| describe(&assigned));
            if let Err(error) = element.set_attribute(HREF, &contract.write(&assigned)) {
                log::debug!("href write dropped: {}", describe(&error));
            }
        }) as Box<dyn Fn(JsValue)>)
        .into_js_value();

        let descriptor = Object::new();
        for (key, value) in [
            ("get", getter),
            ("set", setter),
            ("configurable", JsValue::TRUE),
        ] {
            Reflect::set(&descriptor, &JsValue::from_str(key), &value)
                .map_err(platform("anchor.accessor_failed"))?;
        }

        let defined = Reflect::define_property(self.object(), &JsValue::from_str(HREF), &descriptor)
            .map_err(platform("anchor.accessor_failed"))?;
        if defined {
            Ok(())
        } else {
            Err(RedirectError::new(
                "anchor.accessor_failed",
                "href property is not configurable",
            ))
        }
    }

    fn add_capture_listener(
        &self,
        kind: InteractionKind,
        handler: InteractionHandler,
    ) -> RedirectResult<()> {
        let listener = Closure::wrap(Box::new(move |event: Event| {
            if let Ok(mouse) = event.dyn_into::<MouseEvent>() {
                handler(&WebInteraction { kind, mouse });
            }
        }) as Box<dyn FnMut(Event)>)
        .into_js_value();

        self.element
            .add_event_listener_with_callback_and_bool(
                kind.as_event_type(),
                listener.unchecked_ref(),
                true,
            )
            .map_err(platform("anchor.listener_failed"))
    }
}

struct WebInteraction {
    kind: InteractionKind,
    mouse: MouseEvent,
}

impl InteractionEvent for WebInteraction {
    fn kind(&self) -> InteractionKind {
        self.kind
    }

    fn button(&self) -> PointerButton {
        PointerButton::from_dom_button(self.mouse.button())
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.mouse.ctrl_key(),
            meta: self.mouse.meta_key(),
            shift: self.mouse.shift_key(),
            alt: self.mouse.alt_key(),
        }
    }

    fn suppress(&self) {
        self.mouse.prevent_default();
        self.mouse.stop_immediate_propagation();
    }
}

/// Non-URL arguments of a history call: the state object and the title.
pub type HistoryArguments = (JsValue, JsValue);

/// The page's `history` object.
pub struct WebHistory {
    history: History,
    /// Exception thrown by the last failing original, handed back to the
    /// host caller untouched.
    native_error: Rc<RefCell<Option<JsValue>>>,
}

impl WebHistory {
    pub fn new(window: &Window) -> RedirectResult<Self> {
        let history = window
            .history()
            .map_err(platform("history.unavailable"))?;
        Ok(Self {
            history,
            native_error: Rc::new(RefCell::new(None)),
        })
    }
}

impl HistoryApi for WebHistory {
    type State = HistoryArguments;
    type Entry = Function;

    fn capture(&self, method: HistoryMethod) -> RedirectResult<Function> {
        let current = Reflect::get(&self.history, &JsValue::from_str(method.as_str()))
            .map_err(platform("history.capture_failed"))?;
        // A wrapper left by an earlier instance of this script points at the
        // function it replaced; capture that instead of stacking wrappers.
        let original = Reflect::get(&current, &JsValue::from_str(ORIGINAL_SLOT))
            .ok()
            .filter(JsValue::is_function)
            .unwrap_or(current);
        original.dyn_into::<Function>().map_err(|_| {
            RedirectError::new(
                "history.capture_failed",
                format!("history.{} is not a function", method.as_str()),
            )
        })
    }

    fn invoke(
        &self,
        entry: &Function,
        (state, title): HistoryArguments,
        url: Option<&str>,
    ) -> RedirectResult<()> {
        let url = url.map_or(JsValue::UNDEFINED, JsValue::from_str);
        entry
            .call3(&self.history, &state, &title, &url)
            .map(drop)
            .map_err(|thrown| {
                let error = RedirectError::platform("history.invoke_failed", describe(&thrown));
                *self.native_error.borrow_mut() = Some(thrown);
                error
            })
    }

    fn install(
        &self,
        method: HistoryMethod,
        wrapper: HistoryWrapper<HistoryArguments>,
    ) -> RedirectResult<()> {
        let original = self.capture(method)?;
        let native_error = Rc::clone(&self.native_error);
        let replacement = Closure::wrap(Box::new(
            move |state: JsValue, title: JsValue, url: JsValue| -> Result<(), JsValue> {
                native_error.borrow_mut().take();
                wrapper((state, title), url_argument(&url)).map_err(|error| {
                    native_error
                        .borrow_mut()
                        .take()
                        .unwrap_or_else(|| JsValue::from_str(&error.to_string()))
                })
            },
        )
            as Box<dyn Fn(JsValue, JsValue, JsValue) -> Result<(), JsValue>>)
        .into_js_value();

        Reflect::set(&replacement, &JsValue::from_str(ORIGINAL_SLOT), &original)
            .map_err(platform("history.install_failed"))?;
        Reflect::set(
            &self.history,
            &JsValue::from_str(method.as_str()),
            &replacement,
        )
        .map(drop)
        .map_err(platform("history.install_failed"))
    }
}

// `URL` objects and other non-strings are stringified the way the native
// entry point would.
fn url_argument(url: &JsValue) -> Option<String> {
    if url.is_undefined() || url.is_null() {
        return None;
    }
    url.as_string()
        .or_else(|| Some(String::from(url.unchecked_ref::<Object>().to_string())))
}
