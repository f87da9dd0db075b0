//! Browser tests for the live page binding. Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use js_sys::Array;
use js_sys::Function;
use js_sys::Reflect;
use lf_dom::AnchorHandle;
use lf_dom::HistoryApi;
use lf_dom::HistoryMethod;
use lf_dom::PageHost;
use lf_engine::EngineStats;
use lf_engine::LinkRewriter;
use lf_engine::NavigationInterceptor;
use lf_url::Normalizer;
use longform_extension::WebAnchor;
use longform_extension::WebHistory;
use longform_extension::WebPage;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::wasm_bindgen_test;
use wasm_bindgen_test::wasm_bindgen_test_configure;
use web_sys::History;
use web_sys::HtmlAnchorElement;

wasm_bindgen_test_configure!(run_in_browser);

fn page() -> WebPage {
    match WebPage::from_global() {
        Ok(page) => page,
        Err(error) => panic!("{error}"),
    }
}

fn append_anchor(href: &str) -> HtmlAnchorElement {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        panic!("test page has no document");
    };
    let anchor = match document.create_element("a") {
        Ok(element) => match element.dyn_into::<HtmlAnchorElement>() {
            Ok(anchor) => anchor,
            Err(_) => panic!("created element is not an anchor"),
        },
        Err(error) => panic!("{error:?}"),
    };
    if let Err(error) = anchor.set_attribute("href", href) {
        panic!("{error:?}");
    }
    let Some(body) = document.body() else {
        panic!("test page has no body");
    };
    if let Err(error) = body.append_child(&anchor) {
        panic!("{error:?}");
    }
    anchor
}

#[wasm_bindgen_test]
fn finds_anchors_case_insensitively() {
    let upper = append_anchor("/SHORTS/caseTest");
    let found = match page().anchors_mentioning("/shorts/") {
        Ok(found) => found,
        Err(error) => panic!("{error}"),
    };
    assert!(found.iter().any(|anchor| anchor.element() == &upper));
}

#[wasm_bindgen_test]
fn converted_anchor_reads_and_writes_canonical_targets() {
    let element = append_anchor("/shorts/abc?t=4");
    let page = Rc::new(page());
    let rewriter = LinkRewriter::new(
        Rc::clone(&page),
        Rc::new(Normalizer::default()),
        Rc::new(EngineStats::default()),
    );
    let anchor = WebAnchor::new(element.clone());

    assert!(matches!(rewriter.convert(&anchor), Ok(true)));
    assert!(anchor.is_converted());
    assert_eq!(element.get_attribute("href").as_deref(), Some("/watch?v=abc&t=4"));

    // setAttribute bypasses the accessor; reads still come back canonical.
    if let Err(error) = element.set_attribute("href", "/shorts/def") {
        panic!("{error:?}");
    }
    assert!(element.href().contains("/watch?v=def"));

    element.set_href("/shorts/ghi#t=9");
    assert_eq!(element.get_attribute("href").as_deref(), Some("/watch?v=ghi&t=9"));
}

fn intercept(window: &web_sys::Window) -> Rc<WebHistory> {
    let history = match WebHistory::new(window) {
        Ok(history) => Rc::new(history),
        Err(error) => panic!("{error}"),
    };
    let interceptor = match NavigationInterceptor::capture(
        Rc::clone(&history),
        Rc::new(Normalizer::default()),
        Rc::new(EngineStats::default()),
    ) {
        Ok(interceptor) => interceptor,
        Err(error) => panic!("{error}"),
    };
    if let Err(error) = interceptor.install() {
        panic!("{error}");
    }
    history
}

/// Swaps `history.pushState` for a function built from `body`, returning the
/// previous value so the caller can put it back.
fn stub_push_state(native: &History, body: &str) -> JsValue {
    let previous = match Reflect::get(native, &JsValue::from_str("pushState")) {
        Ok(previous) => previous,
        Err(error) => panic!("{error:?}"),
    };
    let stub = Function::new_with_args("state, title, url", body);
    if let Err(error) = Reflect::set(native, &JsValue::from_str("pushState"), &stub) {
        panic!("{error:?}");
    }
    previous
}

fn restore_push_state(native: &History, previous: &JsValue) {
    if let Err(error) = Reflect::set(native, &JsValue::from_str("pushState"), previous) {
        panic!("{error:?}");
    }
}

fn installed_push_state(native: &History) -> Function {
    match Reflect::get(native, &JsValue::from_str("pushState")) {
        Ok(value) => match value.dyn_into::<Function>() {
            Ok(function) => function,
            Err(_) => panic!("pushState is not a function"),
        },
        Err(error) => panic!("{error:?}"),
    }
}

fn native_history(window: &web_sys::Window) -> History {
    match window.history() {
        Ok(native) => native,
        Err(error) => panic!("{error:?}"),
    }
}

#[wasm_bindgen_test]
fn wrapped_push_state_commits_canonical_url() {
    let Some(window) = web_sys::window() else {
        panic!("no window");
    };
    let history = intercept(&window);

    let native = native_history(&window);
    let state = JsValue::from_str("kept");
    if let Err(error) = native.push_state_with_url(&state, "", Some("/shorts/foo#t=15s")) {
        panic!("{error:?}");
    }
    let location = match window.location().href() {
        Ok(location) => location,
        Err(error) => panic!("{error:?}"),
    };
    assert!(location.ends_with("/watch?v=foo&t=15s"));
    match native.state() {
        Ok(committed) => assert_eq!(committed.as_string().as_deref(), Some("kept")),
        Err(error) => panic!("{error:?}"),
    }

    // A second capture sees through the installed wrapper.
    assert!(history.capture(HistoryMethod::Push).is_ok());
}

#[wasm_bindgen_test]
fn wrapped_push_state_forwards_state_and_title() {
    let Some(window) = web_sys::window() else {
        panic!("no window");
    };
    let native = native_history(&window);
    let previous = stub_push_state(
        &native,
        "globalThis.__longformRecorded = [state, title, url];",
    );
    intercept(&window);

    let called = installed_push_state(&native).call3(
        &native,
        &JsValue::from_str("S"),
        &JsValue::from_str("T"),
        &JsValue::from_str("/shorts/foo?t=3"),
    );
    restore_push_state(&native, &previous);
    if let Err(error) = called {
        panic!("{error:?}");
    }

    let recorded = match Reflect::get(&js_sys::global(), &JsValue::from_str("__longformRecorded")) {
        Ok(value) => match value.dyn_into::<Array>() {
            Ok(recorded) => recorded,
            Err(_) => panic!("stub was not called"),
        },
        Err(error) => panic!("{error:?}"),
    };
    assert_eq!(recorded.get(0).as_string().as_deref(), Some("S"));
    assert_eq!(recorded.get(1).as_string().as_deref(), Some("T"));
    assert_eq!(recorded.get(2).as_string().as_deref(), Some("/watch?v=foo&t=3"));
}

#[wasm_bindgen_test]
fn native_history_exception_reaches_the_caller() {
    let Some(window) = web_sys::window() else {
        panic!("no window");
    };
    let native = native_history(&window);
    let previous = stub_push_state(
        &native,
        "throw new DOMException('blocked', 'SecurityError');",
    );
    intercept(&window);

    let called = installed_push_state(&native).call3(
        &native,
        &JsValue::NULL,
        &JsValue::from_str(""),
        &JsValue::from_str("/shorts/foo"),
    );
    restore_push_state(&native, &previous);

    let thrown = match called {
        Ok(_) => panic!("expected the original exception"),
        Err(thrown) => thrown,
    };
    let name = match Reflect::get(&thrown, &JsValue::from_str("name")) {
        Ok(name) => name,
        Err(error) => panic!("{error:?}"),
    };
    assert_eq!(name.as_string().as_deref(), Some("SecurityError"));
}
