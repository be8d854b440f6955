//! `window.fetch` interceptor
//!
//! Wraps the global fetch so every tracked request holds an
//! [`InflightGuard`] until its promise settles. Arguments, the returned
//! promise and any synchronous throw pass through unchanged.

use checkcx_shared::{LoadingSignal, OutgoingRequest, RequestPolicy};
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::page_url;

/// Global flag marking an installed patch
const INSTALLED_FLAG: &str = "__checkcxFetchPatched";

/// Patch `window.fetch` once per page.
///
/// Returns `Ok(false)` when a patch is already installed.
pub fn install_fetch_interceptor(signal: LoadingSignal, policy: RequestPolicy) -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let flag = JsValue::from_str(INSTALLED_FLAG);
    if Reflect::get(&window, &flag)?.is_truthy() {
        return Ok(false);
    }

    let original: Function = Reflect::get(&window, &JsValue::from_str("fetch"))?.dyn_into()?;
    let this = window.clone();

    let patched = Closure::<dyn FnMut(JsValue, JsValue) -> Result<JsValue, JsValue>>::new(
        move |input: JsValue, init: JsValue| {
            if !is_tracked(&policy, &input, &init) {
                return original.call2(&this, &input, &init);
            }

            let guard = signal.begin();
            // A synchronous throw drops the guard on the way out
            let result = original.call2(&this, &input, &init)?;

            let finally = Reflect::get(&result, &JsValue::from_str("finally"))
                .ok()
                .and_then(|f| f.dyn_into::<Function>().ok());
            match finally {
                Some(finally) => {
                    let done = Closure::once_into_js(move || drop(guard));
                    finally.call1(&result, &done)
                }
                None => Ok(result),
            }
        },
    );

    Reflect::set(&window, &JsValue::from_str("fetch"), patched.as_ref().unchecked_ref())?;
    Reflect::set(&window, &flag, &JsValue::TRUE)?;
    patched.forget();

    tracing::debug!("fetch interceptor installed");
    Ok(true)
}

fn is_tracked(policy: &RequestPolicy, input: &JsValue, init: &JsValue) -> bool {
    let Some(url) = request_url(input) else {
        return false;
    };
    let purpose = request_header(input, init, "purpose");
    let sec_purpose = request_header(input, init, "sec-purpose");

    let request = OutgoingRequest {
        url: &url,
        purpose: purpose.as_deref(),
        sec_purpose: sec_purpose.as_deref(),
    };
    policy.should_track(&request, page_url().as_ref())
}

/// URL of a fetch input: a string, a `URL` or a `Request`
fn request_url(input: &JsValue) -> Option<String> {
    if let Some(url) = input.as_string() {
        return Some(url);
    }
    if let Some(request) = input.dyn_ref::<web_sys::Request>() {
        return Some(request.url());
    }
    if let Some(url) = input.dyn_ref::<web_sys::Url>() {
        return Some(url.href());
    }
    None
}

/// Header from `init.headers` when given, otherwise from a `Request` input
fn request_header(input: &JsValue, init: &JsValue, name: &str) -> Option<String> {
    let init_headers = if init.is_object() {
        Reflect::get(init, &JsValue::from_str("headers"))
            .ok()
            .filter(|headers| headers.is_truthy())
    } else {
        None
    };

    match init_headers {
        Some(headers) => header_value(&headers, name),
        None => input
            .dyn_ref::<web_sys::Request>()
            .and_then(|request| request.headers().get(name).ok().flatten()),
    }
}

/// Case-insensitive lookup in a `Headers`, an array of pairs or a record
fn header_value(headers: &JsValue, name: &str) -> Option<String> {
    if let Some(headers) = headers.dyn_ref::<web_sys::Headers>() {
        return headers.get(name).ok().flatten();
    }

    let entries = if Array::is_array(headers) {
        Array::from(headers)
    } else if headers.is_object() {
        Object::entries(headers.unchecked_ref::<Object>())
    } else {
        return None;
    };

    let pairs: Vec<(String, String)> = entries
        .iter()
        .filter_map(|entry| {
            let entry: Array = entry.dyn_into().ok()?;
            Some((entry.get(0).as_string()?, entry.get(1).as_string()?))
        })
        .collect();
    checkcx_shared::header_value(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())), name)
}
