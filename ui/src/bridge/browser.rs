//! `web-sys` glue: the real parent window, and the `message` event listener
//! that feeds [`HostBridge::handle_message`].

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{MessageEvent, Window};

use super::{BridgeError, HostBridge, HostWindow};

pub struct BrowserHost {
    window: Window,
}

impl BrowserHost {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn current() -> Result<Self, BridgeError> {
        web_sys::window()
            .map(Self::new)
            .ok_or_else(|| BridgeError::Transport("window unavailable".to_string()))
    }

    fn parent(&self) -> Option<Window> {
        self.window.parent().ok().flatten()
    }
}

impl HostWindow for BrowserHost {
    fn is_embedded(&self) -> bool {
        self.parent()
            .map(|parent| !js_sys::Object::is(parent.as_ref(), self.window.as_ref()))
            .unwrap_or(false)
    }

    fn post_to_parent(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError> {
        let parent = self
            .parent()
            .ok_or_else(|| BridgeError::Transport("no parent window".to_string()))?;
        let message = message
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| BridgeError::Transport(err.to_string()))?;
        parent
            .post_message(&message, target_origin)
            .map_err(|err| BridgeError::Transport(describe_js_error(&err)))
    }
}

/// Keeps the `message` listener registered for as long as it is alive.
pub struct MessageListener {
    window: Window,
    closure: Closure<dyn FnMut(MessageEvent)>,
}

impl MessageListener {
    pub fn attach(window: &Window, bridge: HostBridge) -> Result<Self, BridgeError> {
        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match serde_wasm_bindgen::from_value::<Value>(event.data()) {
                Ok(data) => bridge.handle_message(&event.origin(), &data),
                Err(err) => tracing::debug!(error = %err, "ignoring non-JSON message"),
            }
        });

        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .map_err(|err| BridgeError::Transport(describe_js_error(&err)))?;

        Ok(Self {
            window: window.clone(),
            closure,
        })
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
    }
}

fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}
