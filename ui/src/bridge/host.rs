use serde_json::Value;

use super::error::BridgeError;

/// The window the widget runs in, as seen by the bridge.
pub trait HostWindow {
    /// True when a distinct parent window exists (the widget is framed).
    fn is_embedded(&self) -> bool;

    fn post_to_parent(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError>;
}

/// Top-level window with no embedding parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl HostWindow for DetachedHost {
    fn is_embedded(&self) -> bool {
        false
    }

    fn post_to_parent(&self, _message: &Value, _target_origin: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Transport("no parent window".to_string()))
    }
}
