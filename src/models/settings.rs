use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials and feature toggles, stored as one object under the
/// `userSettings` key in the synced area.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub clist_username: String,
    pub clist_api_key: String,
    /// Open contest links in a new tab instead of the current one.
    pub open_in_new_tab: bool,
}

impl UserSettings {
    /// Coerce a stored value field by field. A wrong-typed field falls back
    /// to its default without discarding the rest of the object.
    pub fn from_value(value: &Value) -> Self {
        let mut settings = Self::default();
        if let Some(obj) = value.as_object() {
            if let Some(username) = obj.get("clistUsername").and_then(Value::as_str) {
                settings.clist_username = username.to_string();
            }
            if let Some(api_key) = obj.get("clistApiKey").and_then(Value::as_str) {
                settings.clist_api_key = api_key.to_string();
            }
            if let Some(flag) = obj.get("openInNewTab").and_then(Value::as_bool) {
                settings.open_in_new_tab = flag;
            }
        }
        settings
    }
}
