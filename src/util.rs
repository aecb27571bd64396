use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

pub fn resource_id(resource: &Value) -> String {
    resource
        .get("id")
        .and_then(|i| i.as_str())
        .unwrap_or("")
        .to_string()
}

pub fn resource_attr_str(resource: &Value, key: &str) -> Option<String> {
    resource
        .get("attributes")
        .and_then(|a| a.get(key))
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg.to_string());
    pb
}
