#![allow(clippy::needless_return)]

use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// Chat completion payload as returned by OpenAI compatible APIs.
pub fn completion_body(content: &str) -> String {
    return serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content,
                },
                "finish_reason": "stop",
            }
        ],
    })
    .to_string();
}

pub fn error_body(message: &str) -> String {
    return serde_json::json!({
        "error": {
            "message": message,
            "type": "requests",
        },
    })
    .to_string();
}

pub fn fenced_python_fixture() -> &'static str {
    return r#"
```python
def process_data(items):
    result = []
    for item in items:
        if item > 0:
            result.append(item * 2)
    return result
```
"#
    .trim();
}
