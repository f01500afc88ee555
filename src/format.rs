//! Output formatting utilities for markdown and JSON.

use crate::store::TokenClaims;
use crate::types::{Filter, Task, TaskCounts};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

/// Format a single task as a markdown checklist line.
pub fn format_task_markdown(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!("- [{}] `{}` {}\n", mark, task.id, task.title)
}

/// Format a filtered task list as markdown.
pub fn format_tasks_markdown(tasks: &[&Task], filter: Filter, counts: TaskCounts) -> String {
    let mut md = String::new();

    match filter {
        Filter::All => md.push_str(&format!(
            "# Tasks ({} total, {} pending, {} completed)\n\n",
            counts.total, counts.pending, counts.completed
        )),
        _ => md.push_str(&format!(
            "# Tasks: {} ({} of {})\n\n",
            filter.as_str(),
            tasks.len(),
            counts.total
        )),
    }

    if tasks.is_empty() {
        md.push_str("_No tasks._\n");
        return md;
    }

    for task in tasks {
        md.push_str(&format_task_markdown(task));
    }
    md
}

/// Session and preference summary printed by `todo status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub api_url: String,
    pub storage_path: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub expired: bool,
    pub dark_mode: bool,
}

impl StatusReport {
    pub fn new(
        api_url: impl Into<String>,
        storage_path: impl Into<String>,
        authenticated: bool,
        claims: Option<&TokenClaims>,
        dark_mode: bool,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            api_url: api_url.into(),
            storage_path: storage_path.into(),
            authenticated,
            subject: claims.and_then(TokenClaims::subject),
            expires_at: claims
                .and_then(TokenClaims::expires_at)
                .map(|t| t.to_rfc3339()),
            expired: claims.is_some_and(|c| c.is_expired_at(now)),
            dark_mode,
        }
    }
}

pub fn format_status_markdown(status: &StatusReport) -> String {
    let mut md = String::new();
    md.push_str("## Status\n");
    md.push_str(&format!("- **api**: {}\n", status.api_url));
    md.push_str(&format!("- **storage**: {}\n", status.storage_path));

    if status.authenticated {
        md.push_str("- **session**: logged in\n");
        if let Some(ref subject) = status.subject {
            md.push_str(&format!("- **user**: {}\n", subject));
        }
        if let Some(ref expires_at) = status.expires_at {
            let note = if status.expired {
                " (expired, will refresh on next request)"
            } else {
                ""
            };
            md.push_str(&format!("- **access token expires**: {}{}\n", expires_at, note));
        }
    } else {
        md.push_str("- **session**: not logged in\n");
    }

    md.push_str(&format!(
        "- **theme**: {}\n",
        if status.dark_mode { "dark" } else { "light" }
    ));
    md
}

/// Serialize any result as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        serde_json::json!({ "code": "INTERNAL_ERROR", "message": e.to_string() }).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskId;

    fn task(id: i64, title: &str, completed: bool) -> Task {
        Task {
            id: TaskId::Number(id),
            title: title.into(),
            completed,
        }
    }

    #[test]
    fn markdown_list_uses_checkboxes() {
        let a = task(1, "Buy milk", false);
        let b = task(2, "Walk dog", true);
        let counts = TaskCounts {
            total: 2,
            completed: 1,
            pending: 1,
        };
        let md = format_tasks_markdown(&[&a, &b], Filter::All, counts);

        assert!(md.starts_with("# Tasks (2 total, 1 pending, 1 completed)"));
        assert!(md.contains("- [ ] `1` Buy milk\n"));
        assert!(md.contains("- [x] `2` Walk dog\n"));
    }

    #[test]
    fn filtered_empty_list_says_so() {
        let counts = TaskCounts {
            total: 3,
            completed: 0,
            pending: 3,
        };
        let md = format_tasks_markdown(&[], Filter::Completed, counts);
        assert!(md.starts_with("# Tasks: completed (0 of 3)"));
        assert!(md.contains("_No tasks._"));
    }

    #[test]
    fn status_without_session() {
        let status = StatusReport::new("http://h/api/", "/tmp/s.json", false, None, true);
        let md = format_status_markdown(&status);
        assert!(md.contains("not logged in"));
        assert!(md.contains("**theme**: dark"));

        let json: serde_json::Value = serde_json::from_str(&to_json(&status)).unwrap();
        assert!(json.get("subject").is_none());
        assert_eq!(json["authenticated"], false);
    }

    #[test]
    fn status_reports_expired_token() {
        let claims = TokenClaims {
            exp: Some(1),
            user_id: Some(serde_json::json!(7)),
            ..TokenClaims::default()
        };
        let status = StatusReport::new("http://h/", "s.json", true, Some(&claims), false);
        assert!(status.expired);
        assert_eq!(status.subject.as_deref(), Some("7"));
        assert!(format_status_markdown(&status).contains("expired"));
    }
}
