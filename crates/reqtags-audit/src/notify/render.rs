//! Plain-text and HTML bodies for notices.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::NoticeItem;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_time(t: Option<&DateTime<Utc>>) -> String {
    t.map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn join_tags(item: &NoticeItem) -> String {
    item.tags
        .iter()
        .map(|t| format!("{}={}", t.key, t.value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain-text body.
pub fn render_text(items: &[NoticeItem], fixed: bool) -> String {
    let mut out = String::new();
    if fixed {
        out.push_str("The following resources now carry every required tag:\n\n");
    } else {
        out.push_str("The following resources are missing required tags:\n\n");
    }

    for item in items {
        let issue = &item.issue;
        let _ = writeln!(
            out,
            "- {} ({}) in {} / {}",
            issue.resource_id, issue.resource_type, item.account_name, issue.location
        );
        if !fixed {
            let _ = writeln!(out, "    Missing tags: {}", issue.missing_tags.join(", "));
            for note in &issue.notes {
                let _ = writeln!(out, "    Note: {note}");
            }
            let _ = writeln!(out, "    Current tags: {}", join_tags(item));
            let _ = writeln!(out, "    State: {}", issue.state);
            let _ = writeln!(out, "    Next change: {}", format_time(issue.next_change.as_ref()));
        }
    }
    out
}

/// HTML body; every interpolated value is escaped.
pub fn render_html(title: &str, items: &[NoticeItem], fixed: bool) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(title));
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(title));

    html.push_str("<table>\n<thead><tr><th>Resource</th><th>Type</th><th>Account</th><th>Location</th>");
    if !fixed {
        html.push_str("<th>Missing tags</th><th>Notes</th><th>Current tags</th><th>State</th><th>Next change</th>");
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for item in items {
        let issue = &item.issue;
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            escape_html(&issue.resource_id),
            escape_html(issue.resource_type.as_str()),
            escape_html(&item.account_name),
            escape_html(&issue.location),
        );
        if !fixed {
            let _ = write!(
                html,
                "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                escape_html(&issue.missing_tags.join(", ")),
                escape_html(&issue.notes.join("; ")),
                escape_html(&join_tags(item)),
                issue.state,
                format_time(issue.next_change.as_ref()),
            );
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqtags_core::types::{Issue, Resource, ResourceType, Tag};

    fn item() -> NoticeItem {
        let resource = Resource {
            id: "i-<script>".into(),
            resource_type: ResourceType::ec2_instance(),
            account_id: "111".into(),
            location: "us-east-1".into(),
            tags: vec![Tag::new("Name", "a&b")],
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            state: None,
            properties: Default::default(),
        };
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        NoticeItem {
            issue: Issue::open(&resource, vec!["owner".into()], vec!["Owner tag is not a valid email address".into()], now),
            account_name: "prod".into(),
            tags: resource.tags.clone(),
        }
    }

    #[test]
    fn html_escapes_values() {
        let html = render_html("Missing <tags>", &[item()], false);
        assert!(html.contains("i-&lt;script&gt;"));
        assert!(html.contains("Name=a&amp;b"));
        assert!(html.contains("<title>Missing &lt;tags&gt;</title>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn text_lists_missing_tags_and_notes() {
        let text = render_text(&[item()], false);
        assert!(text.contains("Missing tags: owner"));
        assert!(text.contains("Note: Owner tag is not a valid email address"));
        assert!(text.contains("prod / us-east-1"));

        let fixed = render_text(&[item()], true);
        assert!(fixed.starts_with("The following resources now carry"));
        assert!(!fixed.contains("Missing tags"));
    }
}
