//! HTML rendering for the dashboard pages.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::paging::SortSpec;
use super::table::TIMESTAMP_FORMAT;
use super::TableView;

const TABLE_CLASS: &str = "table table-striped table-bordered table-hover";

/// Dashboard sections, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Clusters,
    Nodes,
    Backups,
    Overview,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Home,
        Section::Clusters,
        Section::Nodes,
        Section::Backups,
        Section::Overview,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Section::Home => "/",
            Section::Clusters => "/cluster",
            Section::Nodes => "/node",
            Section::Backups => "/backup",
            Section::Overview => "/overview",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Clusters => "Clusters",
            Section::Nodes => "Nodes",
            Section::Backups => "Backups",
            Section::Overview => "Overview",
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn nav(active: Option<Section>) -> String {
    let mut out = String::from("<nav><ul class=\"nav\">\n");
    for section in Section::ALL {
        let class = if Some(section) == active {
            " class=\"active\""
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<li{}><a href=\"{}\">{}</a></li>",
            class,
            section.path(),
            section.title()
        );
    }
    out.push_str("</ul></nav>\n");
    out
}

/// Wrap `body` in the common page chrome.
pub fn layout(title: &str, active: Option<Section>, body: &str) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n");
    let _ = writeln!(html, "<title>{} · Cluster Backup Monitor</title>", html_escape(title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&nav(active));
    let _ = writeln!(html, "<h1>{}</h1>", html_escape(title));
    html.push_str(body);
    html.push_str("</body>\n</html>\n");
    html
}

pub fn home_page() -> String {
    layout(
        "Cluster Backup Monitor",
        Some(Section::Home),
        "<p>Backup metadata for database clusters and their nodes.</p>\n",
    )
}

/// Query string for a table link. `fixed` carries parameters that belong to
/// the page itself, such as the overview window.
fn query_string(fixed: &[(&str, String)], sort: Option<&str>, page: u32, per_page: u32) -> String {
    let mut params: Vec<String> = fixed
        .iter()
        .map(|(k, v)| format!("{}={}", k, html_escape(v)))
        .collect();
    if let Some(sort) = sort {
        params.push(format!("sort={}", html_escape(sort)));
    }
    params.push(format!("page={}", page));
    params.push(format!("per_page={}", per_page));
    format!("?{}", params.join("&amp;"))
}

/// Render a paged table with sortable headers and pager links.
pub fn render_table(view: &TableView, fixed: &[(&str, String)]) -> String {
    let pagination = &view.pagination;
    let current_sort = view.sort.as_ref();
    let sort_param = current_sort.map(SortSpec::as_param);

    let mut html = String::new();
    let _ = writeln!(html, "<table class=\"{}\">", TABLE_CLASS);
    html.push_str("<thead>\n<tr>");
    for header in &view.table.headers {
        let target = SortSpec::toggle_param(current_sort, header.key);
        let marker = match current_sort {
            Some(spec) if spec.key == header.key && spec.descending => " ▼",
            Some(spec) if spec.key == header.key => " ▲",
            _ => "",
        };
        let _ = write!(
            html,
            "<th><a href=\"{}\">{}</a>{}</th>",
            query_string(fixed, Some(&target), 1, pagination.per_page),
            html_escape(header.header),
            marker
        );
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    if view.table.is_empty() {
        let _ = writeln!(
            html,
            "<tr><td colspan=\"{}\">No data</td></tr>",
            view.table.headers.len()
        );
    }
    for row in &view.table.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", html_escape(&cell.render()));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");

    if pagination.total_pages > 1 {
        html.push_str("<ul class=\"pagination\">\n");
        if pagination.has_previous() {
            let _ = writeln!(
                html,
                "<li class=\"previous\"><a href=\"{}\">Previous</a></li>",
                query_string(fixed, sort_param.as_deref(), pagination.page - 1, pagination.per_page)
            );
        }
        let _ = writeln!(
            html,
            "<li class=\"cardinality\">Page {} of {} ({} rows)</li>",
            pagination.page, pagination.total_pages, pagination.total
        );
        if pagination.has_next() {
            let _ = writeln!(
                html,
                "<li class=\"next\"><a href=\"{}\">Next</a></li>",
                query_string(fixed, sort_param.as_deref(), pagination.page + 1, pagination.per_page)
            );
        }
        html.push_str("</ul>\n");
    }
    html
}

/// Window bounds and per-status counts shown above the overview table.
pub fn render_status_summary(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    by_status: &BTreeMap<String, usize>,
) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<p class=\"window\">Backups started between {} and {}</p>",
        window_start.format(TIMESTAMP_FORMAT),
        window_end.format(TIMESTAMP_FORMAT)
    );
    html.push_str("<ul class=\"status-summary\">\n");
    for (status, count) in by_status {
        let _ = writeln!(html, "<li>{}: {}</li>", html_escape(status), count);
    }
    html.push_str("</ul>\n");
    html
}

/// Failure page shown instead of a table; never contains partial data.
pub fn error_page(status: u16, message: &str) -> String {
    let title = if status == 503 {
        "Service unavailable"
    } else {
        "Error"
    };
    layout(
        title,
        None,
        &format!(
            "<div class=\"alert alert-danger\"><p>{} {}</p></div>\n",
            status,
            html_escape(message)
        ),
    )
}
