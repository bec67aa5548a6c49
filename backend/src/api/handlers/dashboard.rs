//! HTML dashboard pages.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Duration;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::SharedState;
use crate::error::{AppError, FieldErrors};
use crate::presentation::html::{self, Section};
use crate::presentation::{
    backup_columns, cluster_columns, node_columns, present, TableQuery, TableView,
};

/// Longest overview window a client may request.
pub const MAX_OVERVIEW_HOURS: i64 = 24 * 366;

/// Error rendered as an HTML failure page rather than JSON.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.0.parts();
        tracing::error!(error = %self.0, code, "Dashboard request failed");
        (status, Html(html::error_page(status.as_u16(), &message))).into_response()
    }
}

type PageResult = Result<Html<String>, HtmlError>;

/// Malformed query strings become a 400 page instead of axum's plain-text rejection.
fn page_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, HtmlError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| {
            HtmlError(AppError::Validation(FieldErrors::single(
                "query",
                rejection.body_text(),
            )))
        })
}

fn table_page(
    section: Section,
    view: &TableView,
    prefix: &str,
    fixed: &[(&str, String)],
) -> Html<String> {
    let mut body = String::from(prefix);
    body.push_str(&html::render_table(view, fixed));
    Html(html::layout(section.title(), Some(section), &body))
}

pub async fn home() -> Html<String> {
    Html(html::home_page())
}

pub async fn clusters(
    State(state): State<SharedState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> PageResult {
    let query = page_query(query)?;
    let clusters = state.query.list_clusters().await?;
    let view = present(&cluster_columns(), &clusters, &query, state.default_page_size());
    Ok(table_page(Section::Clusters, &view, "", &[]))
}

pub async fn nodes(
    State(state): State<SharedState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> PageResult {
    let query = page_query(query)?;
    let nodes = state.query.list_nodes().await?;
    let view = present(&node_columns(), &nodes, &query, state.default_page_size());
    Ok(table_page(Section::Nodes, &view, "", &[]))
}

pub async fn backups(
    State(state): State<SharedState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> PageResult {
    let query = page_query(query)?;
    let backups = state.query.list_backups().await?;
    let view = present(&backup_columns(), &backups, &query, state.default_page_size());
    Ok(table_page(Section::Backups, &view, "", &[]))
}

/// Overview window plus the usual table parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct OverviewQuery {
    /// Window length in hours (default from configuration)
    pub hours: Option<i64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OverviewQuery {
    pub fn table(&self) -> TableQuery {
        TableQuery {
            sort: self.sort.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Requested window, or `default` when none was given.
    pub fn window(&self, default: Duration) -> Result<Duration, AppError> {
        match self.hours {
            None => Ok(default),
            Some(hours) if (1..=MAX_OVERVIEW_HOURS).contains(&hours) => {
                Ok(Duration::hours(hours))
            }
            Some(_) => Err(AppError::Validation(FieldErrors::single(
                "hours",
                format!("must be between 1 and {}", MAX_OVERVIEW_HOURS),
            ))),
        }
    }
}

pub async fn overview(
    State(state): State<SharedState>,
    query: Result<Query<OverviewQuery>, QueryRejection>,
) -> PageResult {
    let query = page_query(query)?;
    let window = query.window(state.config.overview_window())?;
    let overview = state.query.overview(window).await?;

    let view = present(
        &backup_columns(),
        &overview.backups,
        &query.table(),
        state.default_page_size(),
    );
    let summary = html::render_status_summary(
        overview.window_start,
        overview.window_end,
        &overview.by_status,
    );
    let fixed: Vec<(&str, String)> = query
        .hours
        .map(|h| vec![("hours", h.to_string())])
        .unwrap_or_default();

    Ok(table_page(Section::Overview, &view, &summary, &fixed))
}

/// Fallback for unknown dashboard paths.
pub async fn not_found() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(html::error_page(404, "No such page")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_window_default_and_override() {
        let query = OverviewQuery::default();
        assert_eq!(query.window(Duration::days(2)).unwrap(), Duration::days(2));

        let query = OverviewQuery {
            hours: Some(6),
            ..Default::default()
        };
        assert_eq!(query.window(Duration::days(2)).unwrap(), Duration::hours(6));
    }

    #[test]
    fn test_overview_window_rejects_nonsense() {
        for hours in [0, -3, MAX_OVERVIEW_HOURS + 1] {
            let query = OverviewQuery {
                hours: Some(hours),
                ..Default::default()
            };
            assert!(matches!(
                query.window(Duration::days(2)),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_malformed_query_is_html_400() {
        let uri: axum::http::Uri = "/backup?page=abc".parse().unwrap();
        let rejected = Query::<TableQuery>::try_from_uri(&uri);
        let response = page_query(rejected).unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("<!DOCTYPE html>"));
        assert!(text.contains("page"));

        let uri: axum::http::Uri = "/backup?page=2&sort=-status".parse().unwrap();
        let query = page_query(Query::<TableQuery>::try_from_uri(&uri)).unwrap();
        assert_eq!(query.page, Some(2));
    }

    #[tokio::test]
    async fn test_html_error_keeps_status() {
        let response =
            HtmlError(AppError::StoreUnavailable("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Service unavailable"));
        assert!(!text.contains("<table"));
    }
}
