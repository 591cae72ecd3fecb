//! Server-rendered dashboard. Every figure comes from the REST API; the
//! dashboard never talks to the database.

pub mod client;
pub mod render;

pub use client::ApiClient;

use crate::domain::model::{DisciplineRead, ProgramFilter, SchoolRead};
use crate::utils::error::Result;
use crate::utils::shutdown::shutdown_signal;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::fmt::Write;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct DashboardState {
    pub client: ApiClient,
}

/// Explorer query string. Values arrive as text so that an empty `<select>`
/// ("All") or a garbled id simply means "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplorerQuery {
    pub school_id: Option<String>,
    pub discipline_id: Option<String>,
    pub search: Option<String>,
    pub program_id: Option<String>,
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

impl ExplorerQuery {
    pub fn filter(&self) -> ProgramFilter {
        ProgramFilter {
            school_id: parse_id(self.school_id.as_deref()),
            discipline_id: parse_id(self.discipline_id.as_deref()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ..Default::default()
        }
    }

    /// Explorer link that keeps the active filters and selects `program_id`.
    fn href_for(&self, program_id: i64) -> String {
        let filter = self.filter();
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(id) = filter.school_id {
            query.append_pair("school_id", &id.to_string());
        }
        if let Some(id) = filter.discipline_id {
            query.append_pair("discipline_id", &id.to_string());
        }
        if let Some(search) = filter.search.as_deref() {
            query.append_pair("search", search);
        }
        query.append_pair("program_id", &program_id.to_string());
        format!("/explorer?{}", query.finish())
    }
}

pub fn router(client: ApiClient) -> Router {
    Router::new()
        .route("/", get(overview_page))
        .route("/explorer", get(explorer_page))
        .layer(TraceLayer::new_for_http())
        .with_state(DashboardState { client })
}

async fn overview_page(State(state): State<DashboardState>) -> Html<String> {
    Html(render_overview(&state.client).await)
}

async fn explorer_page(
    State(state): State<DashboardState>,
    Query(query): Query<ExplorerQuery>,
) -> Html<String> {
    Html(render_explorer(&state.client, &query).await)
}

/// Overview page: headline metrics and the two distribution charts.
pub async fn render_overview(client: &ApiClient) -> String {
    let mut body = String::new();

    match client.overview().await {
        Ok(overview) => body.push_str(&render::metrics(&overview)),
        Err(e) => {
            tracing::warn!("Overview request failed: {}", e);
            body.push_str(&render::banner(
                "error",
                &format!("Failed to load analytics: {}", e),
            ));
        }
    }

    body.push_str("<h2>Distribution by Discipline</h2>\n");
    match client.discipline_counts().await {
        Ok(counts) => {
            let items: Vec<(String, i64)> =
                counts.into_iter().map(|c| (c.discipline, c.count)).collect();
            body.push_str(&render::bar_chart("Programs by Discipline (Top 20)", &items));
        }
        Err(e) => {
            tracing::warn!("Discipline counts request failed: {}", e);
            body.push_str(&render::banner("warning", "Could not load discipline data"));
        }
    }

    body.push_str("<h2>Distribution by School</h2>\n");
    match client.school_counts().await {
        Ok(counts) => {
            let items: Vec<(String, i64)> =
                counts.into_iter().map(|c| (c.school, c.count)).collect();
            body.push_str(&render::bar_chart("Programs by School (Top 20)", &items));
        }
        Err(e) => {
            tracing::warn!("School counts request failed: {}", e);
            body.push_str(&render::banner("warning", "Could not load school data"));
        }
    }

    render::page("National Residency Matching Insights", "Overview", &body)
}

/// Explorer page: filter form, result table and the detail inspector.
/// A failed request shows a banner and the page carries on with no data for it.
pub async fn render_explorer(client: &ApiClient, query: &ExplorerQuery) -> String {
    let mut body = String::new();

    let (schools, disciplines) = tokio::join!(client.schools(), client.disciplines());
    let schools = or_banner(&mut body, "School list", schools);
    let disciplines = or_banner(&mut body, "Discipline list", disciplines);

    let filter = query.filter();
    body.push_str(&filter_form(&filter, &schools, &disciplines));

    let programs = or_banner(&mut body, "Program listing", client.programs(&filter).await);
    if programs.is_empty() {
        body.push_str(&render::banner(
            "info",
            "No programs found matching the selected criteria.",
        ));
        return render::page("Residency Program Explorer", "Program Explorer", &body);
    }

    let _ = writeln!(body, "<p>Showing {} results</p>", programs.len());
    body.push_str(&render::program_table(&programs, |id| query.href_for(id)));

    let selected = parse_id(query.program_id.as_deref())
        .filter(|id| programs.iter().any(|p| p.id == *id))
        .unwrap_or(programs[0].id);

    body.push_str("<hr>\n<h2>Program Detail Inspector</h2>\n");
    match client.program(selected).await {
        Ok(detail) => body.push_str(&render::program_detail(&detail)),
        Err(e) => {
            tracing::warn!("Program detail request failed for {}: {}", selected, e);
            body.push_str(&render::banner(
                "error",
                &format!("Error fetching data from API: {}", e),
            ));
        }
    }

    render::page("Residency Program Explorer", "Program Explorer", &body)
}

/// The list on success; otherwise an error banner and an empty list.
fn or_banner<T>(body: &mut String, what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("{} request failed: {}", what, e);
        body.push_str(&render::banner(
            "error",
            &format!("Error fetching data from API: {}", e),
        ));
        Vec::new()
    })
}

fn filter_form(filter: &ProgramFilter, schools: &[SchoolRead], disciplines: &[DisciplineRead]) -> String {
    let school_options: Vec<(i64, String)> =
        schools.iter().map(|s| (s.id, s.name.clone())).collect();
    let discipline_options: Vec<(i64, String)> =
        disciplines.iter().map(|d| (d.id, d.name.clone())).collect();

    format!(
        "<form method=\"get\" action=\"/explorer\">\n{}{}<label>Search Program Name<br>\
         <input type=\"text\" name=\"search\" value=\"{}\"></label>\n\
         <button type=\"submit\">Filter</button>\n</form>\n",
        render::select("school_id", "Select School", &school_options, filter.school_id),
        render::select(
            "discipline_id",
            "Select Discipline",
            &discipline_options,
            filter.discipline_id
        ),
        render::escape(filter.search.as_deref().unwrap_or("")),
    )
}

/// Serves the dashboard until a shutdown signal arrives.
pub async fn serve(bind: &str, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    let listener = TcpListener::bind(bind).await?;
    tracing::info!(
        "📊 Dashboard listening on {} (API at {})",
        listener.local_addr()?,
        client.base_url()
    );

    axum::serve(listener, router(client))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Dashboard stopped");
    Ok(())
}
