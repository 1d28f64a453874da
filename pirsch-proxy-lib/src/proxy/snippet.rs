use tracing::info;

use super::context::Routes;

/// HTML tag that loads the tracking script through this proxy
pub fn script_snippet(routes: &Routes) -> String {
    format!(
        r#"<script defer type="text/javascript"
    src="{}"
    id="pianjs"
    data-hit-endpoint="{}"
    data-event-endpoint="{}"
    data-session-endpoint="{}"></script>"#,
        routes.script, routes.page_view, routes.event, routes.session
    )
}

pub fn log_snippet(routes: &Routes) {
    info!("add this snippet to your pages:\n{}", script_snippet(routes));
}
