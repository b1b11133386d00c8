//! Embedded web UI handler.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_slider_last_stop_is_total() {
        // The slider walks an index over stops so a total that is not a
        // multiple of 5 stays reachable.
        assert!(INDEX_HTML.contains("function sliderStops(total)"));
        assert!(INDEX_HTML.contains("stops.push(total);"));
        assert!(INDEX_HTML.contains("rowStops[Number(event.target.value)]"));
        assert!(!INDEX_HTML.contains(r#"step="5""#));
    }
}
