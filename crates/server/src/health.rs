use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use rentquote_line::DialogueHandler;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    handler: Arc<DialogueHandler>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub items: usize,
    pub categories: usize,
    pub checked_at: String,
}

pub fn router(handler: Arc<DialogueHandler>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { handler })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = state.handler.engine().catalog();
    let items = catalog.items().len();
    let categories = catalog.categories().len();
    let ready = items > 0;

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "rentquote-server runtime initialized".to_string(),
        },
        catalog: if ready {
            HealthCheck { status: "ready", detail: format!("{items} items in {categories} categories") }
        } else {
            HealthCheck { status: "degraded", detail: "catalog has no items".to_string() }
        },
        items,
        categories,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use rentquote_core::catalog::{Catalog, CatalogItem, RawVariant};
    use rentquote_core::flows::DialogueEngine;
    use rentquote_core::rules::RuleTable;
    use rentquote_line::DialogueHandler;

    use crate::health::{health, HealthState};

    fn state(catalog: Catalog) -> HealthState {
        let engine = DialogueEngine::new(Arc::new(catalog), Arc::new(RuleTable::builtin()));
        HealthState { handler: Arc::new(DialogueHandler::new(Arc::new(engine))) }
    }

    #[tokio::test]
    async fn health_reports_catalog_counts() {
        let catalog = Catalog::new(vec![
            CatalogItem::new("発電機", Some("25kVA"), "超低騒音")
                .with_variant(RawVariant::priced(None, 6000, 60000)),
            CatalogItem::new("クローラーフォーク", None, "普通サヤ")
                .with_variant(RawVariant::priced(None, 8000, 80000)),
        ]);

        let (status, Json(payload)) = health(State(state(catalog))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.items, 2);
        assert_eq!(payload.categories, 2);
    }

    #[tokio::test]
    async fn empty_catalog_is_degraded() {
        let (status, Json(payload)) = health(State(state(Catalog::default()))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.catalog.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
