//! HTTP handler functions for the solar map API.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use solar_map_ai::{AiError, MunicipalityStats};
use solar_map_analytics_models::AnalysisReport;
use solar_map_charts::HeatmapMetric;
use solar_map_editorial_models::{ContentUpdate, UpsertOutcome};
use solar_map_features::FeatureError;
use solar_map_server_models::{
    AnalyticsQueryParams, ApiDeleteResponse, ApiError, ApiGeneratedContent, ApiHealth,
    ApiUpsertResponse, HeatmapQueryParams, LoginRequest, LoginResponse, MunicipalityQuery,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn internal_error(context: &str, e: &impl std::fmt::Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError::with_message(
        "Internal server error",
        e.to_string(),
    ))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new("Municipality not found"))
}

fn name_required() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new("Municipality name is required"))
}

/// Checks the bearer token on an admin route.
fn authorize(req: &HttpRequest, state: &AppState) -> Result<(), HttpResponse> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    state.sessions.authorize(header).map_err(|e| {
        log::debug!("Rejected admin request to {}: {e}", req.path());
        HttpResponse::Unauthorized().json(ApiError::new(e.to_string()))
    })
}

/// Maps a dataset loading failure to an HTTP status.
fn feature_error_response(e: &FeatureError) -> HttpResponse {
    log::error!("Failed to load features: {e}");
    let body = ApiError::with_message("Failed to load data", e.to_string());

    if e.is_fetch() {
        return HttpResponse::BadGateway().json(body);
    }
    match e {
        FeatureError::Parse { .. } | FeatureError::EmptyData { .. } => {
            HttpResponse::UnprocessableEntity().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Loads the configured dataset and runs one analysis pass.
async fn load_report(state: &AppState, seed: Option<u64>) -> Result<AnalysisReport, HttpResponse> {
    let features = state
        .config
        .data_source()
        .load()
        .await
        .map_err(|e| feature_error_response(&e))?;

    let mut config = state.config.analysis;
    if seed.is_some() {
        config.seed = seed;
    }

    log::debug!("Analyzing {} features", features.len());
    Ok(solar_map_analytics::analyze_now(&features, &config))
}

/// `GET /api/municipalities`
///
/// Returns every editorial record keyed by name, or one record when
/// `?name=` is given.
pub async fn list_municipalities(
    state: web::Data<AppState>,
    query: web::Query<MunicipalityQuery>,
) -> HttpResponse {
    if let Some(name) = query.into_inner().name.filter(|n| !n.is_empty()) {
        return find_municipality(&state, &name).await;
    }

    match state.editorial.list().await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => internal_error("Failed to list municipalities", &e),
    }
}

/// `GET /api/municipalities/{name}`
pub async fn get_municipality(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    find_municipality(&state, &path.into_inner()).await
}

async fn find_municipality(state: &AppState, name: &str) -> HttpResponse {
    match state.editorial.get(name).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => not_found(),
        Err(e) => internal_error("Failed to get municipality", &e),
    }
}

/// `POST /api/municipalities` (admin)
///
/// Creates or merges the record named in the body.
pub async fn upsert_municipality(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ContentUpdate>,
) -> HttpResponse {
    if let Err(resp) = authorize(&req, &state) {
        return resp;
    }

    let update = body.into_inner();
    let Some(name) = update
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
    else {
        return name_required();
    };

    match state.editorial.upsert(&name, update).await {
        Ok((record, outcome)) => HttpResponse::Ok().json(ApiUpsertResponse {
            success: true,
            message: match outcome {
                UpsertOutcome::Created => "Municipality created",
                UpsertOutcome::Updated => "Municipality updated",
            }
            .to_string(),
            data: record,
        }),
        Err(e) => internal_error("Failed to save municipality", &e),
    }
}

/// `DELETE /api/municipalities?name=X` (admin)
pub async fn delete_municipality_by_query(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<MunicipalityQuery>,
) -> HttpResponse {
    delete_named(&req, &state, query.into_inner().name).await
}

/// `DELETE /api/municipalities/{name}` (admin)
pub async fn delete_municipality(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    delete_named(&req, &state, Some(path.into_inner())).await
}

async fn delete_named(req: &HttpRequest, state: &AppState, name: Option<String>) -> HttpResponse {
    if let Err(resp) = authorize(req, state) {
        return resp;
    }

    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return name_required();
    };

    match state.editorial.delete(&name).await {
        Ok(true) => HttpResponse::Ok().json(ApiDeleteResponse {
            success: true,
            message: "Municipality deleted".to_string(),
        }),
        Ok(false) => not_found(),
        Err(e) => internal_error("Failed to delete municipality", &e),
    }
}

/// `POST /api/admin/login`
pub async fn admin_login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> HttpResponse {
    state.sessions.login(&body.password).map_or_else(
        || {
            let message = if state.sessions.is_enabled() {
                "Invalid password"
            } else {
                "Admin login is not configured"
            };
            HttpResponse::Unauthorized().json(ApiError::new(message))
        },
        |session| {
            HttpResponse::Ok().json(LoginResponse {
                token: session.token,
                expires_at: session.expires_at,
            })
        },
    )
}

/// `POST /api/admin/logout`
pub async fn admin_logout(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match solar_map_auth::bearer_token(header) {
        Ok(token) if state.sessions.logout(token) => HttpResponse::Ok().json(ApiDeleteResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
        Ok(_) => HttpResponse::Unauthorized().json(ApiError::new("Invalid or expired session")),
        Err(e) => HttpResponse::Unauthorized().json(ApiError::new(e.to_string())),
    }
}

/// `GET /api/analytics`
///
/// Runs the full analysis over the configured dataset.
pub async fn analytics(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    match load_report(&state, params.seed).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(resp) => resp,
    }
}

/// `GET /api/analytics/charts`
pub async fn charts(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    match load_report(&state, params.seed).await {
        Ok(report) => HttpResponse::Ok().json(solar_map_charts::to_chart_series(
            &report.municipalities,
            &report.regions,
        )),
        Err(resp) => resp,
    }
}

/// `GET /api/analytics/heatmap`
///
/// Returns a weighted point `FeatureCollection` for the requested metric
/// (default `customers`).
pub async fn heatmap(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let metric = match params.metric.as_deref().map(str::parse::<HeatmapMetric>) {
        None => HeatmapMetric::default(),
        Some(Ok(metric)) => metric,
        Some(Err(_)) => {
            return HttpResponse::BadRequest().json(ApiError::with_message(
                "Unknown heatmap metric",
                "Use customers, penetration, income or growth",
            ));
        }
    };

    match load_report(&state, params.seed).await {
        Ok(report) => HttpResponse::Ok().json(solar_map_charts::heatmap(
            &report.municipalities,
            &report.predictions,
            metric,
        )),
        Err(resp) => resp,
    }
}

/// `GET /api/analytics/export.csv`
pub async fn export_csv(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let report = match load_report(&state, params.seed).await {
        Ok(report) => report,
        Err(resp) => return resp,
    };

    match solar_map_export::to_csv(&report) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"analisis_solar.csv\"",
            ))
            .body(csv),
        Err(e) => internal_error("Failed to export CSV", &e),
    }
}

/// `GET /api/analytics/export.pdf`
pub async fn export_pdf(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let report = match load_report(&state, params.seed).await {
        Ok(report) => report,
        Err(resp) => return resp,
    };

    match solar_map_export::to_pdf(&report) {
        Ok(pdf) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reporte_solar.pdf\"",
            ))
            .body(pdf),
        Err(e) => internal_error("Failed to export PDF", &e),
    }
}

fn ai_error_response(e: &AiError) -> HttpResponse {
    log::error!("Content generation failed: {e}");
    let body = ApiError::with_message("Content generation failed", e.to_string());
    match e {
        AiError::Config { .. } => HttpResponse::ServiceUnavailable().json(body),
        _ => HttpResponse::BadGateway().json(body),
    }
}

/// `POST /api/content/{name}` (admin)
///
/// Generates a description plus tags, highlights and a fun fact, quoting
/// the municipality's current statistics.
pub async fn generate_content(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&req, &state) {
        return resp;
    }

    let Some(generator) = &state.content else {
        return HttpResponse::ServiceUnavailable().json(ApiError::with_message(
            "Content generation is not configured",
            "Set OPENAI_API_KEY or ANTHROPIC_API_KEY",
        ));
    };

    let name = path.into_inner();
    let stats = match load_report(&state, None).await {
        Ok(report) => report
            .municipalities
            .iter()
            .find(|m| m.name == name)
            .map(MunicipalityStats::from)
            .unwrap_or_default(),
        Err(_) => {
            log::warn!("Generating content for {name} without statistics");
            MunicipalityStats::default()
        }
    };

    let description = match generator.generate_description(&name, &stats).await {
        Ok(text) => text,
        Err(e) => return ai_error_response(&e),
    };
    let extras = match generator.generate_additional_content(&name, &stats).await {
        Ok(extras) => extras,
        Err(e) => return ai_error_response(&e),
    };

    HttpResponse::Ok().json(ApiGeneratedContent {
        name,
        description,
        tags: extras.tags,
        highlights: extras.highlights,
        fun_fact: extras.fun_fact,
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use solar_map_auth::{AdminSessions, hash_password};
    use solar_map_config::AppConfig;
    use solar_map_editorial::EditorialStore;

    use super::*;

    const DATASET: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[-66.61,18.01]},
         "properties":{"County":"Ponce Municipio","Income":30000,"TotalPop":100000}},
        {"type":"Feature","geometry":{"type":"Point","coordinates":[-66.62,18.02]},
         "properties":{"County":"Ponce Municipio","Income":40000,"TotalPop":100000}},
        {"type":"Feature","geometry":{"type":"Point","coordinates":[-66.06,18.42]},
         "properties":{"County":"San Juan Municipio","Income":45000,"TotalPop":300000}}
    ]}"#;

    async fn state(tag: &str, source: &str) -> web::Data<AppState> {
        let db_path = std::env::temp_dir().join(format!(
            "solar_map_server_{}_{tag}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&db_path);

        let mut config = AppConfig::default();
        config.data.source = source.to_string();
        config.data.fallbacks = Vec::new();
        config.editorial.db_path.clone_from(&db_path);

        web::Data::new(AppState {
            editorial: EditorialStore::open(&db_path).await.unwrap(),
            sessions: AdminSessions::new(Some(hash_password("admin123")), 8),
            content: None,
            config,
        })
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(
            App::new()
                .app_data(state("health", DATASET).await)
                .configure(crate::configure_api),
        )
        .await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn editorial_round_trip_requires_admin() {
        let app = test::init_service(
            App::new()
                .app_data(state("editorial", DATASET).await)
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/municipalities")
                .set_json(serde_json::json!({"name": "Ponce"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/admin/login")
                .set_json(serde_json::json!({"password": "wrong"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);

        let login: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/admin/login")
                .set_json(serde_json::json!({"password": "admin123"}))
                .to_request(),
        )
        .await;
        let token = login["token"].as_str().unwrap().to_string();
        assert!(login["expiresAt"].is_string());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/municipalities")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({"description": "Sin nombre"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);

        let created: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/municipalities")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({
                    "name": "Ponce",
                    "description": "La Perla del Sur",
                    "tags": ["sur"]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created["success"], true);
        assert_eq!(created["message"], "Municipality created");
        assert_eq!(created["data"]["tags"][0], "sur");

        let updated: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/municipalities")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({"name": "Ponce", "funFact": "Parque de Bombas"}))
                .to_request(),
        )
        .await;
        assert_eq!(updated["message"], "Municipality updated");
        assert_eq!(updated["data"]["description"], "La Perla del Sur");

        let all: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/municipalities").to_request(),
        )
        .await;
        assert_eq!(all["Ponce"]["funFact"], "Parque de Bombas");

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/municipalities?name=Lares")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 404);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/municipalities?name=Ponce")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/municipalities/Ponce")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 404);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/municipalities")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/admin/logout")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/municipalities/Ponce")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn analytics_routes_use_configured_dataset() {
        let app = test::init_service(
            App::new()
                .app_data(state("analytics", DATASET).await)
                .configure(crate::configure_api),
        )
        .await;

        let report: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics?seed=7")
                .to_request(),
        )
        .await;
        assert_eq!(report["summary"]["totalMunicipalities"], 2);
        assert_eq!(report["summary"]["totalCustomers"], 3);

        let heatmap: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/heatmap?metric=customers")
                .to_request(),
        )
        .await;
        assert_eq!(heatmap["type"], "FeatureCollection");
        assert_eq!(heatmap["features"].as_array().unwrap().len(), 2);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/heatmap?metric=sunshine")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/export.csv")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
        let csv = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&csv).starts_with("Municipio,Clientes"));

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/export.pdf")
                .to_request(),
        )
        .await;
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
    }

    #[actix_web::test]
    async fn empty_dataset_is_unprocessable() {
        let app = test::init_service(
            App::new()
                .app_data(state("empty", r#"{"features":[]}"#).await)
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/analytics").to_request(),
        )
        .await;
        assert_eq!(resp.status(), 422);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to load data");
    }

    #[actix_web::test]
    async fn content_generation_needs_provider() {
        let state = state("content", DATASET).await;
        let token = state.sessions.login("admin123").unwrap().token;
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/content/Ponce")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/content/Ponce")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 503);
    }
}
