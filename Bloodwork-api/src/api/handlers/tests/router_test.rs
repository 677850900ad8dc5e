#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use bloodwork_domain::testing::{
        create_in_memory_bloodwork_service, create_unavailable_bloodwork_service, MockHealthService,
    };

    use crate::api::create_app;

    fn app() -> Router {
        create_app(
            Arc::new(create_in_memory_bloodwork_service()),
            Arc::new(MockHealthService::new()),
        )
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn definition_id(app: &Router, code: &str) -> i64 {
        let (_, catalog) = send(app, Method::GET, "/api/v1/catalog", None).await;
        catalog
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|category| category["definitions"].as_array().unwrap().iter())
            .find(|definition| definition["code"] == code)
            .and_then(|definition| definition["id"].as_i64())
            .unwrap_or_else(|| panic!("{} missing from catalog", code))
    }

    async fn create_test(app: &Router, date: &str, values: &[(&str, f64)]) -> Value {
        let mut measurements = Vec::new();
        for (code, value) in values {
            measurements.push(json!({ "definition_id": definition_id(app, code).await, "value": value }));
        }
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/tests",
            Some(json!({ "test_date": date, "lab_name": "Labor Nord", "measurements": measurements })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    fn status_of<'a>(detail: &'a Value, code: &str) -> &'a Value {
        detail["measurements"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["definition"]["code"] == code)
            .map(|m| &m["measurement"]["status"])
            .unwrap()
    }

    #[tokio::test]
    async fn test_catalog_is_grouped_and_searchable() {
        let app = app();

        let (status, catalog) = send(&app, Method::GET, "/api/v1/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = catalog.as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"Leberwerte"));
        assert!(names.contains(&"Kleines Blutbild"));

        let (status, found) = send(&app, Method::GET, "/api/v1/catalog?q=ggt", None).await;
        assert_eq!(status, StatusCode::OK);
        let codes: Vec<&str> = found
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|c| c["definitions"].as_array().unwrap().iter())
            .map(|d| d["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["GGT"]);
    }

    #[tokio::test]
    async fn test_get_definition_and_unknown_definition() {
        let app = app();
        let hb = definition_id(&app, "Hb").await;

        let (status, definition) = send(&app, Method::GET, &format!("/api/v1/catalog/{}", hb), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(definition["code"], "Hb");

        let (status, error) = send(&app, Method::GET, "/api/v1/catalog/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "not_found");
    }

    #[tokio::test]
    async fn test_classify_uses_sex_specific_ranges() {
        let app = app();

        let (status, male) = send(
            &app,
            Method::POST,
            "/api/v1/classify",
            Some(json!({ "code": "Hb", "value": 13.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(male["status"], "LOW");
        assert_eq!(male["sex"], "MALE");
        assert_eq!(male["reference_range"]["min"], 13.5);

        let (_, female) = send(
            &app,
            Method::POST,
            "/api/v1/classify",
            Some(json!({ "code": "Hb", "value": 13.0, "sex": "FEMALE" })),
        )
        .await;
        assert_eq!(female["status"], "NORMAL");
        assert!(female.get("meaning").is_none());

        let (_, critical) = send(
            &app,
            Method::POST,
            "/api/v1/classify",
            Some(json!({ "code": "K", "value": 7.0 })),
        )
        .await;
        assert_eq!(critical["status"], "CRITICAL_HIGH");
    }

    #[tokio::test]
    async fn test_classify_rejects_bad_input() {
        let app = app();

        let (status, error) = send(
            &app,
            Method::POST,
            "/api/v1/classify",
            Some(json!({ "code": "", "value": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation_error");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/classify",
            Some(json!({ "code": "NOPE", "value": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_get_and_analyze_test() {
        let app = app();
        let created = create_test(&app, "2024-03-01", &[("GLU", 180.0), ("HbA1c", 7.1), ("Hb", 14.5)]).await;

        assert_eq!(status_of(&created, "GLU"), "HIGH");
        assert_eq!(status_of(&created, "HbA1c"), "HIGH");
        assert_eq!(status_of(&created, "Hb"), "NORMAL");

        let id = created["test"]["id"].as_str().unwrap();
        let (status, loaded) = send(&app, Method::GET, &format!("/api/v1/tests/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["test"]["test_date"], "2024-03-01");
        assert_eq!(loaded["measurements"].as_array().unwrap().len(), 3);

        let (status, analysis) = send(&app, Method::GET, &format!("/api/v1/tests/{}/analysis", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(analysis["test_id"], id);
        let findings = analysis["findings"].as_array().unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0]["title"], "Diabetesverdacht");
        assert_eq!(findings[0]["severity"], "INFO");
        assert_eq!(findings[0]["affected_codes"], json!(["GLU", "HbA1c"]));
    }

    #[tokio::test]
    async fn test_list_tests_paginates_newest_first() {
        let app = app();
        for date in ["2024-01-10", "2024-02-10", "2024-03-10"] {
            create_test(&app, date, &[("TSH", 2.0)]).await;
        }

        let (status, page) = send(&app, Method::GET, "/api/v1/tests?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total_count"], 3);
        assert_eq!(page["data"].as_array().unwrap().len(), 2);
        assert_eq!(page["data"][0]["test"]["test_date"], "2024-03-10");
        assert_eq!(page["data"][0]["counts"]["total"], 1);
        assert_eq!(page["next"], "/api/v1/tests?limit=2&offset=2");

        let (_, filtered) = send(&app, Method::GET, "/api/v1/tests?start_date=2024-02-01", None).await;
        assert_eq!(filtered["total_count"], 2);

        let (status, _) = send(&app, Method::GET, "/api/v1/tests?limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_record_update_and_delete_measurement() {
        let app = app();
        let created = create_test(&app, "2024-03-01", &[("K", 4.2)]).await;
        let test_id = created["test"]["id"].as_str().unwrap().to_string();
        let gfr = definition_id(&app, "GFR").await;

        let (status, recorded) = send(
            &app,
            Method::POST,
            &format!("/api/v1/tests/{}/measurements", test_id),
            Some(json!({ "definition_id": gfr, "value": 10.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recorded["measurement"]["status"], "CRITICAL_LOW");

        let measurement_id = recorded["measurement"]["id"].as_str().unwrap().to_string();
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/measurements/{}", measurement_id),
            Some(json!({ "value": 95.0, "notes": "repeated" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["measurement"]["status"], "NORMAL");
        assert_eq!(updated["measurement"]["notes"], "repeated");

        let uri = format!("/api/v1/measurements/{}", measurement_id);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_test_then_not_found() {
        let app = app();
        let created = create_test(&app, "2024-03-01", &[("Hb", 12.0)]).await;
        let uri = format!("/api/v1/tests/{}", created["test"]["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("{}/analysis", uri), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_test_validation_errors() {
        let app = app();

        let (status, error) = send(
            &app,
            Method::POST,
            "/api/v1/tests",
            Some(json!({ "test_date": "2024-03-01", "measurements": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation_error");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/tests",
            Some(json!({ "test_date": "2024-03-01", "measurements": [{ "definition_id": 999999, "value": 1.0 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, error) = send(&app, Method::GET, "/api/v1/tests/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_malformed_input_gets_json_errors() {
        let app = app();

        let (status, error) = send(
            &app,
            Method::POST,
            "/api/v1/tests",
            Some(json!({ "measurements": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "bad_request");
        assert!(error["message"].as_str().unwrap().contains("test_date"));

        let (status, error) = send(
            &app,
            Method::PUT,
            "/api/v1/measurements/not-a-uuid",
            Some(json!({ "value": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "bad_request");

        let (status, error) = send(&app, Method::GET, "/api/v1/catalog/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "bad_request");

        let (status, error) = send(&app, Method::GET, "/api/v1/tests?limit=many", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_list_tests_with_huge_offset() {
        let app = app();
        create_test(&app, "2024-01-10", &[("TSH", 2.0)]).await;

        let (status, page) = send(
            &app,
            Method::GET,
            &format!("/api/v1/tests?offset={}", usize::MAX),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total_count"], 1);
        assert!(page["data"].as_array().unwrap().is_empty());
        assert!(page.get("next").is_none());
    }

    #[tokio::test]
    async fn test_value_history_is_oldest_first() {
        let app = app();
        create_test(&app, "2024-05-01", &[("TSH", 5.0)]).await;
        create_test(&app, "2023-05-01", &[("TSH", 2.0)]).await;
        let tsh = definition_id(&app, "TSH").await;

        let (status, history) = send(&app, Method::GET, &format!("/api/v1/catalog/{}/history", tsh), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["definition"]["code"], "TSH");
        let points = history["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["test_date"], "2023-05-01");
        assert_eq!(points[1]["status"], "HIGH");
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let app = create_app(
            Arc::new(create_unavailable_bloodwork_service()),
            Arc::new(MockHealthService::new()),
        );

        let (status, error) = send(&app, Method::GET, "/api/v1/tests", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "internal_error");
        assert_eq!(error["message"], "An unexpected error occurred");
    }
}
