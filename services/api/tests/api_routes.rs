//! End-to-end tests of the REST API against an in-memory SQLite store.

use std::sync::Arc;

use api_lib::{
    adapters::DbAdapter,
    config::Config,
    seed::ensure_seeded,
    web::{router, ApiDoc, AppState},
};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use utoipa::OpenApi;

async fn app() -> Router {
    let db = DbAdapter::connect("sqlite::memory:").await.unwrap();
    db.run_migrations().await.unwrap();
    ensure_seeded(&db).await.unwrap();
    let config = Config::from_vars(|_| None).unwrap();
    router(Arc::new(AppState::new(Arc::new(db), Arc::new(config))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_stats() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"jobs": 4, "candidates": 30, "assessments": 3, "responses": 0}));
}

#[tokio::test]
async fn seeding_twice_inserts_nothing() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/api/seed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], json!({"jobs": 0, "candidates": 0, "assessments": 0}));
}

#[tokio::test]
async fn lists_seeded_assessments_with_summaries() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/assessments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessments"].as_array().unwrap().len(), 3);
    assert_eq!(body["summaries"][0]["sectionCount"], 2);

    let (_, body) = send(&app, Method::GET, "/api/assessments?jobId=job-2", None).await;
    let assessments = body["assessments"].as_array().unwrap();
    assert_eq!(assessments.len(), 1);
    assert_eq!(assessments[0]["id"], "assessment-2");

    let (status, body) = send(&app, Method::GET, "/api/assessments/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn draft_lifecycle_from_creation_to_publish() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/assessments",
        Some(json!({"jobId": "job-1", "title": "Screening", "description": "Short"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let mut draft = body["assessment"].clone();
    let id = draft["id"].as_str().unwrap().to_string();
    let link = draft["shareableLink"].as_str().unwrap().to_string();
    assert_eq!(draft["isPublished"], false);

    let (status, _) = send(&app, Method::GET, &format!("/api/take/{}", link), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    draft["sections"] = json!([{
        "id": "s1",
        "title": "Basics",
        "description": "",
        "order": 3,
        "questions": [],
    }]);
    let (status, body) = send(&app, Method::PUT, &format!("/api/assessments/{}", id), Some(draft.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STRUCTURE");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 1);

    draft["sections"][0]["order"] = json!(0);
    draft["sections"][0]["questions"] = json!([{
        "id": "q1",
        "type": "single-choice",
        "question": "Pick one",
        "required": true,
        "options": ["A", "B"],
        "order": 0,
    }]);
    draft["shareableLink"] = json!("forged");
    let (status, body) = send(&app, Method::PUT, &format!("/api/assessments/{}", id), Some(draft.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["shareableLink"], link.as_str());

    let (status, body) = send(&app, Method::POST, &format!("/api/assessments/{}/publish", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["isPublished"], true);

    let (status, body) = send(&app, Method::PUT, &format!("/api/assessments/{}", id), Some(draft)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ASSESSMENT_PUBLISHED");

    let (status, body) = send(&app, Method::GET, &format!("/api/take/{}", link), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["totalQuestions"], 1);
    assert_eq!(body["progress"]["answeredCount"], 0);
}

#[tokio::test]
async fn take_hides_conditional_questions_and_rejects_unknown_links() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/take/share-assessment-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["id"], "assessment-1");
    assert_eq!(body["progress"]["totalQuestions"], 7);

    let (status, _) = send(&app, Method::GET, "/api/take/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn designer_answers(years: &str) -> Value {
    json!({
        "assessmentId": "assessment-3",
        "candidateId": "candidate-3",
        "responses": {
            "q21": {"type": "single-choice", "value": "To reduce development costs"},
            "q23": {"type": "short-text", "value": "x".repeat(120)},
            "q26": {"type": "multi-choice", "value": ["Figma", "Sketch"]},
            "q30": {"type": "numeric", "value": years},
            "unknown": {"type": "short-text", "value": "dropped"},
        }
    })
}

#[tokio::test]
async fn submission_is_validated_and_stored() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/assessment-responses", Some(designer_answers("50"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["q30"], "Value must be at most 20");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/assessment-responses",
        Some(json!({"assessmentId": "assessment-3", "responses": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["q21"], "This field is required");
    assert!(body["error"]["details"].get("q29").is_none());

    let (status, body) = send(&app, Method::POST, "/api/assessment-responses", Some(designer_answers("5"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let response = &body["response"];
    assert_eq!(response["candidateId"], "candidate-3");
    let answered: Vec<&String> = response["responses"].as_object().unwrap().keys().collect();
    assert_eq!(answered, vec!["q21", "q23", "q26", "q30"]);

    let id = response["id"].as_str().unwrap();
    let (status, body) = send(&app, Method::GET, &format!("/api/assessment-responses/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["assessmentId"], "assessment-3");

    let (_, stats) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(stats["responses"], 1);
}

#[tokio::test]
async fn submission_to_a_draft_is_forbidden() {
    let app = app().await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/assessments",
        Some(json!({"jobId": "job-1", "title": "Draft"})),
    )
    .await;
    let id = body["assessment"]["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/assessment-responses",
        Some(json!({"assessmentId": id, "responses": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "NOT_PUBLISHED");
}

#[tokio::test]
async fn candidate_summary_reports_percentages() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/candidates/candidate-3/assessment-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averagePercent"], 81);
    assert_eq!(body["scores"][0]["percent"], 81);

    let (_, body) = send(&app, Method::GET, "/api/candidates/candidate-1/assessment-summary", None).await;
    assert_eq!(body["averagePercent"], Value::Null);

    let (status, _) = send(&app, Method::GET, "/api/candidates/nobody/assessment-summary", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_assessment() {
    let app = app().await;
    let (status, _) = send(&app, Method::DELETE, "/api/assessments/assessment-2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/api/assessments/assessment-2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn jobs_are_sorted_created_updated_and_deleted() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<u64> = body["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["order"].as_u64().unwrap())
        .collect();
    assert_eq!(orders.len(), 4);
    assert!(orders.windows(2).all(|pair| pair[0] <= pair[1]));

    let (status, _) = send(&app, Method::POST, "/api/jobs", Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/jobs",
        Some(json!({"title": "Platform Engineer", "tags": ["Rust"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job = body["job"].clone();
    let id = job["id"].as_str().unwrap().to_string();
    assert_eq!(job["slug"], "platform-engineer");
    assert_eq!(job["status"], "active");
    assert_eq!(job["order"], orders.last().unwrap() + 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/jobs/{}", id),
        Some(json!({"status": "archived"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "archived");
    assert_eq!(body["job"]["title"], "Platform Engineer");
    assert_eq!(body["job"]["createdAt"], job["createdAt"]);
    assert_ne!(body["job"]["updatedAt"], Value::Null);

    let (status, _) = send(&app, Method::PUT, "/api/jobs/missing", Some(json!({"title": "X"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/jobs", None).await;
    assert_eq!(body["jobs"].as_array().unwrap().last().unwrap()["id"], id.as_str());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/jobs/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/jobs/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, stats) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(stats["jobs"], 4);
}

#[tokio::test]
async fn candidates_are_listed_and_moved_between_stages() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/candidates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidates"].as_array().unwrap().len(), 30);
    assert!(body["candidates"][0].get("updatedAt").is_none());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/candidates/candidate-3",
        Some(json!({"stage": "offer"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let candidate = &body["candidate"];
    assert_eq!(candidate["stage"], "offer");
    assert_eq!(candidate["id"], "candidate-3");
    assert!(candidate["updatedAt"].is_string());
    assert_eq!(candidate["assessmentScores"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/candidates/candidate-3",
        Some(json!({"stage": "promoted"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::PUT, "/api/candidates/nobody", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn openapi_document_lists_every_route() {
    let doc = ApiDoc::openapi();
    for path in [
        "/api/jobs",
        "/api/jobs/{id}",
        "/api/candidates",
        "/api/candidates/{id}",
        "/api/assessment-responses",
    ] {
        assert!(doc.paths.paths.contains_key(path), "{path}");
    }
}
