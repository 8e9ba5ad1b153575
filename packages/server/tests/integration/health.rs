use crate::common::{TestApp, routes};

#[tokio::test]
async fn healthcheck_reports_ok_without_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTHCHECK).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_lists_problem_routes() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/v1/problems/{id}"].is_object());
    assert!(res.body["paths"]["/api/v1/healthcheck"].is_object());
}
