use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

async fn setup_app() -> (Router, sqlx::PgPool, tempfile::TempDir) {
    dotenvy::dotenv().ok();
    let uploads = tempfile::tempdir().expect("uploads dir");
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("SERVICE_ROLE_KEY", "srk_test");
    env::set_var("UPLOADS_DIR", uploads.path());
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("ACCOUNT_RPS", "1000");

    stages_backend::config::init_config().expect("init config");
    let pool = stages_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let app_state = stages_backend::AppState::new(pool.clone());

    let public_api = Router::new()
        .route("/api/offers", get(stages_backend::routes::offer::list_offers))
        .route(
            "/api/offers/:id",
            get(stages_backend::routes::offer::get_offer),
        )
        .route(
            "/api/companies",
            get(stages_backend::routes::company::list_companies),
        )
        .route(
            "/api/companies/:id",
            get(stages_backend::routes::company::get_company),
        )
        .route(
            "/api/companies/:id/offers",
            get(stages_backend::routes::company::company_offers),
        )
        .route(
            "/api/auth/sign-up",
            post(stages_backend::routes::auth::sign_up),
        )
        .route(
            "/api/auth/sign-in",
            post(stages_backend::routes::auth::sign_in),
        );

    let account_api = Router::new()
        .route("/api/auth/me", get(stages_backend::routes::auth::me))
        .route(
            "/api/dashboard",
            get(stages_backend::routes::dashboard::dashboard),
        )
        .route(
            "/api/offers",
            post(stages_backend::routes::offer::create_offer),
        )
        .route(
            "/api/offers/:id",
            patch(stages_backend::routes::offer::update_offer)
                .delete(stages_backend::routes::offer::delete_offer),
        )
        .route(
            "/api/companies",
            post(stages_backend::routes::company::create_company),
        )
        .route(
            "/api/companies/:id",
            patch(stages_backend::routes::company::update_company)
                .delete(stages_backend::routes::company::delete_company),
        )
        .route(
            "/api/offers/:id/application-status",
            get(stages_backend::routes::application::application_status),
        )
        .route(
            "/api/offers/:id/applications",
            get(stages_backend::routes::application::offer_applications)
                .post(stages_backend::routes::application::apply),
        )
        .route(
            "/api/applications",
            get(stages_backend::routes::application::my_applications),
        )
        .route(
            "/api/applications/:id/status",
            patch(stages_backend::routes::application::update_application_status),
        )
        .layer(axum::middleware::from_fn(
            stages_backend::middleware::auth::require_bearer_auth,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/companies/:id",
            delete(stages_backend::routes::company::delete_company_admin),
        )
        .layer(axum::middleware::from_fn(
            stages_backend::middleware::service_role::require_service_role,
        ));

    let app = public_api
        .merge(account_api)
        .merge(admin_api)
        .with_state(app_state);

    (app, pool, uploads)
}

async fn json_response(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: JsonValue) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn get_with(app: &Router, uri: &str, token: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap()
}

fn multipart_body(boundary: &str, motivation: &str, filename: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"motivation\"\r\n\r\n{motivation}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn apply_to_offer(
    app: &Router,
    offer_id: &str,
    token: &str,
    motivation: &str,
) -> axum::response::Response {
    let boundary = "X-TEST-BOUNDARY";
    let body = multipart_body(boundary, motivation, "cv.pdf", b"%PDF-1.4 test");
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/offers/{}/applications", offer_id))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
#[ignore = "requires a live database"]
async fn marketplace_flow_end_to_end() {
    let (app, pool, _uploads) = setup_app().await;
    let run = Uuid::new_v4().simple().to_string();

    // --- Company sign-up provisions profile and company together ---
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("acme_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "Ada",
            "last_name": "Acme",
            "role": "company",
            "company": { "name": format!("Acme {run}"), "sector": "tech", "address": "1 Way" }
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let company_auth = json_response(resp).await;
    let company_token = company_auth["token"].as_str().unwrap().to_string();
    let company_owner: Uuid = company_auth["profile"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(company_auth["profile"]["role"], "company");

    let company_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE owner_id = $1")
        .bind(company_owner)
        .fetch_one(&pool)
        .await
        .expect("company row provisioned at sign-up");

    // --- Student sign-up provisions the students row ---
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("stu_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "Sam",
            "last_name": "Student",
            "role": "student",
            "company": null
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let student_auth = json_response(resp).await;
    let student_token = student_auth["token"].as_str().unwrap().to_string();
    let student_id: Uuid = student_auth["profile"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let student_row =
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM students WHERE user_id = $1")
            .bind(student_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(student_row, Some(student_id));

    // Company sign-up without company details is rejected up front.
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("nocmp_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "No",
            "last_name": "Company",
            "role": "company",
            "company": null
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // --- Offers ---
    let mk_offer = |title: &str, sector: &str, location: &str| {
        json!({
            "company_id": company_id,
            "title": title,
            "description": "desc",
            "duration": "3 months",
            "start_date": "2026-09-01",
            "end_date": "2026-12-01",
            "location": location,
            "sector": sector,
            "status": null
        })
    };
    let resp = post_json(
        &app,
        "/api/offers",
        Some(&company_token),
        mk_offer(&format!("Backend intern {run}"), &format!("tech-{run}"), "Paris"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let offer = json_response(resp).await;
    let offer_id = offer["id"].as_str().unwrap().to_string();

    let resp = post_json(
        &app,
        "/api/offers",
        Some(&company_token),
        mk_offer(&format!("Design intern {run}"), &format!("tech-{run}"), "Lyon"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Anonymous offer creation is rejected.
    let resp = post_json(&app, "/api/offers", None, mk_offer("x", "y", "z")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // --- Listing: filters compose, filled offers never appear ---
    let resp = get_with(
        &app,
        &format!("/api/offers?sector=tech-{run}&title=backend"),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listing = json_response(resp).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["id"].as_str(), Some(offer_id.as_str()));

    // Pagination windows over the sector's two offers.
    let resp = get_with(
        &app,
        &format!("/api/offers?sector=tech-{run}&per_page=1&page=2"),
        None,
    )
    .await;
    let page2 = json_response(resp).await;
    assert_eq!(page2["total"], 2);
    assert_eq!(page2["total_pages"], 2);
    assert_eq!(page2["items"].as_array().unwrap().len(), 1);

    // --- Offer detail carries company and contact ---
    let resp = get_with(&app, &format!("/api/offers/{}", offer_id), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail = json_response(resp).await;
    assert_eq!(
        detail["company"]["id"].as_str(),
        Some(company_id.to_string().as_str())
    );
    assert_eq!(detail["contact"]["first_name"], "Ada");

    // --- Application intake ---
    let resp = get_with(
        &app,
        &format!("/api/offers/{}/application-status", offer_id),
        Some(&student_token),
    )
    .await;
    assert_eq!(json_response(resp).await["applied"], false);

    let resp = apply_to_offer(&app, &offer_id, &student_token, "I am motivated.").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let submitted = json_response(resp).await;
    assert_eq!(submitted["success"], true);
    let application_id = submitted["application"]["id"].as_str().unwrap().to_string();
    let cv_path = submitted["application"]["cv_path"].as_str().unwrap();
    assert!(cv_path.starts_with(&student_id.to_string()));

    let resp = get_with(
        &app,
        &format!("/api/offers/{}/application-status", offer_id),
        Some(&student_token),
    )
    .await;
    assert_eq!(json_response(resp).await["applied"], true);

    // Second submission is rejected and the first attachment survives.
    let resp = apply_to_offer(&app, &offer_id, &student_token, "again").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The unique constraint also rejects a duplicate row inserted directly,
    // closing the race the advisory pre-check leaves open.
    let direct = sqlx::query(
        "INSERT INTO applications (student_id, offer_id, motivation_letter, cv_path) \
         VALUES ($1, $2, 'dup', 'dup.pdf')",
    )
    .bind(student_id)
    .bind(Uuid::parse_str(&offer_id).unwrap())
    .execute(&pool)
    .await;
    assert!(direct.is_err());

    // Companies cannot apply.
    let resp = apply_to_offer(&app, &offer_id, &company_token, "me too").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // --- Review by the offer's company ---
    let resp = get_with(
        &app,
        &format!("/api/offers/{}/applications", offer_id),
        Some(&company_token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let received = json_response(resp).await;
    assert_eq!(received["items"].as_array().unwrap().len(), 1);

    // The student may not read the company's inbox.
    let resp = get_with(
        &app,
        &format!("/api/offers/{}/applications", offer_id),
        Some(&student_token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/applications/{}/status", application_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", company_token))
        .body(Body::from(json!({ "status": "accepted" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_response(resp).await["status"], "accepted");

    // --- Dashboards follow the caller's role ---
    let resp = get_with(&app, "/api/dashboard", Some(&student_token)).await;
    let student_dash = json_response(resp).await;
    assert_eq!(student_dash["role"], "student");
    assert_eq!(student_dash["applications"].as_array().unwrap().len(), 1);

    let resp = get_with(&app, "/api/dashboard", Some(&company_token)).await;
    let company_dash = json_response(resp).await;
    assert_eq!(company_dash["role"], "company");
    let overview = &company_dash["companies"][0];
    assert_eq!(overview["company"]["id"].as_str(), Some(company_id.to_string().as_str()));
    let counts: Vec<i64> = overview["offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["application_count"].as_i64().unwrap())
        .collect();
    assert!(counts.contains(&1));

    // --- Guarded deletion ---
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/companies/{}", company_id))
        .header("authorization", format!("Bearer {}", company_token))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let blocked = json_response(resp).await;
    assert!(blocked["error"].as_str().unwrap().contains("available offer"));

    // A company with only unexposed offers and no applications goes away,
    // offers included, via the service-role route.
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("ghost_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "Gia",
            "last_name": "Ghost",
            "role": "company",
            "company": { "name": format!("Ghost {run}"), "sector": "misc", "address": "2 Way" }
        }),
    )
    .await;
    let ghost_auth = json_response(resp).await;
    let ghost_owner: Uuid = ghost_auth["profile"]["id"].as_str().unwrap().parse().unwrap();
    let ghost_company =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE owner_id = $1")
            .bind(ghost_owner)
            .fetch_one(&pool)
            .await
            .unwrap();

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/companies/{}", ghost_company))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/companies/{}", ghost_company))
        .header("x-service-role-key", "srk_test")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let gone = sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE id = $1")
        .bind(ghost_company)
        .fetch_optional(&pool)
        .await
        .unwrap();
    assert_eq!(gone, None);

    // --- Admin dashboard sees platform-wide counters ---
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("admin_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "Axel",
            "last_name": "Admin",
            "role": "admin",
            "company": null
        }),
    )
    .await;
    let admin_auth = json_response(resp).await;
    let admin_token = admin_auth["token"].as_str().unwrap().to_string();

    let resp = get_with(&app, "/api/dashboard", Some(&admin_token)).await;
    let admin_dash = json_response(resp).await;
    assert_eq!(admin_dash["role"], "admin");
    assert!(admin_dash["stats"]["companies"].as_i64().unwrap() >= 1);
    assert!(admin_dash["stats"]["students"].as_i64().unwrap() >= 1);
    assert!(admin_dash["stats"]["applications"].as_i64().unwrap() >= 1);

    // Duplicate email is a conflict.
    let resp = post_json(
        &app,
        "/api/auth/sign-up",
        None,
        json!({
            "email": format!("stu_{run}@example.com"),
            "password": "s3cret-pass",
            "first_name": "Sam",
            "last_name": "Again",
            "role": "student",
            "company": null
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Sign-in round trip with the original password.
    let resp = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        json!({ "email": format!("stu_{run}@example.com"), "password": "s3cret-pass" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let signed_in = json_response(resp).await;
    assert_eq!(signed_in["profile"]["role"], "student");

    let resp = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        json!({ "email": format!("stu_{run}@example.com"), "password": "wrong-pass" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
