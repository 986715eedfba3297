mod common;

use axum::http::{header, StatusCode};
use common::{body_text, location, session_cookie, TestApp, PASSWORD};
use poi_server::store::{PoiStore, UserStore};
use rstest::rstest;

#[tokio::test]
async fn signup_starts_a_session_that_reaches_the_dashboard() {
    let app = TestApp::new();

    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app.get("/home", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("User Dashboard"));
    assert!(html.contains("Ada Lovelace"));

    let user = app.user("ada@example.com").await;
    assert_eq!(user.full_name, "Ada Lovelace");
    assert_ne!(user.password, PASSWORD);
    assert!(!user.is_admin);
    assert_eq!(user.contributed_pois, 0);
}

#[tokio::test]
async fn duplicate_email_is_refused_without_a_second_record() {
    let app = TestApp::new();
    app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app
        .post_form(
            "/signup",
            None,
            &[
                ("first_name", "Augusta"),
                ("last_name", "King"),
                ("email", "ada@example.com"),
                ("password", "another-password"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(session_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Email address is already registered"));
    assert!(html.contains("Augusta"));

    let users = app.store.regular_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].full_name, "Ada Lovelace");
}

#[rstest]
#[case::bad_first_name("4da", "Lovelace", "ada@example.com", PASSWORD, "First name")]
#[case::missing_last_name("Ada", "", "ada@example.com", PASSWORD, "Last name")]
#[case::bad_email("Ada", "Lovelace", "not-an-email", PASSWORD, "valid email")]
#[case::short_password("Ada", "Lovelace", "ada@example.com", "short", "Minimum length")]
#[tokio::test]
async fn invalid_signups_are_shown_inline(
    #[case] first_name: &str,
    #[case] last_name: &str,
    #[case] email: &str,
    #[case] password: &str,
    #[case] expected: &str,
) {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/signup",
            None,
            &[
                ("first_name", first_name),
                ("last_name", last_name),
                ("email", email),
                ("password", password),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains(expected));
    assert!(app.store.regular_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn names_with_apostrophes_and_dashes_are_accepted() {
    let app = TestApp::new();
    app.sign_up("Seán", "O'Neill-Smith", "sean@example.com").await;
    assert_eq!(app.user("sean@example.com").await.full_name, "Seán O'Neill-Smith");
}

#[tokio::test]
async fn login_with_correct_password_reaches_the_dashboard() {
    let app = TestApp::new();
    app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app
        .post_form(
            "/login",
            None,
            &[("email", " ada@example.com "), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");
    let cookie = session_cookie(&response).unwrap();

    let response = app.get("/home", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[case::wrong_password("ada@example.com", "wrong-password", "Password mismatch")]
#[case::unknown_email("nobody@example.com", PASSWORD, "Email address is not registered")]
#[tokio::test]
async fn failed_logins_never_start_a_session(
    #[case] email: &str,
    #[case] password: &str,
    #[case] expected: &str,
) {
    let app = TestApp::new();
    app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app
        .post_form("/login", None, &[("email", email), ("password", password)])
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains(expected));
    assert!(html.contains(email));
}

#[rstest]
#[case::no_cookie(None)]
#[case::unsigned_cookie(Some("psessid=01HNOTSIGNED"))]
#[case::unrelated_cookie(Some("theme=dark"))]
#[tokio::test]
async fn protected_pages_redirect_to_login(#[case] cookie: Option<&str>) {
    let app = TestApp::new();

    for uri in ["/home", "/report", "/settings"] {
        let response = app.get(uri, cookie).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login", "{}", uri);
    }
}

#[tokio::test]
async fn tampered_session_cookie_counts_as_no_session() {
    let app = TestApp::new();
    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    // swap the last character of the signed value
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = app.get("/home", Some(&tampered)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn cookie_from_another_server_is_refused() {
    let first = TestApp::new();
    let second = TestApp::new();
    let cookie = first.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = second.get("/home", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new();
    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("psessid=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn landing_page_is_public() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("/signup"));

    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Go to your dashboard"));
}

#[tokio::test]
async fn settings_update_the_profile() {
    let app = TestApp::new();
    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let html = body_text(app.get("/settings", Some(&cookie)).await).await;
    assert!(html.contains("value=\"ada@example.com\""));

    let response = app
        .post_form(
            "/settings",
            Some(&cookie),
            &[
                ("first_name", "Augusta"),
                ("last_name", "King"),
                ("email", "augusta@example.com"),
                ("password", "a-new-password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let user = app.user("augusta@example.com").await;
    assert_eq!(user.full_name, "Augusta King");
    assert!(app.store.user_by_email("ada@example.com").await.unwrap().is_none());

    let response = app
        .post_form(
            "/login",
            None,
            &[("email", "augusta@example.com"), ("password", "a-new-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn settings_refuse_another_users_email() {
    let app = TestApp::new();
    app.sign_up("Grace", "Hopper", "grace@example.com").await;
    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;

    let response = app
        .post_form(
            "/settings",
            Some(&cookie),
            &[
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
                ("email", "grace@example.com"),
                ("password", PASSWORD),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Email address is already registered"));
    assert_eq!(app.user("ada@example.com").await.full_name, "Ada Lovelace");
}

#[tokio::test]
async fn deleting_the_account_removes_everything_it_owns() {
    let app = TestApp::new();
    let cookie = app.sign_up("Ada", "Lovelace", "ada@example.com").await;
    let other = app.sign_up("Grace", "Hopper", "grace@example.com").await;
    app.add_poi(&cookie, "Lighthouse").await;
    app.add_poi(&other, "Harbour").await;
    let response = app
        .post_form("/category", Some(&cookie), &[("name", "Coast")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.post_form("/settings/delete", Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    assert!(app.store.user_by_email("ada@example.com").await.unwrap().is_none());
    let remaining = app.store.pois().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Harbour");

    // the old cookie now points at nobody
    let response = app.get("/home", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}
