#![allow(dead_code)]

use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use cookie::Key;
use poi_server::{
    error::AppError,
    images::{ImageHost, ImageStore},
    models::User,
    server::{router, State},
    store::{MemoryStore, PoiStore, UserStore},
    utils::pass::hash_password,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "lighthouse42";

/// Hands out `https://img.test/{n}.jpg` for the n-th upload.
#[derive(Default)]
pub struct FakeHost {
    uploads: AtomicUsize,
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, path: &Path) -> Result<String, AppError> {
        assert!(path.exists(), "staged file should exist during upload");
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://img.test/{}.jpg", n))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let staging = tempfile::tempdir().unwrap();
        let images = ImageStore::new(Arc::new(FakeHost::default()), staging.path());
        let state = State::try_new(store.clone(), images, Key::generate(), false).unwrap();

        TestApp {
            router: router(Arc::new(state)),
            store,
            staging,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request("GET", uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let request = request("POST", uri, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Post a multipart form; `image` is a `(file name, contents)` pair.
    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> Response {
        const BOUNDARY: &str = "----poi-test-boundary";

        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, contents)) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                    BOUNDARY, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = request("POST", uri, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Sign up a regular user and return their session cookie.
    pub async fn sign_up(&self, first_name: &str, last_name: &str, email: &str) -> String {
        let response = self
            .post_form(
                "/signup",
                None,
                &[
                    ("first_name", first_name),
                    ("last_name", last_name),
                    ("email", email),
                    ("password", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("signup should start a session")
    }

    /// Create an admin directly in the store, log in, and return the session cookie.
    pub async fn admin(&self) -> String {
        let mut admin = User::new("Root", "Admin", "root@example.com", hash_password(PASSWORD).unwrap());
        admin.is_admin = true;
        self.store.insert_user(&admin).await.unwrap();

        let response = self
            .post_form(
                "/login",
                None,
                &[("email", "root@example.com"), ("password", PASSWORD)],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login should start a session")
    }

    /// Add a point of interest with one image and return its id.
    pub async fn add_poi(&self, cookie: &str, name: &str) -> String {
        let before: Vec<String> = self.store.pois().await.unwrap().into_iter().map(|p| p.id).collect();

        let response = self
            .post_multipart(
                "/addpoi",
                Some(cookie),
                &[
                    ("name", name),
                    ("description", "A fine place"),
                    ("lat", "52.12"),
                    ("lon", "-6.93"),
                ],
                Some(("photo.jpg", &b"\xff\xd8\xff\xe0 jpeg bytes"[..])),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/home");

        self.store
            .pois()
            .await
            .unwrap()
            .into_iter()
            .map(|poi| poi.id)
            .find(|id| !before.contains(id))
            .expect("a new point of interest")
    }

    pub async fn user(&self, email: &str) -> User {
        self.store.user_by_email(email).await.unwrap().unwrap()
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'*' => {
                (byte as char).to_string()
            }
            b' ' => "+".to_owned(),
            _ => format!("%{:02X}", byte),
        })
        .collect()
}

/// The `name=value` part of the response's session cookie, if it set one.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
        .filter(|pair| pair.starts_with("psessid=") && pair.len() > "psessid=".len())
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// How many points of interest a dashboard or report page lists.
pub fn listed_pois(html: &str) -> usize {
    html.matches("class=\"poi-name\"").count()
}
