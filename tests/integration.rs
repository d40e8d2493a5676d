use blog_dashboard::{
    actions::DeletionOutcome,
    app::{App, AppServices},
    cms::{CmsCall, MockCmsClient},
    models::{ArticleForm, ArticleTarget, CategoryTarget, Config, DashboardSection, Password},
    prompt::MockPrompt,
    storage::MockStorageClient,
    thumbnail::Thumbnail,
    uploader::{SubmitOutcome, THUMBNAIL_TOO_LARGE},
};
use blog_dashboard::Error;
use std::sync::Arc;
use wiremock::matchers::{
    body_string_contains, header_regex, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_app(cms: &MockCmsClient, storage: &MockStorageClient, prompt: &MockPrompt) -> App {
    App::with_services(
        AppServices {
            cms: Arc::new(cms.clone()),
            storage: Arc::new(storage.clone()),
            prompt: Arc::new(prompt.clone()),
        },
        &Config::default(),
    )
}

#[tokio::test]
async fn test_dashboard_session_with_mocks() {
    let cms = MockCmsClient::new();
    let storage = MockStorageClient::new().with_base_url("https://files.test".to_string());
    let prompt = MockPrompt::new()
        .with_answer(false)
        .with_answer(true)
        .with_answer(true);
    let app = mock_app(&cms, &storage, &prompt);

    let declined = app
        .delete_article(&ArticleTarget::new("Old news", "old-news"))
        .await
        .unwrap();
    let article = app
        .delete_article(&ArticleTarget::new("Old news", "old-news"))
        .await
        .unwrap();
    let category = app
        .delete_category(&CategoryTarget::new("5", "Archive"))
        .await
        .unwrap();

    assert_eq!(declined, DeletionOutcome::Cancelled);
    assert_eq!(article, DeletionOutcome::Deleted { reloaded: true });
    assert_eq!(category, DeletionOutcome::Deleted { reloaded: false });
    assert_eq!(
        cms.get_calls(),
        vec![
            CmsCall::DeleteArticle("old-news".to_string()),
            CmsCall::ReloadDashboard(DashboardSection::Articles),
            CmsCall::DeleteCategory("5".to_string()),
        ]
    );
    assert_eq!(prompt.get_confirmations().len(), 3);
}

#[tokio::test]
async fn test_oversized_thumbnail_blocks_submission() {
    let cms = MockCmsClient::new();
    let storage = MockStorageClient::new();
    let prompt = MockPrompt::new();
    let app = mock_app(&cms, &storage, &prompt);

    let outcome = app
        .submit_article(
            ArticleForm::new("1", "Big", "body"),
            Some(Thumbnail::new("huge.jpg", vec![0xFF; 2 * 1024 * 1024])),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    assert_eq!(prompt.get_alerts(), vec![THUMBNAIL_TOO_LARGE]);
    assert!(cms.get_submitted_forms().is_empty());
    assert_eq!(storage.get_upload_count(), 0);
}

#[tokio::test]
async fn test_end_to_end_against_http_servers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/login/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "csrftoken=tok123; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users/login/"))
        .and(body_string_contains("csrfmiddlewaretoken=tok123"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/")
                .insert_header("set-cookie", "sessionid=live; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/firebase/configuration/file/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "firebase_config": {
                "apiKey": "key",
                "authDomain": "demo.firebaseapp.com",
                "databaseURL": "https://demo.firebasedatabase.app",
                "projectId": "demo",
                "storageBucket": "demo.appspot.com",
                "messagingSenderId": "42",
                "appId": "1:42:web:abc"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v0/b/demo.appspot.com/o"))
        .and(query_param("uploadType", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "images/cover.png",
            "bucket": "demo.appspot.com",
            "downloadTokens": "tok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v0/b/demo\.appspot\.com/o/images%2F.+"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "images/cover.png",
            "bucket": "demo.appspot.com",
            "downloadTokens": "tok"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/article/create/"))
        .and(header_regex("cookie", "sessionid=live"))
        .and(body_string_contains("thumbnail="))
        .and(body_string_contains("token%3Dtok"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/article/details/launch/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article/delete/launch/"))
        .and(header_regex("cookie", "sessionid=live"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/dashboard/"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .and(query_param("q", "articles"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        cms_base_url: server.uri(),
        email: Some("editor@example.com".to_string()),
        password: Some(Password::new("hunter22")),
        firebase_storage_url: server.uri(),
        ..Config::default()
    };
    let app = App::from_config(&config, Arc::new(MockPrompt::accepting()))
        .await
        .unwrap();

    let outcome = app
        .submit_article(
            ArticleForm::new("1", "Launch", "<p>We are live</p>").with_posted(true),
            Some(Thumbnail::new("cover.png", vec![0x89, 0x50, 0x4E, 0x47])),
        )
        .await
        .unwrap();

    match outcome {
        SubmitOutcome::Submitted {
            thumbnail_url: Some(url),
        } => {
            let prefix = format!("{}/v0/b/demo.appspot.com/o/images%2F", server.uri());
            assert!(url.starts_with(&prefix));
            assert!(url.ends_with("?alt=media&token=tok"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let deleted = app
        .delete_article(&ArticleTarget::new("Launch", "launch"))
        .await
        .unwrap();
    assert_eq!(deleted, DeletionOutcome::Deleted { reloaded: true });
}

#[tokio::test]
async fn test_expired_session_against_http_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article/delete/launch/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/users/login/?next=/article/delete/launch/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/article/create/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/users/login/?next=/article/create/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form>login</form>"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        cms_base_url: server.uri(),
        session_id: Some("stale".to_string()),
        dry_run: true,
        ..Config::default()
    };
    let app = App::from_config(&config, Arc::new(MockPrompt::accepting()))
        .await
        .unwrap();

    let err = app
        .delete_article(&ArticleTarget::new("Launch", "launch"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated { ref path } if path == "/article/delete/launch/"));

    let err = app
        .submit_article(ArticleForm::new("1", "Launch", "body"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated { .. }));
}
