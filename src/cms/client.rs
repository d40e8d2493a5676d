use super::CmsService;
use crate::models::{
    ArticleForm, Config, DashboardSection, FirebaseConfig, FirebaseConfigEnvelope, FormTarget,
};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{LOCATION, REFERER};
use reqwest::{redirect, Client, RequestBuilder, Response, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A CMS response, with redirects left unfollowed.
enum Reply {
    Page(Response),
    Redirect(Url),
}

/// HTTP client for the blog CMS. The Django session lives in a cookie jar.
///
/// Redirects are not followed: `@login_required` views answer an anonymous
/// request with a redirect to the login page, which must surface as
/// [`Error::Unauthenticated`] rather than as the login page's 200.
pub struct CmsClient {
    client: Client,
    base: Url,
    jar: Arc<Jar>,
    login_path: String,
}

impl CmsClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid CMS URL '{}': {}", base_url, e)))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .cookie_provider(jar.clone())
            .build()?;

        let mut cms = Self {
            client,
            base,
            jar,
            login_path: String::new(),
        };
        cms.login_path = cms.endpoint(&["users", "login"])?.path().to_string();
        Ok(cms)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let cms = Self::new(config.cms_base_url.clone(), config.request_timeout)?;
        cms.add_cookie("sessionid", config.session_id.as_deref());
        cms.add_cookie("csrftoken", config.csrf_token.as_deref());
        Ok(cms)
    }

    /// Seeds the jar with cookies copied from a browser session.
    pub fn with_session(self, session_id: Option<&str>, csrf_token: Option<&str>) -> Self {
        self.add_cookie("sessionid", session_id);
        self.add_cookie("csrftoken", csrf_token);
        self
    }

    fn add_cookie(&self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.jar
                .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.base);
        }
    }

    /// Current `csrftoken` cookie, as Django expects it echoed back.
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        header
            .to_str()
            .ok()?
            .split(';')
            .filter_map(|pair| pair.trim().strip_prefix("csrftoken="))
            .next()
            .map(str::to_string)
    }

    /// Builds `<base>/<segments>/`. Each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("CMS URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Reply> {
        tracing::debug!("GET {}", url);
        let path = url.path().to_string();
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to send request to CMS: {}", e);
            e
        })?;
        self.classify(response, path)
    }

    async fn post_form<T: Serialize + ?Sized>(&self, url: Url, fields: &T) -> Result<Reply> {
        tracing::debug!("POST {}", url);
        let path = url.path().to_string();

        let mut request: RequestBuilder = self.client.post(url);
        if let Some(csrf_token) = self.csrf_token() {
            request = request
                .header("X-CSRFToken", csrf_token)
                .header(REFERER, self.base.as_str());
        }

        let response = request.form(fields).send().await.map_err(|e| {
            tracing::error!("Failed to post form to CMS: {}", e);
            e
        })?;
        self.classify(response, path)
    }

    fn classify(&self, response: Response, path: String) -> Result<Reply> {
        let status = response.status();

        if status.is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| response.url().join(location).ok())
                .ok_or_else(|| {
                    Error::Cms(format!("Redirect from {} without a usable Location", path))
                })?;

            if target.path().starts_with(&self.login_path) {
                tracing::error!("CMS sent {} to the login page", path);
                return Err(Error::Unauthenticated { path });
            }
            return Ok(Reply::Redirect(target));
        }

        if !status.is_success() {
            tracing::error!("CMS request to {} failed with status {}", path, status);
            return Err(Error::CmsStatus {
                path,
                status: status.as_u16(),
            });
        }
        Ok(Reply::Page(response))
    }

    fn form_url(&self, form: &ArticleForm) -> Result<Url> {
        match &form.target {
            FormTarget::Create => self.endpoint(&["article", "create"]),
            FormTarget::Update { slug } => self.endpoint(&["article", "update", slug.as_str()]),
        }
    }
}

#[async_trait]
impl CmsService for CmsClient {
    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let url = self.endpoint(&["users", "login"])?;

        // The login page sets the csrftoken cookie the form post must echo
        match self.get(url.clone()).await {
            Ok(_) => {}
            Err(Error::Unauthenticated { .. }) => {}
            Err(e) => return Err(e),
        }
        let csrf_token = self
            .csrf_token()
            .ok_or_else(|| Error::LoginFailed("CMS did not issue a CSRF cookie".to_string()))?;

        let fields = [
            ("email", email),
            ("password", password),
            ("csrfmiddlewaretoken", csrf_token.as_str()),
        ];
        match self.post_form(url, &fields).await {
            Ok(Reply::Redirect(target)) => {
                tracing::info!("Signed in to the CMS as {}", email);
                tracing::debug!("Login redirected to {}", target);
                Ok(())
            }
            Ok(Reply::Page(_)) | Err(Error::Unauthenticated { .. }) => Err(Error::LoginFailed(
                format!("CMS rejected the credentials for {}", email),
            )),
            Err(e) => Err(e),
        }
    }

    async fn fetch_storage_config(&self) -> Result<FirebaseConfig> {
        let url = self.endpoint(&["firebase", "configuration", "file"])?;
        let response = match self.get(url).await? {
            Reply::Page(response) => response,
            Reply::Redirect(target) => {
                return Err(Error::Cms(format!(
                    "Storage configuration redirected to {}",
                    target
                )))
            }
        };
        let body = response.text().await?;

        let envelope: FirebaseConfigEnvelope = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse storage configuration: {}\nBody: {}", e, body);
            Error::Cms(format!("Failed to parse storage configuration: {}", e))
        })?;
        Ok(envelope.firebase_config)
    }

    async fn delete_article(&self, slug: &str) -> Result<()> {
        let url = self.endpoint(&["article", "delete", slug])?;
        self.get(url).await?;
        Ok(())
    }

    async fn delete_category(&self, pk: &str) -> Result<()> {
        let url = self.endpoint(&["categories", "delete", pk])?;
        self.get(url).await?;
        Ok(())
    }

    async fn reload_dashboard(&self, section: DashboardSection) -> Result<()> {
        let mut url = self.endpoint(&["dashboard"])?;
        url.query_pairs_mut().append_pair("q", section.query_value());
        self.get(url).await?;
        Ok(())
    }

    async fn submit_article(&self, form: &ArticleForm) -> Result<String> {
        let url = self.form_url(form)?;
        let path = url.path().to_string();

        match self.post_form(url, &form.form_fields()).await? {
            Reply::Redirect(target) => Ok(target.to_string()),
            // A valid form redirects; an invalid one is re-rendered in place
            Reply::Page(response) => {
                let body = response.text().await?;
                tracing::warn!("Article form was re-rendered by the CMS: {} bytes", body.len());
                Err(Error::Cms(format!("Article form was rejected at {}", path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{
        body_string_contains, header, header_regex, method, path, query_param,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CmsClient {
        CmsClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn login_redirect(from: &str) -> ResponseTemplate {
        ResponseTemplate::new(302).insert_header("location", format!("/users/login/?next={}", from))
    }

    #[tokio::test]
    async fn test_delete_article_hits_slug_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/delete/my-post/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_article("my-post").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_redirect_to_dashboard_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/delete/my-post/"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/dashboard/"))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_article("my-post").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_category_hits_pk_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/categories/delete/7/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Rust"))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_category("7").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_reports_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_article("gone").await.unwrap_err();
        match err {
            Error::CmsStatus { path, status } => {
                assert_eq!(path, "/article/delete/gone/");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_without_session_is_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/delete/my-post/"))
            .respond_with(login_redirect("/article/delete/my-post/"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<form>login</form>"))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).delete_article("my-post").await.unwrap_err();

        match err {
            Error::Unauthenticated { path } => assert_eq!(path, "/article/delete/my-post/"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_category_without_session_is_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/categories/delete/7/"))
            .respond_with(login_redirect("/categories/delete/7/"))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_category("7").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_fetch_storage_config() {
        let server = MockServer::start().await;

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
                    "appId": "1:42:web:abc",
                    "measurementId": "G-1"
                }
            })))
            .mount(&server)
            .await;

        let config = client_for(&server).fetch_storage_config().await.unwrap();

        assert_eq!(config.storage_bucket, "demo.appspot.com");
        assert_eq!(config.measurement_id.as_deref(), Some("G-1"));
    }

    #[tokio::test]
    async fn test_fetch_storage_config_rejects_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/firebase/configuration/file/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"Error": "Method not allowed!"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_storage_config().await.unwrap_err();
        assert!(matches!(err, Error::Cms(_)));
    }

    #[tokio::test]
    async fn test_reload_dashboard_section_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dashboard/"))
            .and(query_param("q", "categories"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .reload_dashboard(DashboardSection::Categories)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_article_returns_redirect_location() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/article/create/"))
            .and(header("x-csrftoken", "csrf"))
            .and(header_regex("cookie", "sessionid=sess"))
            .and(body_string_contains("thumbnail=https%3A%2F%2Fcdn.test%2Fa.png"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/article/details/hello/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut form = ArticleForm::new("1", "Hello", "body");
        form.thumbnail = Some("https://cdn.test/a.png".to_string());

        let location = client_for(&server)
            .with_session(Some("sess"), Some("csrf"))
            .submit_article(&form)
            .await
            .unwrap();

        assert_eq!(location, format!("{}/article/details/hello/", server.uri()));
    }

    #[tokio::test]
    async fn test_submit_without_session_is_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/article/create/"))
            .respond_with(login_redirect("/article/create/"))
            .expect(1)
            .mount(&server)
            .await;

        let form = ArticleForm::new("1", "Hello", "body");
        let err = client_for(&server).submit_article(&form).await.unwrap_err();

        match err {
            Error::Unauthenticated { path } => assert_eq!(path, "/article/create/"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_update_rejected_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/article/update/hello/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<form>errors</form>"))
            .mount(&server)
            .await;

        let form = ArticleForm::new("1", "Hello", "body").for_update("hello");
        let err = client_for(&server).submit_article(&form).await.unwrap_err();

        assert!(err.to_string().contains("rejected"));
    }

    #[tokio::test]
    async fn test_login_keeps_session_for_later_requests() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/login/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "csrftoken=tok123; Path=/")
                    .set_body_string("<form>login</form>"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login/"))
            .and(header("x-csrftoken", "tok123"))
            .and(body_string_contains("email=editor%40example.com"))
            .and(body_string_contains("csrfmiddlewaretoken=tok123"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/")
                    .insert_header("set-cookie", "sessionid=abc; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/article/delete/my-post/"))
            .and(header_regex("cookie", "sessionid=abc"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/dashboard/"))
            .expect(1)
            .mount(&server)
            .await;

        let cms = client_for(&server);
        cms.login("editor@example.com", "hunter22").await.unwrap();
        cms.delete_article("my-post").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/login/"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "csrftoken=tok; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<form>errors</form>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login("editor@example.com", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LoginFailed(_)));
    }
}
