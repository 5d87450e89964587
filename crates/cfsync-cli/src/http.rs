//! HTTP implementation of [`AccountDirectory`] against the platform REST API.

use std::time::Duration;

use async_trait::async_trait;
use cfsync_core::context::Context;
use cfsync_core::directory::{AccountDirectory, DirectoryError, DirectoryResult};
use cfsync_core::model::{CreateTeam, CreateUser, CreatedTeam, CurrentUser, Rule, Team, User};
use cfsync_core::rules::CanonicalRule;
use reqwest::{Client, Method, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Client-side timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CreateRulesBody<'a> {
    create: &'a [CanonicalRule],
}

/// One account context reached over HTTP.
#[derive(Clone)]
pub struct HttpDirectory {
    client: Client,
    base: Url,
    token: String,
}

impl HttpDirectory {
    /// Client for `context`, using its URL and raw token.
    ///
    /// # Errors
    ///
    /// Fails when the context URL is not a valid absolute URL.
    pub fn from_context(context: &Context) -> DirectoryResult<Self> {
        Self::new(&context.url, &context.token, DEFAULT_TIMEOUT)
    }

    pub fn new(base_url: &str, token: &str, timeout: Duration) -> DirectoryResult<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|err| DirectoryError::Transport(format!("invalid base url {base_url}: {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base,
            token: token.to_string(),
        })
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> DirectoryResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self
            .base
            .join(path)
            .map_err(|err| DirectoryError::Transport(format!("invalid path {path}: {err}")))?;

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(header::AUTHORIZATION, &self.token)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let text = response
            .text()
            .await
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;

        if !status.is_success() {
            let body = error_body(&text, is_json);
            debug!(status = status.as_u16(), %url, %body, "request failed");
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|err| DirectoryError::Decode(format!("{url}: {err}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> DirectoryResult<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> DirectoryResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, Some(body)).await
    }
}

/// JSON error bodies are re-encoded compactly; anything else is kept as text.
fn error_body(text: &str, is_json: bool) -> String {
    if is_json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
            return value.to_string();
        }
    }
    text.to_string()
}

#[async_trait]
impl AccountDirectory for HttpDirectory {
    async fn current_user(&self) -> DirectoryResult<CurrentUser> {
        self.get("api/user").await
    }

    async fn teams(&self) -> DirectoryResult<Vec<Team>> {
        self.get("api/team").await
    }

    async fn users(&self, account_id: &str) -> DirectoryResult<Vec<User>> {
        self.get(&format!("api/accounts/{account_id}/users")).await
    }

    async fn create_team(&self, team: &CreateTeam) -> DirectoryResult<CreatedTeam> {
        self.post("api/team", team).await
    }

    async fn add_user(&self, account_id: &str, user: &CreateUser) -> DirectoryResult<User> {
        self.post(&format!("api/accounts/{account_id}/adduser"), user)
            .await
    }

    async fn set_user_as_admin(
        &self,
        account_id: &str,
        user_id: &str,
    ) -> DirectoryResult<serde_json::Value> {
        self.send::<_, ()>(
            Method::POST,
            &format!("api/accounts/{account_id}/{user_id}/admin"),
            None,
        )
        .await
    }

    async fn rules(&self) -> DirectoryResult<Vec<Rule>> {
        self.get("api/abac").await
    }

    async fn create_rules(&self, rules: &[CanonicalRule]) -> DirectoryResult<serde_json::Value> {
        self.post("api/abac/batch", &CreateRulesBody { create: rules })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer) -> HttpDirectory {
        HttpDirectory::new(&server.uri(), "secret-token", DEFAULT_TIMEOUT).expect("client builds")
    }

    #[tokio::test]
    async fn current_user_sends_raw_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .and(header("Authorization", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "u1",
                "userName": "alice",
                "email": "alice@x.com",
                "activeAccountName": "prod",
                "account": [{"id": "a1", "name": "prod", "admins": ["u1"]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = directory(&server).current_user().await.expect("user");
        assert_eq!(user.active_account().map(|a| a.id.as_str()), Some("a1"));
    }

    #[tokio::test]
    async fn add_user_posts_user_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/a1/adduser"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"userDetails": "b@x.com"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"_id": "u2", "email": "b@x.com"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = directory(&server)
            .add_user(
                "a1",
                &CreateUser {
                    user_details: "b@x.com".into(),
                },
            )
            .await
            .expect("user added");
        assert_eq!(user.id, "u2");
    }

    #[tokio::test]
    async fn create_team_accepts_member_ids_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/team"))
            .and(body_json(json!({"name": "QA", "tags": [], "users": ["t9"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "t-qa",
                "name": "QA",
                "tags": [],
                "users": ["t9"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let team = directory(&server)
            .create_team(&CreateTeam {
                name: "QA".into(),
                tags: Vec::new(),
                users: vec!["t9".into()],
            })
            .await
            .expect("team created");
        assert_eq!(team.id, "t-qa");
        assert_eq!(team.users, ["t9"]);
    }

    #[tokio::test]
    async fn rules_are_created_in_one_batch_and_empty_body_is_accepted() {
        let server = MockServer::start().await;
        let rule = CanonicalRule {
            teams: vec!["t1".into()],
            actions: vec!["run".into()],
            tags: vec!["prod".into()],
            resource: "pipeline".into(),
            related_resource: None,
        };
        Mock::given(method("POST"))
            .and(path("/api/abac/batch"))
            .and(body_json(json!({"create": [{
                "teams": ["t1"],
                "actions": ["run"],
                "tags": ["prod"],
                "resource": "pipeline"
            }]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let value = directory(&server)
            .create_rules(&[rule])
            .await
            .expect("rules created");
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn non_success_status_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/team"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden"})))
            .mount(&server)
            .await;

        let err = directory(&server).teams().await.expect_err("forbidden");
        assert_eq!(
            err,
            DirectoryError::Status {
                status: 403,
                body: r#"{"message":"forbidden"}"#.into(),
            }
        );
    }

    #[tokio::test]
    async fn base_url_path_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tenant/api/abac"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let directory = HttpDirectory::new(
            &format!("{}/tenant", server.uri()),
            "secret-token",
            DEFAULT_TIMEOUT,
        )
        .expect("client builds");
        assert!(directory.rules().await.expect("rules").is_empty());
    }

    #[test]
    fn plain_text_error_body_is_kept_verbatim() {
        assert_eq!(error_body("bad gateway", false), "bad gateway");
        assert_eq!(error_body("{ \"a\": 1 }", true), r#"{"a":1}"#);
    }
}
