//! Lifecycle flow tests using wiremock
//!
//! These tests drive the multi-step create/read/update/delete flows and
//! check which calls reach the server.

use kanidm_tf::kanidm::oauth2::ScopeMap;
use kanidm_tf::resource::group::GroupSpec;
use kanidm_tf::resource::oauth2::OAuth2Spec;
use kanidm_tf::resource::person::{CredentialSetup, PersonSpec};
use kanidm_tf::resource::{group, oauth2, person, service_account};
use kanidm_tf::{ClientConfig, Error, ErrorKind, KanidmClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> KanidmClient {
    KanidmClient::new(ClientConfig::new(server.uri(), "test-token")).expect("client should build")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scope_map(group: &str, scopes: &[&str]) -> ScopeMap {
    ScopeMap {
        group: group.to_string(),
        scopes: strings(scopes),
    }
}

mod person_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_create_with_reset_token_and_mail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/person"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/person/alice/_credential/_update_intent/3600"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "reset-abc"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/v1/person/alice"))
            .and(body_json(json!({"attrs": {"mail": ["alice@example.com"]}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/person/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attrs": {
                    "name": ["alice"],
                    "displayname": ["Alice"],
                    "mail": ["alice@example.com"]
                }
            })))
            .mount(&server)
            .await;

        let spec = PersonSpec {
            id: "alice".to_string(),
            display_name: "Alice".to_string(),
            mail: Some(strings(&["alice@example.com"])),
            credential: Some(CredentialSetup::reset_token()),
        };

        let state = person::create(&client_for(&server), &spec).await.unwrap();
        assert_eq!(state.credential_reset_token.as_deref(), Some("reset-abc"));
        assert_eq!(state.mail, strings(&["alice@example.com"]));
    }

    #[tokio::test]
    async fn test_create_password_failure_is_incomplete() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/person"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/person/alice/_credential/_update_intent"))
            .respond_with(ResponseTemplate::new(400).set_body_string("password too weak"))
            .mount(&server)
            .await;

        let spec = PersonSpec {
            id: "alice".to_string(),
            display_name: "Alice".to_string(),
            mail: None,
            credential: Some(CredentialSetup::Password("short".to_string())),
        };

        let err = person::create(&client_for(&server), &spec).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incomplete);
        assert!(err.to_string().contains("credential setup"));
    }

    #[tokio::test]
    async fn test_read_missing_is_none_and_delete_missing_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/person/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/v1/person/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(person::read(&client, "ghost").await.unwrap().is_none());
        assert!(person::delete(&client, "ghost").await.is_ok());
    }
}

mod service_account_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_read_surfaces_auth_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/service_account/ci-bot"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = service_account::read(&client_for(&server), "ci-bot").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

mod group_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_create_with_members_reads_back() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/group"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/v1/group/developers"))
            .and(body_json(json!({"attrs": {"member": ["alice", "bob"]}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/group/developers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attrs": {
                    "name": ["developers"],
                    "description": ["Dev team"],
                    "member": ["alice", "bob"]
                }
            })))
            .mount(&server)
            .await;

        let spec = GroupSpec {
            id: "developers".to_string(),
            description: "Dev team".to_string(),
            members: Some(strings(&["alice", "bob"])),
        };

        let created = group::create(&client_for(&server), &spec).await.unwrap();
        assert_eq!(created.description, "Dev team");
        assert!(group::same_members(&created.members, &strings(&["bob", "alice"])));
    }

    #[tokio::test]
    async fn test_create_without_members_skips_member_update() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/group"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/v1/group/ops"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/group/ops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attrs": {"name": ["ops"]}})))
            .mount(&server)
            .await;

        let spec = GroupSpec {
            id: "ops".to_string(),
            members: Some(Vec::new()),
            ..GroupSpec::default()
        };

        let created = group::create(&client_for(&server), &spec).await.unwrap();
        assert!(created.members.is_empty());
    }

    #[tokio::test]
    async fn test_sync_members_adds_and_removes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/group/developers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attrs": {"name": ["developers"], "member": ["alice", "carol"]}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/group/developers/_attr/member"))
            .and(body_json(json!({"attrs": ["bob"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/v1/group/developers/_attr/member"))
            .and(body_json(json!({"attrs": ["carol"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let change = group::sync_members(&client_for(&server), "developers", &strings(&["alice", "bob"]))
            .await
            .unwrap();
        assert_eq!(change.add, strings(&["bob"]));
        assert_eq!(change.remove, strings(&["carol"]));
    }
}

mod oauth2_lifecycle {
    use super::*;

    fn grafana_entry() -> serde_json::Value {
        json!({
            "attrs": {
                "name": ["grafana"],
                "displayname": ["Grafana"],
                "oauth2_rs_origin": ["https://g.example.com/"],
                "oauth2_rs_origin_landing": ["https://g.example.com/login"],
                "oauth2_rs_basic_secret": []
            }
        })
    }

    #[tokio::test]
    async fn test_create_configures_and_keeps_secret() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth2/_basic"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/grafana/_basic_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("s3cr3t")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/v1/oauth2/grafana"))
            .and(body_json(json!({
                "attrs": {
                    "displayname": ["Grafana"],
                    "oauth2_rs_origin": ["https://g.example.com/"],
                    "oauth2_rs_origin_landing": ["https://g.example.com/login"]
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth2/grafana/_scopemap/developers"))
            .and(body_json(json!(["openid", "email"])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/grafana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grafana_entry()))
            .mount(&server)
            .await;

        let spec = OAuth2Spec {
            name: "grafana".to_string(),
            display_name: "Grafana".to_string(),
            origin: "https://g.example.com/".to_string(),
            redirect_uris: Some(strings(&["https://g.example.com/login"])),
            scope_maps: vec![scope_map("developers", &["openid", "email"])],
        };

        let state = oauth2::create(&client_for(&server), &spec).await.unwrap();
        assert_eq!(state.client.origin, "https://g.example.com");
        assert!(!state.client.is_public);
        assert_eq!(state.client.client_secret.as_deref(), Some("s3cr3t"));
        assert_eq!(state.scope_maps, spec.scope_maps);
    }

    #[tokio::test]
    async fn test_read_fetches_secret_only_when_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/grafana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grafana_entry()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/grafana/_basic_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("fetched")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth2/grafana/_basic_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("rotated")))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);

        let known = oauth2::read(&client, "grafana", Some("kept")).await.unwrap().unwrap();
        assert_eq!(known.client_secret.as_deref(), Some("kept"));

        let imported = oauth2::read(&client, "grafana", None).await.unwrap().unwrap();
        assert_eq!(imported.client_secret.as_deref(), Some("fetched"));
    }

    #[tokio::test]
    async fn test_read_rejects_public_client() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/spa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attrs": {"name": ["spa"]}})))
            .mount(&server)
            .await;

        let err = oauth2::read(&client_for(&server), "spa", None).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedClientKind { .. }));
    }

    #[tokio::test]
    async fn test_update_diffs_scope_maps() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/oauth2/grafana"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/v1/oauth2/grafana/_scopemap/admins"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/v1/oauth2/grafana/_scopemap/developers"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth2/grafana/_scopemap/developers"))
            .and(body_json(json!(["openid"])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/oauth2/grafana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grafana_entry()))
            .mount(&server)
            .await;

        let previous = vec![
            scope_map("admins", &["openid", "groups"]),
            scope_map("developers", &["openid", "email"]),
        ];
        let spec = OAuth2Spec {
            name: "grafana".to_string(),
            scope_maps: vec![scope_map("developers", &["openid"])],
            ..OAuth2Spec::default()
        };

        let state = oauth2::update(&client_for(&server), &spec, &previous).await.unwrap();
        assert_eq!(state.scope_maps, spec.scope_maps);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/oauth2/grafana"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(oauth2::delete(&client_for(&server), "grafana").await.is_ok());
    }
}
