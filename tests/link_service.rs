mod common;

use chrono::{Duration, Utc};
use common::{ScriptedGenerator, TestApp};
use shortcode::application::services::{CreateLink, LinkPolicy, Resolution};
use shortcode::domain::entities::{
    NewUrlMapping, Principal, RedirectKind, UrlMapping, UrlMappingPatch, Visitor,
};
use shortcode::domain::repositories::UrlRepository;
use shortcode::error::AppError;
use std::sync::Arc;

fn request(long: &str, code: Option<&str>, kind: Option<RedirectKind>) -> CreateLink {
    CreateLink {
        long_form: long.to_string(),
        short_code: code.map(str::to_string),
        redirect_kind: kind,
    }
}

async fn occupy(app: &TestApp, code: &str) {
    app.urls
        .insert(NewUrlMapping {
            long_form: "https://occupied.example".to_string(),
            short_code: code.to_string(),
            redirect_kind: RedirectKind::Permanent,
            owner_id: 99,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeated_creation_reuses_mapping() {
    let app = TestApp::new();
    let alice = Principal::user(42, false);

    let first = app
        .link_service
        .create(
            &alice,
            request("https://example.com/", None, Some(RedirectKind::Temporary)),
        )
        .await
        .unwrap();
    let second = app
        .link_service
        .create(
            &alice,
            request("https://example.com/", None, Some(RedirectKind::Temporary)),
        )
        .await
        .unwrap();

    assert!(!first.is_reused());
    assert!(second.is_reused());
    assert_eq!(first.mapping().short_code, second.mapping().short_code);
    assert!(second.mapping().modified_at >= first.mapping().modified_at);
    assert_eq!(app.urls.len().await, 1);
}

#[tokio::test]
async fn test_reuse_is_per_owner() {
    let app = TestApp::new();

    let alice = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://example.com/", None, None),
        )
        .await
        .unwrap();
    let bob = app
        .link_service
        .create(
            &Principal::user(7, true),
            request("https://example.com/", None, None),
        )
        .await
        .unwrap();

    assert_ne!(alice.mapping().short_code, bob.mapping().short_code);
    assert_eq!(app.urls.len().await, 2);
}

#[tokio::test]
async fn test_anonymous_creation_reuses_mapping() {
    let app = TestApp::new();

    let first = app
        .link_service
        .create(
            &Principal::anonymous(),
            request("https://example.com/", None, None),
        )
        .await
        .unwrap();
    let second = app
        .link_service
        .create(
            &Principal::anonymous(),
            request("https://example.com/", None, Some(RedirectKind::Temporary)),
        )
        .await
        .unwrap();

    assert!(second.is_reused());
    assert_eq!(first.mapping().short_code, second.mapping().short_code);
    assert_eq!(second.mapping().redirect_kind, RedirectKind::Permanent);
}

#[tokio::test]
async fn test_collision_budget_exhausted() {
    let app = TestApp::with_generator(
        ScriptedGenerator::new(&["coll01", "coll02"]),
        LinkPolicy::default(),
    );
    occupy(&app, "coll01").await;
    occupy(&app, "coll02").await;

    let err = app
        .link_service
        .create_with_retry(
            "https://example.com/".to_string(),
            None,
            RedirectKind::Permanent,
            42,
            2,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MaxCollision { attempts: 2 }));
    assert_eq!(app.generator.calls(), 2);
}

#[tokio::test]
async fn test_collision_resolved_within_budget() {
    let app = TestApp::with_generator(
        ScriptedGenerator::new(&["coll01", "coll02", "free01"]),
        LinkPolicy::default(),
    );
    occupy(&app, "coll01").await;
    occupy(&app, "coll02").await;

    let mapping = app
        .link_service
        .create_with_retry(
            "https://example.com/".to_string(),
            None,
            RedirectKind::Permanent,
            42,
            3,
        )
        .await
        .unwrap();

    assert_eq!(mapping.short_code, "free01");
    assert_eq!(app.generator.calls(), 3);
}

#[tokio::test]
async fn test_explicit_code_is_never_regenerated() {
    let app = TestApp::new();
    occupy(&app, "taken1").await;

    let err = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://example.com/", Some("taken1"), None),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MaxCollision { attempts: 1 }));
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_explicit_codes_single_winner() {
    let app = TestApp::new();
    let service = app.link_service.clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .create(
                        &Principal::user(42, false),
                        request(&format!("https://example.com/{i}"), Some("shared"), None),
                    )
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, AppError::MaxCollision { attempts: 1 })),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(app.urls.len().await, 1);
}

#[tokio::test]
async fn test_expiry_boundary() {
    let app = TestApp::new();
    let mapping = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://example.com/", None, Some(RedirectKind::Permanent)),
        )
        .await
        .unwrap()
        .into_mapping();

    let ttl = app.link_service.policy().ttl;
    let deadline = mapping.modified_at + ttl;

    let live = app
        .link_service
        .resolve_at(&mapping.short_code, Visitor::default(), deadline)
        .await
        .unwrap();
    assert_eq!(
        live,
        Resolution::Redirect {
            long_form: "https://example.com/".to_string(),
            redirect_kind: RedirectKind::Permanent,
        }
    );

    let expired = app
        .link_service
        .resolve_at(
            &mapping.short_code,
            Visitor::default(),
            deadline + Duration::microseconds(1),
        )
        .await
        .unwrap();
    assert_eq!(
        expired,
        Resolution::Expired {
            expired_at: deadline
        }
    );
}

#[tokio::test]
async fn test_anonymous_mappings_record_no_analytics() {
    let mut app = TestApp::new();

    let anonymous = app
        .link_service
        .create(
            &Principal::anonymous(),
            request("https://anon.example/", None, None),
        )
        .await
        .unwrap()
        .into_mapping();
    let owned = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://owned.example/", None, None),
        )
        .await
        .unwrap()
        .into_mapping();

    for _ in 0..3 {
        app.link_service
            .resolve(&anonymous.short_code, Visitor::default())
            .await
            .unwrap();
    }
    app.link_service
        .resolve(&owned.short_code, Visitor::default())
        .await
        .unwrap();

    assert_eq!(app.drain_analytics().await, 1);

    let (_, entries) = app
        .link_service
        .analytics(&Principal::user(42, false), &owned.short_code)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url_id, owned.id);
}

#[tokio::test]
async fn test_delete_cascades_to_analytics() {
    let mut app = TestApp::new();
    let alice = Principal::user(42, false);

    let mapping = app
        .link_service
        .create(&alice, request("https://example.com/", None, None))
        .await
        .unwrap()
        .into_mapping();

    let visitor = Visitor {
        ip: Some("203.0.113.7".to_string()),
        user_agent: Some("curl/8.5.0".to_string()),
        referrer: None,
    };
    app.link_service
        .resolve(&mapping.short_code, visitor)
        .await
        .unwrap();
    app.drain_analytics().await;
    assert_eq!(app.analytics.len().await, 1);

    app.link_service
        .delete(&alice, &mapping.short_code)
        .await
        .unwrap();

    assert!(app.analytics.is_empty().await);
    assert_eq!(
        app.link_service
            .resolve(&mapping.short_code, Visitor::default())
            .await
            .unwrap(),
        Resolution::NotFound
    );
}

#[tokio::test]
async fn test_visit_queued_before_delete_leaves_no_analytics() {
    let mut app = TestApp::new();
    let alice = Principal::user(42, false);

    let mapping = app
        .link_service
        .create(&alice, request("https://example.com/", None, None))
        .await
        .unwrap()
        .into_mapping();

    app.link_service
        .resolve(&mapping.short_code, Visitor::default())
        .await
        .unwrap();

    app.link_service
        .delete(&alice, &mapping.short_code)
        .await
        .unwrap();

    assert_eq!(app.drain_analytics().await, 0);
    assert!(app.analytics.is_empty().await);
}

#[tokio::test]
async fn test_delete_by_other_owner_is_not_found() {
    let app = TestApp::new();

    let mapping = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://example.com/", None, None),
        )
        .await
        .unwrap()
        .into_mapping();

    let err = app
        .link_service
        .delete(&Principal::user(7, true), &mapping.short_code)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
    assert_eq!(app.urls.len().await, 1);
}

#[tokio::test]
async fn test_edit_revives_expired_mapping() {
    let app = TestApp::new();
    let ttl = app.link_service.policy().ttl;
    let long_ago = Utc::now() - ttl - Duration::minutes(1);

    app.urls
        .put(UrlMapping {
            id: 1,
            long_form: "https://old.example/".to_string(),
            short_code: "stale1".to_string(),
            redirect_kind: RedirectKind::Permanent,
            owner_id: 42,
            created_at: long_ago,
            modified_at: long_ago,
        })
        .await;

    assert!(matches!(
        app.link_service
            .resolve("stale1", Visitor::default())
            .await
            .unwrap(),
        Resolution::Expired { .. }
    ));

    let patch = UrlMappingPatch {
        long_form: Some("https://new.example/".to_string()),
        ..Default::default()
    };
    app.link_service
        .edit(&Principal::user(42, false), "stale1", patch)
        .await
        .unwrap();

    assert_eq!(
        app.link_service
            .resolve("stale1", Visitor::default())
            .await
            .unwrap(),
        Resolution::Redirect {
            long_form: "https://new.example/".to_string(),
            redirect_kind: RedirectKind::Permanent,
        }
    );
}

#[tokio::test]
async fn test_edit_moves_short_code() {
    let app = TestApp::new();
    let alice = Principal::user(42, false);

    let mapping = app
        .link_service
        .create(&alice, request("https://example.com/", Some("before1"), None))
        .await
        .unwrap()
        .into_mapping();

    let patch = UrlMappingPatch {
        short_code: Some("after01".to_string()),
        ..Default::default()
    };
    let edited = app
        .link_service
        .edit(&alice, &mapping.short_code, patch)
        .await
        .unwrap();

    assert_eq!(edited.id, mapping.id);
    assert_eq!(
        app.link_service
            .resolve("before1", Visitor::default())
            .await
            .unwrap(),
        Resolution::NotFound
    );
    assert!(matches!(
        app.link_service
            .resolve("after01", Visitor::default())
            .await
            .unwrap(),
        Resolution::Redirect { .. }
    ));
}

#[tokio::test]
async fn test_created_then_expired_example() {
    let app = TestApp::new();

    let mapping = app
        .link_service
        .create(
            &Principal::user(42, false),
            request("https://example.com", Some(""), Some(RedirectKind::Permanent)),
        )
        .await
        .unwrap()
        .into_mapping();

    assert_eq!(mapping.short_code.len(), 6);
    assert_eq!(mapping.owner_id, 42);

    let within = app
        .link_service
        .resolve_at(
            &mapping.short_code,
            Visitor::default(),
            mapping.modified_at + Duration::hours(1),
        )
        .await
        .unwrap();
    assert_eq!(
        within,
        Resolution::Redirect {
            long_form: "https://example.com".to_string(),
            redirect_kind: RedirectKind::Permanent,
        }
    );

    let after = app
        .link_service
        .resolve_at(
            &mapping.short_code,
            Visitor::default(),
            mapping.modified_at + Duration::hours(7),
        )
        .await
        .unwrap();
    assert!(matches!(after, Resolution::Expired { .. }));
}
