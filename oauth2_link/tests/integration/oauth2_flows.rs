use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use oauth2_link::{
    AccountStore, CallbackOutcome, CoordinationError, OAuth2Error, SqlAccountStore,
    SqliteDataStore, activate_account, current_user, delete_link_core, handle_oauth2_callback,
    list_links_core, logout,
};

use crate::common::{
    MockProvider, TEST_ORIGIN, context_with_accounts, query_param, session_cookie, start_login,
    test_context,
};

/// Runs a full login and returns the outcome plus the new session id.
async fn login_via(
    ctx: &oauth2_link::AuthContext,
    provider: &str,
    session_id: Option<&str>,
    next: Option<&str>,
) -> (CallbackOutcome, String) {
    let pending = start_login(ctx, provider, session_id, next).await;
    let (headers, outcome) = handle_oauth2_callback(
        ctx,
        provider,
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await
    .expect("Callback should succeed");
    let session_id = session_cookie(ctx, &headers).expect("Login must set a session cookie");
    (outcome, session_id)
}

#[tokio::test]
async fn test_authorization_url_parameters() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;

    assert!(
        pending
            .auth_url
            .starts_with(&format!("{}/google/auth?", mock.base_url))
    );
    assert_eq!(
        query_param(&pending.auth_url, "response_type").as_deref(),
        Some("code")
    );
    assert_eq!(
        query_param(&pending.auth_url, "client_id").as_deref(),
        Some("google-client-id")
    );
    assert_eq!(
        query_param(&pending.auth_url, "redirect_uri"),
        Some(format!("{TEST_ORIGIN}/o2l/oauth/callback/google"))
    );
    assert_eq!(
        query_param(&pending.auth_url, "scope").as_deref(),
        Some("email profile")
    );
}

#[tokio::test]
async fn test_google_first_login_creates_account_and_link() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (outcome, session_id) = login_via(&ctx, "google", None, None).await;
    assert_eq!(outcome, CallbackOutcome::ProviderUserId("123".to_string()));

    let user = ctx
        .accounts
        .find_user_by_link("google", "123")
        .await
        .unwrap()
        .expect("Link should exist");
    assert!(user.username.starts_with("user_"));
    assert_eq!(user.first_name, "John");
    assert_eq!(user.last_name, "Doe");
    assert_eq!(user.email, "john@example.com");
    assert!(user.is_verified);
    assert!(!user.has_usable_password);

    let me = current_user(&ctx, Some(&session_id)).await.unwrap().unwrap();
    assert_eq!(me.id, user.id);

    let links = ctx.accounts.get_links(&user.id).await.unwrap();
    assert_eq!(links[0].access_info["access_token"], "mock-access-token");
    assert_eq!(links[0].user_info["email"], "john@example.com");
}

#[tokio::test]
async fn test_token_request_carries_code_and_redirect_uri() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    login_via(&ctx, "google", None, None).await;

    let requests = mock.token_requests();
    assert_eq!(requests.len(), 1);
    let form = &requests[0];
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "auth-code");
    assert_eq!(form["client_id"], "google-client-id");
    assert_eq!(form["client_secret"], "google-client-secret");
    assert_eq!(
        form["redirect_uri"],
        format!("{TEST_ORIGIN}/o2l/oauth/callback/google")
    );
}

#[tokio::test]
async fn test_returning_user_gets_same_account() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (_, first_session) = login_via(&ctx, "google", None, None).await;
    let first = current_user(&ctx, Some(&first_session)).await.unwrap().unwrap();

    let (_, second_session) = login_via(&ctx, "google", None, None).await;
    let second = current_user(&ctx, Some(&second_session)).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(ctx.accounts.get_links(&first.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_facebook_login_uses_profile_endpoint() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (outcome, _) = login_via(&ctx, "facebook", None, None).await;
    assert_eq!(outcome, CallbackOutcome::ProviderUserId("fb-42".to_string()));

    let user = ctx
        .accounts
        .find_user_by_link("facebook", "fb-42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.first_name, "Jane");
    assert!(user.is_verified);
}

#[tokio::test]
async fn test_facebook_profile_error_creates_nothing() {
    let mock = MockProvider::start().await;
    mock.configure(|b| b.facebook_profile_status = StatusCode::BAD_REQUEST);
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "facebook", None, None).await;
    let err = handle_oauth2_callback(
        &ctx,
        "facebook",
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unable to get user info for OAuth provider facebook."
    );
    assert!(
        ctx.accounts
            .find_user_by_link("facebook", "fb-42")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_token_endpoint_failure() {
    let mock = MockProvider::start().await;
    mock.configure(|b| b.token_status = StatusCode::BAD_REQUEST);
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;
    let err = handle_oauth2_callback(
        &ctx,
        "google",
        &pending.callback("bad-code"),
        Some(&pending.session_id),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "OAuth code - token exchange failed.");
}

#[tokio::test]
async fn test_next_path_redirects() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (outcome, _) = login_via(&ctx, "google", None, Some("/welcome")).await;
    assert_eq!(outcome, CallbackOutcome::Redirect("/welcome".to_string()));
}

#[tokio::test]
async fn test_offsite_next_is_ignored() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (outcome, _) = login_via(&ctx, "google", None, Some("https://evil.example.com/")).await;
    assert_eq!(outcome, CallbackOutcome::ProviderUserId("123".to_string()));
}

#[tokio::test]
async fn test_garbage_state_is_rejected() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;
    let mut response = pending.callback("auth-code");
    response.state = "not-a-state".to_string();

    let err = handle_oauth2_callback(&ctx, "google", &response, Some(&pending.session_id))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "State is missing or invalid.");
    assert!(mock.token_requests().is_empty());
}

#[tokio::test]
async fn test_state_from_another_session_is_rejected() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let victim = start_login(&ctx, "google", None, None).await;
    let attacker = start_login(&ctx, "google", None, None).await;

    let err = handle_oauth2_callback(
        &ctx,
        "google",
        &attacker.callback("auth-code"),
        Some(&victim.session_id),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "State is missing or invalid.");
}

#[tokio::test]
async fn test_callback_without_session_is_rejected() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;
    let err = handle_oauth2_callback(&ctx, "google", &pending.callback("auth-code"), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "State is missing or invalid.");
}

#[tokio::test]
async fn test_state_is_single_use() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;
    handle_oauth2_callback(
        &ctx,
        "google",
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await
    .unwrap();

    let replay = handle_oauth2_callback(
        &ctx,
        "google",
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await;
    assert!(replay.is_err());
    assert_eq!(mock.token_requests().len(), 1);
}

#[tokio::test]
async fn test_concurrent_callbacks_single_winner() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);
    let pending = start_login(&ctx, "google", None, None).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let ctx = ctx.clone();
            let response = pending.callback("auth-code");
            let session_id = pending.session_id.clone();
            tokio::spawn(async move {
                handle_oauth2_callback(&ctx, "google", &response, Some(&session_id))
                    .await
                    .is_ok()
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
}

#[tokio::test]
async fn test_unknown_provider() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let pending = start_login(&ctx, "google", None, None).await;
    let err = handle_oauth2_callback(
        &ctx,
        "github",
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        CoordinationError::OAuth2Error(OAuth2Error::ProviderNotFound(_))
    ));

    // The state was not consumed by the failed call
    handle_oauth2_callback(
        &ctx,
        "google",
        &pending.callback("auth-code"),
        Some(&pending.session_id),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_authenticated_caller_links_second_provider() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (_, session_id) = login_via(&ctx, "google", None, None).await;
    let me = current_user(&ctx, Some(&session_id)).await.unwrap().unwrap();

    let (outcome, new_session) = login_via(&ctx, "facebook", Some(&session_id), None).await;
    assert_eq!(outcome, CallbackOutcome::ProviderUserId("fb-42".to_string()));
    assert_ne!(new_session, session_id);

    let linked = ctx
        .accounts
        .find_user_by_link("facebook", "fb-42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.id, me.id);

    let links = list_links_core(&ctx, Some(&new_session)).await.unwrap();
    assert!(links["google"].contains_key("123"));
    assert!(links["facebook"].contains_key("fb-42"));

    // The pre-login session no longer authenticates
    assert!(current_user(&ctx, Some(&session_id)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_linking_identity_of_another_account_moves_it() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    // Someone logs in with facebook first and gets their own account
    let (_, other_session) = login_via(&ctx, "facebook", None, None).await;
    let other = current_user(&ctx, Some(&other_session)).await.unwrap().unwrap();

    mock.configure(|b| b.google_claims["sub"] = json!("456"));
    let (_, my_session) = login_via(&ctx, "google", None, None).await;
    let me = current_user(&ctx, Some(&my_session)).await.unwrap().unwrap();
    assert_ne!(me.id, other.id);

    login_via(&ctx, "facebook", Some(&my_session), None).await;
    let owner = ctx
        .accounts
        .find_user_by_link("facebook", "fb-42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.id, me.id);
    assert!(ctx.accounts.get_links(&other.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_account() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pending = start_login(&ctx, "google", None, None).await;
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            let (headers, _) = handle_oauth2_callback(
                &ctx,
                "google",
                &pending.callback("auth-code"),
                Some(&pending.session_id),
            )
            .await
            .unwrap();
            let session_id = session_cookie(&ctx, &headers).unwrap();
            current_user(&ctx, Some(&session_id)).await.unwrap().unwrap().id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_unlink_and_logout() {
    let mock = MockProvider::start().await;
    let ctx = test_context(&mock);

    let (_, session_id) = login_via(&ctx, "google", None, None).await;
    delete_link_core(&ctx, Some(&session_id), "google", "123")
        .await
        .unwrap();
    assert!(list_links_core(&ctx, Some(&session_id)).await.unwrap().is_empty());

    let headers = logout(&ctx, Some(&session_id)).await.unwrap();
    assert!(session_cookie(&ctx, &headers).is_some());
    assert!(current_user(&ctx, Some(&session_id)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_activation_grants_admin_to_listed_email() {
    let mock = MockProvider::start().await;
    let mut ctx = test_context(&mock);
    let mut settings = (*ctx.settings).clone();
    settings.admin_emails = vec!["john@example.com".to_string()];
    ctx.settings = Arc::new(settings);

    let (_, session_id) = login_via(&ctx, "google", None, None).await;
    let user = current_user(&ctx, Some(&session_id)).await.unwrap().unwrap();
    assert!(!user.is_staff);

    let activated = activate_account(&ctx, &user.id).await.unwrap();
    assert!(activated.is_staff);
    assert!(activated.is_superuser);
}

#[tokio::test]
async fn test_full_flow_with_sqlite_accounts() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqlAccountStore::new(Box::new(SqliteDataStore::new(pool)));
    store.init().await.unwrap();

    let mock = MockProvider::start().await;
    let ctx = context_with_accounts(&mock, Arc::new(store));

    let (outcome, session_id) = login_via(&ctx, "google", None, Some("/home")).await;
    assert_eq!(outcome, CallbackOutcome::Redirect("/home".to_string()));
    let me = current_user(&ctx, Some(&session_id)).await.unwrap().unwrap();

    let (_, session_id) = login_via(&ctx, "facebook", Some(&session_id), None).await;
    let links = list_links_core(&ctx, Some(&session_id)).await.unwrap();
    assert_eq!(links.len(), 2);

    let (_, again) = login_via(&ctx, "google", None, None).await;
    let returning = current_user(&ctx, Some(&again)).await.unwrap().unwrap();
    assert_eq!(returning.id, me.id);
}
