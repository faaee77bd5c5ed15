// tests/client_tests.rs

mod common;

use common::{PASSWORD, spawn_app};
use recofeed::{
    client::{ApiClient, AuthEvent, FeedMode, FeedView, GuardOutcome, NoticeKind, PostComposer, SessionGuard},
    error::AppError,
    models::post::{ImageFile, PostForm, PostKind},
    store::LikeStore,
};

async fn signed_in(address: &str, email: &str) -> ApiClient {
    let mut client = ApiClient::new(address).unwrap();
    client.sign_up(email, PASSWORD).await.expect("Sign up failed");
    client
}

fn form(kind: PostKind, title: &str, is_public: bool) -> PostForm {
    PostForm {
        kind: Some(kind),
        title: title.to_string(),
        is_public,
        ..PostForm::default()
    }
}

#[tokio::test]
async fn guard_redirects_when_signed_out() {
    let app = spawn_app().await;
    let client = ApiClient::new(&app.address).unwrap();

    match SessionGuard::default().mount(&client).await {
        GuardOutcome::Redirect(path) => assert_eq!(path, "/login"),
        GuardOutcome::Granted(_) => panic!("Signed-out user was granted access"),
    }
    // The mount subscription is dropped with the outcome
    assert_eq!(client.events().subscriber_count(), 0);
}

#[tokio::test]
async fn guard_redirects_for_an_ended_session() {
    let app = spawn_app().await;
    let mut client = signed_in(&app.address, "ana@example.com").await;
    let token = client.token().map(str::to_string);

    client.sign_out().await.unwrap();
    // Stale token still held by another tab
    client.set_token(token);

    let outcome = SessionGuard::new("/sign-in").mount(&client).await;
    assert!(!outcome.is_granted());
    assert!(matches!(outcome, GuardOutcome::Redirect(ref path) if path == "/sign-in"));
}

#[tokio::test]
async fn guard_follows_auth_changes_until_teardown() {
    let app = spawn_app().await;
    let mut client = signed_in(&app.address, "ana@example.com").await;

    let GuardOutcome::Granted(mut session) = SessionGuard::default().mount(&client).await else {
        panic!("Signed-in user was redirected");
    };
    assert_eq!(session.user().map(|u| u.email.as_str()), Some("ana@example.com"));
    assert!(session.is_subscribed());
    assert_eq!(client.events().subscriber_count(), 1);
    assert!(!session.sync());

    client.sign_out().await.unwrap();
    assert!(session.sync());
    assert!(session.user().is_none());

    client.sign_in("ana@example.com", PASSWORD).await.unwrap();
    let user = session.changed().await.expect("Channel closed").cloned();
    assert_eq!(user.map(|u| u.email), Some("ana@example.com".to_string()));

    session.teardown();
    assert_eq!(client.events().subscriber_count(), 0);
}

#[tokio::test]
async fn clients_can_share_one_auth_channel() {
    let app = spawn_app().await;
    let shell = ApiClient::new(&app.address).unwrap();
    let mut tab = ApiClient::new(&app.address)
        .unwrap()
        .with_events(shell.events().clone());
    let mut subscription = shell.events().subscribe();

    tab.sign_up("ana@example.com", PASSWORD).await.unwrap();
    assert!(matches!(subscription.next().await, Some(AuthEvent::SignedIn(user)) if user.email == "ana@example.com"));

    tab.sign_out().await.unwrap();
    assert_eq!(subscription.try_next(), Some(AuthEvent::SignedOut));
    assert!(!tab.is_signed_in());
}

#[tokio::test]
async fn composer_keeps_input_on_failure_and_resets_on_success() {
    let app = spawn_app().await;
    let client = signed_in(&app.address, "ana@example.com").await;
    let mut composer = PostComposer::new();

    composer.form = PostForm {
        kind: Some(PostKind::Book),
        description: Some("Spice".to_string()),
        ..PostForm::default()
    };
    let err = composer.submit(&client).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(composer.form.description.as_deref(), Some("Spice"));
    assert_eq!(composer.notice().map(|n| n.kind), Some(NoticeKind::Error));

    composer.form.title = "Dune".to_string();
    composer.form.is_public = true;
    let post = composer.submit(&client).await.unwrap();
    assert_eq!(post.title, "Dune");
    assert_eq!(post.description.as_deref(), Some("Spice"));
    assert_eq!(composer.form, PostForm::default());
    let notice = composer.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.title, "Post created");
}

#[tokio::test]
async fn composer_keeps_input_when_the_server_rejects() {
    let app = spawn_app().await;
    let client = signed_in(&app.address, "ana@example.com").await;
    let image = ImageFile {
        file_name: "cover.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: b"png".to_vec(),
    };

    let mut first = PostComposer::new();
    first.form = PostForm {
        image: Some(image.clone()),
        ..form(PostKind::Music, "Blue Train", true)
    };
    let post = first.submit(&client).await.unwrap();
    assert_eq!(post.image_url.as_deref(), Some("public/cover.png"));

    let mut second = PostComposer::new();
    second.form = PostForm {
        image: Some(image),
        ..form(PostKind::Music, "Giant Steps", true)
    };
    let err = second.submit(&client).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(second.form.title, "Giant Steps");
    assert_eq!(second.notice().map(|n| n.kind), Some(NoticeKind::Error));
}

#[tokio::test]
async fn feed_view_toggles_against_the_server() {
    let app = spawn_app().await;
    let author = signed_in(&app.address, "ana@example.com").await;
    let reader = signed_in(&app.address, "bob@example.com").await;

    let post = author
        .create_post(&form(PostKind::SeriesMovie, "The Wire", true))
        .await
        .unwrap();
    assert_eq!(post.kind, PostKind::SeriesMovie);

    let mut view = FeedView::new(FeedMode::Public);
    view.load(&reader).await.unwrap();
    assert_eq!(view.list().len(), 1);

    let toggle = view.toggle_like(&reader, post.id).await.unwrap();
    assert!(toggle.liked);
    let entry = view.list().get(post.id).unwrap();
    assert_eq!((entry.likes, entry.liked_by_user), (1, true));

    view.toggle_like(&reader, post.id).await.unwrap();
    let entry = view.list().get(post.id).unwrap();
    assert_eq!((entry.likes, entry.liked_by_user), (0, false));

    // The local list agrees with a fresh read
    let local = view.list().clone();
    view.load(&reader).await.unwrap();
    assert_eq!(view.list(), &local);
}

#[tokio::test]
async fn feed_view_rejects_anonymous_like_without_a_request() {
    let app = spawn_app().await;
    let author = signed_in(&app.address, "ana@example.com").await;
    let post = author.create_post(&form(PostKind::Book, "Dune", true)).await.unwrap();

    let anonymous = ApiClient::new(&app.address).unwrap();
    let mut view = FeedView::new(FeedMode::Public);
    view.load(&anonymous).await.unwrap();

    let err = view.toggle_like(&anonymous, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(_)));
    assert_eq!(view.notice().map(|n| n.kind), Some(NoticeKind::Error));

    let entry = view.list().get(post.id).unwrap();
    assert_eq!((entry.likes, entry.liked_by_user), (0, false));
    assert_eq!(app.store.count_likes(post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn own_feed_lists_private_posts() {
    let app = spawn_app().await;
    let author = signed_in(&app.address, "ana@example.com").await;
    author.create_post(&form(PostKind::Book, "Public pick", true)).await.unwrap();
    author.create_post(&form(PostKind::Book, "Secret pick", false)).await.unwrap();

    let mut own = FeedView::new(FeedMode::Own);
    own.load(&author).await.unwrap();
    assert_eq!(own.mode(), FeedMode::Own);
    assert_eq!(own.list().len(), 2);

    let mut public = FeedView::new(FeedMode::Public);
    public.load(&author).await.unwrap();
    assert_eq!(public.list().len(), 1);
}

#[tokio::test]
async fn failed_load_leaves_an_empty_list() {
    // Nothing listens on port 9 locally
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let mut view = FeedView::new(FeedMode::Public);

    assert!(view.load(&client).await.is_err());
    assert!(view.list().is_empty());
    let notice = view.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
}

#[tokio::test]
async fn federated_url_comes_from_the_redirect() {
    let app = common::spawn_app_with_oauth(Some("https://id.example.com/authorize")).await;
    let client = ApiClient::new(&app.address).unwrap();

    let url = client.federated_sign_in_url("google").await.unwrap();
    assert_eq!(url.host_str(), Some("id.example.com"));
    assert!(url.query_pairs().any(|(k, v)| k == "provider" && v == "google"));

    let err = client.federated_sign_in_url("myspace").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
