//! Integration tests for the connection lifecycle.

use entiorm_client::{ConnectMode, ConnectionState, Credentials, Filter, OrmError};
use entiorm_testkit::prelude::*;

fn namespace_user(password: &str) -> Credentials {
    Credentials {
        username: "ns_user".into(),
        password: password.into(),
        namespace: Some(TEST_NAMESPACE.into()),
        database: None,
    }
}

#[tokio::test]
async fn connects_as_root_with_default_credentials() {
    init_test_logging();
    let orm = TestOrm::new();
    assert_eq!(orm.state(), ConnectionState::Disconnected);
    assert!(!orm.is_connected().await);

    orm.connect(ConnectMode::Root).await.unwrap();
    assert_eq!(orm.state(), ConnectionState::Connected);
    assert!(orm.is_connected().await);
}

#[tokio::test]
async fn wrong_password_fails_namespace_connect() {
    init_test_logging();
    let server = MemoryServer::new();
    server.add_account(namespace_user("secret"));

    let config = test_config().with_credentials("ns_user", "wrong");
    let orm = TestOrm::with_config(server, config);

    let err = orm.connect(ConnectMode::Namespace).await.unwrap_err();
    assert!(matches!(err, OrmError::Connection { .. }));
    assert!(err.to_string().starts_with("failed to connect to database"));
    assert_eq!(orm.state(), ConnectionState::Disconnected);
    assert!(!orm.is_connected().await);
}

#[tokio::test]
async fn namespace_and_database_users_sign_in_at_their_level() {
    init_test_logging();
    let server = MemoryServer::new();
    server.add_account(namespace_user("secret"));
    server.add_account(Credentials {
        username: "db_user".into(),
        password: "secret".into(),
        namespace: Some(TEST_NAMESPACE.into()),
        database: Some(TEST_DATABASE.into()),
    });

    let ns = TestOrm::with_config(
        server.clone(),
        test_config().with_credentials("ns_user", "secret"),
    );
    ns.connect(ConnectMode::Namespace).await.unwrap();
    assert!(ns.is_connected().await);

    // A namespace user is not a root user.
    assert!(ns.connect(ConnectMode::Root).await.is_err());

    let db = TestOrm::with_config(server, test_config().with_credentials("db_user", "secret"));
    db.connect(ConnectMode::Database).await.unwrap();
    assert!(db.is_connected().await);
}

#[tokio::test]
async fn unreachable_database_fails_connect() {
    init_test_logging();
    let orm = TestOrm::new();
    orm.server.set_reachable(false);

    let err = orm.connect(ConnectMode::Root).await.unwrap_err();
    assert!(matches!(err, OrmError::Connection { .. }));
    assert_eq!(orm.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn operations_before_connect_are_rejected() {
    let orm = TestOrm::new();
    let mut user = User::new("a@x.com", "A", 1);

    assert!(matches!(
        orm.create(&mut user).await,
        Err(OrmError::NotConnected)
    ));
    assert!(matches!(
        orm.find_unique::<User>(&Filter::new().eq("email", "a@x.com")).await,
        Err(OrmError::NotConnected)
    ));
    assert!(matches!(
        orm.raw("SELECT * FROM users", None).await,
        Err(OrmError::NotConnected)
    ));
    assert_eq!(orm.server.request_count(), 0);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let orm = TestOrm::connected().await;

    orm.disconnect().await.unwrap();
    orm.disconnect().await.unwrap();
    assert_eq!(orm.state(), ConnectionState::Disconnected);
    assert!(!orm.is_connected().await);

    let mut user = User::new("a@x.com", "A", 1);
    assert!(matches!(
        orm.create(&mut user).await,
        Err(OrmError::NotConnected)
    ));
}

#[tokio::test]
async fn failed_ping_releases_the_client() {
    init_test_logging();
    let orm = TestOrm::connected().await;

    orm.server.set_reachable(false);
    assert!(!orm.is_connected().await);
    assert_eq!(orm.state(), ConnectionState::Disconnected);

    orm.server.set_reachable(true);
    let all = orm.find_all::<User>().await;
    assert!(matches!(all, Err(OrmError::NotConnected)));

    orm.connect(ConnectMode::Root).await.unwrap();
    assert!(orm.is_connected().await);
}

#[tokio::test]
async fn failed_operation_keeps_connection_state() {
    let orm = TestOrm::connected().await;

    let err = orm.raw("UPDATE users SET age = 1", None).await.unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));
    assert_eq!(orm.state(), ConnectionState::Connected);
    assert!(orm.is_connected().await);
}

#[tokio::test]
async fn reconnect_replaces_the_client() {
    let orm = TestOrm::connected().await;
    let mut user = User::new("a@x.com", "A", 1);
    orm.create(&mut user).await.unwrap();

    orm.connect(ConnectMode::Root).await.unwrap();
    assert_eq!(orm.state(), ConnectionState::Connected);

    let found: Option<User> = orm
        .find_unique(&Filter::new().eq("email", "a@x.com"))
        .await
        .unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn scope_isolates_data() {
    let server = MemoryServer::new();
    let first = TestOrm::with_config(server.clone(), test_config());
    let second = TestOrm::with_config(server, test_config().with_database("other"));
    first.connect(ConnectMode::Root).await.unwrap();
    second.connect(ConnectMode::Root).await.unwrap();

    let mut user = User::new("a@x.com", "A", 1);
    first.create(&mut user).await.unwrap();

    let elsewhere: Vec<User> = second.find_all().await.unwrap();
    assert!(elsewhere.is_empty());
    assert_eq!(first.rows("users").len(), 1);
}
