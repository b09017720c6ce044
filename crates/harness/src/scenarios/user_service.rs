use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ArgumentMatcher, FakeLogger, HarnessConfig, Logger, Matcher, Surface, TestHarness, Times,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

impl User {
    fn new(id: u32, name: &str, email: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

trait UserRepository: Send + Sync {
    fn get_by_id(&self, id: u32) -> impl Future<Output = Result<Option<User>>> + Send;
    fn get_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send;
    fn exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;
    fn add(&self, user: &User) -> impl Future<Output = Result<()>> + Send;
}

struct UserRepositoryDouble(Surface);

impl UserRepository for UserRepositoryDouble {
    fn get_by_id(&self, id: u32) -> impl Future<Output = Result<Option<User>>> + Send {
        let result = self.0.call("get_by_id", (id,)).map_err(anyhow::Error::from);
        async move { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send {
        let result = self
            .0
            .call_or_default("get_all", ())
            .map_err(anyhow::Error::from);
        async move { result }
    }

    fn exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send {
        let result = self
            .0
            .call_or_default("exists", (email,))
            .map_err(anyhow::Error::from);
        async move { result }
    }

    fn add(&self, user: &User) -> impl Future<Output = Result<()>> + Send {
        let result = self.0.call("add", (user,)).map_err(anyhow::Error::from);
        async move { result }
    }
}

struct UserService<R, L> {
    repository: R,
    logger: L,
}

impl<R: UserRepository, L: Logger> UserService<R, L> {
    async fn get_user(&self, id: u32) -> Result<Option<User>> {
        self.logger.debug(&format!("Getting user {id}"));
        self.repository.get_by_id(id).await
    }

    async fn user_names(&self) -> Result<Vec<String>> {
        let users = self.repository.get_all().await?;
        Ok(users.into_iter().map(|u| u.name).collect())
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        if self.repository.exists(email).await? {
            self.logger
                .warn(&format!("User with email {email} already exists"));
            bail!("User with email {email} already exists");
        }

        let user = User::new(0, name, email);
        self.repository.add(&user).await?;
        self.logger.info(&format!("Created user {name}"));
        Ok(user)
    }
}

fn service(harness: &TestHarness) -> UserService<UserRepositoryDouble, FakeLogger> {
    UserService {
        repository: UserRepositoryDouble(harness.surface("UserRepository")),
        logger: harness.logger("UserService"),
    }
}

#[tokio::test]
async fn test_get_user_returns_configured_user() {
    let harness = TestHarness::strict();
    let alice = User::new(1, "Alice", "alice@example.com");
    harness
        .surface("UserRepository")
        .expect("get_by_id")
        .with_args((1,))
        .returns(&alice)
        .register()
        .unwrap();
    harness
        .surface("UserRepository")
        .expect("get_by_id")
        .with_args((2,))
        .returns(Option::<User>::None)
        .register()
        .unwrap();

    let subject = service(&harness);

    assert_eq!(subject.get_user(1).await.unwrap(), Some(alice));
    assert_eq!(subject.get_user(2).await.unwrap(), None);
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_create_user_passes_new_user_to_repository() {
    let harness = TestHarness::strict();
    let repository = harness.surface("UserRepository");
    let added = Arc::new(Mutex::new(Vec::new()));

    repository
        .expect("exists")
        .with(vec![Matcher::any()])
        .returns(false)
        .register()
        .unwrap();
    let sink = added.clone();
    repository
        .expect("add")
        .with(vec![Matcher::satisfying("user named Bob", |user: &User| {
            user.name == "Bob"
        })])
        .calls(move |arguments| {
            sink.lock().unwrap().push(arguments[0].clone());
            Ok(Value::Null)
        })
        .register()
        .unwrap();

    let user = service(&harness)
        .create_user("Bob", "bob@example.com")
        .await
        .unwrap();

    assert_eq!(user.email, "bob@example.com");
    let added = added.lock().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["email"], "bob@example.com");
    assert_eq!(
        repository.calls_to("add")[0].argument::<User>(0),
        Some(user)
    );
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_without_adding() {
    let harness = TestHarness::strict();
    let repository = harness.surface("UserRepository");
    repository
        .expect("exists")
        .with_args(("carol@example.com",))
        .returns(true)
        .register()
        .unwrap();
    repository
        .expect("add")
        .with(vec![Matcher::any()])
        .times(Times::Never)
        .register()
        .unwrap();

    let err = service(&harness)
        .create_user("Carol", "carol@example.com")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("already exists"));
    assert_eq!(
        harness.snapshot().latest().map(|r| r.message.as_str()),
        Some("User with email carol@example.com already exists")
    );
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_lenient_repository_falls_back_to_defaults() {
    let harness = TestHarness::from_config(
        HarnessConfig::lenient().with_verify_no_other_calls(false),
    );
    let subject = service(&harness);

    assert!(subject.user_names().await.unwrap().is_empty());
    assert_eq!(subject.get_user(7).await.unwrap(), None);

    let calls = harness.surface("UserRepository").calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| call.matched.is_none()));
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_calls_can_be_verified_after_the_fact() {
    let harness = TestHarness::lenient();
    let repository = harness.surface("UserRepository");
    let subject = service(&harness);

    subject.get_user(3).await.unwrap();
    subject.get_user(3).await.unwrap();
    subject.get_user(4).await.unwrap();

    repository
        .verify(
            "get_by_id",
            ArgumentMatcher::exact_args(&(3,)).unwrap(),
            Times::Exactly(2),
        )
        .unwrap();
    assert!(
        repository
            .verify("get_by_id", vec![Matcher::exact(4)], Times::Never)
            .is_err()
    );
    repository
        .verify("get_by_id", vec![Matcher::exact(4)], Times::Once)
        .unwrap();

    harness.verify().unwrap();
}
