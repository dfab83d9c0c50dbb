//! End-to-end flows through the services against a real SQLite file.

use lottery::SharedState;
use lottery::config::Config;
use lottery::entities::draws;
use lottery::services::{AdminError, AuthError, LoginRequest, RegisterRequest, UserInfo};
use sea_orm::{ActiveModelTrait, Set};

async fn spawn_state() -> SharedState {
    let db_path =
        std::env::temp_dir().join(format!("lottery-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.rsa_key_bits = 1024;

    SharedState::new(config)
        .await
        .expect("failed to create shared state")
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "Secret1!".to_string(),
        confirm_password: "Secret1!".to_string(),
        firstname: "Bob".to_string(),
        lastname: "Smith".to_string(),
        phone: "0191-555-1234".to_string(),
        birthdate: "01/02/1990".to_string(),
        postcode: "DH1 3LE".to_string(),
    }
}

async fn register_user(state: &SharedState, email: &str) -> UserInfo {
    state
        .auth_service
        .register(register_request(email))
        .await
        .expect("registration failed")
}

async fn admin(state: &SharedState) -> UserInfo {
    state
        .auth_service
        .authenticate("admin@email.com", "Admin1!")
        .await
        .expect("bootstrap admin missing")
}

#[tokio::test]
async fn bootstrap_admin_exists() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    assert!(admin.is_admin());
    assert_eq!(admin.firstname, "Alice");

    let created = state
        .auth_service
        .bootstrap_admin(&state.config.bootstrap)
        .await
        .unwrap();
    assert!(!created, "second bootstrap should be a no-op");
}

#[tokio::test]
async fn login_updates_audit_fields() {
    let state = spawn_state().await;
    register_user(&state, "bob@example.com").await;

    let login = |ip: &str| LoginRequest {
        email: "bob@example.com".to_string(),
        password: "Secret1!".to_string(),
        postcode: "DH1 3LE".to_string(),
        ip: ip.to_string(),
    };

    let first = state.auth_service.login(login("10.0.0.1")).await.unwrap();
    assert_eq!(first.total_logins, 1);
    assert!(first.last_login.is_none());

    let second = state.auth_service.login(login("10.0.0.2")).await.unwrap();
    assert_eq!(second.total_logins, 2);
    assert_eq!(second.last_login, first.current_login);

    let admin = admin(&state).await;
    let activity = state.admin_service.user_activity(&admin).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].current_ip.as_deref(), Some("10.0.0.2"));
    assert_eq!(activity[0].last_ip.as_deref(), Some("10.0.0.1"));
}

#[tokio::test]
async fn login_with_wrong_postcode_is_rejected_and_logged() {
    let state = spawn_state().await;
    register_user(&state, "bob@example.com").await;

    let err = state
        .auth_service
        .login(LoginRequest {
            email: "bob@example.com".to_string(),
            password: "Secret1!".to_string(),
            postcode: "SW1A 1AA".to_string(),
            ip: "10.0.0.9".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let events = state
        .store
        .security_events_by_type("invalid_login")
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].ip.as_deref(), Some("10.0.0.9"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let state = spawn_state().await;
    register_user(&state, "bob@example.com").await;

    let err = state
        .auth_service
        .register(register_request("bob@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken(_)));
}

#[tokio::test]
async fn two_factor_uri_names_the_account() {
    let state = spawn_state().await;
    let user = register_user(&state, "bob@example.com").await;

    let uri = state.auth_service.two_factor_uri(&user).await.unwrap();
    assert!(uri.starts_with("otpauth://totp/Lottery:bob%40example.com?secret="));
    assert!(uri.ends_with("&issuer=Lottery"));
}

#[tokio::test]
async fn submitted_draw_is_stored_encrypted() {
    let state = spawn_state().await;
    let user = register_user(&state, "bob@example.com").await;

    let draw = state
        .lottery_service
        .submit_draw(&user, "42, 7 13 1 59 30")
        .await
        .unwrap();
    assert_eq!(draw.numbers, "1 7 13 30 42 59");

    let stored = state.store.draws_for_user(user.id, false).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].ciphertext, draw.numbers.as_bytes());

    let views = state.lottery_service.view_draws(&user).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].numbers, "1 7 13 30 42 59");
    assert!(!views[0].been_played);
}

#[tokio::test]
async fn invalid_draw_is_rejected() {
    let state = spawn_state().await;
    let user = register_user(&state, "bob@example.com").await;

    for input in ["1 2 3", "1 2 3 4 5 60", "1 1 2 3 4 5", "a b c d e f"] {
        assert!(
            state.lottery_service.submit_draw(&user, input).await.is_err(),
            "{input} should be rejected"
        );
    }
    assert!(state.lottery_service.view_draws(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn generate_advances_round_and_replaces_master() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    let first = state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();
    assert_eq!(first.lottery_round, 1);

    let second = state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();
    assert_eq!(second.lottery_round, 2);

    let current = state.admin_service.view_winning_draw(&admin).await.unwrap();
    assert_eq!(current.draw_id, second.draw_id);
    assert_eq!(current.numbers, second.numbers);
    assert_eq!(current.numbers.split(' ').count(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_generations_get_distinct_rounds() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    let mut rounds = Vec::new();
    for _ in 0..5 {
        let (first, second) = tokio::join!(
            state.admin_service.generate_winning_draw(&admin),
            state.admin_service.generate_winning_draw(&admin)
        );
        rounds.push(first.unwrap().lottery_round);
        rounds.push(second.unwrap().lottery_round);
    }

    rounds.sort_unstable();
    assert_eq!(rounds, (1..=10).collect::<Vec<_>>());

    // Only the latest master survives.
    let current = state.admin_service.view_winning_draw(&admin).await.unwrap();
    assert_eq!(current.lottery_round, 10);
}

#[tokio::test]
async fn unreadable_draw_aborts_settlement_without_writing() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let bob = register_user(&state, "bob@example.com").await;
    let carol = register_user(&state, "carol@example.com").await;

    let master = state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();
    state
        .lottery_service
        .submit_draw(&bob, "1 2 3 4 5 6")
        .await
        .unwrap();
    let broken = state
        .lottery_service
        .submit_draw(&carol, "7 8 9 10 11 12")
        .await
        .unwrap();

    // An all-zero block never carries valid PKCS#1 v1.5 padding.
    draws::ActiveModel {
        id: Set(broken.id.value()),
        numbers: Set(vec![0u8; 128]),
        ..Default::default()
    }
    .update(&state.store.conn)
    .await
    .unwrap();

    let err = state.admin_service.run_lottery(&admin).await.unwrap_err();
    assert!(matches!(err, AdminError::Settlement(_)), "got {err:?}");

    let current = state.admin_service.view_winning_draw(&admin).await.unwrap();
    assert_eq!(current.draw_id, master.draw_id);
    assert!(!current.been_played);

    let pending = state.store.unplayed_user_draws().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|d| !d.been_played && d.lottery_round == 0));
    assert!(state.lottery_service.check_results(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn run_without_master_or_user_draws_fails() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    let err = state.admin_service.run_lottery(&admin).await.unwrap_err();
    assert!(matches!(err, AdminError::NoWinningDraw));

    state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();
    let err = state.admin_service.run_lottery(&admin).await.unwrap_err();
    assert!(matches!(err, AdminError::NoUserDraws));

    // The master draw is left unplayed.
    assert!(state.admin_service.view_winning_draw(&admin).await.is_ok());
}

#[tokio::test]
async fn matching_draw_wins_and_is_not_replayed() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let bob = register_user(&state, "bob@example.com").await;
    let carol = register_user(&state, "carol@example.com").await;

    let master = state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();

    state
        .lottery_service
        .submit_draw(&bob, &master.numbers)
        .await
        .unwrap();

    let losing = if master.numbers == "1 2 3 4 5 6" {
        "1 2 3 4 5 7"
    } else {
        "1 2 3 4 5 6"
    };
    state
        .lottery_service
        .submit_draw(&carol, losing)
        .await
        .unwrap();

    let report = state.admin_service.run_lottery(&admin).await.unwrap();
    assert_eq!(report.lottery_round, master.lottery_round);
    assert_eq!(report.winning_numbers, master.numbers);
    assert_eq!(report.settled, 2);
    assert_eq!(report.winners.len(), 1);
    assert_eq!(report.winners[0].user_id, bob.id);
    assert_eq!(report.winners[0].email, "bob@example.com");

    let bob_results = state.lottery_service.check_results(&bob).await.unwrap();
    assert_eq!(bob_results.len(), 1);
    assert!(bob_results[0].matches_master);
    assert_eq!(bob_results[0].lottery_round, master.lottery_round);
    assert!(state.lottery_service.view_draws(&bob).await.unwrap().is_empty());

    let carol_results = state.lottery_service.check_results(&carol).await.unwrap();
    assert!(!carol_results[0].matches_master);

    // Played draws and a played master are never settled again.
    let err = state.admin_service.run_lottery(&admin).await.unwrap_err();
    assert!(matches!(err, AdminError::NoWinningDraw));

    state
        .admin_service
        .generate_winning_draw(&admin)
        .await
        .unwrap();
    let err = state.admin_service.run_lottery(&admin).await.unwrap_err();
    assert!(matches!(err, AdminError::NoUserDraws));
}

#[tokio::test]
async fn non_admin_is_denied_and_logged() {
    let state = spawn_state().await;
    let bob = register_user(&state, "bob@example.com").await;

    let err = state
        .admin_service
        .generate_winning_draw(&bob)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Unauthorized));

    let err = state
        .admin_service
        .security_events(&bob, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Unauthorized));

    let events = state
        .store
        .security_events_by_type("unauthorised_access")
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].email.as_deref(), Some("bob@example.com"));
}

#[tokio::test]
async fn admin_can_register_admin_and_read_security_log() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    let created = state
        .admin_service
        .register_admin(&admin, register_request("second@example.com"))
        .await
        .unwrap();
    assert!(created.is_admin());

    let users = state.admin_service.view_all_users(&admin).await.unwrap();
    assert!(users.is_empty(), "admins are not listed as users");

    let events = state
        .admin_service
        .security_events(&admin, 10)
        .await
        .unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0].event_type, "registration");
    assert_eq!(events[0].email.as_deref(), Some("second@example.com"));
}
