//! Handler tests against an in-memory SQLite database

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;

    use crate::auth::AuthError;
    use crate::db;
    use crate::domain::{Account, DomainError, EntryType, OperationContext};
    use crate::error::AppError;
    use crate::handlers::*;
    use crate::state::AppState;
    use crate::store::{accounts, sessions};

    async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap();
        db::init_schema(&pool).await.unwrap();
        pool
    }

    async fn test_state() -> AppState {
        AppState::new(memory_pool().await, Duration::from_secs(3600))
    }

    /// Register `username` with password "pw1" and return a session token
    async fn register_and_login(state: &AppState, username: &str) -> String {
        let ctx = OperationContext::new();
        RegisterUserHandler::new(state)
            .execute(
                RegisterCommand::new(username.to_string(), "pw1".to_string()),
                &ctx,
            )
            .await
            .unwrap();
        LoginHandler::new(state)
            .execute(LoginCommand::new(username.to_string(), "pw1".to_string()), &ctx)
            .await
            .unwrap()
            .token
    }

    async fn list(state: &AppState, token: &str) -> Vec<Account> {
        ListAccountsHandler::new(state)
            .execute(token, &OperationContext::new())
            .await
            .unwrap()
    }

    fn balance_of(accounts: &[Account], account_type: &str) -> Decimal {
        accounts
            .iter()
            .find(|a| a.account_type == account_type)
            .map(|a| a.balance.value())
            .unwrap()
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    #[tokio::test]
    async fn test_register_creates_default_accounts() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;

        let accounts = list(&state, &token).await;
        let types: Vec<&str> = accounts.iter().map(|a| a.account_type.as_str()).collect();
        assert_eq!(types, vec!["primary", "savings"]);
        assert!(accounts.iter().all(|a| a.balance.value() == Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_input() {
        let state = test_state().await;
        let handler = RegisterUserHandler::new(&state);
        let ctx = OperationContext::new();

        let blank_name = handler
            .execute(RegisterCommand::new("  ".into(), "pw".into()), &ctx)
            .await;
        assert!(matches!(blank_name, Err(AppError::InvalidRequest(_))));

        let blank_password = handler
            .execute(RegisterCommand::new("bob".into(), String::new()), &ctx)
            .await;
        assert!(matches!(blank_password, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_without_side_effects() {
        let state = test_state().await;
        let handler = RegisterUserHandler::new(&state);
        let ctx = OperationContext::new();

        let first = handler
            .execute(RegisterCommand::new("alice".into(), "pw1".into()), &ctx)
            .await
            .unwrap();
        let second = handler
            .execute(RegisterCommand::new("alice".into(), "other".into()), &ctx)
            .await;
        assert!(matches!(second, Err(AppError::UsernameTaken(_))));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        assert_eq!(count, first.account_ids.len() as i64);
    }

    #[tokio::test]
    async fn test_login_failures_create_no_session() {
        let state = test_state().await;
        register_and_login(&state, "alice").await;
        let login = LoginHandler::new(&state);
        let ctx = OperationContext::new();

        let wrong_password = login
            .execute(LoginCommand::new("alice".into(), "nope".into()), &ctx)
            .await;
        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));

        let unknown_user = login
            .execute(LoginCommand::new("mallory".into(), "pw1".into()), &ctx)
            .await;
        assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));

        let user = crate::store::users::find_user_by_username(state.store.pool(), "alice")
            .await
            .unwrap()
            .unwrap();
        let count = sessions::count_sessions_for_user(state.store.pool(), user.id)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_profile_synthesizes_email() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;

        let profile = ProfileHandler::new(&state)
            .execute(&token, &OperationContext::new())
            .await
            .unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let state = test_state().await;

        let result = ProfileHandler::new(&state)
            .execute("deadbeef", &OperationContext::new())
            .await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidToken))));
    }

    // =========================================================================
    // Deposit
    // =========================================================================

    #[tokio::test]
    async fn test_deposit_credits_primary_and_writes_ledger() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let handler = DepositHandler::new(&state);
        let ctx = OperationContext::new();

        let first = handler
            .execute(DepositCommand::new(token.clone(), dec!(100)), &ctx)
            .await
            .unwrap();
        assert_eq!(first.new_balance.value(), dec!(100));

        let second = handler
            .execute(DepositCommand::new(token.clone(), dec!(0.5)), &ctx)
            .await
            .unwrap();
        assert_eq!(second.new_balance.value(), dec!(100.5));

        let history = AccountHistoryHandler::new(&state)
            .execute(AccountHistoryQuery::new(token, first.account_id), &ctx)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, dec!(0.5));
        assert_eq!(history[0].entry_type, EntryType::Credit);
        assert_eq!(history[0].balance_after.value(), dec!(100.5));
    }

    #[tokio::test]
    async fn test_deposit_rejects_invalid_amounts() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let handler = DepositHandler::new(&state);
        let ctx = OperationContext::new();

        for amount in [dec!(0), dec!(-5), dec!(0.000000001)] {
            let result = handler
                .execute(DepositCommand::new(token.clone(), amount), &ctx)
                .await;
            assert!(
                matches!(result, Err(AppError::Domain(DomainError::InvalidAmount(_)))),
                "amount {} should be rejected",
                amount
            );
        }

        assert_eq!(balance_of(&list(&state, &token).await, "primary"), dec!(0));
    }

    #[tokio::test]
    async fn test_deposit_without_primary_account_is_not_found() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;

        sqlx::query("UPDATE accounts SET account_type = 'checking' WHERE account_type = 'primary'")
            .execute(state.store.pool())
            .await
            .unwrap();

        let result = DepositHandler::new(&state)
            .execute(DepositCommand::new(token, dec!(10)), &OperationContext::new())
            .await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::AccountNotFound(_)))
        ));
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_moves_funds_between_own_accounts() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let ctx = OperationContext::new();

        DepositHandler::new(&state)
            .execute(DepositCommand::new(token.clone(), dec!(100)), &ctx)
            .await
            .unwrap();

        let accounts = list(&state, &token).await;
        let (primary, savings) = (accounts[0].id, accounts[1].id);

        let result = TransferHandler::new(&state)
            .execute(
                TransferCommand::new(token.clone(), primary, savings, dec!(40)),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(result.from_balance.value(), dec!(60));
        assert_eq!(result.to_balance.value(), dec!(40));

        let accounts = list(&state, &token).await;
        assert_eq!(balance_of(&accounts, "primary"), dec!(60));
        assert_eq!(balance_of(&accounts, "savings"), dec!(40));

        let legs: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE journal_id = ?")
                .bind(result.journal_id)
                .fetch_one(state.store.pool())
                .await
                .unwrap();
        assert_eq!(legs, 2);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds_leaves_balances_unchanged() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let ctx = OperationContext::new();

        DepositHandler::new(&state)
            .execute(DepositCommand::new(token.clone(), dec!(10)), &ctx)
            .await
            .unwrap();
        let accounts = list(&state, &token).await;

        let result = TransferHandler::new(&state)
            .execute(
                TransferCommand::new(token.clone(), accounts[0].id, accounts[1].id, dec!(10.01)),
                &ctx,
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InsufficientFunds { .. }))
        ));

        let accounts = list(&state, &token).await;
        assert_eq!(balance_of(&accounts, "primary"), dec!(10));
        assert_eq!(balance_of(&accounts, "savings"), dec!(0));
    }

    #[tokio::test]
    async fn test_transfer_to_same_account_is_rejected() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let primary = list(&state, &token).await[0].id;

        let result = TransferHandler::new(&state)
            .execute(
                TransferCommand::new(token, primary, primary, dec!(1)),
                &OperationContext::new(),
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::SameAccountTransfer))
        ));
    }

    #[tokio::test]
    async fn test_transfer_involving_foreign_account_is_not_found() {
        let state = test_state().await;
        let alice = register_and_login(&state, "alice").await;
        let bob = register_and_login(&state, "bob").await;
        let ctx = OperationContext::new();

        DepositHandler::new(&state)
            .execute(DepositCommand::new(alice.clone(), dec!(50)), &ctx)
            .await
            .unwrap();
        let alice_primary = list(&state, &alice).await[0].id;
        let bob_primary = list(&state, &bob).await[0].id;

        let outgoing = TransferHandler::new(&state)
            .execute(
                TransferCommand::new(alice.clone(), alice_primary, bob_primary, dec!(5)),
                &ctx,
            )
            .await;
        assert!(matches!(
            outgoing,
            Err(AppError::Domain(DomainError::AccountNotFound(_)))
        ));

        let stolen = TransferHandler::new(&state)
            .execute(
                TransferCommand::new(bob.clone(), alice_primary, bob_primary, dec!(5)),
                &ctx,
            )
            .await;
        assert!(matches!(
            stolen,
            Err(AppError::Domain(DomainError::AccountNotFound(_)))
        ));

        assert_eq!(balance_of(&list(&state, &alice).await, "primary"), dec!(50));
        assert_eq!(balance_of(&list(&state, &bob).await, "primary"), dec!(0));
    }

    #[tokio::test]
    async fn test_stale_version_is_detected() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let account = list(&state, &token).await[0].clone();

        let bumped = accounts::update_account_balance(
            state.store.pool(),
            account.id,
            account.version,
            account.balance,
        )
        .await
        .unwrap();
        assert!(bumped);

        let stale = accounts::update_account_balance(
            state.store.pool(),
            account.id,
            account.version,
            account.balance,
        )
        .await
        .unwrap();
        assert!(!stale);
    }

    // =========================================================================
    // Account creation & history
    // =========================================================================

    #[tokio::test]
    async fn test_create_account_accepts_any_type_including_duplicates() {
        let state = test_state().await;
        let token = register_and_login(&state, "alice").await;
        let handler = CreateAccountHandler::new(&state);
        let ctx = OperationContext::new();

        let vacation = handler
            .execute(CreateAccountCommand::new(token.clone(), "vacation".into()), &ctx)
            .await
            .unwrap();
        assert_eq!(vacation.account_type, "vacation");
        assert_eq!(vacation.balance.value(), Decimal::ZERO);

        handler
            .execute(CreateAccountCommand::new(token.clone(), "savings".into()), &ctx)
            .await
            .unwrap();

        assert_eq!(list(&state, &token).await.len(), 4);

        let empty = handler
            .execute(CreateAccountCommand::new(token, String::new()), &ctx)
            .await;
        assert!(matches!(empty, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_history_limit_and_ownership() {
        let state = test_state().await;
        let alice = register_and_login(&state, "alice").await;
        let bob = register_and_login(&state, "bob").await;
        let ctx = OperationContext::new();

        let deposit = DepositHandler::new(&state);
        for _ in 0..3 {
            deposit
                .execute(DepositCommand::new(alice.clone(), dec!(1)), &ctx)
                .await
                .unwrap();
        }
        let primary = list(&state, &alice).await[0].id;
        let history = AccountHistoryHandler::new(&state);

        let limited = history
            .execute(AccountHistoryQuery::new(alice.clone(), primary).with_limit(2), &ctx)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert!(limited[0].id > limited[1].id);

        let foreign = history
            .execute(AccountHistoryQuery::new(bob, primary), &ctx)
            .await;
        assert!(matches!(
            foreign,
            Err(AppError::Domain(DomainError::AccountNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let pool = memory_pool().await;
        let state = AppState::new(pool, Duration::ZERO);
        let token = register_and_login(&state, "alice").await;

        let result = ListAccountsHandler::new(&state)
            .execute(&token, &OperationContext::new())
            .await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidToken))));
    }
}
