//! API Routes
//!
//! HTTP endpoint definitions. Every authenticated route is a POST whose JSON
//! body carries the session token.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Balance, LedgerEntry, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    AccountHistoryHandler, AccountHistoryQuery, CreateAccountCommand, CreateAccountHandler,
    DepositCommand, DepositHandler, ListAccountsHandler, LoginCommand, LoginHandler,
    ProfileHandler, RegisterCommand, RegisterUserHandler, TransferCommand, TransferHandler,
};
use crate::state::AppState;

use super::extract::AppJson;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Body of routes that need nothing but the session
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    #[serde(default)]
    pub token: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub token: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub token: String,
    #[serde(rename = "type")]
    pub account_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(default)]
    pub token: String,
    pub account_id: i64,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub message: String,
    /// Balance of the primary account after the deposit
    pub amount: Balance,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub message: String,
    pub account: Account,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // Registration & sessions
        .route("/users", post(register))
        .route("/sessions", post(login))
        // Authenticated
        .route("/me/profile", post(profile))
        .route("/me/accounts", post(list_accounts))
        .route("/me/accounts/transactions", post(deposit))
        .route("/me/accounts/create", post(create_account))
        .route("/me/accounts/history", post(account_history))
        .route("/me/transfer", post(transfer))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// POST /users
// =========================================================================

async fn register(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let handler = RegisterUserHandler::new(&state);
    handler
        .execute(
            RegisterCommand::new(request.username, request.password),
            &context,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

// =========================================================================
// POST /sessions
// =========================================================================

async fn login(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let handler = LoginHandler::new(&state);
    let result = handler
        .execute(LoginCommand::new(request.username, request.password), &context)
        .await?;

    Ok(Json(TokenResponse {
        token: result.token,
    }))
}

// =========================================================================
// POST /me/profile
// =========================================================================

async fn profile(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<TokenRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let result = ProfileHandler::new(&state)
        .execute(&request.token, &context)
        .await?;

    Ok(Json(ProfileResponse {
        username: result.username,
        email: result.email,
    }))
}

// =========================================================================
// POST /me/accounts
// =========================================================================

async fn list_accounts(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<TokenRequest>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = ListAccountsHandler::new(&state)
        .execute(&request.token, &context)
        .await?;

    Ok(Json(accounts))
}

// =========================================================================
// POST /me/accounts/transactions
// =========================================================================

async fn deposit(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<DepositRequest>,
) -> Result<Json<DepositResponse>, AppError> {
    let result = DepositHandler::new(&state)
        .execute(DepositCommand::new(request.token, request.amount), &context)
        .await?;

    Ok(Json(DepositResponse {
        message: "Deposit successful".to_string(),
        amount: result.new_balance,
    }))
}

// =========================================================================
// POST /me/transfer
// =========================================================================

async fn transfer(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<TransferRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let command = TransferCommand::new(
        request.token,
        request.from_account_id,
        request.to_account_id,
        request.amount,
    );
    TransferHandler::new(&state)
        .execute(command, &context)
        .await?;

    Ok(Json(MessageResponse {
        message: "Transfer successful".to_string(),
    }))
}

// =========================================================================
// POST /me/accounts/create
// =========================================================================

async fn create_account(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    let account = CreateAccountHandler::new(&state)
        .execute(
            CreateAccountCommand::new(request.token, request.account_type),
            &context,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            message: "Account created successfully".to_string(),
            account,
        }),
    ))
}

// =========================================================================
// POST /me/accounts/history
// =========================================================================

async fn account_history(
    State(state): State<AppState>,
    context: OperationContext,
    AppJson(request): AppJson<HistoryRequest>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let mut query = AccountHistoryQuery::new(request.token, request.account_id);
    if let Some(limit) = request.limit {
        query = query.with_limit(limit);
    }

    let entries = AccountHistoryHandler::new(&state)
        .execute(query, &context)
        .await?;

    Ok(Json(entries))
}
