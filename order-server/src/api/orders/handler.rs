//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use shared::error::{ApiResponse, AppError, AppResult};
use shared::models::{
    CreateOrderRequest, CreateOrderResponse, OrderDetail, UpdateOrderStatusRequest,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::status;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Place an order for the authenticated buyer
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    let request = json_body(payload)?;
    request.validate()?;

    let order_id = state.workflow.create_order(user.buyer(), &request).await?;
    Ok(ApiResponse::success(CreateOrderResponse { order_id }))
}

/// Order detail with items
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let detail = status::get_order_detail(&state.pool, &user.actor(), id).await?;
    Ok(ApiResponse::success(detail))
}

/// Change order status
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> AppResult<ApiResponse<()>> {
    let request = json_body(payload)?;
    status::update_status(&state.pool, &user.actor(), id, request.new_status_code).await?;
    Ok(ApiResponse::ok())
}
