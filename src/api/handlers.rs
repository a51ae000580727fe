use crate::models::{ReconciliationResult, RunStatus, VendorScoreReport};
use crate::service::{ReconciliationService, RunOptions};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// 请求体: 提取后的发票 + 可选的单次参数
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub invoice: Value,
    #[serde(flatten)]
    pub options: RunOptions,
}

/// 供应商评分查询参数
#[derive(Debug, Deserialize)]
pub struct VendorScoreQuery {
    pub vendor: Option<String>,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

fn internal_error(message: String) -> Response {
    let response = ErrorResponse {
        success: false,
        message,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对账接口: 校验失败返回 400，结果体与成功时同构
pub async fn reconcile(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    let joined = tokio::task::spawn_blocking(move || {
        service.reconcile_value(&req.invoice, &req.options)
    })
    .await;

    match joined {
        Ok(result) => reconcile_response(result),
        Err(e) => {
            tracing::error!("Reconciliation task failed: {}", e);
            internal_error(format!("Error: {}", e))
        }
    }
}

fn reconcile_response(result: ReconciliationResult) -> Response {
    let code = match result.status {
        RunStatus::Success => StatusCode::OK,
        RunStatus::Failed => StatusCode::BAD_REQUEST,
    };
    (code, Json(result)).into_response()
}

/// 供应商评分接口 (只读历史报告)
pub async fn vendor_scores(
    State(service): State<Arc<ReconciliationService>>,
    Query(query): Query<VendorScoreQuery>,
) -> Response {
    let joined = tokio::task::spawn_blocking(move || -> VendorScoreReport {
        service.vendor_scores(query.vendor.as_deref())
    })
    .await;

    match joined {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!("Vendor score task failed: {}", e);
            internal_error(format!("Error: {}", e))
        }
    }
}
