use serde::Serialize;
use utoipa::ToSchema;

/// Pagination window echoed back on the admin order listing. Every other
/// endpoint returns a single order, outcome, or token and carries no meta.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Meta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Envelope every endpoint returns. The checkout frontend surfaces
/// `message` verbatim, so it reads as customer-facing copy on the order
/// paths ("Order Placed Successfully!") and as a field map summary on
/// validation failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: None,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: Some(Meta {
                page,
                per_page,
                total,
            }),
        }
    }
}
