use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, OrderImage};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithImages {
    pub order: Order,
    pub images: Vec<OrderImage>,
}
