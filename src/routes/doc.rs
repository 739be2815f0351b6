use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        orders::{OrderList, OrderWithImages},
    },
    models::{DeliveryAddress, Order, OrderImage, PaperType, PrintSize, User},
    promo::{Promo, PromoOutcome},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, params, promo},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        orders::create_order,
        orders::get_order,
        promo::list_promos,
        promo::validate_promo,
        admin::list_orders,
        admin::get_order,
        admin::update_order_status,
        admin::download_archive
    ),
    components(
        schemas(
            User,
            Order,
            OrderImage,
            DeliveryAddress,
            PrintSize,
            PaperType,
            Promo,
            PromoOutcome,
            OrderList,
            OrderWithImages,
            LoginRequest,
            LoginResponse,
            admin::UpdateOrderStatusRequest,
            promo::CartLine,
            promo::ValidatePromoRequest,
            promo::PromoCatalog,
            params::Pagination,
            params::OrderListQuery,
            health::HealthData,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithImages>,
            ApiResponse<PromoOutcome>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Print order endpoints"),
        (name = "Promo", description = "Promo code endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
