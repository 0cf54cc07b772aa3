//! HTTP surface over the session services.
//!
//! Every route carries the session id in its path; the session's store stands in for the
//! browser storage the pages used to share. Cart mutations dispose of their session before
//! responding. Read-only and checkout handlers drop it, since they hold no cart changes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::{AddressForm, CartLineItem, CheckoutSnapshot, Order, PaymentForm};
use crate::domain::value_objects::DiscountCode;
use crate::pricing::{DiscountOutcome, PriceBreakdown};
use crate::services::{CartStore, PlacedOrder};
use crate::session::{Services, Storefront};
use crate::storage::SessionStores;
use crate::{Route, StorefrontError};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStores>,
    pub services: Services,
    /// Cancelled on shutdown; in-flight payments are aborted with it.
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "aura-storefront"})) }))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items", post(add_to_cart))
        .route("/api/v1/cart/:session/items/:id", put(update_quantity).delete(remove_from_cart))
        .route("/api/v1/cart/:session/discount", post(apply_code).delete(remove_code))
        .route("/api/v1/checkout/:session/address", post(submit_address))
        .route("/api/v1/checkout/:session/payment", get(payment_step))
        .route("/api/v1/checkout/:session/orders", post(place_order))
        .route("/api/v1/checkout/:session/complete/:order_id", post(complete_checkout))
        .route("/api/v1/orders/:session", get(list_orders))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EmptyCart => StatusCode::CONFLICT,
            Self::PaymentCancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            Self::Validation(fields) => serde_json::json!({"error": self.to_string(), "fields": fields}),
            _ => serde_json::json!({"error": self.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, StorefrontError>;

async fn open(state: &AppState, session: &str) -> ApiResult<Storefront> {
    let store = state.sessions.open(session).await?;
    Storefront::init(store, &state.services).await
}

/// Renders the cart and disposes of the session after a cart mutation.
async fn release(storefront: Storefront) -> ApiResult<CartView> {
    let view = CartView::from(storefront.cart());
    storefront.dispose().await?;
    Ok(view)
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub applied_code: Option<DiscountCode>,
    pub summary: PriceBreakdown,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self { items: cart.items().to_vec(), applied_code: cart.applied_code().cloned(), summary: cart.summary() }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: i64 }

#[derive(Debug, Deserialize)]
pub struct ApplyCodeRequest { pub code: String }

#[derive(Debug, Serialize)]
pub struct DiscountView { pub outcome: DiscountOutcome, pub cart: CartView }

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CartView>> {
    let storefront = open(&s, &session).await?;
    Ok(Json(CartView::from(storefront.cart())))
}

async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(item): Json<CartLineItem>) -> ApiResult<(StatusCode, Json<CartView>)> {
    let mut storefront = open(&s, &session).await?;
    storefront.cart_mut().add_to_cart(item).await?;
    Ok((StatusCode::CREATED, Json(release(storefront).await?)))
}

async fn update_quantity(State(s): State<AppState>, Path((session, id)): Path<(String, String)>, Json(r): Json<UpdateQuantityRequest>) -> ApiResult<Json<CartView>> {
    let mut storefront = open(&s, &session).await?;
    storefront.cart_mut().update_quantity(&id.as_str().into(), r.quantity).await?;
    Ok(Json(release(storefront).await?))
}

async fn remove_from_cart(State(s): State<AppState>, Path((session, id)): Path<(String, String)>) -> ApiResult<Json<CartView>> {
    let mut storefront = open(&s, &session).await?;
    storefront.cart_mut().remove_from_cart(&id.as_str().into()).await?;
    Ok(Json(release(storefront).await?))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CartView>> {
    let mut storefront = open(&s, &session).await?;
    storefront.cart_mut().clear_cart().await?;
    Ok(Json(release(storefront).await?))
}

async fn apply_code(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<ApplyCodeRequest>) -> ApiResult<Json<DiscountView>> {
    let mut storefront = open(&s, &session).await?;
    let outcome = storefront.cart_mut().apply_code(&r.code).await?;
    Ok(Json(DiscountView { outcome, cart: release(storefront).await? }))
}

async fn remove_code(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CartView>> {
    let mut storefront = open(&s, &session).await?;
    storefront.cart_mut().remove_code().await?;
    Ok(Json(release(storefront).await?))
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RedirectView { pub redirect: Route }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub checkout_address: Option<CheckoutSnapshot>,
    pub summary: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(flatten)]
    pub payment: PaymentForm,
    #[serde(default)]
    pub customer_id: Option<String>,
}

async fn submit_address(State(s): State<AppState>, Path(session): Path<String>, Json(form): Json<AddressForm>) -> ApiResult<Json<RedirectView>> {
    let storefront = open(&s, &session).await?;
    let redirect = storefront.checkout().submit_address(&form).await?;
    Ok(Json(RedirectView { redirect }))
}

async fn payment_step(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<PaymentView>> {
    let storefront = open(&s, &session).await?;
    let checkout = storefront.checkout();
    Ok(Json(PaymentView { checkout_address: checkout.load_snapshot().await?, summary: checkout.payment_summary().await? }))
}

async fn place_order(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<PlaceOrderRequest>) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    let storefront = open(&s, &session).await?;
    let cancel = s.shutdown.child_token();
    let placed = storefront.orders().place_order(&r.payment, r.customer_id, &cancel).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn complete_checkout(State(s): State<AppState>, Path((session, order_id)): Path<(String, String)>) -> ApiResult<StatusCode> {
    let storefront = open(&s, &session).await?;
    storefront.checkout().complete(&order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_orders(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    let storefront = open(&s, &session).await?;
    Ok(Json(storefront.orders().list_orders().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingConfig;
    use crate::services::{LogPublisher, SimulatedGateway};
    use crate::storage::MemorySessions;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState {
            sessions: Arc::new(MemorySessions::new()),
            services: Services::new(PricingConfig::default(), Arc::new(SimulatedGateway::new(Duration::ZERO)), Arc::new(LogPublisher)),
            shutdown: CancellationToken::new(),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri).header("content-type", "application/json");
        let request = match body {
            Some(b) => request.body(Body::from(b.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn test_cart_endpoints() {
        let app = app();
        let item = json!({"id": 1, "name": "Neutral Plaster", "subtitle": "5 kg", "image": "/img/plaster.png", "price": 429, "quantity": 2});
        let (status, body) = call(&app, Method::POST, "/api/v1/cart/s1/items", Some(item)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["summary"]["subtotal"], 858);
        assert_eq!(body["summary"]["shipping"], json!({"status": "deferred"}));

        let (_, body) = call(&app, Method::PUT, "/api/v1/cart/s1/items/1", Some(json!({"quantity": -4}))).await;
        assert_eq!(body["items"][0]["quantity"], 1);

        let (_, body) = call(&app, Method::POST, "/api/v1/cart/s1/discount", Some(json!({"code": "WRONG"}))).await;
        assert_eq!(body["outcome"]["status"], "rejected");
        assert_eq!(body["cart"]["summary"]["discount"], 0);

        let (_, body) = call(&app, Method::GET, "/api/v1/cart/s2", None).await;
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["summary"]["total"], 0);
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = app();
        let item = json!({"id": "bundle", "name": "Tinted Plaster", "price": 1499, "quantity": 1});
        call(&app, Method::POST, "/api/v1/cart/s1/items", Some(item)).await;
        let (_, body) = call(&app, Method::POST, "/api/v1/cart/s1/discount", Some(json!({"code": " aura10 "}))).await;
        assert_eq!(body["outcome"], json!({"status": "applied", "code": "AURA10", "amount": 500}));

        let mut address = json!({
            "fullName": "Meera Iyer", "phone": "9876543210", "email": "meera@example.com",
            "address": "12 Lake View Road", "city": "", "state": "Karnataka", "pincode": "560001"
        });
        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/s1/address", Some(json!({"shippingAddress": address, "sameAsShipping": true}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["shippingAddress.city"].is_string());

        address["city"] = json!("Bengaluru");
        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/s1/address", Some(json!({"shippingAddress": address, "sameAsShipping": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["redirect"], "/payment");

        let (_, body) = call(&app, Method::GET, "/api/v1/checkout/s1/payment", None).await;
        assert_eq!(body["checkoutAddress"]["billingAddress"]["city"], "Bengaluru");
        // subtotal 1499 ships free; (1499 - 500) * 0.18 = 179.82
        assert_eq!(body["summary"]["shipping"], json!({"status": "charged", "amount": 0}));
        assert_eq!(body["summary"]["total"], 1179);

        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/s1/orders", Some(json!({"method": "upi", "upiId": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["upiId"].is_string());

        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/s1/orders", Some(json!({"method": "cod", "customerId": "uid-7"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let order_id = body["order"]["orderId"].as_str().unwrap().to_string();
        assert_eq!(body["redirect"], format!("/order-confirmation?orderId={order_id}&paymentMethod=Cash%20on%20Delivery"));

        let (status, _) = call(&app, Method::POST, &format!("/api/v1/checkout/s1/complete/{order_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = call(&app, Method::GET, "/api/v1/cart/s1", None).await;
        assert_eq!(body["items"], json!([]));
        let (_, body) = call(&app, Method::GET, "/api/v1/orders/s1", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["total"], 1179);
        assert_eq!(body[0]["shippingAddress"]["city"], "Bengaluru");
    }

    #[tokio::test]
    async fn test_order_on_empty_cart_conflicts() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/s9/orders", Some(json!({"method": "cod"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "cart is empty");
    }
}
