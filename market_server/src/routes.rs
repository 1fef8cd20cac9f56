//! Request handler definitions
//!
//! Define each route and its handler here. Webhook handlers live in [`crate::webhook_routes`].
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call in these handlers is therefore an
//! async call, and nothing in here may block.
//!
//! All routes except `/health` are mounted under `/api`, behind [`crate::middleware::JwtMiddlewareFactory`], so every
//! handler that takes [`JwtClaims`] is guaranteed an authenticated caller.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use market_engine::{
    db_types::{OrderId, ProductId, UserId},
    order_objects::CheckoutRequest,
    payment_objects::PaymentIntentRequest,
    traits::{CartManagement, CatalogLookup, OrderManagement, PaymentGateway, PaymentManagement},
    CartApi,
    OrderLedgerApi,
    PaymentIntentApi,
};

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{AddCartItem, JsonResponse, StatusUpdate, UpdateCartItem, UserOrderPath},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `impl A, B` makes the handler generic over one backend type implementing every listed trait. `; gateway G` adds a
// second type parameter for the payment gateway. `where requires [roles]` wraps the route in the ACL middleware.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ $(where requires [$($roles:expr),+])?) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>); }
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>)
                    $(.wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+])))?;
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ ; gateway $gateway:path
        $(where requires [$($roles:expr),+])?) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, G>(core::marker::PhantomData<fn() -> (B, G)>); }
        paste::paste! { impl<B, G> [<$name:camel Route>]<B, G> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (B, G)>)
            }
        }}
        paste::paste! { impl<B, G> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, G>
        where
            B: $($bounds +)+ 'static,
            G: $gateway + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, G>)
                    $(.wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+])))?;
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement, CatalogLookup);
/// Route handler for the cart endpoint
///
/// Returns the caller's cart, with every line priced at the current catalog price. Products that are no longer
/// available are listed, but do not count towards the total.
pub async fn my_cart<B>(claims: JwtClaims, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CartManagement + CatalogLookup {
    debug!("💻️ GET cart for {}", claims.sub);
    let cart = api.cart(&claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(clear_cart => Delete "/cart" impl CartManagement, CatalogLookup);
pub async fn clear_cart<B>(claims: JwtClaims, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CartManagement + CatalogLookup {
    debug!("💻️ DELETE cart for {}", claims.sub);
    let removed = api.clear_cart(&claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{removed} items removed from the cart."))))
}

route!(add_cart_item => Post "/cart/items" impl CartManagement, CatalogLookup);
/// Route handler for adding a product to the cart
///
/// Adding a product that is already in the cart increases its quantity. The updated cart is returned.
pub async fn add_cart_item<B>(
    claims: JwtClaims,
    body: web::Json<AddCartItem>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup,
{
    let AddCartItem { product_id, quantity } = body.into_inner();
    debug!("💻️ POST cart item {product_id} x{quantity} for {}", claims.sub);
    let user_id = claims.user_id();
    api.add_item(&user_id, product_id, quantity).await?;
    let cart = api.cart(&user_id).await?;
    Ok(HttpResponse::Created().json(cart))
}

route!(update_cart_item => Put "/cart/items/{product_id}" impl CartManagement, CatalogLookup);
/// Route handler for changing the quantity of a product in the cart
///
/// A quantity of zero removes the product from the cart. The updated cart is returned.
pub async fn update_cart_item<B>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    body: web::Json<UpdateCartItem>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup,
{
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ PUT cart item {product_id} x{quantity} for {}", claims.sub);
    let user_id = claims.user_id();
    api.update_item(&user_id, product_id, quantity).await?;
    let cart = api.cart(&user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_cart_item => Delete "/cart/items/{product_id}" impl CartManagement, CatalogLookup);
pub async fn remove_cart_item<B>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup,
{
    let product_id = path.into_inner();
    debug!("💻️ DELETE cart item {product_id} for {}", claims.sub);
    let user_id = claims.user_id();
    api.remove_item(&user_id, product_id).await?;
    let cart = api.cart(&user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl CartManagement, CatalogLookup, OrderManagement);
/// Route handler for checkout
///
/// Turns the caller's cart into a `pending` order. The body carries the shipping and billing addresses and the
/// payment method (`credit_card` or `paypal`). On success, the cart is empty and the new order is returned with a
/// 201 status.
///
/// If the cart changed while the order was being created (e.g. a concurrent checkout), a 409 is returned and nothing
/// is written.
pub async fn create_order<B>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup + OrderManagement,
{
    debug!("💻️ POST order for {}", claims.sub);
    let order = api.create_order(&claims.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl CartManagement, CatalogLookup, OrderManagement);
/// Route handler for the orders endpoint
///
/// Authenticated users can fetch their own orders, newest first, using this endpoint.
pub async fn my_orders<B>(claims: JwtClaims, api: web::Data<OrderLedgerApi<B>>) -> Result<HttpResponse, ServerError>
where B: CartManagement + CatalogLookup + OrderManagement {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.fetch_orders(&claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_order => Get "/orders/{order_id}" impl CartManagement, CatalogLookup, OrderManagement);
/// Route handler for a single order
///
/// Orders belonging to other users are reported as not found, exactly like orders that do not exist.
pub async fn my_order<B>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup + OrderManagement,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", claims.sub);
    let order = api.fetch_order(&claims.user_id(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Put "/admin/orders/{user_id}/{order_id}/status"
    impl CartManagement, CatalogLookup, OrderManagement where requires [Role::Admin]);
/// Route handler for manual order status changes
///
/// Admins can move any order to any status. No transition rules are applied, so this is the escape hatch for
/// shipping, delivery, cancellation and corrections.
pub async fn update_order_status<B>(
    claims: JwtClaims,
    path: web::Path<UserOrderPath>,
    body: web::Json<StatusUpdate>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + CatalogLookup + OrderManagement,
{
    let UserOrderPath { user_id, order_id } = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ {} is setting the status of order {order_id} (owned by {user_id}) to {status}", claims.sub);
    let order = api.update_status(&UserId::from(user_id), order_id, &status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment_intent => Post "/payments/create-intent"
    impl OrderManagement, PaymentManagement ; gateway PaymentGateway);
/// Route handler for starting a payment
///
/// The caller asks to pay for one of their orders. The amount must equal the order total. The response carries the
/// payment id and the client secret the frontend needs to complete payment with the gateway.
pub async fn create_payment_intent<B, G>(
    claims: JwtClaims,
    body: web::Json<PaymentIntentRequest>,
    api: web::Data<PaymentIntentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST payment intent for order {} by {}", request.order_id, claims.sub);
    let response = api.create_payment_intent(&claims.user_id(), request).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(order_payments => Get "/orders/{order_id}/payments"
    impl OrderManagement, PaymentManagement ; gateway PaymentGateway);
/// The payment attempts for one of the caller's orders, oldest first.
pub async fn order_payments<B, G>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<PaymentIntentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET payments for order {order_id} by {}", claims.sub);
    let payments = api.payments_for_order(&claims.user_id(), order_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}
