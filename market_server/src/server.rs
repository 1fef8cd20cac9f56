use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use market_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderCreatedEvent, OrderPaidEvent, PaymentFailedEvent},
    CartApi,
    OrderLedgerApi,
    PaymentIntentApi,
    ReconcilerApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::StripeGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddCartItemRoute,
        ClearCartRoute,
        CreateOrderRoute,
        CreatePaymentIntentRoute,
        MyCartRoute,
        MyOrderRoute,
        MyOrdersRoute,
        OrderPaymentsRoute,
        RemoveCartItemRoute,
        UpdateCartItemRoute,
        UpdateOrderStatusRoute,
    },
    webhook_routes::StripeWebhookRoute,
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    } else {
        info!("🗃️ Skipping database migrations. MKT_RUN_MIGRATIONS is off.");
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that record order and payment milestones in the server log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev: OrderCreatedEvent| {
            Box::pin(async move {
                info!("🧾️ Order #{} created for {}. Total: {}", ev.order.id, ev.order.user_id, ev.order.total_price);
            })
        })
        .on_order_paid(|ev: OrderPaidEvent| {
            Box::pin(async move {
                info!(
                    "💰️ Order #{} paid in full by payment {} ({} {})",
                    ev.order.id, ev.payment.gateway_intent_id, ev.payment.amount, ev.payment.currency
                );
            })
        })
        .on_payment_failed(|ev: PaymentFailedEvent| {
            Box::pin(async move {
                let reason = ev.payment.error.as_deref().unwrap_or("no reason given");
                let payment = &ev.payment;
                warn!("💳️ Payment {} for order #{} failed. {reason}", payment.gateway_intent_id, payment.order_id);
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = StripeGateway::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let validator = TokenValidator::new(&config.auth);
    let gateway_timeout = config.gateway_timeout;
    let srv = HttpServer::new(move || {
        let cart_api = CartApi::new(db.clone());
        let orders_api = OrderLedgerApi::new(db.clone(), producers.clone());
        let payments_api = PaymentIntentApi::new(db.clone(), gateway.clone()).with_timeout(gateway_timeout);
        let reconciler_api = ReconcilerApi::new(db.clone(), gateway.clone(), producers.clone());
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let path_config = web::PathConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(json_config)
            .app_data(path_config)
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(reconciler_api));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(validator.clone()))
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderPaymentsRoute::<SqliteDatabase, StripeGateway>::new())
            .service(MyOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(CreatePaymentIntentRoute::<SqliteDatabase, StripeGateway>::new());
        // Webhook calls are authenticated by their signature, not by a token
        let webhook_scope = web::scope("/webhook").service(StripeWebhookRoute::<SqliteDatabase, StripeGateway>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
