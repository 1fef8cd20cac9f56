//----------------------------------------------   Stripe webhook  ----------------------------------------------------
//! The payment gateway pushes payment outcomes here.
//!
//! The raw body is handed to the reconciler untouched, since the signature covers the exact bytes Stripe sent.
//!
//! Stripe retries any delivery that does not get a 2xx response, so the status code is chosen with that in mind:
//! * 200: the event was applied, was a duplicate, or is a kind we ignore. Retrying would not change anything.
//! * 400: the event is authentic but cannot be understood, e.g. it has no order id. Stripe will keep redelivering it
//!   until its retry window runs out, so these show up in the log and in the Stripe dashboard.
//! * 401: the signature is missing or wrong. Nothing was read or written.
//! * 500: a payment or order lookup failed, or the database did. A later retry may succeed.
use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use market_engine::{
    traits::{PaymentGateway, PaymentManagement},
    ReconcileError,
    ReconcilerApi,
};
use stripe_tools::webhook::SIGNATURE_HEADER;

use crate::{data_objects::JsonResponse, route};

route!(stripe_webhook => Post "/stripe" impl PaymentManagement ; gateway PaymentGateway);
pub async fn stripe_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconcilerApi<B, G>>,
) -> HttpResponse
where
    B: PaymentManagement,
    G: PaymentGateway,
{
    trace!("🔄️ Received webhook request: {}", req.uri());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match api.handle_gateway_event(body.as_ref(), signature).await {
        Ok(outcome) => {
            info!("🔄️ {}", outcome.summary());
            HttpResponse::Ok().json(JsonResponse::success(outcome.summary()))
        },
        Err(e) if e.is_unauthenticated() => {
            warn!("🔄️ Rejected unauthenticated webhook call. {e}");
            HttpResponse::Unauthorized().json(JsonResponse::failure("Invalid signature."))
        },
        Err(ReconcileError::MalformedEvent(s)) => {
            warn!("🔄️ Could not interpret webhook event. {s}");
            HttpResponse::BadRequest().json(JsonResponse::failure(format!("Malformed event. {s}")))
        },
        Err(e) => {
            if e.is_retryable() {
                warn!("🔄️ Could not apply webhook event. It should be retried. {e}");
            } else {
                error!("🔄️ Could not apply webhook event. {e}");
            }
            HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process the event."))
        },
    }
}
