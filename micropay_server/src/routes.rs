//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits its database and network calls instead.
use actix_web::{get, web, HttpResponse, Responder};
use gateway_tools::stripe::webhook::StripeEvent;
use log::*;
use micropay_engine::{
    db_types::NewAccount,
    traits::{AccountManagement, PaymentGateway, RechargeDatabase, TreasuryGateway, WalletProvider},
    ProvisioningApi,
    RechargeFlowApi,
    SettlementApi,
};

use crate::{
    auth::CallerAccount,
    data_objects::{
        InitPaymentRequest,
        InitPaymentResponse,
        NewAccountRequest,
        NewAccountResponse,
        QuoteParams,
        WebhookAck,
    },
    errors::ServerError,
    integrations::stripe::notification_from_event,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
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

//----------------------------------------------   Recharges  ----------------------------------------------------
route!(quote => Get "/recharges/quote" impl RechargeDatabase, PaymentGateway, TreasuryGateway);
/// Prices a recharge of `units` credit units. Nothing is reserved, and the caller need not be identified.
pub async fn quote<B, P, T>(
    params: web::Query<QuoteParams>,
    api: web::Data<RechargeFlowApi<B, P, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: RechargeDatabase,
    P: PaymentGateway,
    T: TreasuryGateway,
{
    trace!("💻️ GET quote for {} units", params.units);
    let quote = api.quote(params.units)?;
    Ok(HttpResponse::Ok().json(quote))
}

route!(init_payment => Post "/recharges/init-payment" impl RechargeDatabase, PaymentGateway, TreasuryGateway);
/// Starts a recharge for the calling account.
///
/// On success the response carries the payment processor's client secret, which the client uses to collect the card
/// payment, and the `PENDING` recharge. The recharge is settled later, when the processor calls the payment webhook.
pub async fn init_payment<B, P, T>(
    caller: CallerAccount,
    body: web::Json<InitPaymentRequest>,
    api: web::Data<RechargeFlowApi<B, P, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: RechargeDatabase,
    P: PaymentGateway,
    T: TreasuryGateway,
{
    let account_id = caller.account_id();
    debug!("💻️ POST init-payment for {} units by {account_id}", body.units);
    let handle = api.init_payment(account_id, body.units).await?;
    let response = InitPaymentResponse { client_secret: handle.client_secret, recharge: handle.recharge };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(create_account => Post "/accounts" impl AccountManagement, WalletProvider);
pub async fn create_account<B, W>(
    body: web::Json<NewAccountRequest>,
    api: web::Data<ProvisioningApi<B, W>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement,
    W: WalletProvider,
{
    let NewAccountRequest { email, first_name, last_name } = body.into_inner();
    debug!("💻️ POST new account for {email}");
    let (account, wallet) = api.create_account(NewAccount::new(email, first_name, last_name)).await?;
    Ok(HttpResponse::Created().json(NewAccountResponse { account, wallet }))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/payment" impl RechargeDatabase, TreasuryGateway);
/// Receives payment outcome notifications from Stripe. The signature has already been checked by the middleware.
///
/// A correctly signed delivery is always acknowledged with `{"status": "success"}`. Settlement problems are logged
/// and alerted on here, and are not reported back to the processor.
pub async fn payment_webhook<B, T>(
    body: web::Bytes,
    api: web::Data<SettlementApi<B, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: RechargeDatabase,
    T: TreasuryGateway,
{
    trace!("💻️ Received payment webhook");
    let notification = match StripeEvent::parse(body.as_ref()).and_then(|ev| notification_from_event(&ev)) {
        Ok(n) => n,
        Err(e) => {
            warn!("💻️ Could not interpret a signed webhook delivery. {e}");
            return Ok(HttpResponse::Ok().json(WebhookAck::success()));
        },
    };
    let intent_id = notification.intent_id.clone();
    match api.process_notification(notification).await {
        Ok(outcome) => debug!("💻️ Webhook for intent {intent_id} processed. {outcome:?}"),
        Err(e) => error!("💻️ Webhook for intent {intent_id} could not be settled. {e}"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck::success()))
}
