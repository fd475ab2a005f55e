//! Bindings between the `gateway_tools` REST clients and the capabilities the engine expects.
use gateway_tools::GatewayApiError;
use micropay_engine::traits::ExternalServiceError;

pub mod circle;
pub mod notifications;
pub mod stripe;

pub(crate) fn service_error(service: &str, e: GatewayApiError) -> ExternalServiceError {
    match e {
        e if e.is_transient() => ExternalServiceError::unavailable(service, e.to_string()),
        e @ (GatewayApiError::JsonError(_) | GatewayApiError::EmptyResponse(_)) => {
            ExternalServiceError::invalid_response(service, e.to_string())
        },
        e => ExternalServiceError::rejected(service, e.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gateway_errors_are_classified() {
        let e = service_error("Circle", GatewayApiError::QueryError { status: 503, message: "down".into() });
        assert!(matches!(e, ExternalServiceError::Unavailable { .. }));
        let e = service_error("Circle", GatewayApiError::QueryError { status: 400, message: "bad".into() });
        assert!(matches!(e, ExternalServiceError::Rejected { .. }));
        let e = service_error("Stripe", GatewayApiError::JsonError("eof".into()));
        assert!(matches!(e, ExternalServiceError::InvalidResponse { .. }));
        let e = service_error("Stripe", GatewayApiError::RestResponseError("timeout".into()));
        assert!(matches!(e, ExternalServiceError::Unavailable { .. }));
    }
}
