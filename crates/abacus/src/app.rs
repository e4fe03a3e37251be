//! Routes and handlers of the calculator API.

use std::sync::Arc;

use http::Method;
use tracing::{debug, error};

use abacus_config::AbacusConfig;
use abacus_core::{
    evaluate, ApiError, CalculationRequest, CalculationResponse, Operation, RequestContext,
    ServiceInfo,
};
use abacus_server::{Server, HEALTH_PATH};
use abacus_telemetry::metrics::record_evaluation;

/// Operation ID of `GET /`.
pub const SERVICE_INFO: &str = "serviceInfo";

/// Operation ID of `POST /calculate`.
pub const CALCULATE: &str = "calculate";

/// Operation ID of `GET /health`.
pub const HEALTH: &str = "health";

/// Builds the calculator server from configuration.
///
/// `GET /health` is answered by the server's built-in probe; it is routed
/// here only so it shows up in the endpoint list of `GET /`.
#[must_use]
pub fn build_server(config: &AbacusConfig) -> Server {
    let mut server = Server::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.shutdown_timeout())
        .request_timeout(config.request_timeout())
        .max_body_bytes(config.server.max_body_bytes)
        .build();

    let router = server.router_mut();
    router.add_route(Method::GET, "/", SERVICE_INFO);
    router.add_route(Method::POST, "/calculate", CALCULATE);
    router.add_route(Method::GET, HEALTH_PATH, HEALTH);

    let endpoints = server
        .router()
        .paths()
        .into_iter()
        .filter(|path| *path != "/")
        .map(str::to_string)
        .collect();

    let info = Arc::new(ServiceInfo {
        message: config.service.name.clone(),
        version: config.service.version.clone(),
        endpoints,
    });

    let handlers = server.handlers_mut();
    handlers.register_no_body(SERVICE_INFO, move |_ctx| {
        let info = Arc::clone(&info);
        async move { Ok::<_, ApiError>(ServiceInfo::clone(&info)) }
    });
    handlers.register(CALCULATE, calculate);

    server
}

async fn calculate(
    ctx: RequestContext,
    request: CalculationRequest,
) -> Result<CalculationResponse, ApiError> {
    // Unknown tags share one label so client input can't grow the series.
    let label = request
        .operation
        .parse::<Operation>()
        .map_or("unsupported", Operation::as_str);

    match evaluate(request.a, request.b, &request.operation) {
        Ok(result) if [request.a, request.b, result].iter().all(|v| v.is_finite()) => {
            record_evaluation(label, "ok");
            Ok(CalculationResponse::new(request, result))
        }
        Ok(result) => {
            // JSON has no encoding for infinity or NaN.
            record_evaluation(label, "non_finite");
            error!(
                request_id = %ctx.request_id(),
                operation = %request.operation,
                a = %request.a,
                b = %request.b,
                result = %result,
                "Evaluation produced a non-finite number"
            );
            Err(ApiError::internal("Out of range float values are not JSON compliant"))
        }
        Err(err) => {
            record_evaluation(label, err.kind());
            debug!(
                request_id = %ctx.request_id(),
                operation = %request.operation,
                error = %err,
                "Evaluation rejected"
            );
            Err(err.into())
        }
    }
}
