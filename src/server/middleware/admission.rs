//! Admission middleware

use crate::auth::{AuthContext, Decision};
use crate::server::middleware::helpers::{extract_credentials, is_public_route};
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{HttpMessage, HttpRequest, ResponseError, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// Runs the gate's authenticate and admit steps for every non-public route.
///
/// An admitted request carries its [`AuthContext`] in the request
/// extensions. A denial or store failure short-circuits with the mapped
/// error response and the handler never runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdmissionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AdmissionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

/// Service implementation for admission middleware
pub struct AdmissionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path()) {
                return service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body);
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                error!("admission middleware mounted without application state");
                return Ok(reject(
                    req,
                    GatewayError::internal("application state missing"),
                ));
            };

            let credentials =
                extract_credentials(req.request(), state.config.rate_limit.trust_proxy_header);

            let ctx = match state.auth.gate().admit_request(&credentials).await {
                Ok(Decision::Allow(ctx)) => ctx,
                Ok(Decision::Deny(reason)) => {
                    debug!(
                        addr = %credentials.client_addr,
                        path = %req.path(),
                        %reason,
                        "request denied"
                    );
                    return Ok(reject(req, reason.into_error()));
                }
                Err(e) => return Ok(reject(req, e)),
            };

            let audited_client = ctx.trusted_client.as_ref().map(|c| c.id);
            let endpoint = req.path().to_string();
            let method = req.method().to_string();
            req.extensions_mut().insert(ctx);

            let res = service.call(req).await?;

            if let Some(client_id) = audited_client {
                let status = res.status().as_u16();
                if let Err(e) = state
                    .auth
                    .clients()
                    .record_request(client_id, &endpoint, &method, status)
                    .await
                {
                    warn!(client_id, error = %e, "failed to record trusted client request");
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}

fn reject<B>(req: ServiceRequest, err: GatewayError) -> ServiceResponse<EitherBody<B>> {
    let response = err.error_response();
    req.into_response(response).map_into_right_body()
}

/// Admission outcome attached by [`AdmissionMiddleware`]
pub fn request_context(req: &HttpRequest) -> Result<AuthContext, GatewayError> {
    req.extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| GatewayError::internal("missing request context"))
}
