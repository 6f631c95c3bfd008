use aws_sdk_dynamodb::error::DisplayErrorContext;
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::{HeaderValue, StatusCode};
use lambda_http::request::RequestContext;
use lambda_http::{Request, RequestExt, Response};
use tracing::error;

use crate::common::errors::Error;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Plain status-text response. Never fails, so it is safe to reach for on any error path.
fn status_response(status: StatusCode) -> Response<String> {
    let mut response = Response::new(status.canonical_reason().unwrap_or_default().to_string());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

    response
}

pub fn client_error(status: StatusCode) -> Response<String> {
    status_response(status)
}

pub fn server_error(err: &Error) -> Response<String> {
    error!("{}", DisplayErrorContext(err));
    status_response(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Maps a handler error onto the response the caller gets.
pub fn error_response(err: &Error) -> Response<String> {
    if err.is_client_error() {
        client_error(err.status())
    } else {
        server_error(err)
    }
}

/// Path from the raw event, without the API Gateway stage prefix that `uri()` carries.
/// Falls back to the URI path for requests that never came through API Gateway.
pub fn request_path(request: &Request) -> &str {
    match request.raw_http_path() {
        "" => request.uri().path(),
        raw => raw,
    }
}

/// Caller address. Tries the REST, HTTP API and WebSocket request contexts in turn, then the
/// first `X-Forwarded-For` entry, and finally gives up with an empty string.
pub fn source_ip(request: &Request) -> String {
    let from_context = match request.request_context_ref() {
        Some(RequestContext::ApiGatewayV1(context)) => context.identity.source_ip.clone(),
        Some(RequestContext::ApiGatewayV2(context)) => context.http.source_ip.clone(),
        Some(RequestContext::WebSocket(context)) => context.identity.source_ip.clone(),
        _ => None,
    };

    from_context
        .filter(|ip| !ip.is_empty())
        .or_else(|| forwarded_for(request))
        .unwrap_or_default()
}

fn forwarded_for(request: &Request) -> Option<String> {
    request
        .headers()
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}

#[cfg(test)]
pub mod fixtures {
    use std::collections::HashMap;

    /// API Gateway REST proxy event, as the runtime hands it to the function.
    pub fn rest_event(method: &str, path: &str, stage: &str, query: &[(&str, &str)]) -> String {
        let query = (!query.is_empty()).then(|| {
            query
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<HashMap<_, _>>()
        });

        serde_json::json!({
            "resource": "/{proxy+}",
            "path": path,
            "httpMethod": method,
            "headers": {"Host": "abc123.execute-api.eu-west-1.amazonaws.com"},
            "multiValueHeaders": {"Host": ["abc123.execute-api.eu-west-1.amazonaws.com"]},
            "queryStringParameters": query,
            "multiValueQueryStringParameters": null,
            "pathParameters": {"proxy": path.trim_start_matches('/')},
            "stageVariables": null,
            "requestContext": {
                "accountId": "123456789012",
                "resourceId": "us4z18",
                "stage": stage,
                "requestId": "41b45ea3-70b5-11e6-b7bd-69b5aaebc7d9",
                "identity": {"sourceIp": "203.0.113.7", "userAgent": "curl/8.0"},
                "resourcePath": "/{proxy+}",
                "httpMethod": method,
                "apiId": "abc123",
                "path": format!("/{stage}{path}"),
            },
            "body": null,
            "isBase64Encoded": false,
        })
        .to_string()
    }
}
