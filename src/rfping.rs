use aws_config::{BehaviorVersion, Region};
use lambda_http::http::header::LOCATION;
use lambda_http::http::{Method, StatusCode};
use lambda_http::{
    run, service_fn, Error as LambdaError, Request as LambdaRequest, RequestExt,
    Response as LambdaResponse,
};
use tracing::info;

mod common;
use crate::common::errors::Error;
use crate::common::store::{DynamoPingStore, PingStore};
use crate::common::utils::{error_response, request_path, source_ip};
use crate::common::validation::{redirect_target, Validator};
use crate::common::{Config, Ping};

const RECEIVED_HEADER: &str = "X-RFPing-Received";
const RECEIVED_OK: &str = "OK";
const RECEIVED_REDIRECT: &str = "REDIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    List,
    Record,
}

impl Route {
    fn for_method(method: &Method) -> Self {
        if method == Method::OPTIONS {
            Route::List
        } else {
            Route::Record
        }
    }
}

/// Everything an invocation needs, built once per cold start.
struct Context<S> {
    store: S,
    validator: Validator,
}

async fn record<S: PingStore>(
    request: &LambdaRequest,
    context: &Context<S>,
) -> Result<LambdaResponse<String>, Error> {
    let path = request_path(request);
    if !context.validator.is_valid_path(path) {
        return Err(Error::InvalidPath(path.into()));
    }

    let query = request.query_string_parameters_ref();
    let code = context
        .validator
        .response_code(query.and_then(|query| query.first("code")));
    let location = context
        .validator
        .location(query.and_then(|query| query.first("location")));

    let status = StatusCode::from_bytes(code.as_bytes())
        .map_err(|err| Error::InvalidStatusCode(code.into(), err))?;

    let builder = LambdaResponse::builder().status(status);
    let builder = match redirect_target(location) {
        Some(target) => builder
            .header(LOCATION, target)
            .header(RECEIVED_HEADER, RECEIVED_REDIRECT),
        None => builder.header(RECEIVED_HEADER, RECEIVED_OK),
    };

    let ping = Ping::new(path, source_ip(request));
    let response = builder.body(serde_json::to_string(&ping)?)?;

    context.store.put_ping(&ping).await?;
    info!("Recorded ping {} for {}", ping.id, ping.path);

    Ok(response)
}

async fn list<S: PingStore>(context: &Context<S>) -> Result<LambdaResponse<String>, Error> {
    let pings = context.store.list_pings().await?;

    let response = LambdaResponse::builder()
        .status(StatusCode::OK)
        .body(serde_json::to_string(&pings)?)?;

    Ok(response)
}

#[tracing::instrument(skip_all, fields(method = %request.method(), path = %request_path(&request)))]
async fn process_request<S: PingStore>(
    request: LambdaRequest,
    context: &Context<S>,
) -> Result<LambdaResponse<String>, LambdaError> {
    let route = Route::for_method(request.method());
    info!("Routing to {:?}", route);

    let result = match route {
        Route::List => list(context).await,
        Route::Record => record(&request, context).await,
    };

    match result {
        Ok(val) => Ok(val),
        Err(err) => Ok(error_response(&err)),
    }
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time() // CloudWatch will add the ingestion time
        .with_target(false)
        .init();

    let config = Config::from_env();
    info!("Starting with {:?}", config);

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = config.region.clone() {
        loader = loader.region(Region::new(region));
    }
    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    let aws_config = loader.load().await;
    let dynamo_client = aws_sdk_dynamodb::Client::new(&aws_config);

    let context = Context {
        store: DynamoPingStore::new(dynamo_client, config.table_name),
        validator: Validator::new()?,
    };

    run(service_fn(|request: LambdaRequest| process_request(request, &context))).await
}
