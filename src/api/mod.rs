use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Calculation, CalculatorInputs, ComparisonSelection, Language, ProductProfile,
    ProductProjection, ProductType, RadarRow, ValidationFailure, calculate, clamp_number,
    product_profile, project_products, radar_rows, sanitize_number_input, validation_report,
};
use crate::error::Error;
use crate::export::{
    ExportFormat, PROJECTION_EXPORT_NAME, ShareContent, calculator_link, dated_filename,
    projection_share, projection_table, today,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProductType {
    #[serde(alias = "private-pension", alias = "privatePension")]
    Private,
    Riester,
    #[serde(alias = "rürup")]
    Ruerup,
    #[serde(alias = "bav")]
    Occupational,
}

impl From<ApiProductType> for ProductType {
    fn from(value: ApiProductType) -> Self {
        match value {
            ApiProductType::Private => ProductType::Private,
            ApiProductType::Riester => ProductType::Riester,
            ApiProductType::Ruerup => ProductType::Ruerup,
            ApiProductType::Occupational => ProductType::Occupational,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiLanguage {
    #[serde(alias = "de-DE")]
    De,
    #[serde(alias = "en-US", alias = "en-GB")]
    En,
}

impl From<ApiLanguage> for Language {
    fn from(value: ApiLanguage) -> Self {
        match value {
            ApiLanguage::De => Language::De,
            ApiLanguage::En => Language::En,
        }
    }
}

/// A numeric field as typed by a user. JSON numbers pass through untouched;
/// text goes through the same sanitization as form input.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    fn value(&self) -> f64 {
        match self {
            NumberInput::Number(value) => *value,
            NumberInput::Text(raw) => sanitize_number_input(raw),
        }
    }

    fn age(&self) -> u32 {
        clamp_number(self.value().round(), 0.0, f64::from(u32::MAX)) as u32
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatorPayload {
    current_age: Option<NumberInput>,
    retirement_age: Option<NumberInput>,
    monthly_contribution: Option<NumberInput>,
    start_capital: Option<NumberInput>,
    expected_return: Option<NumberInput>,
    inflation_rate: Option<NumberInput>,

    product: Option<ApiProductType>,
    language: Option<ApiLanguage>,

    /// Comma-separated product ids for the comparison endpoint.
    products: Option<String>,
    share_url: Option<String>,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: CalculatorInputs,
    product: ProductType,
    language: Language,
    products: Vec<ProductType>,
    share_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    valid: bool,
    blocking: bool,
    failures: Vec<ValidationFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    language: Language,
    #[serde(flatten)]
    calculation: Calculation,
    #[serde(skip_serializing_if = "Option::is_none")]
    share: Option<ShareContent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    language: Language,
    selected: Vec<ProductType>,
    products: Vec<ProductProfile>,
    radar: Vec<RadarRow>,
    projections: Vec<ProductProjection>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<ValidationFailure>,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/validate",
            get(validate_get_handler).post(validate_post_handler),
        )
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/project.csv", get(project_csv_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pension calculator API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn validate_get_handler(Query(payload): Query<CalculatorPayload>) -> Response {
    validate_handler_impl(payload)
}

async fn validate_post_handler(Json(payload): Json<CalculatorPayload>) -> Response {
    validate_handler_impl(payload)
}

async fn project_get_handler(Query(payload): Query<CalculatorPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<CalculatorPayload>) -> Response {
    project_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<CalculatorPayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<CalculatorPayload>) -> Response {
    compare_handler_impl(payload)
}

fn validate_handler_impl(payload: CalculatorPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let report = validation_report(&request.inputs, request.product, request.language);
    json_response(
        StatusCode::OK,
        ValidateResponse {
            valid: report.is_valid(),
            blocking: report.has_blocking(),
            failures: report.failures,
        },
    )
}

fn project_handler_impl(payload: CalculatorPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let calculation = match calculate(&request.inputs, request.product, request.language) {
        Ok(calculation) => calculation,
        Err(err) => return calculation_error_response(err),
    };

    let share = match request.share_url.as_deref() {
        Some(base) => match calculator_link(base, request.product, &request.inputs) {
            Ok(link) => Some(projection_share(
                &calculation.summary,
                request.language,
                &link,
            )),
            Err(err) => {
                tracing::warn!(error = %err, "share link rejected");
                return error_response(StatusCode::BAD_REQUEST, &err.to_string());
            }
        },
        None => None,
    };

    json_response(
        StatusCode::OK,
        ProjectResponse {
            language: request.language,
            calculation,
            share,
        },
    )
}

async fn project_csv_handler(Query(payload): Query<CalculatorPayload>) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let calculation = match calculate(&request.inputs, request.product, request.language) {
        Ok(calculation) => calculation,
        Err(err) => return calculation_error_response(err),
    };

    let csv = match projection_table(&calculation.points, request.language).to_csv() {
        Ok(csv) => csv,
        Err(err) => {
            tracing::error!(error = %err, "csv export failed");
            let msg = request.language.pick(
                "Ergebnisse konnten nicht heruntergeladen werden",
                "Failed to download results",
            );
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, msg);
        }
    };

    let filename = dated_filename(PROJECTION_EXPORT_NAME, ExportFormat::Csv, today());
    with_cache_control((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

fn compare_handler_impl(payload: CalculatorPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let selection = ComparisonSelection::from_products(&request.products);
    let selected = selection.products().to_vec();
    let projections = match project_products(&request.inputs, &selected, request.language) {
        Ok(projections) => projections,
        Err(err) => return calculation_error_response(err),
    };
    let response = CompareResponse {
        language: request.language,
        products: selected
            .iter()
            .map(|&product| product_profile(product, request.language))
            .collect(),
        radar: radar_rows(&selected, request.language),
        projections,
        selected,
    };
    json_response(StatusCode::OK, response)
}

fn calculation_error_response(err: Error) -> Response {
    match err {
        Error::Validation(failures) => {
            tracing::debug!(failures = failures.len(), "inputs rejected");
            let message = failures
                .first()
                .map(|f| f.message.clone())
                .unwrap_or_default();
            json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: message,
                    failures,
                },
            )
        }
        Error::Export(err) => {
            tracing::error!(error = %err, "calculation export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            failures: Vec::new(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatorPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: CalculatorPayload) -> Result<ApiRequest, String> {
    let mut inputs = CalculatorInputs::default();

    if let Some(v) = payload.current_age {
        inputs.current_age = v.age();
    }
    if let Some(v) = payload.retirement_age {
        inputs.retirement_age = v.age();
    }
    if let Some(v) = payload.monthly_contribution {
        inputs.monthly_contribution = v.value();
    }
    if let Some(v) = payload.start_capital {
        inputs.start_capital = v.value();
    }
    if let Some(v) = payload.expected_return {
        inputs.expected_return = v.value();
    }
    if let Some(v) = payload.inflation_rate {
        inputs.inflation_rate = v.value();
    }

    let products = match payload.products.as_deref() {
        Some(raw) => parse_product_list(raw)?,
        None => Vec::new(),
    };

    Ok(ApiRequest {
        inputs,
        product: payload.product.map(Into::into).unwrap_or(ProductType::Private),
        language: payload.language.map(Into::into).unwrap_or_default(),
        products,
        share_url: payload.share_url,
    })
}

fn parse_product_list(raw: &str) -> Result<Vec<ProductType>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            serde_json::from_value::<ApiProductType>(serde_json::Value::String(id.to_string()))
                .map(Into::into)
                .map_err(|_| format!("unknown product '{id}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[test]
    fn api_request_defaults_to_calculator_defaults() {
        let request = api_request_from_json("{}").expect("empty payload is valid");
        assert_eq!(request.inputs, CalculatorInputs::default());
        assert_eq!(request.product, ProductType::Private);
        assert_eq!(request.language, Language::De);
        assert!(request.products.is_empty());
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "currentAge": 40,
          "retirementAge": 65,
          "monthlyContribution": 150.5,
          "startCapital": "2500",
          "expectedReturn": 5,
          "inflationRate": "-1",
          "product": "private-pension",
          "language": "en",
          "products": "riester, ruerup,occupational"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");

        assert_eq!(request.inputs.current_age, 40);
        assert_eq!(request.inputs.retirement_age, 65);
        assert_approx(request.inputs.monthly_contribution, 150.5);
        assert_approx(request.inputs.start_capital, 2_500.0);
        assert_approx(request.inputs.expected_return, 5.0);
        // Text input is sanitized, so negatives clamp to zero.
        assert_approx(request.inputs.inflation_rate, 0.0);
        assert_eq!(request.product, ProductType::Private);
        assert_eq!(request.language, Language::En);
        assert_eq!(
            request.products,
            vec![
                ProductType::Riester,
                ProductType::Ruerup,
                ProductType::Occupational
            ]
        );
    }

    #[test]
    fn api_request_rejects_unknown_product_in_list() {
        let err = api_request_from_json(r#"{"products":"riester,bitcoin"}"#)
            .expect_err("must reject unknown product");
        assert!(err.contains("bitcoin"));
    }

    #[test]
    fn infinity_text_sanitizes_to_zero() {
        let request =
            api_request_from_json(r#"{"retirementAge":"inf","startCapital":"infinity"}"#)
                .expect("ok");
        assert_eq!(request.inputs.retirement_age, 0);
        assert_approx(request.inputs.start_capital, 0.0);
    }

    #[test]
    fn text_ages_are_sanitized_and_rounded() {
        let request =
            api_request_from_json(r#"{"currentAge":"abc","retirementAge":"66.6"}"#).expect("ok");
        assert_eq!(request.inputs.current_age, 0);
        assert_eq!(request.inputs.retirement_age, 67);
    }

    #[tokio::test]
    async fn project_returns_series_and_summary() {
        let resp = router()
            .oneshot(get("/api/project?currentAge=35&retirementAge=67&product=riester"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");

        let body = body_json(resp).await;
        assert_eq!(body["product"], "riester");
        let points = body["points"].as_array().expect("points array");
        assert_eq!(points.len(), 33);
        assert_eq!(points[0]["capital"], 14_200.0);
        assert_eq!(points[32]["year"], 67);
        assert!(body["summary"]["monthlyPension"].is_number());
        assert!(body.get("share").is_none());
    }

    #[tokio::test]
    async fn project_rejects_invalid_inputs_with_first_message() {
        let resp = router()
            .oneshot(post_json(
                "/api/project",
                r#"{"currentAge":35,"retirementAge":30,"language":"en"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(resp).await;
        assert_eq!(
            body["error"],
            "Retirement age must be greater than current age"
        );
        assert_eq!(body["failures"][0]["field"], "retirementAge");
        assert_eq!(body["failures"][0]["severity"], "error");
    }

    #[tokio::test]
    async fn project_keeps_occupational_advisory_non_blocking() {
        let resp = router()
            .oneshot(post_json(
                "/api/project",
                r#"{"product":"occupational","monthlyContribution":700}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["advisories"][0]["severity"], "advisory");
    }

    #[tokio::test]
    async fn project_attaches_share_content_when_url_given() {
        let resp = router()
            .oneshot(post_json(
                "/api/project",
                r#"{"product":"ruerup","shareUrl":"https://example.de/rechner"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["share"]["title"], "Meine Rentenprognose");
        let url = body["share"]["url"].as_str().expect("url");
        assert!(url.starts_with("https://example.de/rechner?product=ruerup"));
    }

    #[tokio::test]
    async fn project_rejects_invalid_share_url() {
        let resp = router()
            .oneshot(post_json("/api/project", r#"{"shareUrl":"not a url"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_reports_all_failures() {
        let resp = router()
            .oneshot(get(
                "/api/validate?product=ruerup&monthlyContribution=2400&expectedReturn=20",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["blocking"], true);
        let failures = body["failures"].as_array().expect("failures");
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[0]["message"],
            "Rürup-Beitrag darf höchstens 2297€/Monat sein (27566€/Jahr)"
        );
        assert_eq!(failures[1]["field"], "expectedReturn");
    }

    #[tokio::test]
    async fn validate_accepts_defaults() {
        let resp = router().oneshot(get("/api/validate")).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["failures"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn project_csv_is_attachment_with_dated_name() {
        let resp = router()
            .oneshot(get("/api/project.csv?language=en&currentAge=60&retirementAge=62"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("rentenrechner-ergebnisse-"));
        assert!(disposition.ends_with(".csv\""));

        let csv = body_text(resp).await;
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("Year,Capital,Contributions,Returns\n60,"));
    }

    #[tokio::test]
    async fn compare_uses_default_selection() {
        let resp = router().oneshot(get("/api/compare")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(
            body["selected"],
            serde_json::json!(["riester", "ruerup", "private"])
        );
        assert_eq!(body["radar"].as_array().map(Vec::len), Some(5));
        assert_eq!(body["projections"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["products"][0]["name"], "Riester-Rente");
    }

    #[tokio::test]
    async fn compare_caps_selection_and_localizes() {
        let resp = router()
            .oneshot(post_json(
                "/api/compare",
                r#"{"products":"occupational,private,private","language":"en"}"#,
            ))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(
            body["selected"],
            serde_json::json!(["occupational", "private"])
        );
        assert_eq!(body["radar"][4]["label"], "Costs");
        assert_eq!(body["radar"][4]["values"][0]["value"], 6.0);
    }

    #[tokio::test]
    async fn compare_rejects_horizon_past_max_age() {
        let resp = router()
            .oneshot(get(
                "/api/compare?currentAge=18&retirementAge=200000&language=en",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");

        let body = body_json(resp).await;
        assert_eq!(body["error"], "Retirement age must be at most 75");
        assert_eq!(body["failures"][0]["field"], "retirementAge");
        assert!(body.get("projections").is_none());
    }

    #[tokio::test]
    async fn compare_rejects_infinite_and_inverted_ages() {
        let resp = router()
            .oneshot(get("/api/compare?retirementAge=inf"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(
            body["error"],
            "Renteneintrittsalter muss höher als das aktuelle Alter sein"
        );

        let resp = router()
            .oneshot(post_json(
                "/api/compare",
                r#"{"currentAge":10,"retirementAge":5,"products":"riester"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Aktuelles Alter muss mindestens 18 sein");
        assert_eq!(body["failures"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let resp = router().oneshot(get("/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = router().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }
}
