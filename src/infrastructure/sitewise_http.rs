// IoT SiteWise REST client signed with SigV4
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::sitewise_client::{ApiError, ApiResult, ClientProvider, SitewiseClient};
use crate::domain::sitewise::*;
use crate::infrastructure::config::DatasourceSettings;
use crate::infrastructure::credentials::CredentialSource;
use crate::infrastructure::sigv4::sign_request;

pub const SERVICE: &str = "iotsitewise";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plane {
    Control,
    Data,
}

type Params = Vec<(&'static str, String)>;

fn push(params: &mut Params, name: &'static str, value: Option<impl ToString>) {
    if let Some(value) = value {
        params.push((name, value.to_string()));
    }
}

fn query_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn property_params(property: &PropertyRef) -> Params {
    let mut params = Params::new();
    push(&mut params, "assetId", property.asset_id.as_deref());
    push(&mut params, "propertyId", property.property_id.as_deref());
    push(&mut params, "propertyAlias", property.property_alias.as_deref());
    params
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, rename = "__type")]
    error_type: Option<String>,
}

/// Error code from the `x-amzn-errortype` header or the body `__type`,
/// stripped of any namespace or trailing url.
fn error_code(header: Option<&str>, body_type: Option<&str>, status: StatusCode) -> String {
    header
        .or(body_type)
        .map(|raw| {
            let code = raw.split(':').next().unwrap_or(raw);
            code.rsplit('#').next().unwrap_or(code).to_string()
        })
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("UnknownError")
                .replace(' ', "")
        })
}

pub struct SitewiseHttpClient {
    http: reqwest::Client,
    region: String,
    endpoint: Option<String>,
    credentials: CredentialSource,
}

impl SitewiseHttpClient {
    pub fn new(
        http: reqwest::Client,
        region: impl Into<String>,
        endpoint: Option<&str>,
        credentials: CredentialSource,
    ) -> Self {
        Self {
            http,
            region: region.into(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            credentials,
        }
    }

    fn url(&self, plane: Plane, path: &str) -> String {
        match (&self.endpoint, plane) {
            (Some(endpoint), _) => format!("{endpoint}{path}"),
            (None, Plane::Control) => {
                format!("https://api.iotsitewise.{}.amazonaws.com{path}", self.region)
            }
            (None, Plane::Data) => {
                format!("https://data.iotsitewise.{}.amazonaws.com{path}", self.region)
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, plane: Plane, path: &str, params: &Params) -> ApiResult<T> {
        let builder = self.http.request(Method::GET, self.url(plane, path)).query(params);
        self.send(builder).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        plane: Plane,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.http.request(Method::POST, self.url(plane, path)).json(body);
        self.send(builder).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let mut request = builder.build()?;
        let credentials = self.credentials.credentials().await?;
        sign_request(&mut request, &credentials, &self.region, SERVICE, Utc::now())?;

        tracing::debug!("{} {}", request.method(), request.url().path());
        let response = self.http.execute(request).await?;
        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
            let code = error_code(error_type.as_deref(), parsed.error_type.as_deref(), status);
            let message = parsed
                .message
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            tracing::warn!("SiteWise request failed with {}: {}: {}", status, code, message);
            return Err(ApiError::Service {
                status: status.as_u16(),
                code,
                message,
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SitewiseClient for SitewiseHttpClient {
    async fn describe_asset(&self, asset_id: &str) -> ApiResult<DescribeAssetResponse> {
        let path = format!("/assets/{}", urlencoding::encode(asset_id));
        self.get(Plane::Control, &path, &Params::new()).await
    }

    async fn describe_asset_model(
        &self,
        asset_model_id: &str,
    ) -> ApiResult<DescribeAssetModelResponse> {
        let path = format!("/asset-models/{}", urlencoding::encode(asset_model_id));
        self.get(Plane::Control, &path, &Params::new()).await
    }

    async fn describe_time_series(
        &self,
        request: &DescribeTimeSeriesRequest,
    ) -> ApiResult<DescribeTimeSeriesResponse> {
        let mut params = Params::new();
        push(&mut params, "alias", request.alias.as_deref());
        push(&mut params, "assetId", request.asset_id.as_deref());
        push(&mut params, "propertyId", request.property_id.as_deref());
        self.get(Plane::Control, "/timeseries/describe/", &params).await
    }

    async fn list_assets(&self, request: &ListAssetsRequest) -> ApiResult<ListAssetsResponse> {
        let mut params = Params::new();
        push(&mut params, "assetModelId", request.asset_model_id.as_deref());
        push(&mut params, "filter", request.filter.as_deref());
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", request.max_results);
        self.get(Plane::Control, "/assets", &params).await
    }

    async fn list_asset_models(
        &self,
        request: &ListAssetModelsRequest,
    ) -> ApiResult<ListAssetModelsResponse> {
        let mut params = Params::new();
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", request.max_results);
        self.get(Plane::Control, "/asset-models", &params).await
    }

    async fn list_associated_assets(
        &self,
        request: &ListAssociatedAssetsRequest,
    ) -> ApiResult<ListAssetsResponse> {
        let path = format!("/assets/{}/hierarchies", urlencoding::encode(&request.asset_id));
        let mut params = Params::new();
        push(&mut params, "hierarchyId", request.hierarchy_id.as_deref());
        push(&mut params, "traversalDirection", Some(request.traversal_direction.as_str()));
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", request.max_results);
        self.get(Plane::Control, &path, &params).await
    }

    async fn list_asset_properties(
        &self,
        request: &ListAssetPropertiesRequest,
    ) -> ApiResult<ListAssetPropertiesResponse> {
        let path = format!("/assets/{}/properties", urlencoding::encode(&request.asset_id));
        let mut params = Params::new();
        push(&mut params, "filter", Some("ALL"));
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", request.max_results);
        self.get(Plane::Control, &path, &params).await
    }

    async fn list_time_series(
        &self,
        request: &ListTimeSeriesRequest,
    ) -> ApiResult<ListTimeSeriesResponse> {
        let mut params = Params::new();
        push(&mut params, "assetId", request.asset_id.as_deref());
        push(&mut params, "aliasPrefix", request.alias_prefix.as_deref());
        push(&mut params, "timeSeriesType", request.time_series_type.as_deref());
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", request.max_results);
        self.get(Plane::Control, "/timeseries/", &params).await
    }

    async fn get_asset_property_value(
        &self,
        property: &PropertyRef,
    ) -> ApiResult<GetAssetPropertyValueResponse> {
        self.get(Plane::Data, "/properties/latest", &property_params(property))
            .await
    }

    async fn batch_get_asset_property_value(
        &self,
        request: &BatchGetAssetPropertyValueRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueResponse> {
        self.post(Plane::Data, "/properties/batch/latest", request).await
    }

    async fn get_asset_property_value_history(
        &self,
        request: &GetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<GetAssetPropertyValueHistoryResponse> {
        let mut params = property_params(&request.property);
        push(&mut params, "startDate", Some(query_time(request.start_date)));
        push(&mut params, "endDate", Some(query_time(request.end_date)));
        push(&mut params, "qualities", request.quality.map(|q| q.as_str()));
        push(&mut params, "timeOrdering", Some(request.time_ordering.as_str()));
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", Some(request.max_results));
        self.get(Plane::Data, "/properties/history", &params).await
    }

    async fn batch_get_asset_property_value_history(
        &self,
        request: &BatchGetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueHistoryResponse> {
        self.post(Plane::Data, "/properties/batch/history", request).await
    }

    async fn get_asset_property_aggregates(
        &self,
        request: &GetAssetPropertyAggregatesRequest,
    ) -> ApiResult<GetAssetPropertyAggregatesResponse> {
        let mut params = property_params(&request.property);
        for aggregate in &request.aggregate_types {
            params.push(("aggregateTypes", aggregate.as_str().to_string()));
        }
        push(&mut params, "resolution", Some(request.resolution.as_str()));
        push(&mut params, "startDate", Some(query_time(request.start_date)));
        push(&mut params, "endDate", Some(query_time(request.end_date)));
        push(&mut params, "qualities", request.quality.map(|q| q.as_str()));
        push(&mut params, "timeOrdering", Some(request.time_ordering.as_str()));
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", Some(request.max_results));
        self.get(Plane::Data, "/properties/aggregates", &params).await
    }

    async fn batch_get_asset_property_aggregates(
        &self,
        request: &BatchGetAssetPropertyAggregatesRequest,
    ) -> ApiResult<BatchGetAssetPropertyAggregatesResponse> {
        self.post(Plane::Data, "/properties/batch/aggregates", request).await
    }

    async fn get_interpolated_asset_property_values(
        &self,
        request: &GetInterpolatedAssetPropertyValuesRequest,
    ) -> ApiResult<GetInterpolatedAssetPropertyValuesResponse> {
        let mut params = property_params(&request.property);
        push(&mut params, "startTimeInSeconds", Some(request.start_time.time_in_seconds));
        push(&mut params, "startTimeOffsetInNanos", Some(request.start_time.offset_in_nanos));
        push(&mut params, "endTimeInSeconds", Some(request.end_time.time_in_seconds));
        push(&mut params, "endTimeOffsetInNanos", Some(request.end_time.offset_in_nanos));
        push(&mut params, "quality", Some(request.quality.as_str()));
        push(&mut params, "intervalInSeconds", Some(request.interval_in_seconds));
        push(&mut params, "type", Some(request.interpolation_type.as_str()));
        push(&mut params, "nextToken", request.next_token.as_deref());
        push(&mut params, "maxResults", Some(request.max_results));
        self.get(Plane::Data, "/properties/interpolated", &params).await
    }

    async fn execute_query(&self, request: &ExecuteQueryRequest) -> ApiResult<ExecuteQueryResponse> {
        self.post(Plane::Data, "/queries/execution", request).await
    }
}

struct Transport {
    http: reqwest::Client,
    credentials: CredentialSource,
}

/// One signed client per region, created on first use. Invalid settings are
/// kept as an error and reported by every `client` call.
pub struct HttpClientProvider {
    default_region: String,
    edge: bool,
    endpoint: Option<String>,
    transport: Result<Transport, String>,
    clients: Mutex<HashMap<String, Arc<SitewiseHttpClient>>>,
}

impl HttpClientProvider {
    pub fn from_settings(settings: &DatasourceSettings) -> Self {
        let transport = Self::transport(settings).map_err(|err| {
            tracing::error!("SiteWise client setup failed: {}", err);
            match err {
                ApiError::Configuration(message) => message,
                other => other.to_string(),
            }
        });
        Self::build(settings, transport)
    }

    pub fn with_credentials(
        http: reqwest::Client,
        settings: &DatasourceSettings,
        credentials: CredentialSource,
    ) -> Self {
        Self::build(settings, Ok(Transport { http, credentials }))
    }

    fn transport(settings: &DatasourceSettings) -> ApiResult<Transport> {
        settings.validate()?;
        let credentials = CredentialSource::from_settings(settings)?;
        let http = match &credentials {
            CredentialSource::Edge(edge) => edge.http().clone(),
            CredentialSource::Static(_) => reqwest::Client::builder().build()?,
        };
        Ok(Transport { http, credentials })
    }

    fn build(settings: &DatasourceSettings, transport: Result<Transport, String>) -> Self {
        Self {
            default_region: settings.default_region.clone(),
            edge: settings.is_edge(),
            endpoint: settings.endpoint().map(str::to_string),
            transport,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Blank and `default` select the configured region; an edge data source
    /// always talks to its gateway.
    fn resolve_region<'a>(&'a self, region: Option<&'a str>) -> &'a str {
        if self.edge {
            return &self.default_region;
        }
        match region.map(str::trim) {
            Some(r) if !r.is_empty() && r != "default" => r,
            _ => &self.default_region,
        }
    }
}

#[async_trait]
impl ClientProvider for HttpClientProvider {
    async fn client(&self, region: Option<&str>) -> ApiResult<Arc<dyn SitewiseClient>> {
        let transport = self
            .transport
            .as_ref()
            .map_err(|message| ApiError::Configuration(message.clone()))?;
        let region = self.resolve_region(region);
        let mut clients = self.clients.lock();
        let client = clients
            .entry(region.to_string())
            .or_insert_with(|| {
                tracing::info!("Creating SiteWise client for region {}", region);
                Arc::new(SitewiseHttpClient::new(
                    transport.http.clone(),
                    region,
                    self.endpoint.as_deref(),
                    transport.credentials.clone(),
                ))
            })
            .clone();
        Ok(client)
    }

    fn default_region(&self) -> &str {
        &self.default_region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{Quality, TimeOrdering};
    use crate::infrastructure::credentials::Credentials;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SitewiseHttpClient {
        SitewiseHttpClient::new(
            reqwest::Client::new(),
            "us-east-1",
            Some(&server.uri()),
            CredentialSource::Static(Credentials::new("AKIDEXAMPLE", "secret", Some("token".into()))),
        )
    }

    #[test]
    fn test_default_hosts_per_plane() {
        let client = SitewiseHttpClient::new(
            reqwest::Client::new(),
            "eu-west-1",
            None,
            CredentialSource::Static(Credentials::new("AKIDEXAMPLE", "secret", None)),
        );
        assert_eq!(
            client.url(Plane::Control, "/assets"),
            "https://api.iotsitewise.eu-west-1.amazonaws.com/assets"
        );
        assert_eq!(
            client.url(Plane::Data, "/properties/latest"),
            "https://data.iotsitewise.eu-west-1.amazonaws.com/properties/latest"
        );
    }

    #[test]
    fn test_error_code_parsing() {
        assert_eq!(
            error_code(
                Some("ResourceNotFoundException:http://internal.amazon.com/coral/"),
                None,
                StatusCode::NOT_FOUND
            ),
            "ResourceNotFoundException"
        );
        assert_eq!(
            error_code(None, Some("com.amazonaws#ThrottlingException"), StatusCode::TOO_MANY_REQUESTS),
            "ThrottlingException"
        );
        assert_eq!(error_code(None, None, StatusCode::BAD_GATEWAY), "BadGateway");
    }

    #[tokio::test]
    async fn test_describe_asset_is_signed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/a1"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header("x-amz-security-token", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "assetId": "a1",
                "assetName": "Turbine 1",
                "assetModelId": "m1",
                "assetProperties": [
                    {"id": "p1", "name": "Wind Speed", "dataType": "DOUBLE", "unit": "m/s"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let asset = client(&server).describe_asset("a1").await.unwrap();
        assert_eq!(asset.asset_name, "Turbine 1");
        assert_eq!(asset.asset_properties[0].unit.as_deref(), Some("m/s"));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/asset-models/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header(ERROR_TYPE_HEADER, "ResourceNotFoundException:http://internal/")
                    .set_body_json(json!({"message": "Asset model missing not found"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).describe_asset_model("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ResourceNotFoundException: Asset model missing not found");
    }

    #[tokio::test]
    async fn test_history_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties/history"))
            .and(query_param("assetId", "a1"))
            .and(query_param("propertyId", "p1"))
            .and(query_param("startDate", "2023-11-14T22:13:20Z"))
            .and(query_param("timeOrdering", "DESCENDING"))
            .and(query_param("qualities", "GOOD"))
            .and(query_param("maxResults", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "assetPropertyValueHistory": [
                    {"value": {"doubleValue": 1.5}, "timestamp": {"timeInSeconds": 1700000000, "offsetInNanos": 0}}
                ],
                "nextToken": "next"
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .get_asset_property_value_history(&GetAssetPropertyValueHistoryRequest {
                property: PropertyRef::by_id("a1", "p1"),
                start_date: get_time(1_700_000_000, 0),
                end_date: get_time(1_700_003_600, 0),
                quality: Some(Quality::Good),
                time_ordering: TimeOrdering::Descending,
                next_token: None,
                max_results: 1,
            })
            .await
            .unwrap();
        assert_eq!(response.asset_property_value_history.len(), 1);
        assert_eq!(response.next_token.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_batch_history_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/properties/batch/history"))
            .and(body_json(json!({
                "entries": [{
                    "entryId": "e0",
                    "propertyAlias": "/plant/line1/temp",
                    "startDate": 1700000000.0,
                    "endDate": 1700003600.0,
                    "qualities": ["GOOD"],
                    "timeOrdering": "ASCENDING"
                }],
                "maxResults": 20000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "successEntries": [{"entryId": "e0", "assetPropertyValueHistory": []}],
                "errorEntries": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .batch_get_asset_property_value_history(&BatchGetAssetPropertyValueHistoryRequest {
                entries: vec![BatchHistoryEntry {
                    entry_id: "e0".into(),
                    property: PropertyRef::by_alias("/plant/line1/temp"),
                    start_date: get_time(1_700_000_000, 0),
                    end_date: get_time(1_700_003_600, 0),
                    qualities: vec![Quality::Good],
                    time_ordering: TimeOrdering::Ascending,
                }],
                next_token: None,
                max_results: 20_000,
            })
            .await
            .unwrap();
        assert_eq!(response.success_entries[0].entry_id, "e0");
    }

    #[tokio::test]
    async fn test_provider_caches_clients_per_region() {
        let settings = DatasourceSettings {
            default_region: "us-west-2".into(),
            ..DatasourceSettings::default()
        };
        let provider = HttpClientProvider::with_credentials(
            reqwest::Client::new(),
            &settings,
            CredentialSource::Static(Credentials::new("AKIDEXAMPLE", "secret", None)),
        );

        provider.client(None).await.unwrap();
        provider.client(Some("default")).await.unwrap();
        provider.client(Some("eu-west-1")).await.unwrap();
        assert_eq!(provider.clients.lock().len(), 2);
        assert_eq!(provider.default_region(), "us-west-2");
        assert_eq!(provider.resolve_region(Some(" ")), "us-west-2");
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_each_client_call() {
        let settings = DatasourceSettings {
            default_region: "Edge".into(),
            ..DatasourceSettings::default()
        };
        let provider = HttpClientProvider::from_settings(&settings);
        match provider.client(None).await {
            Err(ApiError::Configuration(message)) => {
                assert!(message.contains("edge_auth_user"));
            }
            Err(other) => panic!("expected a configuration error, got {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }
}
