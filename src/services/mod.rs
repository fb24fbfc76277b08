/// Business logic services layer
use crate::clients::UsgsClient;
use crate::domain::{
    event_time, project_event, LocationEarthquakes, LocationQuery, RecentEarthquakes,
    RecentQuery, NO_EARTHQUAKES_MESSAGE,
};
use crate::errors::{ApiResult, UpstreamError};
use crate::utils::start_date;
use chrono::Utc;
use serde_json::Value;

/// Earthquake query pipeline.
///
/// Stateless apart from the client: every call issues exactly one upstream
/// request and nothing is cached between calls.
pub struct EarthquakeService {
    client: UsgsClient,
}

impl EarthquakeService {
    pub fn new(client: UsgsClient) -> Self {
        Self { client }
    }

    /// Events within a radius of a point, normalized, in upstream order
    pub async fn query_by_location(
        &self,
        query: &LocationQuery,
    ) -> ApiResult<LocationEarthquakes> {
        let params = [
            ("format", "geojson".to_string()),
            ("latitude", query.latitude.to_string()),
            ("longitude", query.longitude.to_string()),
            ("maxradiuskm", query.radius_km.to_string()),
            ("starttime", start_date(Utc::now(), query.lookback_days)),
        ];

        let features = self.client.fetch_features(&params).await?;
        let events = features.iter().map(project_event).collect();

        Ok(LocationEarthquakes::new(events))
    }

    /// Most recent events worldwide at or above a magnitude.
    ///
    /// Returns raw features. Upstream failures are folded into the envelope.
    pub async fn query_recent(&self, query: &RecentQuery) -> RecentEarthquakes {
        let params = [
            ("format", "geojson".to_string()),
            ("starttime", start_date(Utc::now(), query.lookback_days)),
            ("minmagnitude", query.min_magnitude.to_string()),
        ];

        match self.client.fetch_features(&params).await {
            Ok(features) if features.is_empty() => RecentEarthquakes::Empty {
                message: NO_EARTHQUAKES_MESSAGE.to_string(),
            },
            Ok(features) => {
                let found = features.len();
                RecentEarthquakes::Found {
                    message: format!("Found {found} items"),
                    events: select_most_recent(features, query.limit),
                }
            }
            Err(UpstreamError::Status(code)) => RecentEarthquakes::Failed {
                error: format!("Failed to fetch data: {code}"),
            },
            Err(UpstreamError::Request(e)) => RecentEarthquakes::Failed {
                error: format!("Request failed: {e}"),
            },
        }
    }
}

/// Newest first by `properties.time`, keeping at most `limit`.
/// Ties keep their upstream order.
pub fn select_most_recent(mut features: Vec<Value>, limit: usize) -> Vec<Value> {
    features.sort_by(|a, b| event_time(b).total_cmp(&event_time(a)));
    features.truncate(limit);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use serde_json::json;
    use wiremock::matchers::{method, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feature(id: &str, time: Option<i64>) -> Value {
        let mut properties = json!({"mag": 2.0, "place": id, "type": "earthquake"});
        if let Some(t) = time {
            properties["time"] = json!(t);
        }
        json!({"id": id, "properties": properties, "geometry": {"coordinates": [1.0, 2.0, 3.0]}})
    }

    fn ids(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["id"].as_str().unwrap()).collect()
    }

    fn service_for(uri: String) -> EarthquakeService {
        EarthquakeService::new(UsgsClient::new(uri, "quake-dashboard-test/1.0").unwrap())
    }

    async fn upstream_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_select_most_recent_orders_descending() {
        let features = vec![
            feature("a", Some(1000)),
            feature("b", Some(5000)),
            feature("c", Some(3000)),
        ];
        let selected = select_most_recent(features, 10);
        assert_eq!(ids(&selected), vec!["b", "c", "a"]);
        for pair in selected.windows(2) {
            assert!(event_time(&pair[0]) >= event_time(&pair[1]));
        }
    }

    #[test]
    fn test_select_most_recent_truncates() {
        let features = (0..10).map(|i| feature(&i.to_string(), Some(i))).collect();
        let selected = select_most_recent(features, 3);
        assert_eq!(ids(&selected), vec!["9", "8", "7"]);
    }

    #[test]
    fn test_select_most_recent_is_stable_on_ties() {
        let features = vec![
            feature("first", Some(7)),
            feature("newest", Some(9)),
            feature("second", Some(7)),
            feature("third", Some(7)),
        ];
        let selected = select_most_recent(features, 4);
        assert_eq!(ids(&selected), vec!["newest", "first", "second", "third"]);
    }

    #[test]
    fn test_select_most_recent_mixes_integer_and_float_times() {
        let features = vec![
            json!({"id": "int", "properties": {"time": 1000}}),
            json!({"id": "float", "properties": {"time": 5000.0}}),
            json!({"id": "fraction", "properties": {"time": 1000.5}}),
        ];
        let selected = select_most_recent(features, 3);
        assert_eq!(ids(&selected), vec!["float", "fraction", "int"]);
    }

    #[test]
    fn test_select_most_recent_missing_time_sorts_last() {
        let features = vec![feature("untimed", None), feature("timed", Some(1))];
        let selected = select_most_recent(features, 2);
        assert_eq!(ids(&selected), vec!["timed", "untimed"]);
    }

    #[tokio::test]
    async fn test_recent_found_sorted() {
        let server = upstream_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [feature("old", Some(1000)), feature("new", Some(5000))]
        })))
        .await;

        let query = RecentQuery::new(30, 1.0, 5).unwrap();
        let result = service_for(server.uri()).query_recent(&query).await;

        match result {
            RecentEarthquakes::Found { message, events } => {
                assert_eq!(message, "Found 2 items");
                assert_eq!(ids(&events), vec!["new", "old"]);
                // raw features pass through untouched
                assert_eq!(events[0], feature("new", Some(5000)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recent_message_counts_before_truncation() {
        let features: Vec<Value> = (0..6).map(|i| feature(&i.to_string(), Some(i))).collect();
        let server =
            upstream_with(ResponseTemplate::new(200).set_body_json(json!({ "features": features })))
                .await;

        let result = service_for(server.uri())
            .query_recent(&RecentQuery::default())
            .await;

        match result {
            RecentEarthquakes::Found { message, events } => {
                assert_eq!(message, "Found 6 items");
                assert_eq!(events.len(), 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recent_empty() {
        let server =
            upstream_with(ResponseTemplate::new(200).set_body_json(json!({"features": []}))).await;

        let result = service_for(server.uri())
            .query_recent(&RecentQuery::default())
            .await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"message": "No earthquakes found within the specified time and magnitude range."})
        );
    }

    #[tokio::test]
    async fn test_recent_is_global_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("format", "geojson"))
            .and(query_param("minmagnitude", "4.5"))
            .and(query_param_is_missing("latitude"))
            .and(query_param_is_missing("maxradiuskm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
            .expect(1)
            .mount(&server)
            .await;

        let query = RecentQuery::new(1, 4.5, 3).unwrap();
        let result = service_for(server.uri()).query_recent(&query).await;
        assert!(matches!(result, RecentEarthquakes::Empty { .. }));
    }

    #[tokio::test]
    async fn test_recent_upstream_status() {
        let server = upstream_with(ResponseTemplate::new(500)).await;
        let result = service_for(server.uri())
            .query_recent(&RecentQuery::default())
            .await;

        assert_eq!(
            result,
            RecentEarthquakes::Failed {
                error: "Failed to fetch data: 500".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_recent_unreachable() {
        let result = service_for("http://127.0.0.1:1/query".to_string())
            .query_recent(&RecentQuery::default())
            .await;

        match result {
            RecentEarthquakes::Failed { error } => assert!(error.starts_with("Request failed: ")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_location_normalizes_in_upstream_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("format", "geojson"))
            .and(query_param("latitude", "32.0853"))
            .and(query_param("longitude", "34.7818"))
            .and(query_param("maxradiuskm", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [
                    feature("older", Some(1000)),
                    feature("newer", Some(9000)),
                    {"properties": {"mag": 3.1}, "geometry": {"coordinates": []}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = LocationQuery::new(32.0853, 34.7818, 100.0, 30).unwrap();
        let result = service_for(server.uri())
            .query_by_location(&query)
            .await
            .unwrap();

        assert_eq!(result.count, 3);
        assert_eq!(result.count, result.events.len());
        assert_eq!(result.events[0].place.as_deref(), Some("older"));
        assert_eq!(result.events[1].place.as_deref(), Some("newer"));
        assert_eq!(result.events[2].magnitude, Some(3.1));
        assert_eq!(result.events[2].coordinates.latitude, None);
    }

    #[tokio::test]
    async fn test_location_propagates_upstream_status() {
        let server = upstream_with(ResponseTemplate::new(503)).await;
        let query = LocationQuery::new(0.0, 0.0, 50.0, 30).unwrap();

        let err = service_for(server.uri())
            .query_by_location(&query)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UpstreamStatus(503)));
        assert_eq!(err.status_code().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_location_unreachable() {
        let query = LocationQuery::new(0.0, 0.0, 50.0, 30).unwrap();
        let err = service_for("http://127.0.0.1:1/query".to_string())
            .query_by_location(&query)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UpstreamUnreachable(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }
}
