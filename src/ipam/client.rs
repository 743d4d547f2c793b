//! SolarWinds Information Service (SWIS) JSON client.
//!
//! Queries are posted to the `Json/Query` endpoint with basic auth. The HTTP
//! client is built on first use and reused for every later request.

use super::query::{fetch_pages, group_query, host_query, paged};
use super::IpamSource;
use crate::config::{InventorySettings, SwisSettings};
use crate::error::{Error, Result};
use crate::models::{HostRecord, NetworkRecord, RecordId, Row};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of a successful query response.
#[derive(Deserialize, Debug)]
struct QueryResponse {
    results: Vec<Row>,
}

/// Blocking SWIS client.
pub struct SwisClient {
    url: String,
    user: String,
    password: String,
    verify_ssl: bool,
    per_page: usize,
    subnet_columns: Vec<String>,
    host_columns: Vec<String>,
    host_vars: Vec<String>,
    session: Option<Client>,
}

impl SwisClient {
    pub fn new(swis: &SwisSettings, inventory: &InventorySettings) -> Result<SwisClient> {
        let host = swis
            .host
            .clone()
            .ok_or_else(|| Error::MissingConfig("swipam.host".to_string()))?;
        let user = swis
            .user
            .clone()
            .ok_or_else(|| Error::MissingConfig("swipam.user".to_string()))?;
        let password = swis
            .password
            .clone()
            .ok_or_else(|| Error::MissingConfig("swipam.password".to_string()))?;

        Ok(SwisClient {
            url: format!(
                "https://{host}:{port}/SolarWinds/InformationService/v3/Json/Query",
                port = swis.port
            ),
            user,
            password,
            verify_ssl: swis.verify_ssl,
            per_page: swis.per_page,
            subnet_columns: inventory.subnet_columns.clone(),
            host_columns: inventory.host_columns.clone(),
            host_vars: inventory.host_vars.clone(),
            session: None,
        })
    }

    fn session(session: &mut Option<Client>, verify_ssl: bool) -> Result<&Client> {
        let client = match session.take() {
            Some(client) => client,
            None => {
                log::info!("Opening SWIS session (verify_ssl={verify_ssl})");
                Client::builder()
                    .no_proxy()
                    .danger_accept_invalid_certs(!verify_ssl)
                    .build()?
            }
        };
        Ok(session.insert(client))
    }

    /// Run one SWQL query and return its rows.
    pub fn query(&mut self, swql: &str) -> Result<Vec<Row>> {
        log::trace!("query: {swql}");
        let client = Self::session(&mut self.session, self.verify_ssl)?;
        let response = client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&json!({ "query": swql, "parameters": {} }))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let reason = error_reason(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            log::error!("SWIS query failed: {status} {reason}");
            return Err(Error::Transport {
                status: status.as_u16(),
                reason,
            });
        }
        parse_results(&body)
    }
}

impl IpamSource for SwisClient {
    fn fetch_group_records(&mut self) -> Result<Vec<NetworkRecord>> {
        let query = group_query(&self.subnet_columns);
        let rows = fetch_pages(self.per_page, "group", |from, to| {
            self.query(&paged(&query, from, to))
        })?;
        rows.into_iter().map(NetworkRecord::from_row).collect()
    }

    fn fetch_host_records(&mut self, subnet_id: RecordId) -> Result<Vec<HostRecord>> {
        let query = host_query(&self.host_columns, &self.host_vars, subnet_id);
        let rows = fetch_pages(self.per_page, "host", |from, to| {
            self.query(&paged(&query, from, to))
        })?;
        Ok(rows.into_iter().map(HostRecord::from).collect())
    }
}

/// Extract the `Message` field SWIS puts in error bodies.
fn error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("Message")?
        .as_str()
        .map(str::to_string)
}

/// Parse a query response body into rows.
fn parse_results(body: &str) -> Result<Vec<Row>> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    let parsed: QueryResponse =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", body);
            Error::Parse {
                context: "SWIS response".to_string(),
                path: e.path().to_string(),
                message: e.inner().to_string(),
            }
        })?;
    Ok(parsed.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let rows = parse_results(
            r#"{"results":[{"SubnetId":1,"DisplayName":"Europe"},{"SubnetId":2,"DisplayName":"Asia"}]}"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["DisplayName"], "Asia");
    }

    #[test]
    fn test_parse_results_reports_path() {
        let err = parse_results(r#"{"results":[{"a":1}, 7]}"#).unwrap_err();
        match err {
            Error::Parse { path, .. } => assert_eq!(path, "results[1]"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_error_reason() {
        assert_eq!(
            error_reason(r#"{"Message":"Login failed","ExceptionType":"x"}"#).as_deref(),
            Some("Login failed")
        );
        assert_eq!(error_reason("<html>Bad gateway</html>"), None);
        assert_eq!(error_reason(r#"{"Other":1}"#), None);
    }

    #[test]
    fn test_new_builds_url_without_connecting() {
        let swis = SwisSettings {
            host: Some("ipam.example.net".to_string()),
            user: Some("reader".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let client = SwisClient::new(&swis, &InventorySettings::default()).unwrap();
        assert_eq!(
            client.url,
            "https://ipam.example.net:17778/SolarWinds/InformationService/v3/Json/Query"
        );
        assert!(client.session.is_none());
    }

    #[test]
    fn test_new_requires_credentials() {
        let swis = SwisSettings {
            host: Some("ipam.example.net".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SwisClient::new(&swis, &InventorySettings::default()),
            Err(Error::MissingConfig(_))
        ));
    }
}
