//! Async HTTP client for the ScoDoc JSON API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
  Connectivity, Error, Result, ScoDocApi,
  types::{
    ApiDepartment, ApiFramework, ApiProgram, ApiTerm, JuryRecord, parse_items, unwrap_listing,
  },
};

fn default_api_prefix() -> String { "/ScoDoc/api".to_owned() }

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for a ScoDoc instance.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoDocConfig {
  pub base_url:     String,
  #[serde(default = "default_api_prefix")]
  pub api_prefix:   String,
  /// Bearer token; requests are sent unauthenticated when empty.
  #[serde(default)]
  pub api_token:    String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl ScoDocConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url:     base_url.into(),
      api_prefix:   default_api_prefix(),
      api_token:    String::new(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// HTTP implementation of [`ScoDocApi`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ScoDocClient {
  client: Client,
  config: ScoDocConfig,
}

impl ScoDocClient {
  pub fn new(config: ScoDocConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ScoDocConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/{}{}",
      self.config.base_url.trim_end_matches('/'),
      self.config.api_prefix.trim_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.api_token.is_empty() {
      req
    } else {
      req.bearer_auth(&self.config.api_token)
    }
  }

  async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { path: path.to_owned(), status: status.as_u16() });
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

impl ScoDocApi for ScoDocClient {
  async fn test_connectivity(&self) -> Connectivity {
    match self.get_json("/departements", &[]).await {
      Ok(_) => Connectivity { ok: true, message: format!("connected to {}", self.config.base_url) },
      Err(e) => Connectivity { ok: false, message: e.to_string() },
    }
  }

  /// `GET /departements`
  async fn list_departments(&self) -> Result<Vec<ApiDepartment>> {
    let body = self.get_json("/departements", &[]).await?;
    Ok(parse_items(unwrap_listing(body, "departements"), "department"))
  }

  /// `GET /formations[?dept_id=<id>]`
  async fn list_programs(&self, department_id: Option<i64>) -> Result<Vec<ApiProgram>> {
    let query: Vec<_> = department_id
      .map(|id| ("dept_id", id.to_string()))
      .into_iter()
      .collect();
    let body = self.get_json("/formations", &query).await?;
    Ok(parse_items(unwrap_listing(body, "formations"), "program"))
  }

  /// `GET /formation/<id>/referentiel_competences`
  async fn list_competency_framework(&self, program_id: i64) -> Result<Option<ApiFramework>> {
    let body = self
      .get_json(&format!("/formation/{program_id}/referentiel_competences"), &[])
      .await?;
    if body.is_null() {
      return Ok(None);
    }
    Ok(Some(serde_json::from_value(body)?))
  }

  /// `GET /formsemestres/query?annee_scolaire=<year>`
  async fn query_terms_for_year(&self, year: i32) -> Result<Vec<ApiTerm>> {
    let body = self
      .get_json("/formsemestres/query", &[("annee_scolaire", year.to_string())])
      .await?;
    Ok(parse_items(unwrap_listing(body, "formsemestres"), "term"))
  }

  /// `GET /formsemestre/<id>/decisions_jury`
  async fn list_jury_decisions(&self, term_id: i64) -> Result<Vec<JuryRecord>> {
    let body = self
      .get_json(&format!("/formsemestre/{term_id}/decisions_jury"), &[])
      .await?;
    Ok(parse_items(unwrap_listing(body, "etudiants"), "jury record"))
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn url_joins_base_prefix_and_path() {
    let client = ScoDocClient::new(ScoDocConfig::new("https://scodoc.example.org/")).unwrap();
    assert_eq!(
      client.url("/departements"),
      "https://scodoc.example.org/ScoDoc/api/departements"
    );

    let mut config = ScoDocConfig::new("http://localhost:5000");
    config.api_prefix = "api/".into();
    let client = ScoDocClient::new(config).unwrap();
    assert_eq!(client.url("/formations"), "http://localhost:5000/api/formations");
  }

  #[test]
  fn config_defaults_apply_when_deserializing() {
    let config: ScoDocConfig =
      serde_json::from_value(serde_json::json!({"base_url": "http://x"})).unwrap();
    assert_eq!(config.api_prefix, "/ScoDoc/api");
    assert_eq!(config.timeout_secs, 30);
    assert!(config.api_token.is_empty());
  }

  #[tokio::test]
  async fn unreachable_host_fails_connectivity() {
    let mut config = ScoDocConfig::new("http://127.0.0.1:9");
    config.timeout_secs = 2;
    let client = ScoDocClient::new(config).unwrap();
    let outcome = client.test_connectivity().await;
    assert!(!outcome.ok);
    assert!(!outcome.message.is_empty());
  }
}
