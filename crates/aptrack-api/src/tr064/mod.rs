// TR-064 host table client
//
// Speaks the AVM flavour of TR-064 (Fritz!Box and Fritz!Repeater): a SOAP
// action on the Hosts service returns the path of an XML host list, which
// is then fetched with a plain GET. SOAP calls are protected by HTTP
// Digest authentication; the list path carries its own session id.

mod digest;
mod models;
mod soap;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::transport::TransportConfig;

use digest::DigestChallenge;
pub use models::RawHost;
use models::HostList;

const HOST_LIST_PATH_ACTION: &str = "X_AVM-DE_GetHostListPath";
const HOST_LIST_PATH_VALUE: &str = "NewX_AVM-DE_HostListPath";

/// Client for the TR-064 Hosts service of a single access point.
///
/// Holds the credentials for answering digest challenges. Each SOAP call
/// starts unauthenticated and answers at most one challenge.
pub struct Tr064Client {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl Tr064Client {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the TR-064 root, e.g. `http://fritz.box:49000` or
    /// `https://fritz.box:49443`.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, username, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
        }
    }

    /// The TR-064 root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the complete host table of the access point.
    pub async fn host_list(&self) -> Result<Vec<RawHost>, Error> {
        let response = self
            .soap_call(soap::HOSTS_CONTROL_URL, soap::HOSTS_SERVICE, HOST_LIST_PATH_ACTION)
            .await?;

        let path = soap::extract_value(&response, HOST_LIST_PATH_VALUE)
            .map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: response.clone(),
            })?
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Deserialization {
                message: format!("response carries no {HOST_LIST_PATH_VALUE}"),
                body: response.clone(),
            })?;

        let url = self.base_url.join(&path)?;
        debug!("GET {}", url);

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let list: HostList =
            quick_xml::de::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        debug!(hosts = list.items.len(), "host list received");
        Ok(list.items)
    }

    // ── SOAP transport ──────────────────────────────────────────────

    /// Invoke an argument-less action, answering one digest challenge.
    async fn soap_call(
        &self,
        control_url: &str,
        service: &str,
        action: &str,
    ) -> Result<String, Error> {
        let url = self.base_url.join(control_url)?;
        let body = soap::envelope(service, action);
        debug!("POST {} ({})", url, action);

        let mut resp = self.post_soap(&url, service, action, &body, None).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            let challenge = resp
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(DigestChallenge::parse)
                .ok_or_else(|| Error::Authentication {
                    message: "access point offered no usable digest challenge".into(),
                })?;

            let cnonce = Uuid::new_v4().simple().to_string();
            let authorization = challenge.authorization(
                "POST",
                url.path(),
                &self.username,
                self.password.expose_secret(),
                &cnonce,
                1,
            );

            resp = self
                .post_soap(&url, service, action, &body, Some(authorization))
                .await?;

            if resp.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::Authentication {
                    message: format!("credentials for user '{}' were rejected", self.username),
                });
            }
        }

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Soap {
                action: action.into(),
                status: status.as_u16(),
                message: soap::fault_message(&text).unwrap_or_else(|| status.to_string()),
            });
        }

        Ok(text)
    }

    async fn post_soap(
        &self,
        url: &Url,
        service: &str,
        action: &str,
        body: &str,
        authorization: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let mut request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", soap::soap_action(service, action))
            .body(body.to_owned());

        if let Some(authorization) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        Ok(request.send().await?)
    }
}
