use ureq::tls::{TlsConfig, TlsProvider};
use ureq::{Agent, RequestBuilder};

use crate::config::RegistryConfig;
use crate::constants::defaults;
use crate::correlation::Scope;

use super::{check_status, Method, Registry, RegistryError, RegistryRequest, RegistryResponse};

const CORRELATION_HEADER: &str = "X-Correlation-Id";
const API_KEY_HEADER: &str = "x-api-key";

pub struct HttpRegistry {
    agent: Agent,
    base_url: String,
    api_key: Option<String>,
    authorization: Option<String>,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(defaults::API_REQUEST_TIMEOUT))
            // Status codes are interpreted by `check_status`, including the 404 branch
            .http_status_as_error(false)
            .tls_config(TlsConfig::builder().provider(TlsProvider::NativeTls).build())
            .build()
            .into();

        HttpRegistry {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            authorization: config.authorization.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn decorate<B>(&self, scope: &Scope, mut builder: RequestBuilder<B>) -> RequestBuilder<B> {
        builder = builder.header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key.as_str());
        }
        if let Some(auth) = &self.authorization {
            builder = builder.header("Authorization", auth.as_str());
        }
        if let Some(id) = scope.current() {
            builder = builder.header(CORRELATION_HEADER, id.as_str());
        }
        builder
    }
}

impl Registry for HttpRegistry {
    fn send(
        &self,
        scope: &Scope,
        request: &RegistryRequest,
    ) -> Result<RegistryResponse, RegistryError> {
        let url = self.url(&request.path);
        log::debug!("{scope}{} {url}", request.method);

        let with_body = |builder: RequestBuilder<ureq::typestate::WithBody>| {
            let builder = self.decorate(scope, builder);
            match &request.body {
                Some(body) => builder.send_json(body),
                None => builder.send_empty(),
            }
        };

        let result = match request.method {
            Method::Get => self.decorate(scope, self.agent.get(&url)).call(),
            Method::Post => with_body(self.agent.post(&url)),
            Method::Patch => with_body(self.agent.patch(&url)),
            Method::Put => with_body(self.agent.put(&url)),
        };

        let mut response = result.map_err(|e| RegistryError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        log::trace!("{scope}{} {url} -> {status}: {body}", request.method);

        check_status(status, body)
    }
}
