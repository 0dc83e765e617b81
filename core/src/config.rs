//! Endpoint layout: one base host, one port per platform service.

use std::env;
use std::fmt;

pub const API_URL_ENV: &str = "GIIA_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost";

/// The six services behind the platform, each on its own port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Catalog,
    Buffers,
    Execution,
    Analytics,
    Notifications,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::Auth,
        Service::Catalog,
        Service::Buffers,
        Service::Execution,
        Service::Analytics,
        Service::Notifications,
    ];

    pub fn default_port(self) -> u16 {
        match self {
            Service::Auth => 8081,
            Service::Catalog => 8082,
            Service::Buffers => 8083,
            Service::Execution => 8084,
            Service::Analytics => 8085,
            Service::Notifications => 8086,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Service::Auth => "auth",
            Service::Catalog => "catalog",
            Service::Buffers => "buffers",
            Service::Execution => "execution",
            Service::Analytics => "analytics",
            Service::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePorts {
    pub auth: u16,
    pub catalog: u16,
    pub buffers: u16,
    pub execution: u16,
    pub analytics: u16,
    pub notifications: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            auth: Service::Auth.default_port(),
            catalog: Service::Catalog.default_port(),
            buffers: Service::Buffers.default_port(),
            execution: Service::Execution.default_port(),
            analytics: Service::Analytics.default_port(),
            notifications: Service::Notifications.default_port(),
        }
    }
}

impl ServicePorts {
    pub fn port(&self, service: Service) -> u16 {
        match service {
            Service::Auth => self.auth,
            Service::Catalog => self.catalog,
            Service::Buffers => self.buffers,
            Service::Execution => self.execution,
            Service::Analytics => self.analytics,
            Service::Notifications => self.notifications,
        }
    }

    pub fn with_port(mut self, service: Service, port: u16) -> Self {
        match service {
            Service::Auth => self.auth = port,
            Service::Catalog => self.catalog = port,
            Service::Buffers => self.buffers = port,
            Service::Execution => self.execution = port,
            Service::Analytics => self.analytics = port,
            Service::Notifications => self.notifications = port,
        }
        self
    }
}

/// Where the client sends requests.
///
/// `base_url` is scheme and host only (`http://localhost`); the service
/// port is appended per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    pub ports: ServicePorts,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ports: ServicePorts::default(),
        }
    }

    /// Read `GIIA_API_URL`, falling back to `http://localhost`.
    pub fn from_env() -> Self {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    pub fn with_ports(mut self, ports: ServicePorts) -> Self {
        self.ports = ports;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}:{port}` for `service`.
    pub fn service_url(&self, service: Service) -> String {
        format!("{}:{}", self.base_url, self.ports.port(service))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
