//! Per-context transport configuration.

use cometsync_protocol::Params;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of the context that is always registered.
pub const DEFAULT_CONTEXT: &str = "default";

/// Outgoing request headers.
pub type Headers = BTreeMap<String, String>;

/// Hook run immediately before every request; may mutate the outgoing
/// headers in place (e.g. inject an API key). A configuration seam, not
/// optional in contract: absent means no-op.
pub type BeforeSend = Arc<dyn Fn(&mut Headers) + Send + Sync>;

/// How request bodies are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// JSON bodies.
    Json,
    /// Form-url-encoded bodies.
    FormUrlEncoded,
}

impl ContentType {
    /// The `Content-Type` header value.
    pub fn header_value(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json; charset=UTF-8",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Options handed to the realtime connector when a channel is opened.
///
/// The channel implementation is opaque to the engine; these options are
/// passed through uninterpreted (socket transports, auth payloads, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtimeConfig {
    /// Connector-specific options.
    pub options: Params,
}

impl RealtimeConfig {
    /// Creates an empty realtime configuration, enough to enable the
    /// bridge with connector defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connector-specific options.
    pub fn with_options(mut self, options: Params) -> Self {
        self.options = options;
        self
    }
}

/// Configuration for one transport context.
#[derive(Clone)]
pub struct TransportConfig {
    /// Base URL prepended to every request path.
    pub base_url: String,
    /// Context name this configuration registers under.
    pub context: String,
    /// Log every request/response pair.
    pub debug: bool,
    /// Body encoding.
    pub content_type: ContentType,
    /// Default headers merged into every request.
    pub request_defaults: Headers,
    /// Pre-send hook.
    pub before_send: Option<BeforeSend>,
    /// Enables the realtime bridge when present.
    pub realtime: Option<RealtimeConfig>,
}

impl TransportConfig {
    /// Configuration for the given base URL, registering under the
    /// `"default"` context.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            context: DEFAULT_CONTEXT.to_string(),
            debug: false,
            content_type: ContentType::Json,
            request_defaults: Headers::new(),
            before_send: None,
            realtime: None,
        }
    }

    /// Sets the context name.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Enables debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the body encoding.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Adds a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_defaults.insert(name.into(), value.into());
        self
    }

    /// Installs the pre-send hook.
    pub fn with_before_send(mut self, hook: impl Fn(&mut Headers) + Send + Sync + 'static) -> Self {
        self.before_send = Some(Arc::new(hook));
        self
    }

    /// Enables the realtime bridge.
    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = Some(realtime);
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("context", &self.context)
            .field("debug", &self.debug)
            .field("content_type", &self.content_type)
            .field("request_defaults", &self.request_defaults)
            .field("before_send", &self.before_send.as_ref().map(|_| "<hook>"))
            .field("realtime", &self.realtime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = TransportConfig::new("https://api.example.com")
            .with_context("admin")
            .with_debug(true)
            .with_content_type(ContentType::FormUrlEncoded)
            .with_header("X-Api-Key", "secret")
            .with_realtime(RealtimeConfig::new());

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.context, "admin");
        assert!(config.debug);
        assert_eq!(config.content_type, ContentType::FormUrlEncoded);
        assert_eq!(
            config.request_defaults.get("X-Api-Key").map(String::as_str),
            Some("secret")
        );
        assert!(config.realtime.is_some());
    }

    #[test]
    fn defaults_to_the_default_context() {
        let config = TransportConfig::default();
        assert_eq!(config.context, DEFAULT_CONTEXT);
        assert_eq!(config.content_type, ContentType::Json);
        assert!(config.before_send.is_none());
    }

    #[test]
    fn hook_mutates_headers() {
        let config = TransportConfig::new("x").with_before_send(|headers: &mut Headers| {
            headers.insert("Authorization".into(), "Bearer token".into());
        });
        let mut headers = Headers::new();
        if let Some(hook) = &config.before_send {
            hook(&mut headers);
        }
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer token")
        );
    }
}
