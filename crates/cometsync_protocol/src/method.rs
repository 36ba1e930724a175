//! HTTP methods understood by the transport.

use std::fmt;

/// HTTP verbs the transport can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a resource or a collection.
    Get,
    /// Create a resource.
    Post,
    /// Replace or update a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Delete a resource.
    Delete,
    /// Capability probe.
    Options,
    /// Headers-only read.
    Head,
}

impl Method {
    /// Uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
        }
    }

    /// True when this verb carries its parameters in the request body.
    ///
    /// All other verbs serialize parameters into the query string.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    /// Parses an uppercase or lowercase wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "OPTIONS" => Some(Method::Options),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_placement() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
        assert!(!Method::Patch.has_body());
        assert!(!Method::Options.has_body());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
        assert_eq!(Method::parse("brew"), None);
    }
}
