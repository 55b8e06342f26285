//! Origin allow-list guarding the privileged side of the bridge.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginRule {
    /// Serialized origin, e.g. `https://app.example.com`
    Exact(String),
    /// `scheme://*.host[:port]`: any strict subdomain of `host`
    Subdomains {
        scheme: String,
        suffix: String,
        port: Option<u16>,
    },
}

/// Strict allow-list of page origins
///
/// There is no bypass: an empty policy rejects everything, and opaque origins
/// (`null`) never match.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    rules: Vec<OriginRule>,
}

impl OriginPolicy {
    /// Build a policy, skipping entries that do not parse
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = origins
            .into_iter()
            .filter_map(|o| {
                let rule = parse_rule(o.as_ref());
                if rule.is_none() {
                    tracing::warn!(origin = o.as_ref(), "ignoring unparseable allowed origin");
                }
                rule
            })
            .collect();
        Self { rules }
    }

    /// Whether `origin` is an acceptable allow-list entry
    #[must_use]
    pub fn is_valid_rule(origin: &str) -> bool {
        parse_rule(origin).is_some()
    }

    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin.trim()) else {
            return false;
        };
        let parsed = url.origin();
        if !parsed.is_tuple() {
            return false;
        }
        let serialized = parsed.ascii_serialization();

        self.rules.iter().any(|rule| match rule {
            OriginRule::Exact(allowed) => *allowed == serialized,
            OriginRule::Subdomains {
                scheme,
                suffix,
                port,
            } => {
                url.scheme() == scheme
                    && url.port_or_known_default() == *port
                    && url.host_str().is_some_and(|h| h.ends_with(suffix.as_str()))
            }
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_rule(raw: &str) -> Option<OriginRule> {
    let raw = raw.trim().trim_end_matches('/');

    if let Some((scheme, rest)) = raw.split_once("://*.") {
        let url = Url::parse(&format!("{scheme}://{rest}")).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.path() != "/" {
            return None;
        }
        return Some(OriginRule::Subdomains {
            scheme: url.scheme().to_string(),
            suffix: format!(".{}", url.host_str()?),
            port: url.port_or_known_default(),
        });
    }

    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let origin = url.origin();
    origin
        .is_tuple()
        .then(|| OriginRule::Exact(origin.ascii_serialization()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_origins_match_scheme_host_and_port() {
        let policy = OriginPolicy::new(["http://localhost:5173", "https://app.hotelierhub.com/"]);

        assert!(policy.is_allowed("http://localhost:5173"));
        assert!(policy.is_allowed("https://app.hotelierhub.com"));
        assert!(!policy.is_allowed("http://localhost:3000"));
        assert!(!policy.is_allowed("https://localhost:5173"));
        assert!(!policy.is_allowed("https://evil.example"));
    }

    #[test]
    fn wildcard_covers_subdomains_only() {
        let policy = OriginPolicy::new(["https://*.hotelierhub.com"]);

        assert!(policy.is_allowed("https://tenant1.hotelierhub.com"));
        assert!(!policy.is_allowed("https://hotelierhub.com"));
        assert!(!policy.is_allowed("https://evilhotelierhub.com"));
        assert!(!policy.is_allowed("http://tenant1.hotelierhub.com"));
    }

    #[test]
    fn opaque_and_garbage_origins_never_match() {
        let policy = OriginPolicy::new(["http://localhost:5173"]);
        assert!(!policy.is_allowed("null"));
        assert!(!policy.is_allowed(""));
        assert!(!policy.is_allowed("file:///etc/passwd"));
        assert!(!OriginPolicy::is_valid_rule("not an origin"));
        assert!(OriginPolicy::new(Vec::<String>::new()).is_empty());
    }
}
