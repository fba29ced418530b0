//! Domain and path matching shared by the validators and the drift
//! monitor.

/// Domains that belong to identity providers. A redirect landing on one of
/// these (or any subdomain) is still part of the login flow, never proof
/// of completion.
pub const IDENTITY_PROVIDER_DOMAINS: &[&str] = &[
    "login.gov",
    "secure.login.gov",
    "accounts.google.com",
    "login.microsoftonline.com",
    "login.live.com",
    "okta.com",
    "auth0.com",
    "onelogin.com",
    "pingidentity.com",
    "duosecurity.com",
];

/// Path prefixes that mark login/SSO/callback flows. A redirect onto one
/// of these must never count as success, even on an allowed host.
pub const LOGIN_PATH_PATTERNS: &[&str] = &[
    "/login", "/signin", "/sign-in", "/sso", "/oauth", "/saml", "/callback", "/oidc", "/auth",
];

/// Scope containment: exact match, substring containment either direction,
/// or a wildcard-suffix form (`*.example.com`).
pub fn domain_in_scope(domain: &str, allowed: &[String]) -> bool {
    let domain = domain.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    allowed.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        if entry.is_empty() {
            return false;
        }
        if let Some(suffix) = entry.strip_prefix("*.") {
            return domain == suffix || domain.ends_with(&format!(".{suffix}"));
        }
        domain == entry || domain.contains(&entry) || entry.contains(&domain)
    })
}

/// True when the destination belongs to a known identity provider.
pub fn is_identity_provider(domain: &str) -> bool {
    let domain = domain.trim().to_ascii_lowercase();
    IDENTITY_PROVIDER_DOMAINS
        .iter()
        .any(|idp| domain == *idp || domain.ends_with(&format!(".{idp}")))
}

/// True when the path is part of a login/SSO/callback flow.
pub fn is_login_path(path: &str) -> bool {
    let path = path.trim().to_ascii_lowercase();
    LOGIN_PATH_PATTERNS
        .iter()
        .any(|pattern| path.starts_with(pattern) || path.contains(&format!("{pattern}/")))
}

/// Hostname of a URL: scheme, port, path, query, and fragment stripped,
/// lowercased.
pub fn extract_domain(url: &str) -> String {
    let rest = url
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| url.trim());
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    host.split(':').next().unwrap_or_default().to_ascii_lowercase()
}

/// Path component of a URL, `/` when absent.
pub fn extract_path(url: &str) -> String {
    let rest = url
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| url.trim());
    match rest.find('/') {
        Some(idx) => {
            let path = &rest[idx..];
            path.split(['?', '#']).next().unwrap_or("/").to_string()
        }
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_is_in_scope() {
        assert!(domain_in_scope("sam.gov", &allowed(&["sam.gov"])));
        assert!(!domain_in_scope("google.com", &allowed(&["sam.gov"])));
    }

    #[test]
    fn substring_containment_works_both_directions() {
        assert!(domain_in_scope("beta.sam.gov", &allowed(&["sam.gov"])));
        assert!(domain_in_scope("sam.gov", &allowed(&["beta.sam.gov"])));
    }

    #[test]
    fn wildcard_suffix_matches_subdomains_and_apex() {
        let scope = allowed(&["*.example.com"]);
        assert!(domain_in_scope("api.example.com", &scope));
        assert!(domain_in_scope("example.com", &scope));
        assert!(!domain_in_scope("example.org", &scope));
        assert!(!domain_in_scope("badexample.com", &scope));
    }

    #[test]
    fn identity_providers_match_subdomains() {
        assert!(is_identity_provider("login.gov"));
        assert!(is_identity_provider("dev-123.okta.com"));
        assert!(!is_identity_provider("sam.gov"));
    }

    #[test]
    fn login_paths_are_recognized() {
        for path in [
            "/login",
            "/sso",
            "/oauth/callback",
            "/saml/acs",
            "/oidc",
            "/callback",
            "/signin?next=/home",
        ] {
            assert!(is_login_path(path), "{path} should be a login path");
        }
        assert!(!is_login_path("/dashboard"));
        assert!(!is_login_path("/workspace/profile"));
    }

    #[test]
    fn extract_domain_strips_scheme_port_and_path() {
        assert_eq!(extract_domain("https://sam.gov/x?q=1"), "sam.gov");
        assert_eq!(extract_domain("https://SAM.gov:8443/x"), "sam.gov");
        assert_eq!(extract_domain("sam.gov/path"), "sam.gov");
        assert_eq!(extract_domain("https://user@sam.gov/x"), "sam.gov");
    }

    #[test]
    fn extract_path_defaults_to_root() {
        assert_eq!(extract_path("https://sam.gov"), "/");
        assert_eq!(extract_path("https://sam.gov/dashboard?tab=1"), "/dashboard");
        assert_eq!(extract_path("sam.gov/a/b#frag"), "/a/b");
    }
}
