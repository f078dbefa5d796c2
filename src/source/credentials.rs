// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Credential header construction.
//!
//! Pure mapping from an [`AuthScheme`] to the request headers that carry it.

use super::AuthScheme;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Build the request headers for a source's credentials.
///
/// * `None` / `Presigned` - no headers
/// * `Bearer` - `Authorization: Bearer <token>`
/// * `Basic` - `Authorization: Basic base64(user:pass)`
/// * `Header` - the single caller-specified header
pub fn build_headers(auth: &AuthScheme) -> Vec<(String, String)> {
    match auth {
        AuthScheme::None | AuthScheme::Presigned => Vec::new(),
        AuthScheme::Bearer { token } => {
            vec![("Authorization".to_string(), format!("Bearer {}", token))]
        }
        AuthScheme::Basic { username, password } => {
            let encoded = STANDARD.encode(format!("{}:{}", username, password));
            vec![("Authorization".to_string(), format!("Basic {}", encoded))]
        }
        AuthScheme::Header { name, value } => vec![(name.clone(), value.clone())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_headers_for_none_and_presigned() {
        assert!(build_headers(&AuthScheme::None).is_empty());
        assert!(build_headers(&AuthScheme::Presigned).is_empty());
    }

    #[test]
    fn test_bearer_header() {
        let headers = build_headers(&AuthScheme::Bearer {
            token: "abc123".to_string(),
        });
        assert_eq!(
            headers,
            vec![("Authorization".to_string(), "Bearer abc123".to_string())]
        );
    }

    #[test]
    fn test_basic_header_is_base64_user_colon_pass() {
        let headers = build_headers(&AuthScheme::Basic {
            username: "Aladdin".to_string(),
            password: "open sesame".to_string(),
        });
        assert_eq!(
            headers,
            vec![(
                "Authorization".to_string(),
                "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==".to_string()
            )]
        );
    }

    #[test]
    fn test_custom_header_from_line() {
        let auth = AuthScheme::from_header_line("X-Api-Key: secret").unwrap();
        assert_eq!(
            build_headers(&auth),
            vec![("X-Api-Key".to_string(), "secret".to_string())]
        );
    }
}
