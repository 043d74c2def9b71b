//! 登录状态与域名白名单

use crate::error::AuthorizationError;
use crate::models::Identity;

/// 身份提供方的会话状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// 尚未得到身份服务的结果
    #[default]
    Loading,
    SignedOut,
    SignedIn(Identity),
}

/// 访问判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<'a> {
    Pending,
    SignInRequired,
    Denied,
    Granted(&'a Identity),
}

/// 域名白名单
#[derive(Debug, Clone)]
pub struct AccessGate {
    allowed_domain: String,
}

impl AccessGate {
    pub fn new(allowed_domain: impl Into<String>) -> Self {
        let domain: String = allowed_domain.into();
        Self {
            allowed_domain: domain.trim_start_matches('@').to_ascii_lowercase(),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// 邮箱是否属于允许的域名（必须以 `@域名` 结尾）
    pub fn is_allowed_email(&self, email: &str) -> bool {
        match email.rsplit_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.eq_ignore_ascii_case(&self.allowed_domain)
            }
            None => false,
        }
    }

    pub fn check<'a>(&self, auth: &'a AuthState) -> Access<'a> {
        match auth {
            AuthState::Loading => Access::Pending,
            AuthState::SignedOut => Access::SignInRequired,
            AuthState::SignedIn(identity) => {
                let allowed = identity
                    .email
                    .as_deref()
                    .is_some_and(|email| self.is_allowed_email(email));
                if allowed {
                    Access::Granted(identity)
                } else {
                    Access::Denied
                }
            }
        }
    }

    /// 需要已授权身份的操作使用
    pub fn require<'a>(&self, auth: &'a AuthState) -> Result<&'a Identity, AuthorizationError> {
        match self.check(auth) {
            Access::Granted(identity) => Ok(identity),
            Access::Denied => Err(AuthorizationError::DomainNotAllowed {
                domain: self.allowed_domain.clone(),
            }),
            Access::Pending | Access::SignInRequired => Err(AuthorizationError::NotSignedIn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(email: Option<&str>) -> AuthState {
        AuthState::SignedIn(Identity::new("u1", Some("山田 太郎"), email))
    }

    #[test]
    fn test_domain_boundary() {
        let gate = AccessGate::new("tokium.jp");
        assert!(gate.is_allowed_email("taro@tokium.jp"));
        assert!(gate.is_allowed_email("taro@TOKIUM.JP"));
        assert!(!gate.is_allowed_email("taro@nottokium.jp"));
        assert!(!gate.is_allowed_email("taro@tokium.jp.evil.com"));
        assert!(!gate.is_allowed_email("@tokium.jp"));
        assert!(!gate.is_allowed_email("tokium.jp"));
    }

    #[test]
    fn test_check_states() {
        let gate = AccessGate::new("@tokium.jp");
        assert_eq!(gate.check(&AuthState::Loading), Access::Pending);
        assert_eq!(gate.check(&AuthState::SignedOut), Access::SignInRequired);
        assert_eq!(gate.check(&signed_in(None)), Access::Denied);
        assert_eq!(gate.check(&signed_in(Some("a@gmail.com"))), Access::Denied);

        let auth = signed_in(Some("a@tokium.jp"));
        assert!(matches!(gate.check(&auth), Access::Granted(_)));
        assert!(gate.require(&auth).is_ok());
    }

    #[test]
    fn test_require_errors() {
        let gate = AccessGate::new("tokium.jp");
        assert_eq!(
            gate.require(&AuthState::SignedOut),
            Err(AuthorizationError::NotSignedIn)
        );
        assert_eq!(
            gate.require(&signed_in(Some("a@example.com"))),
            Err(AuthorizationError::DomainNotAllowed {
                domain: "tokium.jp".to_string()
            })
        );
    }
}
