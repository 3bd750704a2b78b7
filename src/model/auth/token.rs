use jsonwebtoken::{DecodingKey, TokenData, Validation};
use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::config::Config;
use crate::error::Error;
use crate::model::common::{College, Scope, StudentId};

use super::claims::{IdentityClaims, Role};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// The verified identity of the caller, decoded from the identity provider's
/// token. Available to any route as a request guard.
#[derive(Debug, Clone)]
pub struct Identity {
    claims: IdentityClaims,
}

impl Identity {
    pub fn student_id(&self) -> &StudentId {
        &self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn college(&self) -> Option<&College> {
        self.claims.college.as_ref()
    }

    /// The caller's query scope: their college if they have one, otherwise
    /// the university-wide scope.
    pub fn scope(&self) -> Scope {
        match &self.claims.college {
            Some(college) => Scope::College(college.clone()),
            None => Scope::University,
        }
    }

    /// The one capability check: may this caller access the given scope?
    /// University-wide data is visible to everyone; a college's slice is
    /// visible to its own members and to election officers.
    pub fn can_access(&self, target: &Scope) -> bool {
        match target {
            Scope::University => true,
            Scope::College(college) => {
                self.claims.role == Role::Officer || self.claims.college.as_ref() == Some(college)
            }
        }
    }

    /// Decode and verify an identity token.
    pub fn from_token(token: &str, config: &Config) -> Result<Self, Error> {
        let data: TokenData<IdentityClaims> = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )?;
        Ok(Self {
            claims: data.claims,
        })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = Error;

    /// Get the identity token from the `Authorization: Bearer` header or the
    /// auth cookie, and verify it.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let bearer = req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::to_string);
        let token = bearer.or_else(|| {
            req.cookies()
                .get(AUTH_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
        });
        let token = try_outcome!(token.into_outcome((
            Status::Unauthorized,
            Error::Unauthorized("No identity token supplied".to_string()),
        )));

        match Identity::from_token(&token, config) {
            Ok(identity) => Outcome::Success(identity),
            Err(err) => Outcome::Failure((Status::Unauthorized, err)),
        }
    }
}
