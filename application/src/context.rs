/// [`Context`]-related definitions.
use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{self, Header},
    TypedHeader,
};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::domain::user;
use tokio::sync::OnceCell;

use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Resolved [`Actor`] or the [`Error`] resolving it.
    actor: OnceCell<Result<Actor, Error>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the error status code of this [`Context`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .expect("invalid status code")
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Returns the [`Actor`] performing the current request.
    ///
    /// # Errors
    ///
    /// Errors if the `X-User-Id` header is missing or malformed.
    pub async fn actor(&self) -> Result<Actor, Error> {
        self.actor
            .get_or_init(|| async { self.identify().await })
            .await
            .clone()
            .map_err(self.error())
    }

    /// Identifies the [`Actor`] by the `X-User-Id` header.
    async fn identify(&self) -> Result<Actor, Error> {
        match self.parts.clone().extract::<TypedHeader<UserId>>().await {
            Ok(TypedHeader(UserId(id))) => Ok(Actor { user_id: id.into() }),
            Err(e) if e.is_missing() => {
                Err(IdentityError::IdentityRequired.into())
            }
            Err(e) => Err(e.into_error()),
        }
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            actor: OnceCell::new(),
        })
    }
}

/// User performing a request, as identified by the upstream identity
/// provider.
#[derive(Clone, Copy, Debug)]
pub struct Actor {
    /// ID of the user.
    pub user_id: api::user::Id,
}

/// `X-User-Id` HTTP header.
#[derive(Clone, Copy, Debug)]
pub(crate) struct UserId(pub(crate) user::Id);

/// Name of the HTTP header identifying the acting `User`.
pub static X_USER_ID: http::HeaderName =
    http::HeaderName::from_static("x-user-id");

impl Header for UserId {
    fn name() -> &'static http::HeaderName {
        &X_USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i http::HeaderValue>,
    {
        values
            .next()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .map(Self)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<http::HeaderValue>>(&self, values: &mut E) {
        values.extend(http::HeaderValue::from_str(&self.0.to_string()).ok());
    }
}

define_error! {
    enum IdentityError {
        #[code = "IDENTITY_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "`X-User-Id` header is required"]
        IdentityRequired,
    }
}
