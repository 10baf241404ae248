//! Request handlers
//!
//! A handler executes a command body that already passed the opcode table
//! and returns the reply payload. Errors become ERROR replies.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, WireError};
use crate::protocol::{CommandCodec, Login, LoginRequest, LoginResponse, Logout, Ping};

/// Executes commands on behalf of a [`Connection`](super::Connection)
pub trait RequestHandler: Send + Sync {
    fn handle(&self, code: u8, body: &[u8]) -> Result<Bytes>;
}

type Route = Box<dyn Fn(&[u8]) -> Result<Bytes> + Send + Sync>;

/// Routes bodies to typed functions through each command's codec
///
/// A route decodes the body with `C::decode_body`, runs the function and
/// encodes its result with `C::encode_reply`.
#[derive(Default)]
pub struct Router {
    routes: HashMap<u8, Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve command `C` with `f`. A later route for the same opcode wins.
    pub fn route<C, F>(mut self, f: F) -> Self
    where
        C: CommandCodec + 'static,
        F: Fn(C::Request) -> Result<C::Response> + Send + Sync + 'static,
    {
        let route: Route = Box::new(move |body: &[u8]| {
            let request = C::decode_body(body)?;
            let response = f(request)?;
            C::encode_reply(&response)
        });
        self.routes.insert(C::CODE, route);
        self
    }

    pub fn handles(&self, code: u8) -> bool {
        self.routes.contains_key(&code)
    }
}

impl RequestHandler for Router {
    fn handle(&self, code: u8, body: &[u8]) -> Result<Bytes> {
        match self.routes.get(&code) {
            Some(route) => route(body),
            None => Err(WireError::UnknownCommand(code)),
        }
    }
}

/// Fixed in-memory user list
///
/// Users are numbered from 1 in the order they are added.
#[derive(Debug, Default)]
pub struct StaticUsers {
    /// username -> (password, user_id)
    users: HashMap<Vec<u8>, (Vec<u8>, u32)>,
}

impl StaticUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user; a repeated username replaces the password and keeps its id
    pub fn with_user(mut self, username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> Self {
        let next_id = self.users.len() as u32 + 1;
        let entry = self
            .users
            .entry(username.as_ref().to_vec())
            .or_insert_with(|| (Vec::new(), next_id));
        entry.0 = password.as_ref().to_vec();
        self
    }

    /// Parse `name:password`. The password may itself contain colons.
    pub fn parse_user(entry: &str) -> Result<(String, String)> {
        match entry.split_once(':') {
            Some((name, password)) if !name.is_empty() && !password.is_empty() => {
                Ok((name.to_string(), password.to_string()))
            }
            _ => Err(WireError::Config(format!(
                "Expected user as name:password, got '{}'",
                entry
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check credentials and return the user's id
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        match self.users.get(request.username()) {
            Some((password, user_id)) if password.as_slice() == request.password() => {
                tracing::info!(
                    "User {} logged in (version {:?})",
                    user_id,
                    request.client_version().map(String::from_utf8_lossy)
                );
                Ok(LoginResponse { user_id: *user_id })
            }
            _ => {
                tracing::info!(
                    "Rejected login for '{}'",
                    String::from_utf8_lossy(request.username())
                );
                Err(WireError::InvalidCredentials)
            }
        }
    }

    /// Serve LOGIN from this list; PING and LOGOUT answer empty
    pub fn into_router(self) -> Router {
        let users = Arc::new(self);
        Router::new()
            .route::<Login, _>(move |request| users.login(&request))
            .route::<Ping, _>(|()| Ok(()))
            .route::<Logout, _>(|()| Ok(()))
    }
}
