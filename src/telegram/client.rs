//! Telegram client wrapper for placing calls.

use std::sync::Arc;

use grammers_client::client::{LoginToken, PasswordToken};
use grammers_client::{Client, SenderPool, SignInError, sender};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{DhParams, TelegramError};
use crate::config::TelegramConfig;

/// Re-export types for external use.
pub use grammers_client::client::{LoginToken as Token, PasswordToken as PwdToken};

/// Oldest and newest libtgvoip layer advertised in call requests.
pub const CALL_PROTOCOL_LAYER: i32 = 92;

/// Library versions advertised in call requests.
pub const CALL_LIBRARY_VERSIONS: [&str; 2] = ["5.0.0", "6.0.0"];

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AccountInfo {
    /// `@username`, or `ID:<id>` when the account has none.
    #[must_use]
    pub fn handle(&self) -> String {
        display_handle(self.username.as_deref(), self.id)
    }

    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A user resolved to something calls and messages can be addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub id: i64,
    pub access_hash: i64,
    pub username: Option<String>,
}

impl ResolvedUser {
    /// `@username`, or `ID:<id>` when the user has none.
    #[must_use]
    pub fn display(&self) -> String {
        display_handle(self.username.as_deref(), self.id)
    }

    fn input_user(&self) -> tl::enums::InputUser {
        tl::enums::InputUser::User(tl::types::InputUser {
            user_id: self.id,
            access_hash: self.access_hash,
        })
    }

    fn input_peer(&self) -> tl::enums::InputPeer {
        tl::enums::InputPeer::User(tl::types::InputPeerUser {
            user_id: self.id,
            access_hash: self.access_hash,
        })
    }
}

impl From<tl::types::User> for ResolvedUser {
    fn from(user: tl::types::User) -> Self {
        Self {
            id: user.id,
            access_hash: user.access_hash.unwrap_or_default(),
            username: user.username,
        }
    }
}

/// Identifies an outgoing call for discarding it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallHandle {
    pub id: i64,
    pub access_hash: i64,
}

/// High-level Telegram client wrapper.
pub struct TelegramCaller {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// API hash, needed again when requesting a login code.
    api_hash: String,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramCaller {
    /// Connects to Telegram with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened or the connection fails.
    pub async fn connect(config: &TelegramConfig) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates: _updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        Ok(Self {
            client,
            handle: handle.thin,
            api_hash: config.api_hash.clone(),
            _pool_task: pool_task,
        })
    }

    /// Checks if the client is authorized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Requests a login code to be sent to the phone number.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::InvalidPhone`] for a malformed number and
    /// [`TelegramError::FloodWait`] when Telegram refuses more attempts.
    pub async fn request_login_code(&self, phone: &str) -> Result<LoginToken, TelegramError> {
        info!("Requesting login code for phone: {}...", mask_phone(phone));

        self.client
            .request_login_code(phone, &self.api_hash)
            .await
            .map_err(|e| login_code_error(TelegramError::from(e)))
    }

    /// Signs in with the login code.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::PasswordRequired`] when 2FA is enabled.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<(), TelegramError> {
        info!("Signing in with login code...");

        match self.client.sign_in(token, code).await {
            Ok(_user) => {
                info!("Successfully signed in!");
                Ok(())
            }
            Err(SignInError::PasswordRequired(password_token)) => {
                debug!("2FA password required, hint: {:?}", password_token.hint());
                Err(TelegramError::PasswordRequired(password_token))
            }
            Err(SignInError::InvalidCode) => Err(TelegramError::InvalidCode),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Checks the 2FA password.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is invalid.
    pub async fn check_password(
        &self,
        password_token: PasswordToken,
        password: &str,
    ) -> Result<(), TelegramError> {
        info!("Checking 2FA password...");

        match self.client.check_password(password_token, password).await {
            Ok(_user) => {
                info!("Successfully authenticated with 2FA!");
                Ok(())
            }
            Err(SignInError::InvalidPassword(token)) => Err(TelegramError::InvalidPassword(token)),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Fetches the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if not authorized or the API call fails.
    pub async fn me(&self) -> Result<AccountInfo, TelegramError> {
        let request = tl::functions::users::GetUsers {
            id: vec![tl::enums::InputUser::UserSelf],
        };

        let users = self.client.invoke(&request).await?;
        match users.into_iter().next() {
            Some(tl::enums::User::User(user)) => Ok(AccountInfo {
                id: user.id,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
            }),
            _ => Err(TelegramError::NotAuthorized),
        }
    }

    /// Resolves a `@username` (without the `@`).
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::NotFound`] if nobody owns the username or it
    /// belongs to a channel or group.
    pub async fn resolve_username(&self, username: &str) -> Result<ResolvedUser, TelegramError> {
        debug!("Resolving username @{}", username);

        let request = tl::functions::contacts::ResolveUsername {
            username: username.to_owned(),
            referer: None,
        };

        let tl::enums::contacts::ResolvedPeer::Peer(resolved) = self.client.invoke(&request).await?;

        let tl::enums::Peer::User(peer) = resolved.peer else {
            return Err(TelegramError::NotFound(format!("@{username} is not a user")));
        };

        resolved
            .users
            .into_iter()
            .find_map(|user| match user {
                tl::enums::User::User(user) if user.id == peer.user_id => Some(user.into()),
                _ => None,
            })
            .ok_or_else(|| TelegramError::NotFound(format!("@{username}")))
    }

    /// Resolves a numeric user ID.
    ///
    /// Telegram only accepts IDs the account has already seen; contacts are
    /// searched as a fallback.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::NotFound`] if the ID cannot be resolved.
    pub async fn resolve_id(&self, user_id: i64) -> Result<ResolvedUser, TelegramError> {
        debug!("Resolving user ID {}", user_id);

        let request = tl::functions::users::GetUsers {
            id: vec![tl::enums::InputUser::User(tl::types::InputUser {
                user_id,
                access_hash: 0,
            })],
        };

        match self.client.invoke(&request).await {
            Ok(users) => {
                let found = users.into_iter().find_map(|user| match user {
                    tl::enums::User::User(user) if user.id == user_id => Some(user),
                    _ => None,
                });
                if let Some(user) = found {
                    return Ok(user.into());
                }
            }
            Err(e) => match TelegramError::from(e) {
                TelegramError::NotFound(_) => {}
                other => return Err(other),
            },
        }

        debug!("User {} not cached, searching contacts", user_id);
        self.find_contact(user_id).await
    }

    async fn find_contact(&self, user_id: i64) -> Result<ResolvedUser, TelegramError> {
        let request = tl::functions::contacts::GetContacts { hash: 0 };

        match self.client.invoke(&request).await? {
            tl::enums::contacts::Contacts::Contacts(contacts) => contacts
                .users
                .into_iter()
                .find_map(|user| match user {
                    tl::enums::User::User(user) if user.id == user_id => Some(user.into()),
                    _ => None,
                })
                .ok_or_else(|| TelegramError::NotFound(format!("ID:{user_id}"))),
            tl::enums::contacts::Contacts::NotModified => {
                Err(TelegramError::NotFound(format!("ID:{user_id}")))
            }
        }
    }

    /// Sends a plain text message to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn send_message(&self, user: &ResolvedUser, text: &str) -> Result<(), TelegramError> {
        info!("Sending message to {}: \"{}\"", user.display(), truncate_for_log(text, 30));

        let request = tl::functions::messages::SendMessage {
            no_webpage: false,
            silent: false,
            background: false,
            clear_draft: false,
            noforwards: false,
            update_stickersets_order: false,
            invert_media: false,
            allow_paid_floodskip: false,
            peer: user.input_peer(),
            reply_to: None,
            message: text.to_owned(),
            random_id: rand::rng().random(),
            reply_markup: None,
            entities: None,
            schedule_date: None,
            send_as: None,
            quick_reply_shortcut: None,
            effect: None,
            allow_paid_stars: None,
            suggested_post: None,
            schedule_repeat_period: None,
            rich_message: None,
        };

        self.client.invoke(&request).await?;
        Ok(())
    }

    /// Starts ringing a user.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::PrivacyRestricted`] if the user does not
    /// accept calls from this account.
    pub async fn request_call(
        &self,
        user: &ResolvedUser,
        dh: &DhParams,
    ) -> Result<CallHandle, TelegramError> {
        info!("Requesting call to {}", user.display());

        let request = tl::functions::phone::RequestCall {
            video: false,
            user_id: user.input_user(),
            random_id: rand::rng().random_range(0..i32::MAX),
            g_a_hash: dh.g_a_hash().to_vec(),
            protocol: call_protocol(),
        };

        let tl::enums::phone::PhoneCall::Call(result) = self.client.invoke(&request).await?;

        let handle = match result.phone_call {
            tl::enums::PhoneCall::Waiting(call) => CallHandle {
                id: call.id,
                access_hash: call.access_hash,
            },
            tl::enums::PhoneCall::Requested(call) => CallHandle {
                id: call.id,
                access_hash: call.access_hash,
            },
            tl::enums::PhoneCall::Accepted(call) => CallHandle {
                id: call.id,
                access_hash: call.access_hash,
            },
            tl::enums::PhoneCall::Call(call) => CallHandle {
                id: call.id,
                access_hash: call.access_hash,
            },
            tl::enums::PhoneCall::Discarded(call) => {
                return Err(TelegramError::UnexpectedResponse(format!(
                    "call {} was discarded immediately",
                    call.id
                )));
            }
            tl::enums::PhoneCall::Empty(call) => {
                return Err(TelegramError::UnexpectedResponse(format!(
                    "call {} is empty",
                    call.id
                )));
            }
        };

        debug!("Call {} is ringing", handle.id);
        Ok(handle)
    }

    /// Hangs up a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn discard_call(&self, call: CallHandle) -> Result<(), TelegramError> {
        debug!("Discarding call {}", call.id);

        let request = tl::functions::phone::DiscardCall {
            video: false,
            peer: tl::enums::InputPhoneCall::Call(tl::types::InputPhoneCall {
                id: call.id,
                access_hash: call.access_hash,
            }),
            duration: 0,
            reason: tl::enums::PhoneCallDiscardReason::Hangup,
            connection_id: 0,
        };

        if let Err(e) = self.client.invoke(&request).await {
            warn!("Failed to discard call {}: {}", call.id, e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl std::fmt::Debug for TelegramCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCaller").finish_non_exhaustive()
    }
}

fn call_protocol() -> tl::enums::PhoneCallProtocol {
    tl::enums::PhoneCallProtocol::Protocol(tl::types::PhoneCallProtocol {
        udp_p2p: true,
        udp_reflector: true,
        min_layer: CALL_PROTOCOL_LAYER,
        max_layer: CALL_PROTOCOL_LAYER,
        library_versions: CALL_LIBRARY_VERSIONS
            .iter()
            .map(|&v| v.to_owned())
            .collect(),
    })
}

/// Keeps the login errors the sign-in prompt reacts to; anything else is a
/// failed sign-in.
fn login_code_error(err: TelegramError) -> TelegramError {
    match err {
        TelegramError::InvalidPhone | TelegramError::FloodWait(_) => err,
        other => TelegramError::SignInFailed(other.to_string()),
    }
}

fn display_handle(username: Option<&str>, id: i64) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{name}"),
        _ => format!("ID:{id}"),
    }
}

/// Masks a phone number for logging (shows last 4 digits).
fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 4 {
        format!("***{}", &digits[digits.len() - 4..])
    } else {
        "****".to_owned()
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
