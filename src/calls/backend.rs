//! The remote operations a call attempt is built from.

use std::future::Future;

use super::Target;
use crate::telegram::{CallHandle, DhParams, ResolvedUser, TelegramCaller, TelegramError};

/// Remote side of a call attempt.
///
/// [`TelegramCaller`] is the real implementation; tests substitute a fake.
pub trait CallBackend {
    /// Resolves a normalized target to a user.
    fn resolve(&self, target: &Target) -> impl Future<Output = Result<ResolvedUser, TelegramError>>;

    /// Sends a text message ahead of the call.
    fn send_message(
        &self,
        user: &ResolvedUser,
        text: &str,
    ) -> impl Future<Output = Result<(), TelegramError>>;

    /// Starts ringing.
    fn request_call(
        &self,
        user: &ResolvedUser,
        dh: &DhParams,
    ) -> impl Future<Output = Result<CallHandle, TelegramError>>;

    /// Hangs up.
    fn discard_call(&self, call: CallHandle) -> impl Future<Output = Result<(), TelegramError>>;
}

impl CallBackend for TelegramCaller {
    async fn resolve(&self, target: &Target) -> Result<ResolvedUser, TelegramError> {
        match target {
            Target::Username(name) => self.resolve_username(name).await,
            Target::Id(id) => self.resolve_id(*id).await,
        }
    }

    async fn send_message(&self, user: &ResolvedUser, text: &str) -> Result<(), TelegramError> {
        TelegramCaller::send_message(self, user, text).await
    }

    async fn request_call(
        &self,
        user: &ResolvedUser,
        dh: &DhParams,
    ) -> Result<CallHandle, TelegramError> {
        TelegramCaller::request_call(self, user, dh).await
    }

    async fn discard_call(&self, call: CallHandle) -> Result<(), TelegramError> {
        TelegramCaller::discard_call(self, call).await
    }
}

impl<T: CallBackend> CallBackend for &T {
    async fn resolve(&self, target: &Target) -> Result<ResolvedUser, TelegramError> {
        (**self).resolve(target).await
    }

    async fn send_message(&self, user: &ResolvedUser, text: &str) -> Result<(), TelegramError> {
        (**self).send_message(user, text).await
    }

    async fn request_call(
        &self,
        user: &ResolvedUser,
        dh: &DhParams,
    ) -> Result<CallHandle, TelegramError> {
        (**self).request_call(user, dh).await
    }

    async fn discard_call(&self, call: CallHandle) -> Result<(), TelegramError> {
        (**self).discard_call(call).await
    }
}
