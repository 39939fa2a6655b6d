//! InMemory Identity Provider 実装
//!
//! 起動時に渡されたアカウントでメール + パスワード認証を行い、
//! サインイン・サインアウトを `AuthEvent` として配信します。

use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::domain::{
    AccessToken, AuthEvent, Email, IdentityError, IdentityProvider, ParticipantId, Session,
    ValueObjectError,
};

const AUTH_EVENT_CAPACITY: usize = 64;

/// `email:password` 形式のアカウント定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredential {
    pub email: Email,
    pub password: String,
}

impl FromStr for AccountCredential {
    type Err = ValueObjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((email, password)) = value.split_once(':') else {
            return Err(ValueObjectError::InvalidEmail(value.to_string()));
        };
        Ok(Self {
            email: Email::new(email.to_string())?,
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct Account {
    participant_id: ParticipantId,
    email: Email,
    password: String,
}

/// インメモリ Identity Provider 実装
pub struct InMemoryIdentityProvider {
    /// メールアドレス → アカウント
    accounts: HashMap<String, Account>,
    /// アクセストークン → セッション
    sessions: Mutex<HashMap<String, Session>>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl InMemoryIdentityProvider {
    /// アカウントごとに参加者 ID を払い出して作成
    pub fn new(credentials: impl IntoIterator<Item = AccountCredential>) -> Self {
        let accounts = credentials
            .into_iter()
            .filter_map(|credential| {
                let participant_id = ParticipantId::new(Uuid::new_v4().to_string()).ok()?;
                Some((
                    credential.email.as_str().to_string(),
                    Account {
                        participant_id,
                        email: credential.email,
                        password: credential.password,
                    },
                ))
            })
            .collect();
        let (auth_tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Self {
            accounts,
            sessions: Mutex::new(HashMap::new()),
            auth_tx,
        }
    }

    /// 登録済みアカウントの参加者 ID
    pub fn participant_id_of(&self, email: &str) -> Option<ParticipantId> {
        self.accounts
            .get(&email.to_lowercase())
            .map(|account| account.participant_id.clone())
    }

    fn emit(&self, event: AuthEvent) {
        // 受信者がいなくても問題ない
        let _ = self.auth_tx.send(event);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;

        let access_token = AccessToken::new(Uuid::new_v4().to_string())
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let session = Session {
            participant_id: account.participant_id.clone(),
            email: Some(account.email.clone()),
            access_token,
        };
        self.sessions
            .lock()
            .await
            .insert(session.access_token.as_str().to_string(), session.clone());

        tracing::debug!("Signed in '{}'", account.participant_id.as_str());
        self.emit(AuthEvent::SignedIn(account.participant_id.clone()));
        Ok(session)
    }

    async fn current_session(
        &self,
        token: &AccessToken,
    ) -> Result<Option<Session>, IdentityError> {
        Ok(self.sessions.lock().await.get(token.as_str()).cloned())
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(token.as_str())
            .ok_or(IdentityError::InvalidSession)?;

        tracing::debug!("Signed out '{}'", session.participant_id.as_str());
        self.emit(AuthEvent::SignedOut(session.participant_id));
        Ok(())
    }

    fn on_auth_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }
}
