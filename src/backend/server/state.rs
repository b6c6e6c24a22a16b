/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every handler. All
 * fields are cheap to clone: stores and service adapters sit behind `Arc`,
 * and the fan-out handle is an `mpsc` sender.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only the part they
 * need, e.g. `State<Repositories>`, instead of the whole `AppState`.
 *
 * # Example
 *
 * ```rust,no_run
 * use spamit::backend::store::Repositories;
 * use axum::extract::State;
 *
 * async fn handler(State(repos): State<Repositories>) {
 *     let _ = repos.backend();
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::auth::sessions::SessionKeys;
use crate::backend::groups::{InviteCodec, MembershipService};
use crate::backend::notifications::{spawn_fanout_worker, FanoutEngine, FanoutHandle, FANOUT_QUEUE_CAPACITY};
use crate::backend::services::{
    BlobStore, FcmPushSender, FirebaseIdentityVerifier, IdentityVerifier, LocalBlobStore,
    NoopPushSender, NoopSmsSender, PushSender, SmsSender, TwilioSmsSender,
    UnconfiguredIdentityVerifier,
};
use crate::backend::store::Repositories;
use crate::shared::config::AppConfig;

/// External service adapters, constructed once at startup
#[derive(Clone)]
pub struct ServiceHandles {
    pub identity: Arc<dyn IdentityVerifier>,
    pub push: Arc<dyn PushSender>,
    pub sms: Arc<dyn SmsSender>,
    pub blobs: Arc<dyn BlobStore>,
}

impl ServiceHandles {
    /// Build adapters from configuration
    ///
    /// A missing section selects the no-op adapter for that service and
    /// logs a warning.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::new();

        let identity: Arc<dyn IdentityVerifier> = match &config.firebase {
            Some(firebase) => Arc::new(FirebaseIdentityVerifier::new(client.clone(), firebase.clone())),
            None => {
                tracing::warn!("FIREBASE_PROJECT_ID not set. Sign-in is disabled.");
                Arc::new(UnconfiguredIdentityVerifier)
            }
        };
        let push: Arc<dyn PushSender> = match &config.fcm {
            Some(fcm) => Arc::new(FcmPushSender::new(client.clone(), fcm.clone())),
            None => {
                tracing::warn!("FCM not configured. Push notifications are disabled.");
                Arc::new(NoopPushSender)
            }
        };
        let sms: Arc<dyn SmsSender> = match &config.twilio {
            Some(twilio) => Arc::new(TwilioSmsSender::new(client, twilio.clone())),
            None => {
                tracing::warn!("Twilio not configured. Invite SMS will only be logged.");
                Arc::new(NoopSmsSender)
            }
        };
        let blobs = Arc::new(LocalBlobStore::new(
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        ));

        Self {
            identity,
            push,
            sms,
            blobs,
        }
    }
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub sessions: SessionKeys,
    pub membership: MembershipService,
    pub identity: Arc<dyn IdentityVerifier>,
    pub sms: Arc<dyn SmsSender>,
    pub blobs: Arc<dyn BlobStore>,
    /// Submit side of the notification fan-out queue
    pub fanout: FanoutHandle,
}

impl AppState {
    /// Assemble the state and start the fan-out worker
    ///
    /// Must be called inside a Tokio runtime. The returned handle completes
    /// when the worker stops.
    pub fn new(config: AppConfig, repos: Repositories, services: ServiceHandles) -> (Self, JoinHandle<()>) {
        let sessions = SessionKeys::new(&config.jwt_secret, config.session_ttl_days);
        let invites = InviteCodec::new(&config.jwt_secret, config.invite_ttl_days);
        let membership = MembershipService::new(&repos, invites);

        let engine = FanoutEngine::new(&repos, services.push.clone());
        let (fanout, worker) = spawn_fanout_worker(engine, FANOUT_QUEUE_CAPACITY);

        let state = Self {
            config: Arc::new(config),
            repos,
            sessions,
            membership,
            identity: services.identity,
            sms: services.sms,
            blobs: services.blobs,
            fanout,
        };
        (state, worker)
    }
}

impl FromRef<AppState> for Repositories {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.repos.clone()
    }
}

impl FromRef<AppState> for MembershipService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.membership.clone()
    }
}

impl FromRef<AppState> for FanoutHandle {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.fanout.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
