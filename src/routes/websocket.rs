use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    app::AppState,
    middleware::auth::decode_access_token,
    services::{
        announcements::AnnouncementService, contacts::ContactService, news::NewsService,
        settings::SettingsService,
    },
    store::{StoreError, Subscription},
};

#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    pub token: String,
}

/// A collection pushed to a socket as whole snapshots, never as diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveFeed {
    Contacts,
    News,
    Announcements,
    Settings,
}

impl LiveFeed {
    fn message_type(self) -> &'static str {
        match self {
            LiveFeed::Contacts => "contacts_snapshot",
            LiveFeed::News => "news_snapshot",
            LiveFeed::Announcements => "announcements_snapshot",
            LiveFeed::Settings => "settings_snapshot",
        }
    }

    fn subscribe(self, state: &AppState) -> Subscription {
        let store = state.store.as_ref();
        match self {
            LiveFeed::Contacts => ContactService::subscribe(store),
            LiveFeed::News => NewsService::subscribe(store),
            LiveFeed::Announcements => AnnouncementService::subscribe(store),
            LiveFeed::Settings => SettingsService::subscribe(store),
        }
    }

    async fn snapshot(self, state: &AppState) -> Result<Value, StoreError> {
        let store = state.store.as_ref();
        let payload = match self {
            LiveFeed::Contacts => json!(ContactService::list(store).await?),
            LiveFeed::News => json!(NewsService::list_all(store).await?),
            LiveFeed::Announcements => json!(AnnouncementService::list_all(store).await?),
            LiveFeed::Settings => json!(SettingsService::get(store).await?),
        };
        Ok(json!({ "type": self.message_type(), "payload": payload }))
    }
}

/// GET /admin/contacts/ws?token=...
pub async fn contacts_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
) -> Response {
    staff_socket(ws, state, params, LiveFeed::Contacts)
}

/// GET /admin/news/ws?token=... (drafts included)
pub async fn news_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
) -> Response {
    staff_socket(ws, state, params, LiveFeed::News)
}

/// GET /admin/announcements/ws?token=...
pub async fn announcements_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
) -> Response {
    staff_socket(ws, state, params, LiveFeed::Announcements)
}

/// GET /settings/ws: public, the site header and footer follow setting changes live.
pub async fn settings_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        handle_socket(socket, state, LiveFeed::Settings, "public".into()).await;
    })
}

fn staff_socket(
    ws: WebSocketUpgrade,
    state: AppState,
    params: WsQueryParams,
    feed: LiveFeed,
) -> Response {
    let auth_staff = decode_access_token(&params.token, &state.config.jwt_secret);

    ws.on_upgrade(move |socket| async move {
        match auth_staff {
            Ok(staff) => {
                info!("{:?} feed connected: staff={}", feed, staff.user_id);
                handle_socket(socket, state, feed, staff.user_id).await;
            }
            Err(e) => {
                error!("WebSocket auth failed: {}", e);
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: AppState, feed: LiveFeed, client: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the first snapshot so no change slips between the two.
    let mut subscription = feed.subscribe(&state);

    let mut feed_task = tokio::spawn(async move {
        if !send_snapshot(&mut sender, &state, feed).await {
            return;
        }
        while subscription.changed().await {
            if !send_snapshot(&mut sender, &state, feed).await {
                break;
            }
        }
    });

    let mut client_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    info!("WS message from {}: {}", client, text);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut feed_task) => client_task.abort(),
        _ = (&mut client_task) => feed_task.abort(),
    }

    info!("{:?} feed disconnected", feed);
}

/// Returns false once the client is gone.
async fn send_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    feed: LiveFeed,
) -> bool {
    let ws_msg = match feed.snapshot(state).await {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to load {:?} snapshot: {}", feed, e);
            return true;
        }
    };
    sender
        .send(Message::Text(ws_msg.to_string().into()))
        .await
        .is_ok()
}
