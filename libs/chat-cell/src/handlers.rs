// libs/chat-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use axum_extra::TypedHeader;
use futures::{sink::SinkExt, stream::StreamExt};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token;
use shared_utils::profile::load_caller_profile;

use crate::models::{
    ChatMessage, FeedEvent, MessagesQuery, SendMessageRequest, StartConversationRequest,
    SubscribeQuery,
};
use crate::router::ChatState;
use crate::services::{catch_up, ChatService, MessageFeed, RoomHistory};

#[axum::debug_handler]
pub async fn start_conversation(
    State(state): State<ChatState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<StartConversationRequest>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state.config));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let room = ChatService::with_client(supabase, state.hub.clone())
        .start_conversation(&caller, request.counterpart_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "room": room
    })))
}

#[axum::debug_handler]
pub async fn list_conversations(
    State(state): State<ChatState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state.config));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let conversations = ChatService::with_client(supabase, state.hub.clone())
        .list_conversations(&caller, auth.token())
        .await?;

    Ok(Json(json!({
        "conversations": conversations,
        "total": conversations.len()
    })))
}

#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<ChatState>,
    Path(room_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Value>, AppError> {
    let chat_service = ChatService::new(&state.config, state.hub.clone());

    let messages = chat_service
        .list_messages(user.id, room_id, query.after_seq, query.limit, auth.token())
        .await?;

    let last_seq = messages.last().map(|m| m.seq);

    Ok(Json(json!({
        "room_id": room_id,
        "messages": messages,
        "last_seq": last_seq
    })))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<ChatState>,
    Path(room_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let chat_service = ChatService::new(&state.config, state.hub.clone());

    let message = chat_service
        .send_message(user.id, room_id, &request.message, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "message": message
    }))))
}

/// Live feed of a conversation. The token comes from the `Authorization`
/// header or, for browser clients, the `access_token` query parameter.
pub async fn subscribe(
    State(state): State<ChatState>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<SubscribeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = match query.access_token {
        Some(token) => token,
        None => bearer_token(&headers)?.to_string(),
    };

    let user = validate_token(&token, &state.config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    let chat_service = ChatService::new(&state.config, state.hub.clone());
    chat_service.participant_room(room_id, user.id, &token).await?;

    // subscribe before the backlog is read so nothing falls between the two
    let live = state.hub.subscribe(room_id).await;
    let history = RoomHistory::new(chat_service.supabase(), token);
    let hub = state.hub.clone();

    info!("User {} subscribing to room {}", user.id, room_id);

    Ok(ws.on_upgrade(move |socket| async move {
        stream_room(socket, room_id, live, history).await;
        hub.release(room_id).await;
        debug!("Subscriber {} left room {}", user.id, room_id);
    }))
}

async fn stream_room(
    socket: WebSocket,
    room_id: Uuid,
    mut live: broadcast::Receiver<ChatMessage>,
    history: RoomHistory,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut feed = MessageFeed::new();

    match catch_up(&history, &mut feed, room_id).await {
        Ok(backlog) => {
            if !deliver(&mut sender, backlog).await {
                return;
            }
        }
        Err(e) => {
            warn!("Failed to load backlog for room {}: {}", room_id, e);
            let _ = send_event(&mut sender, &FeedEvent::Error { error: e.to_string() }).await;
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = live.recv() => {
                let batch = match incoming {
                    Ok(message) => {
                        if feed.accept(&message) { vec![message] } else { Vec::new() }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscriber of room {} lagged by {} messages, re-reading", room_id, skipped);
                        match catch_up(&history, &mut feed, room_id).await {
                            Ok(recovered) => recovered,
                            Err(e) => {
                                let _ = send_event(&mut sender, &FeedEvent::Error { error: e.to_string() }).await;
                                break;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                if !deliver(&mut sender, batch).await {
                    break;
                }
            }
            client = receiver.next() => {
                match client {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn deliver<S>(sender: &mut S, messages: Vec<ChatMessage>) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    for message in messages {
        if !send_event(sender, &FeedEvent::Message { message }).await {
            return false;
        }
    }
    true
}

async fn send_event<S>(sender: &mut S, event: &FeedEvent) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode feed event: {}", e);
            false
        }
    }
}

#[axum::debug_handler]
pub async fn chat_health(State(state): State<ChatState>) -> Json<Value> {
    let rooms = state.hub.active_rooms().await;

    let mut subscribers = 0;
    for room_id in &rooms {
        subscribers += state.hub.subscriber_count(*room_id).await;
    }

    Json(json!({
        "status": "healthy",
        "live_rooms": rooms.len(),
        "subscribers": subscribers
    }))
}
