use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access;
use crate::api::rest::{ok, Envelope};
use crate::error::AppError;
use crate::models::account::Role;
use crate::models::chat::{ChatMessage, Conversation};
use crate::state::AppState;

const ALL_ROLES: &[Role] = &[
    Role::Shipper,
    Role::Carrier,
    Role::Escort,
    Role::Admin,
    Role::Driver,
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/messages/conversations",
            post(open_conversation).get(list_conversations),
        )
        .route("/messages/conversation/:id", get(get_conversation))
        .route("/messages/conversation/:id/read", post(mark_read))
        .route("/messages", post(send_message))
}

#[derive(Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub participants: [Uuid; 2],
    pub last_message: Option<ChatMessage>,
    pub unread_count: u32,
    pub message_count: usize,
}

fn summarize(conversation: &Conversation, viewer: Uuid) -> ConversationSummary {
    ConversationSummary {
        id: conversation.id,
        booking_id: conversation.booking_id,
        participants: conversation.participants,
        last_message: conversation.messages.last().cloned(),
        unread_count: conversation.unread_for(viewer),
        message_count: conversation.messages.len(),
    }
}

#[derive(Deserialize)]
pub struct OpenConversationRequest {
    pub recipient_id: Uuid,
    pub booking_id: Option<Uuid>,
}

async fn open_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<OpenConversationRequest>,
) -> Result<Json<Envelope<Conversation>>, AppError> {
    let account = access::authorize(&state, &headers, ALL_ROLES)?;

    if payload.recipient_id == account.id {
        return Err(AppError::BadRequest(
            "cannot open a conversation with yourself".to_string(),
        ));
    }

    if !state.accounts.contains_key(&payload.recipient_id) {
        return Err(AppError::NotFound("recipient not found".to_string()));
    }

    let existing = state.conversations.iter().find(|entry| {
        entry.booking_id == payload.booking_id
            && entry.participant_index(account.id).is_some()
            && entry.participant_index(payload.recipient_id).is_some()
    });
    if let Some(conversation) = existing {
        return Ok(ok(conversation.value().clone()));
    }

    let conversation = Conversation {
        id: Uuid::new_v4(),
        booking_id: payload.booking_id,
        participants: [account.id, payload.recipient_id],
        messages: Vec::new(),
        unread: [0, 0],
        created_at: Utc::now(),
    };

    state
        .conversations
        .insert(conversation.id, conversation.clone());

    Ok(ok(conversation))
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<ConversationSummary>>>, AppError> {
    let account = access::authorize(&state, &headers, ALL_ROLES)?;

    let conversations = state
        .conversations
        .iter()
        .filter(|entry| entry.participant_index(account.id).is_some())
        .map(|entry| summarize(entry.value(), account.id))
        .collect();

    Ok(ok(conversations))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Conversation>>, AppError> {
    let account = access::authorize(&state, &headers, ALL_ROLES)?;

    let conversation = state
        .conversations
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("conversation {} not found", id)))?;

    if conversation.participant_index(account.id).is_none() {
        return Err(AppError::Forbidden(
            "not a participant in this conversation".to_string(),
        ));
    }

    Ok(ok(conversation.value().clone()))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ConversationSummary>>, AppError> {
    let account = access::authorize(&state, &headers, ALL_ROLES)?;

    let mut conversation = state
        .conversations
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("conversation {} not found", id)))?;

    let idx = conversation
        .participant_index(account.id)
        .ok_or_else(|| {
            AppError::Forbidden("not a participant in this conversation".to_string())
        })?;

    conversation.unread[idx] = 0;

    Ok(ok(summarize(&conversation, account.id)))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    pub body: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<Envelope<ChatMessage>>, AppError> {
    let account = access::authorize(&state, &headers, ALL_ROLES)?;

    if payload.body.trim().is_empty() {
        return Err(AppError::BadRequest(
            "message body is required".to_string(),
        ));
    }

    let mut conversation = state
        .conversations
        .get_mut(&payload.conversation_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "conversation {} not found",
                payload.conversation_id
            ))
        })?;

    let idx = conversation
        .participant_index(account.id)
        .ok_or_else(|| {
            AppError::Forbidden("not a participant in this conversation".to_string())
        })?;

    let message = ChatMessage {
        id: Uuid::new_v4(),
        sender_id: account.id,
        body: payload.body,
        sent_at: Utc::now(),
    };

    conversation.messages.push(message.clone());
    conversation.unread[1 - idx] += 1;

    Ok(ok(message))
}
