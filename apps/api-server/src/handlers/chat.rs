//! Chat handler.

use actix_web::{HttpResponse, web};
use folio_shared::dto::{ChatReply, ChatRequest};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/chat - admission is enforced by the middleware wrapping this route.
pub async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> AppResult<HttpResponse> {
    let exchange = state.chat.reply(&body.message).await?;

    Ok(HttpResponse::Ok().json(ChatReply {
        reply: exchange.reply,
    }))
}
