use {
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        Bot,
        dispatching::{Dispatcher, UpdateFilterExt},
        dptree,
        prelude::{Requester, ResponseResult},
        types::{Message, Update, UserId},
    },
    threadsage_auto_reply::{DispatchHandle, Outcome},
    threadsage_common::types::InboundMessage,
    tracing::{info, warn},
};

use crate::chunk::{TELEGRAM_MAX_MESSAGE_LEN, split_reply};

/// The bot's own user id, used to drop messages it authored.
#[derive(Debug, Clone, Copy)]
struct BotIdentity(UserId);

/// Long-poll Telegram until interrupted, routing every text message through
/// `handle`.
pub async fn run(token: &Secret<String>, handle: DispatchHandle) -> anyhow::Result<()> {
    let bot = Bot::new(token.expose_secret());
    let me = bot.get_me().await?;
    info!(username = ?me.user.username, id = me.user.id.0, "telegram bot connected");

    let handler = Update::filter_message().endpoint(on_message);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![handle, BotIdentity(me.user.id)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("telegram bot stopped");
    Ok(())
}

async fn on_message(
    bot: Bot,
    msg: Message,
    handle: DispatchHandle,
    me: BotIdentity,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let inbound = to_inbound(
        msg.chat.id.0,
        msg.from.as_ref().map(|u| u.id.0),
        me.0.0,
        text,
    );

    match handle.dispatch(inbound).await {
        Ok(Outcome::Reply(payload)) => {
            for chunk in split_reply(&payload.text, TELEGRAM_MAX_MESSAGE_LEN) {
                bot.send_message(msg.chat.id, chunk).await?;
            }
        },
        Ok(Outcome::Ignored(_)) => {},
        Err(e) => warn!(chat_id = msg.chat.id.0, error = %e, "could not dispatch message"),
    }
    Ok(())
}

fn to_inbound(chat_id: i64, author_id: Option<u64>, bot_id: u64, text: &str) -> InboundMessage {
    InboundMessage {
        channel_id: chat_id.to_string(),
        author_id: author_id.map(|id| id.to_string()).unwrap_or_default(),
        from_self: author_id == Some(bot_id),
        text: text.to_string(),
    }
}
