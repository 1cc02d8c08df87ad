use std::sync::Arc;

use rentquote_core::flows::{codec, DialogueEngine, DialogueOutcome, FailureReason};
use tracing::{debug, info, warn};

use crate::client::Reply;
use crate::events::{MessageContent, WebhookEvent};
use crate::messages::{price_card, prompt_with_text, quick_reply_prompt, LineMessage};

/// Turns webhook events into replies. Holds no per-user state: the trail
/// travels inside each postback payload.
#[derive(Clone, Debug)]
pub struct DialogueHandler {
    engine: Arc<DialogueEngine>,
}

impl DialogueHandler {
    pub fn new(engine: Arc<DialogueEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DialogueEngine {
        &self.engine
    }

    /// Returns `None` for events that get no reply.
    pub fn handle(&self, event: &WebhookEvent) -> Option<Reply> {
        match event {
            WebhookEvent::Message(message) => match &message.message {
                MessageContent::Text { text } => {
                    let step = self.engine.start(text);
                    info!(
                        event_name = "line.dialogue.started",
                        options = step.options.len(),
                        "free text opened a dialogue"
                    );
                    Some(Reply::new(&message.reply_token, vec![quick_reply_prompt(&step)]))
                }
                MessageContent::Unsupported => {
                    debug!(event_name = "line.event.ignored", kind = "non_text_message", "ignoring message");
                    None
                }
            },
            WebhookEvent::Postback(postback) => {
                let outcome = self.outcome_for_postback(&postback.postback.data);
                Some(Reply::new(&postback.reply_token, self.render(outcome)))
            }
            WebhookEvent::Unsupported => {
                debug!(event_name = "line.event.ignored", kind = event.kind(), "ignoring event");
                None
            }
        }
    }

    fn outcome_for_postback(&self, data: &str) -> DialogueOutcome {
        match codec::decode_choice(data) {
            Ok((state, Some(choice))) => self.engine.advance_state(state, &choice),
            Ok((state, None)) => self.engine.drive(state),
            Err(error) => {
                warn!(event_name = "line.postback.rejected", error = %error, "postback data rejected");
                DialogueOutcome::Failed { reason: FailureReason::NotFound, reprompt: None }
            }
        }
    }

    fn render(&self, outcome: DialogueOutcome) -> Vec<LineMessage> {
        match outcome {
            DialogueOutcome::NextStep(step) => vec![quick_reply_prompt(&step)],
            DialogueOutcome::Resolved(resolution) => {
                info!(
                    event_name = "line.dialogue.resolved",
                    title = %resolution.title,
                    surcharge_applied = resolution.surcharge_applied,
                    "sending price card"
                );
                vec![price_card(&resolution)]
            }
            DialogueOutcome::Failed { reason, reprompt: Some(step) } => {
                vec![prompt_with_text(reason.user_message().to_owned(), &step)]
            }
            DialogueOutcome::Failed { reason, reprompt: None } => {
                info!(event_name = "line.dialogue.restarted", reason = ?reason, "restarting dialogue");
                let restart = self.engine.start("");
                vec![prompt_with_text(reason.user_message().to_owned(), &restart)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rentquote_core::catalog::{Catalog, CatalogItem, RawVariant};
    use rentquote_core::flows::DialogueEngine;
    use rentquote_core::rules::RuleTable;

    use super::DialogueHandler;
    use crate::events::{MessageContent, MessageEvent, PostbackContent, PostbackEvent, WebhookEvent};
    use crate::messages::LineMessage;

    fn handler() -> DialogueHandler {
        let catalog = Catalog::new(vec![
            CatalogItem::new("発電機", Some("25kVA"), "超低騒音")
                .with_variant(RawVariant::priced(None, 6000, 60000)),
            CatalogItem::new("発電機", Some("45kVA"), "超低騒音")
                .with_variant(RawVariant::priced(None, 9000, 90000)),
        ]);
        DialogueHandler::new(Arc::new(DialogueEngine::new(
            Arc::new(catalog),
            Arc::new(RuleTable::builtin()),
        )))
    }

    fn postback(data: &str) -> WebhookEvent {
        WebhookEvent::Postback(PostbackEvent {
            reply_token: "reply".to_owned(),
            webhook_event_id: None,
            postback: PostbackContent { data: data.to_owned() },
        })
    }

    #[test]
    fn stickers_and_unknown_events_get_no_reply() {
        let sticker = WebhookEvent::Message(MessageEvent {
            reply_token: "reply".to_owned(),
            webhook_event_id: None,
            message: MessageContent::Unsupported,
        });
        assert!(handler().handle(&sticker).is_none());
        assert!(handler().handle(&WebhookEvent::Unsupported).is_none());
    }

    #[test]
    fn garbage_postback_restarts_with_categories() {
        let reply = handler().handle(&postback("cat=%ZZ&page=x")).expect("reply");
        let [LineMessage::Text { text, quick_reply: Some(quick_reply) }] = reply.messages.as_slice()
        else {
            panic!("expected one quick reply");
        };
        assert!(text.starts_with("該当データが見つかりませんでした"));
        assert_eq!(quick_reply.items.len(), 1);
    }

    #[test]
    fn postback_without_choice_replays_the_pending_step() {
        let reply = handler().handle(&postback("cat=発電機")).expect("reply");
        let [LineMessage::Text { quick_reply: Some(quick_reply), .. }] = reply.messages.as_slice()
        else {
            panic!("expected one quick reply");
        };
        assert_eq!(quick_reply.items.len(), 2);
    }
}
