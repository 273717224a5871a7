//! Stateless command dispatcher: one inbound message in, exactly one reply out.

use std::sync::Arc;

use crate::{
    formatting::{escape_html, format_address_result, format_transaction_result},
    i18n::Translations,
    messaging::{port::MessagingPort, types::IncomingMessage},
    metrics::Metrics,
    service::AmlService,
    Error, Result,
};

pub struct MessageDispatcher {
    service: Arc<AmlService>,
    messenger: Arc<dyn MessagingPort>,
    translations: Arc<Translations>,
    metrics: Arc<Metrics>,
}

impl MessageDispatcher {
    pub fn new(
        service: Arc<AmlService>,
        messenger: Arc<dyn MessagingPort>,
        translations: Arc<Translations>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            service,
            messenger,
            translations,
            metrics,
        }
    }

    /// Handle one inbound message.
    ///
    /// AML failures are turned into a user-facing reply here. The only error returned is a
    /// failure to build or deliver the reply itself.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<()> {
        self.metrics.record_bot_request();

        let Some(cmd) = msg.command() else {
            return self.reply(msg, "use_command", &[]).await;
        };

        match cmd.name.as_str() {
            "start" | "help" => self.reply(msg, "welcome", &[]).await,
            "check" => self.handle_check(msg, &cmd.args).await,
            "checktx" => self.handle_check_tx(msg, &cmd.args).await,
            other => {
                let command = escape_html(other);
                self.reply(msg, "unknown_command", &[("command", command.as_str())])
                    .await
            }
        }
    }

    async fn handle_check(&self, msg: &IncomingMessage, args: &str) -> Result<()> {
        let target = args.trim();
        if target.is_empty() {
            return self.reply(msg, "check_usage", &[]).await;
        }

        self.metrics.record_aml_request();
        let lang = msg.language.as_deref();
        let html = match self.service.check_address(target).await {
            Ok(result) => format_address_result(&self.translations, lang, &result)?,
            Err(e) => self.check_failed(msg, target, &e)?,
        };
        self.send(msg, &html).await
    }

    async fn handle_check_tx(&self, msg: &IncomingMessage, args: &str) -> Result<()> {
        let mut tokens = args.split_whitespace();
        let (Some(tx_hash), None) = (tokens.next(), tokens.next()) else {
            return self.reply(msg, "checktx_usage", &[]).await;
        };

        self.metrics.record_aml_request();
        let lang = msg.language.as_deref();
        let html = match self.service.check_transaction(tx_hash).await {
            Ok(result) => format_transaction_result(&self.translations, lang, &result)?,
            Err(e) => self.check_failed(msg, tx_hash, &e)?,
        };
        self.send(msg, &html).await
    }

    fn check_failed(&self, msg: &IncomingMessage, target: &str, err: &Error) -> Result<String> {
        tracing::warn!(
            chat_id = msg.chat_id.0,
            text = %msg.text,
            target = %target,
            error = %err,
            "AML check failed"
        );

        let target = escape_html(target);
        let reason = escape_html(&err.to_string());
        self.translations.get(
            msg.language.as_deref(),
            "error_checking",
            &[("target", target.as_str()), ("reason", reason.as_str())],
        )
    }

    async fn reply(&self, msg: &IncomingMessage, key: &str, args: &[(&str, &str)]) -> Result<()> {
        let html = self.translations.get(msg.language.as_deref(), key, args)?;
        self.send(msg, &html).await
    }

    async fn send(&self, msg: &IncomingMessage, html: &str) -> Result<()> {
        self.messenger.send_html(msg.chat_id, html).await?;
        Ok(())
    }
}
