//! Plain-text rendering of chats, messages, and the model catalog.

use armins_core::format::{format_date, format_relative_time, format_time, truncate_chars};
use armins_core::{Analysis, ChatSession, Message, ModelCatalog, ModelInfo};

const TITLE_WIDTH: usize = 56;

/// One line per chat, newest first; the active chat is marked with `*`.
pub fn print_chats(session: &ChatSession) {
    if session.chats().is_empty() {
        println!("No chats yet. Start one with `armins new` or `armins send <text>`.");
        return;
    }

    for chat in session.chats() {
        let marker = if session.active_chat_id() == Some(chat.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {:<width$}  {} ({})",
            marker,
            chat.id,
            truncate_chars(&chat.title, TITLE_WIDTH),
            format_date(chat.created_at),
            format_relative_time(chat.created_at),
            width = TITLE_WIDTH,
        );
    }
}

/// Print a chat transcript.
pub fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }

    for message in messages {
        print_message(message);
    }
}

pub fn print_message(message: &Message) {
    let time = format_time(message.timestamp());
    match message {
        Message::User(m) => {
            println!("[{}] you:", time);
            if !m.text.is_empty() {
                println!("  {}", m.text);
            }
            if let Some(file) = &m.file_info {
                println!("  [file] {} ({} bytes)", file.name, file.size);
            }
        }
        Message::Assistant(m) => {
            println!("[{}] armins:", time);
            if m.is_loading {
                println!("  (analyzing...)");
            }
            if let Some(analysis) = &m.analysis {
                for line in analysis_text(analysis).lines() {
                    println!("  {}", line);
                }
            }
        }
    }
}

/// Pretty JSON for results, the message itself for errors.
pub fn analysis_text(analysis: &Analysis) -> String {
    match analysis {
        Analysis::Error(message) => format!("error: {}", message),
        Analysis::Result(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

/// The catalog for both slots with the current selection marked.
pub fn print_catalog(catalog: &ModelCatalog) {
    let Some(available) = catalog.available() else {
        println!("No model catalog loaded.");
        return;
    };

    println!("ADU classification:");
    print_models(&available.adu_classification, catalog.selected_adu_model());
    println!();
    println!("Stance classification:");
    print_models(
        &available.stance_classification,
        catalog.selected_stance_model(),
    );
}

fn print_models(models: &[ModelInfo], selected: Option<&str>) {
    if models.is_empty() {
        println!("  (none)");
        return;
    }

    for model in models {
        let marker = if selected == Some(model.id.as_str()) {
            "*"
        } else {
            " "
        };
        let mut flags = Vec::new();
        if model.supports_few_shot() {
            flags.push("few-shot");
        }
        if !model.is_enabled() {
            flags.push("disabled");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!(
            "  {} {:<14} {:<7} {}{}",
            marker,
            model.id,
            model.provider.as_str(),
            model.description,
            flags
        );
    }
}
