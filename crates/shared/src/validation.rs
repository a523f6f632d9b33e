use crate::constants::*;

pub fn validate_chat_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Chat name is required".into());
    }
    if name.trim().len() > MAX_CHAT_NAME_LENGTH {
        return Err(format!(
            "Chat name must be at most {} characters",
            MAX_CHAT_NAME_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_chat_description(description: &str) -> Result<(), String> {
    if description.len() > MAX_CHAT_DESCRIPTION_LENGTH {
        return Err(format!(
            "Chat description must be at most {} characters",
            MAX_CHAT_DESCRIPTION_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_message_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message content is required".into());
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err("Message too long".into());
    }
    Ok(())
}

pub fn validate_emoji(emoji: &str) -> Result<(), String> {
    if emoji.is_empty() {
        return Err("Emoji is required".into());
    }
    if emoji.len() > MAX_EMOJI_LENGTH {
        return Err("Not a valid emoji".into());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LENGTH
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(
            "Username can only contain letters, numbers, hyphens, and underscores".into(),
        );
    }
    Ok(())
}
