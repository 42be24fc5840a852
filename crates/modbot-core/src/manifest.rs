//! Message manifest consumed by the batch synchronizer.

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::platform::ensure_snowflake;

/// A set of bot messages in one channel and the state each should be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextFile {
    #[serde(rename = "channelID")]
    pub channel_id: String,
    pub messages: Vec<TextFileMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextFileMessage {
    pub id: String,
    /// Lines of the message, joined with newlines before rendering.
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<MessageComponents>,
}

impl TextFileMessage {
    pub fn joined_content(&self) -> String {
        self.content.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdowns: Option<Vec<DropdownDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonDescriptor {
    pub id: String,
    pub label: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropdownDescriptor {
    pub id: String,
    /// Distinguishes dropdowns that share a base id within one message.
    pub flag: String,
    pub placeholder: String,
    pub min: u32,
    /// `-1` means "as many as there are options".
    pub max: i32,
    pub options: Vec<String>,
}

const MAX_MIN_VALUES: u32 = 25;

impl TextFile {
    /// Parse a manifest and validate its fields.
    pub fn parse(raw: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(raw)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_id.trim().is_empty() {
            return Err(BotError::Validation("manifest has no channelID".into()));
        }
        ensure_snowflake("channelID", &self.channel_id)?;

        for (index, message) in self.messages.iter().enumerate() {
            if message.id.trim().is_empty() {
                return Err(BotError::Validation(format!(
                    "message #{index} has no id"
                )));
            }
            ensure_snowflake("message id", &message.id)?;

            let Some(components) = &message.components else {
                continue;
            };
            for button in components.buttons.iter().flatten() {
                if button.id.trim().is_empty() {
                    return Err(BotError::Validation(format!(
                        "message #{index} has a button without id"
                    )));
                }
            }
            for dropdown in components.dropdowns.iter().flatten() {
                if dropdown.id.trim().is_empty() {
                    return Err(BotError::Validation(format!(
                        "message #{index} has a dropdown without id"
                    )));
                }
                if dropdown.max < -1 {
                    return Err(BotError::Validation(format!(
                        "dropdown '{}' has max {}, expected -1 or more",
                        dropdown.id, dropdown.max
                    )));
                }
                if dropdown.min > MAX_MIN_VALUES {
                    return Err(BotError::Validation(format!(
                        "dropdown '{}' has min {}, expected at most {MAX_MIN_VALUES}",
                        dropdown.id, dropdown.min
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = r#"{
        "channelID": "555",
        "messages": [
            {
                "id": "1",
                "content": ["Welcome to {channel:general}!", "Ping {role:Moderator} for help."],
                "components": {
                    "buttons": [{"id": "bntDepartment", "label": "Department", "style": "Primary"}],
                    "dropdowns": [{"id": "year", "flag": "bc", "placeholder": "Year", "min": 0, "max": -1, "options": ["1", "2", "3"]}]
                }
            },
            { "id": "2", "content": ["Plain"] }
        ]
    }"#;

    #[test]
    fn test_parse_sample_manifest() {
        let manifest = TextFile::parse(SAMPLE).unwrap();
        assert_eq!(manifest.channel_id, "555");
        assert_eq!(manifest.messages.len(), 2);
        assert_eq!(
            manifest.messages[0].joined_content(),
            "Welcome to {channel:general}!\nPing {role:Moderator} for help."
        );
        let components = manifest.messages[0].components.as_ref().unwrap();
        assert_eq!(components.dropdowns.as_ref().unwrap()[0].max, -1);
        assert!(manifest.messages[1].components.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let raw = r#"{"channelID": "1", "messages": [], "extra": true}"#;
        let err = TextFile::parse(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_parse_rejects_negative_min() {
        let raw = r#"{"channelID": "1", "messages": [{"id": "2", "content": [], "components": {
            "dropdowns": [{"id": "d", "flag": "f", "placeholder": "", "min": -1, "max": 1, "options": []}]
        }}]}"#;
        assert!(TextFile::parse(raw).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_max() {
        let raw = r#"{"channelID": "1", "messages": [{"id": "2", "content": [], "components": {
            "dropdowns": [{"id": "d", "flag": "f", "placeholder": "", "min": 0, "max": -2, "options": []}]
        }}]}"#;
        let err = TextFile::parse(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_blank_ids() {
        let raw = r#"{"channelID": " ", "messages": []}"#;
        assert_eq!(TextFile::parse(raw).unwrap_err().kind(), ErrorKind::Validation);

        let raw = r#"{"channelID": "1", "messages": [{"id": "", "content": ["x"]}]}"#;
        assert_eq!(TextFile::parse(raw).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_non_numeric_ids() {
        let raw = r#"{"channelID": "10/../77", "messages": []}"#;
        assert_eq!(TextFile::parse(raw).unwrap_err().kind(), ErrorKind::Validation);

        let raw = r#"{"channelID": "10", "messages": [
            {"id": "100", "content": ["ok"]},
            {"id": "../../77/messages/5", "content": ["x"]}
        ]}"#;
        let err = TextFile::parse(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("../../77/messages/5"));
    }
}
